//! Local stand-in for a hosted spreadsheet: named sheets of styled cells and
//! line charts, persisted as JSON and exported to `.xlsx`.

mod cell;
mod chart;
mod range;
mod render;
mod sheet;
mod workbook;
mod xlsx;

pub use cell::{Cell, CellStyle, CellValue};
pub use chart::{ChartAxis, ChartSeries, LegendPosition, LineChart};
pub use range::CellRange;
pub use render::{render_burndown, sheet_title, HEADERS};
pub use sheet::Sheet;
pub use workbook::{state_path_for, validate_sheet_name, Spreadsheet};
pub use xlsx::export_xlsx;
