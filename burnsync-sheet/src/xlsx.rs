use std::{fs, path::Path};

use anyhow::{Context, Result};
use rust_xlsxwriter::{
    Chart, ChartFormat, ChartLegendPosition, ChartLine, ChartType, Color, Format, Workbook,
    Worksheet,
};

use crate::{Cell, CellValue, LegendPosition, LineChart, Sheet, Spreadsheet};

const DEFAULT_DATE_FORMAT: &str = "yyyy-mm-dd";
const DEFAULT_DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Writes every sheet of `book`, with its formats and charts, to an `.xlsx`
/// file at `path`, replacing any previous file.
pub fn export_xlsx(book: &Spreadsheet, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();

    for sheet in book.sheets() {
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(sheet.name())
            .with_context(|| format!("invalid sheet name '{}'", sheet.name()))?;
        write_sheet(worksheet, sheet)
            .with_context(|| format!("failed to export sheet '{}'", sheet.name()))?;
    }

    if book.sheets().is_empty() {
        // a workbook needs at least one sheet
        workbook.add_worksheet();
    }

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    workbook
        .save(path)
        .with_context(|| format!("failed to save workbook at {}", path.display()))?;
    log::debug!("exported {} sheet(s) to {}", book.sheets().len(), path.display());
    Ok(())
}

fn write_sheet(worksheet: &mut Worksheet, sheet: &Sheet) -> Result<()> {
    for (row, col, cell) in sheet.cells() {
        write_cell(worksheet, row, col, cell)?;
    }

    for chart in sheet.charts() {
        worksheet.insert_chart(chart.anchor_row, chart.anchor_col, &build_chart(sheet.name(), chart))?;
    }

    if sheet.autofit() {
        worksheet.autofit();
    }
    Ok(())
}

fn write_cell(worksheet: &mut Worksheet, row: u32, col: u16, cell: &Cell) -> Result<()> {
    let format = cell_format(cell);
    match &cell.value {
        Some(CellValue::Text(text)) => {
            worksheet.write_string_with_format(row, col, text, &format)?;
        }
        Some(CellValue::Number(number)) => {
            worksheet.write_number_with_format(row, col, *number, &format)?;
        }
        Some(CellValue::Date(date)) => {
            worksheet.write_datetime_with_format(row, col, date, &format)?;
        }
        Some(CellValue::DateTime(timestamp)) => {
            worksheet.write_datetime_with_format(row, col, timestamp, &format)?;
        }
        None => {
            worksheet.write_blank(row, col, &format)?;
        }
    }
    Ok(())
}

fn cell_format(cell: &Cell) -> Format {
    let style = &cell.style;
    let mut format = Format::new();
    if style.bold {
        format = format.set_bold();
    }
    if let Some(size) = style.font_size {
        format = format.set_font_size(size);
    }

    // dates without an explicit pattern would show up as serial numbers
    let number_format = style.number_format.as_deref().or(match cell.value {
        Some(CellValue::Date(_)) => Some(DEFAULT_DATE_FORMAT),
        Some(CellValue::DateTime(_)) => Some(DEFAULT_DATETIME_FORMAT),
        _ => None,
    });
    if let Some(pattern) = number_format {
        format = format.set_num_format(pattern);
    }
    format
}

fn build_chart(sheet_name: &str, line: &LineChart) -> Chart {
    let mut chart = Chart::new(ChartType::Line);
    chart.title().set_name(line.title.as_str());
    chart.set_width(line.width).set_height(line.height);

    for series in &line.series {
        chart
            .add_series()
            .set_name((sheet_name, line.header_row, series.column))
            .set_categories((
                sheet_name,
                line.first_row,
                line.category_column,
                line.last_row,
                line.category_column,
            ))
            .set_values((
                sheet_name,
                line.first_row,
                series.column,
                line.last_row,
                series.column,
            ))
            .set_format(
                ChartFormat::new().set_line(
                    ChartLine::new()
                        .set_color(Color::RGB(series.color))
                        .set_width(series.line_width),
                ),
            );
    }

    chart.x_axis().set_name(line.x_axis.title.as_str());
    if let Some(pattern) = line.x_axis.number_format.as_deref() {
        chart.x_axis().set_num_format(pattern);
    }
    if let Some(min) = line.x_axis.min {
        chart.x_axis().set_min(min);
    }

    chart.y_axis().set_name(line.y_axis.title.as_str());
    if let Some(pattern) = line.y_axis.number_format.as_deref() {
        chart.y_axis().set_num_format(pattern);
    }
    if let Some(min) = line.y_axis.min {
        chart.y_axis().set_min(min);
    }

    match line.legend {
        LegendPosition::Top => {
            chart.legend().set_position(ChartLegendPosition::Top);
        }
        LegendPosition::Bottom => {
            chart.legend().set_position(ChartLegendPosition::Bottom);
        }
        LegendPosition::Left => {
            chart.legend().set_position(ChartLegendPosition::Left);
        }
        LegendPosition::Right => {
            chart.legend().set_position(ChartLegendPosition::Right);
        }
        LegendPosition::Hidden => {
            chart.legend().set_hidden();
        }
    }

    chart
}
