use anyhow::Result;
use burnsync_domain::BurndownPoint;
use chrono::NaiveDateTime;

use crate::{CellRange, CellValue, ChartAxis, ChartSeries, LegendPosition, LineChart, Sheet};

pub const HEADERS: [&str; 4] = ["Date", "Total Created", "Total Completed", "Remaining"];

const TITLE_CELL: &str = "A1";
const TITLE_FONT_SIZE: f64 = 14.0;
const HEADER_RANGE: &str = "A3:D3";
const HEADER_ROW: u32 = 2;
const FIRST_DATA_ROW: u32 = 3;
const SUMMARY_TITLE_CELL: &str = "F3";
const SUMMARY_RANGE: &str = "F4:G7";
const SUMMARY_LABELS: &str = "F4:F7";
const SUMMARY_TIMESTAMP_CELL: &str = "G7";
const DATE_FORMAT: &str = "yyyy-mm-dd";
const TIMESTAMP_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

// Below the summary block, right of the data columns.
const CHART_ANCHOR_ROW: u32 = 8;
const CHART_ANCHOR_COL: u16 = 5;
const CHART_WIDTH: u32 = 800;
const CHART_HEIGHT: u32 = 400;

pub fn sheet_title(project_name: &str) -> String {
    format!("{project_name} - GitHub Issue Burndown")
}

/// Replaces the whole content of `sheet` with the burndown table, summary
/// block and chart for `series`.
///
/// An empty series leaves only the title and header row: no chart and no
/// summary are drawn.
pub fn render_burndown(
    sheet: &mut Sheet,
    project_name: &str,
    series: &[BurndownPoint],
    refreshed_at: NaiveDateTime,
) -> Result<()> {
    sheet.clear();

    let title = sheet_title(project_name);
    let title_range = CellRange::parse(TITLE_CELL)?;
    sheet.set_value(TITLE_CELL, title.as_str())?;
    sheet.set_font_size(title_range, TITLE_FONT_SIZE);
    sheet.set_bold(title_range);

    let header_range = CellRange::parse(HEADER_RANGE)?;
    sheet.set_values(
        header_range,
        vec![HEADERS.iter().copied().map(CellValue::from).collect()],
    )?;
    sheet.set_bold(header_range);

    if !series.is_empty() {
        let rows = u32::try_from(series.len())?;
        let data_range = CellRange::new(FIRST_DATA_ROW, 0, rows, 4)?;
        let values = series
            .iter()
            .map(|point| {
                vec![
                    CellValue::from(point.date),
                    CellValue::from(point.created),
                    CellValue::from(point.completed),
                    CellValue::from(point.remaining),
                ]
            })
            .collect();
        sheet.set_values(data_range, values)?;
        sheet.set_number_format(CellRange::new(FIRST_DATA_ROW, 0, rows, 1)?, DATE_FORMAT);
    }

    replace_chart(sheet, &title, series.len())?;

    if let Some(last) = series.last() {
        write_summary(sheet, last, refreshed_at)?;
    }

    sheet.auto_resize_columns();
    log::debug!(
        "rendered {} burndown row(s) into sheet '{}'",
        series.len(),
        sheet.name()
    );
    Ok(())
}

fn replace_chart(sheet: &mut Sheet, title: &str, data_rows: usize) -> Result<()> {
    sheet.remove_charts();
    if data_rows == 0 {
        return Ok(());
    }

    let last_row = FIRST_DATA_ROW + u32::try_from(data_rows)? - 1;
    sheet.insert_chart(LineChart {
        title: title.to_string(),
        anchor_row: CHART_ANCHOR_ROW,
        anchor_col: CHART_ANCHOR_COL,
        width: CHART_WIDTH,
        height: CHART_HEIGHT,
        header_row: HEADER_ROW,
        first_row: FIRST_DATA_ROW,
        last_row,
        category_column: 0,
        series: vec![
            ChartSeries {
                column: 1,
                color: 0x4285F4,
                line_width: 2.0,
            },
            ChartSeries {
                column: 2,
                color: 0x34A853,
                line_width: 2.0,
            },
            ChartSeries {
                column: 3,
                color: 0xEA4335,
                line_width: 3.0,
            },
        ],
        x_axis: ChartAxis {
            title: "Date".to_string(),
            number_format: Some("mmm d".to_string()),
            min: None,
        },
        y_axis: ChartAxis {
            title: "Issue Count".to_string(),
            number_format: None,
            min: Some(0.0),
        },
        legend: LegendPosition::Bottom,
    });
    Ok(())
}

fn write_summary(sheet: &mut Sheet, last: &BurndownPoint, refreshed_at: NaiveDateTime) -> Result<()> {
    sheet.set_value(SUMMARY_TITLE_CELL, "Summary:")?;
    sheet.set_bold(CellRange::parse(SUMMARY_TITLE_CELL)?);

    sheet.set_values(
        CellRange::parse(SUMMARY_RANGE)?,
        vec![
            vec!["Total Issues:".into(), last.created.into()],
            vec!["Completed:".into(), last.completed.into()],
            vec!["Remaining:".into(), last.remaining.into()],
            vec!["Last Updated:".into(), refreshed_at.into()],
        ],
    )?;
    sheet.set_bold(CellRange::parse(SUMMARY_LABELS)?);
    sheet.set_number_format(CellRange::parse(SUMMARY_TIMESTAMP_CELL)?, TIMESTAMP_FORMAT);
    Ok(())
}
