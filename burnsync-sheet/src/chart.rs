use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegendPosition {
    Top,
    #[default]
    Bottom,
    Left,
    Right,
    Hidden,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartAxis {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
}

/// One plotted column; its name is read from the chart's header row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub column: u16,
    /// `0xRRGGBB`
    pub color: u32,
    pub line_width: f64,
}

/// Line chart over a block of rows: one category column and one column per
/// series, with a header row naming each series.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineChart {
    pub title: String,
    pub anchor_row: u32,
    pub anchor_col: u16,
    pub width: u32,
    pub height: u32,
    pub header_row: u32,
    pub first_row: u32,
    pub last_row: u32,
    pub category_column: u16,
    pub series: Vec<ChartSeries>,
    pub x_axis: ChartAxis,
    pub y_axis: ChartAxis,
    #[serde(default)]
    pub legend: LegendPosition,
}

impl LineChart {
    pub fn data_rows(&self) -> u32 {
        self.last_row + 1 - self.first_row
    }
}
