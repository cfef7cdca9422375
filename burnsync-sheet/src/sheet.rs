use std::collections::BTreeMap;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::{Cell, CellRange, CellStyle, CellValue, LineChart};

/// A named grid of cells plus the charts drawn on it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    name: String,
    #[serde(default)]
    rows: BTreeMap<u32, BTreeMap<u16, Cell>>,
    #[serde(default)]
    charts: Vec<LineChart>,
    #[serde(default)]
    autofit: bool,
}

impl Sheet {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Drops every cell, format and chart.
    pub fn clear(&mut self) {
        self.rows.clear();
        self.charts.clear();
        self.autofit = false;
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.charts.is_empty()
    }

    pub fn set_value(&mut self, notation: &str, value: impl Into<CellValue>) -> Result<()> {
        let range = CellRange::parse(notation)?;
        if range.rows != 1 || range.cols != 1 {
            bail!("'{notation}' addresses more than one cell");
        }
        self.cell_mut(range.row, range.col).value = Some(value.into());
        Ok(())
    }

    /// Writes a block of values; `values` must match the range's shape.
    pub fn set_values(&mut self, range: CellRange, values: Vec<Vec<CellValue>>) -> Result<()> {
        if values.len() != range.rows as usize {
            bail!(
                "range {range} has {} row(s) but {} were provided",
                range.rows,
                values.len()
            );
        }
        for (offset, row) in values.iter().enumerate() {
            if row.len() != usize::from(range.cols) {
                bail!(
                    "range {range} has {} column(s) but row {} has {}",
                    range.cols,
                    offset,
                    row.len()
                );
            }
        }

        for (row, row_values) in (range.row..).zip(values) {
            for (col, value) in (range.col..).zip(row_values) {
                self.cell_mut(row, col).value = Some(value);
            }
        }
        Ok(())
    }

    pub fn value(&self, row: u32, col: u16) -> Option<&CellValue> {
        self.cell(row, col).and_then(|cell| cell.value.as_ref())
    }

    pub fn value_at(&self, notation: &str) -> Result<Option<&CellValue>> {
        let range = CellRange::parse(notation)?;
        Ok(self.value(range.row, range.col))
    }

    pub fn values(&self, range: CellRange) -> Vec<Vec<Option<CellValue>>> {
        (range.row..=range.last_row())
            .map(|row| {
                (range.col..=range.last_col())
                    .map(|col| self.value(row, col).cloned())
                    .collect()
            })
            .collect()
    }

    pub fn cell(&self, row: u32, col: u16) -> Option<&Cell> {
        self.rows.get(&row).and_then(|cells| cells.get(&col))
    }

    pub fn style(&self, row: u32, col: u16) -> Option<&CellStyle> {
        self.cell(row, col).map(|cell| &cell.style)
    }

    pub fn set_bold(&mut self, range: CellRange) {
        self.update_style(range, |style| style.bold = true);
    }

    pub fn set_font_size(&mut self, range: CellRange, size: f64) {
        self.update_style(range, |style| style.font_size = Some(size));
    }

    pub fn set_number_format(&mut self, range: CellRange, pattern: &str) {
        self.update_style(range, |style| style.number_format = Some(pattern.to_string()));
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (u32, u16, &Cell)> + '_ {
        self.rows
            .iter()
            .flat_map(|(row, cells)| cells.iter().map(move |(col, cell)| (*row, *col, cell)))
    }

    /// Zero-based index of the last row holding a cell.
    pub fn last_row(&self) -> Option<u32> {
        self.rows.keys().next_back().copied()
    }

    pub fn charts(&self) -> &[LineChart] {
        &self.charts
    }

    /// Returns how many charts were removed.
    pub fn remove_charts(&mut self) -> usize {
        let removed = self.charts.len();
        self.charts.clear();
        removed
    }

    pub fn insert_chart(&mut self, chart: LineChart) {
        self.charts.push(chart);
    }

    pub fn auto_resize_columns(&mut self) {
        self.autofit = true;
    }

    pub fn autofit(&self) -> bool {
        self.autofit
    }

    fn update_style<F>(&mut self, range: CellRange, apply: F)
    where
        F: Fn(&mut CellStyle),
    {
        for (row, col) in range.cells() {
            apply(&mut self.cell_mut(row, col).style);
        }
    }

    fn cell_mut(&mut self, row: u32, col: u16) -> &mut Cell {
        self.rows.entry(row).or_default().entry(col).or_default()
    }
}
