use std::{fmt, sync::LazyLock};

use anyhow::{anyhow, bail, Result};
use regex::Regex;

static A1_CELL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\$?([A-Za-z]{1,3})\$?([1-9][0-9]{0,6})$").expect("regex")
});

const MAX_COLUMNS: u32 = 16_384;

/// Rectangular block of cells, zero-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellRange {
    pub row: u32,
    pub col: u16,
    pub rows: u32,
    pub cols: u16,
}

impl CellRange {
    pub fn new(row: u32, col: u16, rows: u32, cols: u16) -> Result<Self> {
        if rows == 0 || cols == 0 {
            bail!("range must span at least one cell, got {rows}x{cols}");
        }
        Ok(Self {
            row,
            col,
            rows,
            cols,
        })
    }

    pub fn cell(row: u32, col: u16) -> Self {
        Self {
            row,
            col,
            rows: 1,
            cols: 1,
        }
    }

    /// Parses `A1` or `A1:D4` notation; `$` anchors are accepted and ignored.
    pub fn parse(notation: &str) -> Result<Self> {
        let trimmed = notation.trim();
        let (start, end) = match trimmed.split_once(':') {
            Some((start, end)) => (parse_cell(start)?, parse_cell(end)?),
            None => {
                let cell = parse_cell(trimmed)?;
                (cell, cell)
            }
        };

        if end.0 < start.0 || end.1 < start.1 {
            bail!("range '{notation}' ends before it starts");
        }

        Self::new(start.0, start.1, end.0 - start.0 + 1, end.1 - start.1 + 1)
    }

    pub fn last_row(&self) -> u32 {
        self.row + self.rows - 1
    }

    pub fn last_col(&self) -> u16 {
        self.col + self.cols - 1
    }

    pub fn cells(&self) -> impl Iterator<Item = (u32, u16)> + '_ {
        (self.row..=self.last_row())
            .flat_map(move |row| (self.col..=self.last_col()).map(move |col| (row, col)))
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letters(self.col), self.row + 1)?;
        if self.rows > 1 || self.cols > 1 {
            write!(f, ":{}{}", column_letters(self.last_col()), self.last_row() + 1)?;
        }
        Ok(())
    }
}

pub(crate) fn column_letters(col: u16) -> String {
    let mut remaining = u32::from(col) + 1;
    let mut letters = Vec::new();
    while remaining > 0 {
        let offset = (remaining - 1) % 26;
        letters.push(char::from(b'A' + offset as u8));
        remaining = (remaining - 1) / 26;
    }
    letters.iter().rev().collect()
}

fn parse_cell(notation: &str) -> Result<(u32, u16)> {
    let captures = A1_CELL
        .captures(notation.trim())
        .ok_or_else(|| anyhow!("'{notation}' is not a valid A1 cell reference"))?;

    let column = captures[1]
        .bytes()
        .map(|byte| u32::from(byte.to_ascii_uppercase() - b'A') + 1)
        .fold(0u32, |acc, digit| acc * 26 + digit);
    if column > MAX_COLUMNS {
        bail!("column in '{notation}' is out of range");
    }
    let row = captures[2].parse::<u32>()?;

    Ok((row - 1, u16::try_from(column - 1)?))
}

#[cfg(test)]
mod tests {
    use super::{column_letters, CellRange};

    #[test]
    fn parses_single_cells_and_blocks() {
        assert_eq!(CellRange::parse("A1").expect("a1"), CellRange::cell(0, 0));
        assert_eq!(
            CellRange::parse("F4:G7").expect("f4"),
            CellRange::new(3, 5, 4, 2).expect("range")
        );
        assert_eq!(
            CellRange::parse("$a$3:$d$3").expect("anchored"),
            CellRange::new(2, 0, 1, 4).expect("range")
        );
        assert_eq!(CellRange::parse("AA10").expect("aa").col, 26);
    }

    #[test]
    fn rejects_malformed_references() {
        assert!(CellRange::parse("").is_err());
        assert!(CellRange::parse("A0").is_err());
        assert!(CellRange::parse("1A").is_err());
        assert!(CellRange::parse("D4:A1").is_err());
        assert!(CellRange::parse("ZZZZ1").is_err());
    }

    #[test]
    fn renders_back_to_a1() {
        assert_eq!(CellRange::parse("a3:d3").expect("range").to_string(), "A3:D3");
        assert_eq!(CellRange::cell(6, 6).to_string(), "G7");
        assert_eq!(column_letters(27), "AB");
        assert_eq!(column_letters(701), "ZZ");
    }

    #[test]
    fn iterates_cells_row_major() {
        let cells = CellRange::parse("B2:C3").expect("range").cells().collect::<Vec<_>>();
        assert_eq!(cells, vec![(1, 1), (1, 2), (2, 1), (2, 2)]);
    }
}
