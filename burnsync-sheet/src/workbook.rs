use std::{
    fs, io,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::Sheet;

/// Every sheet of the workbook, in insertion order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Spreadsheet {
    #[serde(default)]
    sheets: Vec<Sheet>,
}

impl Spreadsheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads persisted sheet state; a missing file is an empty spreadsheet.
    pub fn load(path: &Path) -> Result<Self> {
        let payload = match fs::read_to_string(path) {
            Ok(payload) => payload,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(error) => {
                return Err(error)
                    .with_context(|| format!("failed to read sheet state at {}", path.display()))
            }
        };
        serde_json::from_str(&payload)
            .with_context(|| format!("invalid sheet state in {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let payload =
            serde_json::to_string_pretty(self).with_context(|| "failed to encode sheet state")?;
        fs::write(path, payload)
            .with_context(|| format!("failed to write sheet state at {}", path.display()))
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(Sheet::name).collect()
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|sheet| sheet.name() == name)
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|sheet| sheet.name() == name)
    }

    /// Returns the sheet called `name`, appending an empty one if absent.
    pub fn sheet_or_insert(&mut self, name: &str) -> &mut Sheet {
        let index = match self.sheets.iter().position(|sheet| sheet.name() == name) {
            Some(index) => index,
            None => {
                log::debug!("creating sheet '{name}'");
                self.sheets.push(Sheet::new(name));
                self.sheets.len() - 1
            }
        };
        &mut self.sheets[index]
    }
}

const MAX_SHEET_NAME_CHARS: usize = 31;
const FORBIDDEN_SHEET_NAME_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// Rejects names that an `.xlsx` workbook cannot hold, so a bad name fails
/// before its sheet is created rather than at export time.
pub fn validate_sheet_name(name: &str) -> Result<()> {
    if name.is_empty() {
        bail!("sheet name cannot be empty");
    }
    if name.chars().count() > MAX_SHEET_NAME_CHARS {
        bail!("sheet name '{name}' is longer than {MAX_SHEET_NAME_CHARS} characters");
    }
    if let Some(ch) = name.chars().find(|ch| FORBIDDEN_SHEET_NAME_CHARS.contains(ch)) {
        bail!("sheet name '{name}' cannot contain '{ch}'");
    }
    if name.starts_with('\'') || name.ends_with('\'') {
        bail!("sheet name '{name}' cannot start or end with an apostrophe");
    }
    if name.eq_ignore_ascii_case("history") {
        bail!("sheet name '{name}' is reserved");
    }
    Ok(())
}

/// `reports/burndown.xlsx` keeps its sheet state in `reports/burndown.state.json`.
pub fn state_path_for(workbook: &Path) -> PathBuf {
    workbook.with_extension("state.json")
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use tempfile::tempdir;

    use super::{state_path_for, validate_sheet_name, Spreadsheet};

    #[test]
    fn creates_sheets_once_and_keeps_order() {
        let mut book = Spreadsheet::new();
        book.sheet_or_insert("Square");
        book.sheet_or_insert("Cohere");
        book.sheet_or_insert("Square").set_value("A1", "x").expect("write");

        assert_eq!(book.sheet_names(), vec!["Square", "Cohere"]);
        assert!(!book.sheet("Square").expect("sheet").is_empty());
        assert!(book.sheet_mut("Intercom").is_none());
    }

    #[test]
    fn persists_sheet_state() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("state").join("burndown.state.json");

        let mut book = Spreadsheet::new();
        book.sheet_or_insert("Square").set_value("B4", 5u32).expect("write");
        book.save(&path).expect("save");

        assert_eq!(Spreadsheet::load(&path).expect("load"), book);
    }

    #[test]
    fn missing_state_is_empty() {
        let dir = tempdir().expect("temp dir");
        let book = Spreadsheet::load(&dir.path().join("absent.json")).expect("load");
        assert!(book.sheets().is_empty());
    }

    #[test]
    fn validates_sheet_names_like_xlsx() {
        let longest = "x".repeat(31);
        let too_long = "x".repeat(32);
        for name in ["Square", "Acme EU", "Cohere (2024)", longest.as_str()] {
            assert!(validate_sheet_name(name).is_ok(), "{name}");
        }

        let error = validate_sheet_name("Acme/EU").expect_err("slash");
        assert!(error.to_string().contains("cannot contain '/'"));
        for name in ["", "a[b]", "Q1:Q2", "why?", "back\\slash", "'quoted'", "History", too_long.as_str()] {
            assert!(validate_sheet_name(name).is_err(), "{name}");
        }
    }

    #[test]
    fn derives_state_path_from_workbook() {
        assert_eq!(
            state_path_for(Path::new("reports/burndown.xlsx")),
            Path::new("reports/burndown.state.json")
        );
    }
}
