use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use burnsync_config::{default_config_path, BurnsyncConfig};
use burnsync_domain::IssueSource;
use burnsync_linear::LinearClient;
use burnsync_sheet::{export_xlsx, state_path_for, Spreadsheet};

use crate::{cli_args::Cli, mock::MockSource};

/// Everything a refresh needs, resolved from flags and the config file.
pub struct Runtime {
    pub config: BurnsyncConfig,
    pub workbook: PathBuf,
    pub source: Box<dyn IssueSource>,
}

pub fn config_path(cli: &Cli) -> PathBuf {
    cli.config.clone().unwrap_or_else(default_config_path)
}

pub fn load_config(cli: &Cli) -> Result<BurnsyncConfig> {
    BurnsyncConfig::load_from_path(&config_path(cli))
}

pub fn load_runtime(cli: &Cli) -> Result<Runtime> {
    let config = load_config(cli)?;
    let workbook = resolve_workbook(cli, &config);
    let source = build_source(cli.mock, &config)?;
    Ok(Runtime {
        config,
        workbook,
        source,
    })
}

fn resolve_workbook(cli: &Cli, config: &BurnsyncConfig) -> PathBuf {
    cli.workbook.clone().unwrap_or_else(|| config.workbook.clone())
}

fn build_source(mock: bool, config: &BurnsyncConfig) -> Result<Box<dyn IssueSource>> {
    if mock {
        log::info!("using mock issues, Linear will not be contacted");
        return Ok(Box::new(MockSource));
    }
    Ok(Box::new(LinearClient::from_config(config)?))
}

pub fn load_spreadsheet(workbook: &Path) -> Result<Spreadsheet> {
    Spreadsheet::load(&state_path_for(workbook))
}

/// Regenerates the xlsx, then writes the sheet state next to it. A failed
/// export leaves the previous state untouched.
pub fn persist_spreadsheet(book: &Spreadsheet, workbook: &Path) -> Result<()> {
    export_xlsx(book, workbook)
        .with_context(|| format!("failed to export workbook {}", workbook.display()))?;
    book.save(&state_path_for(workbook))?;
    log::info!("workbook written to {}", workbook.display());
    Ok(())
}
