mod adapter;
mod cli_args;
mod mock;
mod refresh;
mod setup;
mod telemetry;
mod types;
mod utils;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use crate::{
    adapter::{config_path, load_config, load_runtime, load_spreadsheet, persist_spreadsheet},
    cli_args::{Cli, Command, LogLevel},
    refresh::Refresher,
    utils::compact_error,
};

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    match cli.command() {
        Command::RefreshAll => refresh_all(&cli),
        Command::Refresh { project } => refresh_one(&cli, &project),
        Command::SetupToken => {
            setup::setup_token(&config_path(&cli))?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Init => {
            if !setup::setup_token(&config_path(&cli))? && !cli.mock {
                println!("No token saved, skipping the initial refresh");
                return Ok(ExitCode::SUCCESS);
            }
            refresh_all(&cli)
        }
        Command::Projects => {
            let config = load_config(&cli)?;
            for project in &config.projects {
                println!("{}\t{}", project.name, project.id);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_logging(log_level: LogLevel) {
    if log_level == LogLevel::Off {
        return;
    }

    let env = env_logger::Env::default().filter_or("RUST_LOG", log_level.as_filter());
    env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(matches!(log_level, LogLevel::Debug | LogLevel::Trace))
        .init();
}

fn refresh_all(cli: &Cli) -> Result<ExitCode> {
    let runtime = load_runtime(cli)?;
    let mut book = load_spreadsheet(&runtime.workbook)?;
    let refresher = Refresher::new(
        runtime.source.as_ref(),
        &runtime.config.projects,
        runtime.config.title_filter()?,
    );

    let summary = refresher.refresh_all(&mut book);
    telemetry::timed("export", None, || persist_spreadsheet(&book, &runtime.workbook))?;

    println!("{summary}");
    for failure in &summary.failed {
        eprintln!("  {} [{}]: {}", failure.project, failure.kind, compact_error(&failure.message));
    }

    if summary.failed_count() > 0 {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn refresh_one(cli: &Cli, project: &str) -> Result<ExitCode> {
    let runtime = load_runtime(cli)?;
    let mut book = load_spreadsheet(&runtime.workbook)?;
    let refresher = Refresher::new(
        runtime.source.as_ref(),
        &runtime.config.projects,
        runtime.config.title_filter()?,
    );

    let report = refresher.refresh_project(&mut book, project)?;
    telemetry::timed("export", None, || persist_spreadsheet(&book, &runtime.workbook))?;

    println!(
        "Refreshed {}: {} tracked of {} issues over {} day(s), {} remaining",
        report.project, report.tracked, report.fetched, report.points, report.remaining
    );
    Ok(ExitCode::SUCCESS)
}
