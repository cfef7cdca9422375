use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "burnsync",
    version,
    about = "Refresh Linear issue burndown sheets and charts per customer project"
)]
pub struct Cli {
    /// Config file (defaults to $BURNSYNC_CONFIG_FILE or ~/.config/burnsync/config.yaml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Workbook to export; overrides `workbook` from the config file
    #[arg(long, global = true, value_name = "PATH")]
    pub workbook: Option<PathBuf>,

    /// Skip Linear calls and use built-in mock issues
    #[arg(long, global = true)]
    pub mock: bool,

    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Clone, Debug, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Refresh every configured customer sheet
    RefreshAll,
    /// Refresh one customer sheet; fails if that refresh fails
    Refresh {
        /// Project display name as configured
        project: String,
    },
    /// Prompt for the Linear API token and store it in the config file
    SetupToken,
    /// First-time setup: store the token, then refresh every customer
    Init,
    /// List the configured projects
    Projects,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl Cli {
    /// Running without a subcommand refreshes every customer.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::RefreshAll)
    }
}
