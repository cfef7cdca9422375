use std::{
    io::{self, BufRead, Write},
    path::Path,
};

use anyhow::{Context, Result};
use burnsync_config::save_api_token;

const TOKEN_PROMPT: &str = "Enter your Linear API token (from linear.app/settings/api):";

/// Reads one line from `input`; blank input means the user cancelled.
pub fn prompt_for_token<R: BufRead, W: Write>(mut input: R, mut output: W) -> Result<Option<String>> {
    write!(output, "{TOKEN_PROMPT} ")?;
    output.flush()?;

    let mut line = String::new();
    input
        .read_line(&mut line)
        .with_context(|| "failed to read API token")?;
    let token = line.trim();
    if token.is_empty() {
        return Ok(None);
    }
    Ok(Some(token.to_string()))
}

/// Interactive token setup against stdin; returns whether a token was saved.
pub fn setup_token(config_path: &Path) -> Result<bool> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    store_token(stdin.lock(), stdout.lock(), config_path)
}

fn store_token<R: BufRead, W: Write>(input: R, mut output: W, config_path: &Path) -> Result<bool> {
    let Some(token) = prompt_for_token(input, &mut output)? else {
        writeln!(output)?;
        log::info!("token setup cancelled");
        return Ok(false);
    };

    save_api_token(config_path, &token)?;
    log::debug!("API token written to {}", config_path.display());
    writeln!(output, "Linear API token saved!")?;
    Ok(true)
}
