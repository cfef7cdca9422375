use std::{env, fmt::Write as _, sync::OnceLock, time::Instant};

use anyhow::Result;
use chrono::{SecondsFormat, Utc};

use crate::utils::compact_error;

const TELEMETRY_TARGET: &str = "burnsync::telemetry";
const TELEMETRY_ENV_VAR: &str = "BURNSYNC_TELEMETRY";

static TELEMETRY_ENABLED: OnceLock<bool> = OnceLock::new();

/// Runs `work` and, when `BURNSYNC_TELEMETRY` is on, logs one logfmt line
/// with its outcome and duration.
pub fn timed<T>(op: &str, project: Option<&str>, work: impl FnOnce() -> Result<T>) -> Result<T> {
    let started = Instant::now();
    let result = work();
    if telemetry_enabled() {
        let status = match &result {
            Ok(_) => Status::Ok,
            Err(error) => Status::Error(compact_error(&format!("{error:#}"))),
        };
        log::info!(
            target: TELEMETRY_TARGET,
            "{}",
            render_line(op, project, started.elapsed().as_millis(), &status)
        );
    }
    result
}

enum Status {
    Ok,
    Error(String),
}

fn render_line(op: &str, project: Option<&str>, duration_ms: u128, status: &Status) -> String {
    let mut line = format!(
        "ts={} op={} project={}",
        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        logfmt_value(op),
        logfmt_value(project.unwrap_or("-")),
    );
    match status {
        Status::Ok => line.push_str(" status=ok"),
        Status::Error(_) => line.push_str(" status=error"),
    }
    let _ = write!(line, " duration_ms={duration_ms}");
    if let Status::Error(message) = status {
        let _ = write!(line, " error={}", logfmt_value(message));
    }
    line
}

fn telemetry_enabled() -> bool {
    *TELEMETRY_ENABLED.get_or_init(|| {
        env::var(TELEMETRY_ENV_VAR)
            .map(|value| is_truthy(&value))
            .unwrap_or(false)
    })
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Bare when safe, otherwise double-quoted with `"` and `\` escaped.
fn logfmt_value(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|ch| ch.is_whitespace() || matches!(ch, '"' | '=' | '\\'));
    if !needs_quotes {
        return value.to_string();
    }
    let escaped = value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r");
    format!("\"{escaped}\"")
}
