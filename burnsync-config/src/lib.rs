use std::{
    env, fs, io,
    path::{Path, PathBuf},
    process::Command,
};

use anyhow::{anyhow, bail, Context, Result};
use burnsync_domain::{SyncError, TitleFilter, DEFAULT_TITLE_MARKER};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};

pub const DEFAULT_API_URL: &str = "https://api.linear.app/graphql";
pub const DEFAULT_PAGE_SIZE: usize = 100;
pub const TOKEN_ENV_VAR: &str = "LINEAR_API_TOKEN";
pub const CONFIG_ENV_VAR: &str = "BURNSYNC_CONFIG_FILE";

const DEFAULT_WORKBOOK: &str = "burndown.xlsx";
const MAX_PAGE_SIZE: usize = 250;
const DEFAULT_PROJECTS: [(&str, &str); 4] = [
    ("Square", "857fa6e14378"),
    ("Intercom", "9eb5c238a630"),
    ("Elevenlabs", "f2059a25931a"),
    ("Cohere", "ac784cf01e1d"),
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectConfig {
    pub name: String,
    pub id: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BurnsyncConfig {
    pub api_url: String,
    pub api_token: Option<String>,
    pub title_marker: String,
    pub page_size: usize,
    pub workbook: PathBuf,
    pub projects: Vec<ProjectConfig>,
}

#[derive(Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    general: RawGeneral,
    #[serde(default)]
    projects: Vec<RawProject>,
    linear_api_url: Option<String>,
    linear_api_token: Option<String>,
    title_marker: Option<String>,
    page_size: Option<usize>,
    workbook: Option<String>,
}

#[derive(Default, Deserialize)]
struct RawGeneral {
    linear_api_url: Option<String>,
    linear_api_token: Option<String>,
    title_marker: Option<String>,
    page_size: Option<usize>,
    workbook: Option<String>,
}

#[derive(Default, Deserialize)]
struct RawProject {
    name: Option<String>,
    id: Option<String>,
}

impl BurnsyncConfig {
    pub fn load_default() -> Result<Self> {
        Self::load_from_path(&default_config_path())
    }

    /// Reads the YAML config at `path`; a missing file yields the defaults.
    ///
    /// `LINEAR_API_TOKEN` in the environment takes precedence over the token
    /// stored in the file.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let payload = match fs::read_to_string(path) {
            Ok(payload) => payload,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                log::debug!("no config at {}, using defaults", path.display());
                String::new()
            }
            Err(error) => {
                return Err(error)
                    .with_context(|| format!("failed to read config at {}", path.display()))
            }
        };
        Self::parse(&payload, env::var(TOKEN_ENV_VAR).ok())
    }

    /// Credential for the issue tracker; its absence is a configuration error.
    pub fn api_token(&self) -> Result<&str> {
        self.api_token.as_deref().ok_or_else(|| {
            SyncError::configuration(format!(
                "Linear API token not set; run `burnsync setup-token` or export {TOKEN_ENV_VAR}"
            ))
            .into()
        })
    }

    pub fn resolve_project(&self, name: &str) -> Result<&ProjectConfig> {
        self.projects
            .iter()
            .find(|project| project.name == name)
            .ok_or_else(|| SyncError::configuration(format!("Invalid project: {name}")).into())
    }

    pub fn title_filter(&self) -> Result<TitleFilter> {
        Ok(TitleFilter::new(&self.title_marker)?)
    }

    fn parse(payload: &str, env_token: Option<String>) -> Result<Self> {
        let raw: RawConfig = if payload.trim().is_empty() {
            RawConfig::default()
        } else {
            serde_yaml::from_str(payload).with_context(|| "invalid YAML config format")?
        };
        Self::from_raw(raw, env_token)
    }

    fn from_raw(raw: RawConfig, env_token: Option<String>) -> Result<Self> {
        let api_url = first_some(raw.general.linear_api_url, raw.linear_api_url)
            .and_then(non_empty)
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_token = match env_token.and_then(non_empty) {
            Some(token) => Some(token),
            None => first_some(raw.general.linear_api_token, raw.linear_api_token)
                .and_then(resolve_api_token),
        };
        // an explicit but blank marker would track every issue
        let title_marker = match first_some(raw.general.title_marker, raw.title_marker) {
            Some(marker) => {
                TitleFilter::new(&marker)?;
                marker.trim().to_string()
            }
            None => DEFAULT_TITLE_MARKER.to_string(),
        };
        let page_size = first_some(raw.general.page_size, raw.page_size).unwrap_or(DEFAULT_PAGE_SIZE);
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(SyncError::configuration(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}, got {page_size}"
            ))
            .into());
        }
        let workbook = first_some(raw.general.workbook, raw.workbook)
            .and_then(non_empty)
            .map(|value| expand_home(&value))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_WORKBOOK));

        let mut projects = raw
            .projects
            .into_iter()
            .filter_map(|project| {
                let name = project.name.and_then(non_empty)?;
                let id = project.id.and_then(non_empty)?;
                Some(ProjectConfig { name, id })
            })
            .collect::<Vec<_>>();

        if projects.is_empty() {
            projects = default_projects();
        }

        Ok(Self {
            api_url,
            api_token,
            title_marker,
            page_size,
            workbook,
            projects,
        })
    }
}

impl Default for BurnsyncConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_token: None,
            title_marker: DEFAULT_TITLE_MARKER.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            workbook: PathBuf::from(DEFAULT_WORKBOOK),
            projects: default_projects(),
        }
    }
}

pub fn default_config_path() -> PathBuf {
    if let Some(override_path) = env::var_os(CONFIG_ENV_VAR) {
        return PathBuf::from(override_path);
    }

    let mut base = home_dir();
    base.push(".config");
    base.push("burnsync");
    base.push("config.yaml");
    base
}

/// Stores `token` under `general.linear_api_token`, keeping every other key
/// of an existing config file.
pub fn save_api_token(path: &Path, token: &str) -> Result<()> {
    let token = token.trim();
    if token.is_empty() {
        bail!("API token cannot be empty");
    }

    let mut document = match fs::read_to_string(path) {
        Ok(payload) if !payload.trim().is_empty() => serde_yaml::from_str::<Value>(&payload)
            .with_context(|| format!("invalid YAML config format in {}", path.display()))?,
        Ok(_) => Value::Mapping(Mapping::new()),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Value::Mapping(Mapping::new()),
        Err(error) => {
            return Err(error)
                .with_context(|| format!("failed to read config at {}", path.display()))
        }
    };

    let root = document
        .as_mapping_mut()
        .ok_or_else(|| anyhow!("config root in {} must be a mapping", path.display()))?;
    let mut general = match root.get("general") {
        Some(Value::Mapping(existing)) => existing.clone(),
        Some(Value::Null) | None => Mapping::new(),
        Some(_) => bail!("'general' in {} must be a mapping", path.display()),
    };
    general.insert(Value::from("linear_api_token"), Value::from(token));
    root.insert(Value::from("general"), Value::Mapping(general));

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let payload = serde_yaml::to_string(&document).with_context(|| "failed to encode config")?;
    write_private(path, &payload)
        .with_context(|| format!("failed to write config at {}", path.display()))
}

/// Writes `payload` to a file only the owner can read, tightening the mode of
/// an existing file before the token lands in it.
#[cfg(unix)]
fn write_private(path: &Path, payload: &str) -> io::Result<()> {
    use std::{
        io::Write,
        os::unix::fs::{OpenOptionsExt, PermissionsExt},
    };

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    file.write_all(payload.as_bytes())
}

#[cfg(not(unix))]
fn write_private(path: &Path, payload: &str) -> io::Result<()> {
    fs::write(path, payload)
}

fn default_projects() -> Vec<ProjectConfig> {
    DEFAULT_PROJECTS
        .iter()
        .map(|(name, id)| ProjectConfig {
            name: (*name).to_string(),
            id: (*id).to_string(),
        })
        .collect()
}

fn home_dir() -> PathBuf {
    env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn expand_home(value: &str) -> PathBuf {
    match value.strip_prefix("~/") {
        Some(rest) => home_dir().join(rest),
        None => PathBuf::from(value),
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}

fn first_some<T>(first: Option<T>, second: Option<T>) -> Option<T> {
    first.or(second)
}

fn resolve_api_token(value: String) -> Option<String> {
    resolve_api_token_with(value, fetch_secret_from_manager)
}

fn resolve_api_token_with<F>(value: String, fetch: F) -> Option<String>
where
    F: Fn(&str, &str) -> Option<String>,
{
    let token = non_empty(value)?;
    let Some((provider, key)) = parse_secret_reference(token.as_str()) else {
        return Some(token);
    };
    fetch(provider, key)
}

fn parse_secret_reference(value: &str) -> Option<(&str, &str)> {
    let (provider, key) = value.split_once("::")?;
    if key.trim().is_empty() {
        return None;
    }
    if provider == "pass" || provider == "passage" {
        Some((provider, key.trim()))
    } else {
        None
    }
}

fn fetch_secret_from_manager(provider: &str, key: &str) -> Option<String> {
    let output = Command::new(provider).arg("show").arg(key).output().ok()?;
    if !output.status.success() {
        log::warn!("{provider} could not resolve secret '{key}'");
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    // password managers print the secret on the first line
    stdout.lines().next().map(str::to_string).and_then(non_empty)
}
