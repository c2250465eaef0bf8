use crate::error::AppError;
use crate::search::SearchSources;
use crate::storage::json_store;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_ENV_VAR: &str = "MISSION_CONTROL_CONFIG_PATH";
const DATA_DIR_ENV_VAR: &str = "DATA_DIR";
const WORKSPACE_DIR_ENV_VAR: &str = "WORKSPACE_DIR";
const PORT_ENV_VAR: &str = "MISSION_CONTROL_PORT";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "text" | "plain" | "pretty" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Contents of the optional config file. Every key may be omitted.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default)]
    pub workspace_dir: Option<PathBuf>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub log_format: Option<LogFormat>,
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub error: Option<AppError>,
}

/// Fully resolved runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub workspace_dir: PathBuf,
    pub host: String,
    pub port: u16,
    pub log_format: LogFormat,
}

impl Settings {
    pub fn activities_path(&self) -> PathBuf {
        json_store::activities_path(&self.data_dir)
    }

    pub fn tasks_path(&self) -> PathBuf {
        json_store::tasks_path(&self.data_dir)
    }

    pub fn dashboard_path(&self) -> PathBuf {
        json_store::dashboard_path(&self.data_dir)
    }

    pub fn search_sources(&self) -> SearchSources {
        SearchSources {
            workspace_dir: self.workspace_dir.clone(),
            activities_path: self.activities_path(),
            tasks_path: self.tasks_path(),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

pub fn config_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    Ok(home_dir()?
        .join(".config")
        .join("mission-control")
        .join(CONFIG_FILE_NAME))
}

fn home_dir() -> Result<PathBuf, AppError> {
    let var = if cfg!(windows) { "USERPROFILE" } else { "HOME" };
    std::env::var(var)
        .map(PathBuf::from)
        .map_err(|_| AppError::invalid_data(format!("{var} is not set")))
}

pub fn load_config_with_fallback() -> ConfigLoad {
    match config_path() {
        Ok(path) => load_config_with_fallback_from_path(&path),
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_with_fallback_from_path(path: &Path) -> ConfigLoad {
    if !path.exists() {
        return ConfigLoad {
            config: Config::default(),
            error: None,
        };
    }

    match load_config_from_path(path) {
        Ok(config) => ConfigLoad {
            config,
            error: None,
        },
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_from_path(path: &Path) -> Result<Config, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_data(format!("invalid JSON in {}: {}", path.display(), err))
    })
}

/// Values taken from `DATA_DIR`, `WORKSPACE_DIR` and `MISSION_CONTROL_PORT`.
pub fn env_overrides() -> Result<Config, AppError> {
    let var = |name: &str| {
        std::env::var(name)
            .ok()
            .filter(|value| !value.trim().is_empty())
    };

    let port = match var(PORT_ENV_VAR) {
        Some(raw) => Some(parse_port(&raw)?),
        None => None,
    };

    Ok(Config {
        data_dir: var(DATA_DIR_ENV_VAR).map(PathBuf::from),
        workspace_dir: var(WORKSPACE_DIR_ENV_VAR).map(PathBuf::from),
        host: None,
        port,
        log_format: None,
    })
}

pub fn parse_port(raw: &str) -> Result<u16, AppError> {
    raw.trim()
        .parse::<u16>()
        .map_err(|_| AppError::invalid_input(format!("invalid port '{}'", raw.trim())))
}

/// Layers `overrides` on top of `base`; set fields win.
pub fn merge_overrides(base: &Config, overrides: &Config) -> Config {
    let mut merged = base.clone();
    if let Some(data_dir) = overrides.data_dir.as_ref() {
        merged.data_dir = Some(data_dir.clone());
    }
    if let Some(workspace_dir) = overrides.workspace_dir.as_ref() {
        merged.workspace_dir = Some(workspace_dir.clone());
    }
    if let Some(host) = overrides.host.as_ref() {
        merged.host = Some(host.clone());
    }
    if let Some(port) = overrides.port {
        merged.port = Some(port);
    }
    if let Some(log_format) = overrides.log_format {
        merged.log_format = Some(log_format);
    }
    merged
}

/// Fills in defaults. The data directory defaults to
/// `<workspace>/control-center/data` so both live under the same tree.
pub fn resolve(config: &Config) -> Result<Settings, AppError> {
    let workspace_dir = match config.workspace_dir.clone() {
        Some(dir) => dir,
        None => home_dir()?.join(".openclaw").join("workspace"),
    };
    let data_dir = config
        .data_dir
        .clone()
        .unwrap_or_else(|| workspace_dir.join("control-center").join("data"));

    Ok(Settings {
        data_dir,
        workspace_dir,
        host: config.host.clone().unwrap_or_else(|| DEFAULT_HOST.to_string()),
        port: config.port.unwrap_or(DEFAULT_PORT),
        log_format: config.log_format.unwrap_or_default(),
    })
}
