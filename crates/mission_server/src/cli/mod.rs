use clap::{Parser, Subcommand};
use mission_core::config::{Config, LogFormat, parse_port};
use mission_core::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Mission Control dashboard server", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the dashboard HTTP API (default when no command is given)
    ///
    /// Example: mission serve --port 3000
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Record an activity in the log
    ///
    /// Example: mission log "Deploy v2" --type deploy --category release --project factursimple
    Log {
        title: String,
        #[arg(long = "type", value_name = "TYPE")]
        kind: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        project: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        status: Option<String>,
    },
    /// List recent activities with rollup stats
    ///
    /// Example: mission activities --limit 10 --category release
    Activities {
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        project: Option<String>,
        #[arg(long = "type", value_name = "TYPE")]
        kind: Option<String>,
    },
    /// Inspect and manage scheduled tasks
    Tasks {
        #[command(subcommand)]
        tasks: TasksCommand,
    },
    /// Search workspace documents, memories, activities and tasks
    ///
    /// Example: mission search invoice --limit 30
    Search {
        query: String,
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[derive(Subcommand, Debug)]
pub enum TasksCommand {
    /// List task definitions
    ///
    /// Example: mission tasks list --enabled-only
    List {
        #[arg(long)]
        enabled_only: bool,
    },
    /// Show occurrences for a week
    ///
    /// Example: mission tasks week
    /// Example: mission tasks week --offset -1
    /// Example: mission tasks week --week-start-ms 1770000000000
    Week {
        #[arg(long, conflicts_with = "offset")]
        week_start_ms: Option<i64>,
        #[arg(long, allow_hyphen_values = true)]
        offset: Option<i64>,
    },
    /// Remove a task by cron id
    ///
    /// Example: mission tasks remove cron-42
    Remove { cron_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    DataDir,
    WorkspaceDir,
    Host,
    Port,
    LogFormat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let trimmed = raw.trim();
    let (key_raw, value_raw) = trimmed
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let value = value_raw.trim().to_string();
    if value.is_empty() {
        return Err(format!("override '{}' has an empty value", key_raw.trim()));
    }

    let canonical_field = canonicalize_flag_name(key_raw)
        .ok_or_else(|| "override key cannot be empty".to_string())?;

    let target = match canonical_field.as_str() {
        "data_dir" | "datadir" => ConfigOverrideTarget::DataDir,
        "workspace_dir" | "workspacedir" | "workspace" => ConfigOverrideTarget::WorkspaceDir,
        "host" => ConfigOverrideTarget::Host,
        "port" => ConfigOverrideTarget::Port,
        "log_format" | "logformat" => ConfigOverrideTarget::LogFormat,
        other => return Err(format!("unknown config field '{other}'")),
    };

    Ok(ParsedConfigOverride { target, value })
}

/// Folds every `--config-override` into a [`Config`] layer; later values win.
pub fn overrides_to_config(raw_overrides: &[String]) -> Result<Config, AppError> {
    let mut config = Config::default();
    for raw in raw_overrides {
        let parsed = parse_config_override(raw).map_err(AppError::invalid_input)?;
        match parsed.target {
            ConfigOverrideTarget::DataDir => config.data_dir = Some(PathBuf::from(parsed.value)),
            ConfigOverrideTarget::WorkspaceDir => {
                config.workspace_dir = Some(PathBuf::from(parsed.value))
            }
            ConfigOverrideTarget::Host => config.host = Some(parsed.value),
            ConfigOverrideTarget::Port => config.port = Some(parse_port(&parsed.value)?),
            ConfigOverrideTarget::LogFormat => {
                let format = LogFormat::parse(&parsed.value).ok_or_else(|| {
                    AppError::invalid_input(format!("unknown log format '{}'", parsed.value))
                })?;
                config.log_format = Some(format);
            }
        }
    }
    Ok(config)
}

fn canonicalize_flag_name(name: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
