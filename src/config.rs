//! Command line flags, environment fallbacks and the TOML config file.
//!
//! Precedence, highest first: flags, environment, config file, defaults.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::notion::{Schema, normalize_notion_id};
use crate::source::Credentials;

pub const CONFIG_DIR_NAME: &str = "lyricsproj";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const LOG_FILE_NAME: &str = "lyricsproj.log";

pub const TOKEN_ENV: &str = "NOTION_TOKEN";
pub const DATABASE_ENV: &str = "NOTION_DB_ID";

/// Application configuration from CLI
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about)]
pub struct Config {
    /// Notion integration token. Falls back to NOTION_TOKEN.
    #[arg(long)]
    pub token: Option<String>,
    /// Notion database id or URL. Falls back to NOTION_DB_ID.
    #[arg(long)]
    pub database: Option<String>,
    /// Path to the config file (default ~/.config/lyricsproj/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
    /// Duration of the scroll animation between lines, in milliseconds
    #[arg(long = "scroll-ms", value_name = "MS")]
    pub scroll_ms: Option<u64>,
    /// Where to write the log (default next to the config file)
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
    /// Log at debug level
    #[arg(long)]
    pub debug_log: bool,
}

fn credentials_from_env_if_empty(cli: &mut Config, env: impl Fn(&str) -> Option<String>) {
    if cli.token.is_none()
        && let Some(token) = env(TOKEN_ENV).filter(|t| !t.trim().is_empty())
    {
        cli.token = Some(token);
    }
    if cli.database.is_none()
        && let Some(db) = env(DATABASE_ENV).filter(|d| !d.trim().is_empty())
    {
        cli.database = Some(db);
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Contents of `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub notion: NotionConfig,
    #[serde(default)]
    pub projection: ProjectionConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotionConfig {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub database_id: String,
    #[serde(default = "default_title_property")]
    pub title_property: String,
    #[serde(default = "default_group_property")]
    pub group_property: String,
}

fn default_title_property() -> String {
    Schema::default().title_property
}

fn default_group_property() -> String {
    Schema::default().group_property
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            database_id: String::new(),
            title_property: default_title_property(),
            group_property: default_group_property(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionConfig {
    #[serde(default = "default_scroll_ms")]
    pub scroll_ms: u64,
}

const fn default_scroll_ms() -> u64 {
    500
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            scroll_ms: default_scroll_ms(),
        }
    }
}

impl FileConfig {
    /// Read the file. A missing file is an empty config.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(toml::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// ~/.config/lyricsproj/
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join(CONFIG_DIR_NAME)
}

pub fn default_config_path() -> PathBuf {
    config_dir().join(CONFIG_FILE_NAME)
}

/// Everything the app needs after merging all configuration layers.
#[derive(Debug, Clone)]
pub struct Settings {
    pub credentials: Credentials,
    pub schema: Schema,
    pub scroll_duration: Duration,
    pub config_path: PathBuf,
    pub log_file: PathBuf,
    pub debug_log: bool,
}

pub fn resolve(mut cli: Config, env: impl Fn(&str) -> Option<String>) -> Result<Settings, ConfigError> {
    credentials_from_env_if_empty(&mut cli, env);
    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let file = FileConfig::load(&config_path)?;

    let token = cli.token.unwrap_or(file.notion.token);
    let database = cli.database.unwrap_or(file.notion.database_id);
    let database_id = normalize_notion_id(&database).unwrap_or_else(|| database.trim().to_string());

    let log_file = cli.log_file.unwrap_or_else(|| {
        config_path
            .parent()
            .map_or_else(config_dir, Path::to_path_buf)
            .join(LOG_FILE_NAME)
    });

    Ok(Settings {
        credentials: Credentials::new(token.trim(), database_id),
        schema: Schema {
            title_property: file.notion.title_property,
            group_property: file.notion.group_property,
        },
        scroll_duration: Duration::from_millis(cli.scroll_ms.unwrap_or(file.projection.scroll_ms)),
        config_path,
        log_file,
        debug_log: cli.debug_log,
    })
}

/// Persist credentials, keeping the rest of the file.
pub fn save_credentials(path: &Path, creds: &Credentials) -> Result<(), ConfigError> {
    let mut file = FileConfig::load(path)?;
    file.notion.token = creds.token.clone();
    file.notion.database_id = creds.database_id.clone();
    file.save(path)?;
    tracing::info!(path = %path.display(), "credentials saved");
    Ok(())
}

/// Forget persisted credentials. Nothing to do when there is no file.
pub fn clear_credentials(path: &Path) -> Result<(), ConfigError> {
    if !path.exists() {
        return Ok(());
    }
    let mut file = FileConfig::load(path)?;
    file.notion.token.clear();
    file.notion.database_id.clear();
    file.save(path)?;
    tracing::info!(path = %path.display(), "credentials cleared");
    Ok(())
}
