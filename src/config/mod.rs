use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use time::format_description::{self, OwnedFormatItem};
use time::UtcOffset;

const APP_DOMAIN: &str = "io";
const APP_ORG: &str = "NotesClient";
const APP_NAME: &str = "notes-client";

pub const CONFIG_ENV: &str = "NOTES_CLIENT_CONFIG";
pub const API_URL_ENV: &str = "NOTES_API_URL";

const DEFAULT_DATE_FORMAT: &str = "[year]-[month]-[day] [hour]:[minute]";

pub struct ConfigLoader {
    paths: ConfigPaths,
}

impl ConfigLoader {
    pub fn discover() -> Result<Self> {
        let paths = ConfigPaths::discover()?;
        Ok(Self { paths })
    }

    pub fn with_paths(paths: ConfigPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    pub fn load_or_init(&self) -> Result<AppConfig> {
        self.paths.ensure_directories()?;
        if !self.paths.config_file.exists() {
            let mut default_cfg = AppConfig::default();
            self.write_default_config(&default_cfg)?;
            default_cfg.post_load()?;
            return Ok(default_cfg);
        }

        self.load()
    }

    pub fn load(&self) -> Result<AppConfig> {
        let raw = fs::read_to_string(&self.paths.config_file)
            .with_context(|| format!("reading config {}", self.paths.config_file.display()))?;
        let mut cfg: AppConfig = toml::from_str(&raw).context("parsing config toml")?;
        cfg.post_load()?;
        Ok(cfg)
    }

    fn write_default_config(&self, cfg: &AppConfig) -> Result<()> {
        let toml = toml::to_string_pretty(cfg).context("serializing default config")?;
        if let Some(parent) = self.paths.config_file.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        let mut file = fs::File::create(&self.paths.config_file)
            .with_context(|| format!("creating config {}", self.paths.config_file.display()))?;
        file.write_all(toml.as_bytes())
            .context("writing default config")?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
    pub state_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl ConfigPaths {
    pub fn discover() -> Result<Self> {
        let override_config = env::var(CONFIG_ENV).ok().map(PathBuf::from);

        let project_dirs = ProjectDirs::from(APP_DOMAIN, APP_ORG, APP_NAME)
            .context("resolving XDG project directories")?;

        let config_dir = override_config
            .clone()
            .map(|p| {
                if p.is_dir() {
                    p
                } else {
                    p.parent().map(Path::to_path_buf).unwrap_or(p)
                }
            })
            .unwrap_or_else(|| project_dirs.config_dir().to_path_buf());

        let config_file = override_config
            .filter(|p| p.is_file() || p.extension().is_some())
            .unwrap_or_else(|| config_dir.join("config.toml"));

        let state_dir = project_dirs
            .state_dir()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| project_dirs.data_local_dir().join("state"));
        let log_dir = state_dir.join("logs");

        Ok(Self {
            config_dir,
            config_file,
            state_dir,
            log_dir,
        })
    }

    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.config_dir, &self.state_dir, &self.log_dir] {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating application directory {}", dir.display()))?;
        }
        Ok(())
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_dir.join(format!("{APP_NAME}.log"))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub display: DisplayConfig,
}

impl AppConfig {
    fn post_load(&mut self) -> Result<()> {
        self.api.apply_base_url_override(env::var(API_URL_ENV).ok());
        if let Err(err) = self.display.format_items() {
            tracing::warn!(
                format = %self.display.date_format,
                %err,
                "invalid date_format in config, falling back to default"
            );
            self.display.date_format = DEFAULT_DATE_FORMAT.to_string();
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_secs: 10,
            user_agent: format!("{}/{}", APP_NAME, env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ApiConfig {
    pub fn apply_base_url_override(&mut self, value: Option<String>) {
        let Some(value) = value else {
            return;
        };
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return;
        }
        tracing::debug!(base_url = trimmed, "API base url overridden");
        self.base_url = trimmed.to_string();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub time_zone: TimeZoneSetting,
    /// `time` format description used for note timestamps
    pub date_format: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            time_zone: TimeZoneSetting::Local,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

impl DisplayConfig {
    pub fn format_items(&self) -> Result<OwnedFormatItem> {
        format_description::parse_owned::<2>(&self.date_format)
            .with_context(|| format!("parsing date format {:?}", self.date_format))
    }

    /// Must be called before any other thread is spawned; the local offset
    /// cannot be determined soundly afterwards on most unix platforms.
    pub fn resolve_offset(&self) -> UtcOffset {
        match self.time_zone {
            TimeZoneSetting::Utc => UtcOffset::UTC,
            TimeZoneSetting::Local => UtcOffset::current_local_offset().unwrap_or_else(|err| {
                tracing::warn!(%err, "local offset unavailable, showing times in UTC");
                UtcOffset::UTC
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TimeZoneSetting {
    #[default]
    Local,
    Utc,
}
