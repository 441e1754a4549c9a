use crate::constants::{DEFAULT_AUDIT_TAIL, DEFAULT_REFRESH_INTERVAL_MS, MIN_REFRESH_INTERVAL_MS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Name of the config file, both in the current directory and under `~/.lbconsole/`.
const CONFIG_FILE: &str = "lbconsole.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub api_host: String,
    pub api_port: u16,
    /// Period of the auto-refresh loop, in milliseconds.
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,
    /// Whether the auto-refresh loop starts enabled.
    #[serde(default)]
    pub auto_refresh: bool,
    /// Default number of audit log lines to tail.
    #[serde(default = "default_audit_tail")]
    pub audit_tail: u32,
    /// Where tracing output goes, the terminal belongs to the UI.
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
}

#[inline(always)]
#[rustfmt::skip]
fn default_refresh_interval_ms() -> u64 { DEFAULT_REFRESH_INTERVAL_MS }
#[inline(always)]
#[rustfmt::skip]
fn default_audit_tail() -> u32          { DEFAULT_AUDIT_TAIL }
#[inline(always)]
#[rustfmt::skip]
fn default_log_file() -> PathBuf        { PathBuf::from("lbconsole.log") }

impl Default for Config {
    fn default() -> Self {
        Self {
            api_host: "127.0.0.1".to_string(),
            api_port: 8080,
            refresh_interval_ms: default_refresh_interval_ms(),
            auto_refresh: false,
            audit_tail: default_audit_tail(),
            log_file: default_log_file(),
        }
    }
}

impl Config {
    /// Load config from either current directory or `~/.lbconsole/` directory
    pub fn load() -> color_eyre::Result<Self> {
        // try current directory first
        let local_path = PathBuf::from(CONFIG_FILE);
        if local_path.exists() {
            let content = fs::read_to_string(&local_path)?;
            return Self::parse(&content);
        }

        // try ~/.lbconsole/ directory
        let home_path = Self::home_config_path();
        if home_path.exists() {
            let content = fs::read_to_string(&home_path)?;
            return Self::parse(&content);
        }

        // if neither exists, create default config in current directory
        let config = Self::default();
        let content = serde_json::to_string_pretty(&config)?;
        fs::write(&local_path, content)?;
        Ok(config)
    }

    /// Parse a config document, missing optional fields take their defaults.
    pub fn parse(content: &str) -> color_eyre::Result<Self> {
        let config: Config = serde_json::from_str(content)?;
        Ok(config)
    }

    /// Save config where [`Config::load`] will find it first: the current
    /// directory if it has a config, `~/.lbconsole/` otherwise.
    pub fn save(&self) -> color_eyre::Result<()> {
        let local_path = PathBuf::from(CONFIG_FILE);
        let config_path = if local_path.exists() {
            local_path
        } else {
            Self::home_config_path()
        };

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(&config_path, content)?;
        Ok(())
    }

    /// Get the path to `$HOME/.lbconsole/lbconsole.json`
    fn home_config_path() -> PathBuf {
        let mut path = match std::env::var("HOME") {
            Ok(home) => PathBuf::from(home),
            Err(_) => PathBuf::from("."),
        };
        path.push(".lbconsole");
        path.push(CONFIG_FILE);
        path
    }

    /// Get the current config location (for display purposes)
    pub fn current_location() -> String {
        let local_path = PathBuf::from(CONFIG_FILE);
        if local_path.exists() {
            return format!("./{}", CONFIG_FILE);
        }

        let home_path = Self::home_config_path();
        if home_path.exists() {
            return home_path.to_string_lossy().to_string();
        }

        format!("./{} (not found)", CONFIG_FILE)
    }

    /// Get the full API URL, `http://{host}:{port}` format
    pub fn api_url(&self) -> String {
        format!("http://{}:{}", self.api_host, self.api_port)
    }

    /// Refresh loop period, floored so a bad config cannot spin the loop.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms.max(MIN_REFRESH_INTERVAL_MS))
    }
}
