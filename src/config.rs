use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_theme")]
    pub theme: String,
    /// How long the verdict stays on screen before auto-advancing.
    #[serde(default = "default_feedback_delay_ms")]
    pub feedback_delay_ms: u64,
    #[serde(default = "default_bank_refresh_enabled")]
    pub bank_refresh_enabled: bool,
    /// Base URL serving bank JSON files; only consulted when refresh is
    /// enabled and the `network` feature is built in.
    #[serde(default = "default_bank_refresh_url")]
    pub bank_refresh_url: String,
}

fn default_theme() -> String {
    "catppuccin-mocha".to_string()
}
fn default_feedback_delay_ms() -> u64 {
    2000
}
fn default_bank_refresh_enabled() -> bool {
    false
}
fn default_bank_refresh_url() -> String {
    String::new()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            feedback_delay_ms: default_feedback_delay_ms(),
            bank_refresh_enabled: default_bank_refresh_enabled(),
            bank_refresh_url: default_bank_refresh_url(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    #[allow(dead_code)]
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("phrasedr")
            .join("config.toml")
    }

    /// Clamp out-of-range values from hand-edited config files.
    pub fn validate(&mut self) {
        self.feedback_delay_ms = self.feedback_delay_ms.clamp(500, 10_000);
        if self.theme.trim().is_empty() {
            self.theme = default_theme();
        }
    }

    /// Remote base URL to try for bank refresh, if configured and usable.
    pub fn remote_bank_url(&self) -> Option<&str> {
        if self.bank_refresh_enabled && !self.bank_refresh_url.trim().is_empty() {
            Some(self.bank_refresh_url.as_str())
        } else {
            None
        }
    }
}
