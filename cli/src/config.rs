// Configuration management for the Mobius CLI
//
// Cross-platform config stored in:
// - macOS: ~/Library/Application Support/mobius/config.json
// - Linux: ~/.config/mobius/config.json
// - Windows: %APPDATA%\mobius\config.json

use anyhow::{Context, Result};
use mobius_core::{ChecksumPolicy, EngineConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Controller used when no --address is given
    pub default_address: Option<String>,

    /// Which BLE adapter to use when several are present
    pub adapter_index: usize,

    /// Log at debug level without --verbose
    pub verbose: bool,

    /// Retry budgets and response handling
    pub engine: EngineConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_address: None,
            adapter_index: 0,
            verbose: false,
            engine: EngineConfig::default(),
        }
    }
}

impl Config {
    /// Get the config directory path (cross-platform)
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to determine config directory")?
            .join("mobius");

        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;

        Ok(config_dir)
    }

    /// Get the config file path
    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Load config from file, or create default if not exists
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path).context("Failed to read config file")?;
            let config: Config =
                serde_json::from_str(&contents).context("Failed to parse config file")?;
            config
                .engine
                .validate()
                .context("Invalid engine settings in config file")?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, contents).context("Failed to write config file")?;
        Ok(())
    }

    /// Set a config value in memory; the caller persists it
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let previous = self.engine.clone();
        match key {
            "default_address" => {
                self.default_address = if value.is_empty() {
                    None
                } else {
                    Some(value.to_uppercase())
                };
            }
            "adapter_index" => {
                self.adapter_index = value.parse().context("Invalid number")?;
            }
            "verbose" => {
                self.verbose = value.parse().context("Invalid boolean value")?;
            }
            "debug" => {
                self.engine.debug = value.parse().context("Invalid boolean value")?;
            }
            "checksum_policy" => {
                self.engine.checksum_policy = value
                    .parse::<ChecksumPolicy>()
                    .map_err(anyhow::Error::msg)
                    .context("Expected 'ignore' or 'validate'")?;
            }
            "poll_interval_ms" => {
                self.engine.poll_interval_ms = value.parse().context("Invalid number")?;
            }
            "discovery_polls" => {
                self.engine.discovery_polls = value.parse().context("Invalid number")?;
            }
            "response_polls" => {
                self.engine.response_polls = value.parse().context("Invalid number")?;
            }
            "connect_attempts" => {
                self.engine.connect_attempts = value.parse().context("Invalid number")?;
            }
            "name_scan_rounds" => {
                self.engine.name_scan_rounds = value.parse().context("Invalid number")?;
            }
            _ => anyhow::bail!("Unknown config key: {}", key),
        }
        if let Err(err) = self.engine.validate() {
            self.engine = previous;
            return Err(err.into());
        }
        Ok(())
    }

    /// Get a config value
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "default_address" => self.default_address.clone(),
            "adapter_index" => Some(self.adapter_index.to_string()),
            "verbose" => Some(self.verbose.to_string()),
            "debug" => Some(self.engine.debug.to_string()),
            "checksum_policy" => Some(self.engine.checksum_policy.to_string()),
            "poll_interval_ms" => Some(self.engine.poll_interval_ms.to_string()),
            "discovery_polls" => Some(self.engine.discovery_polls.to_string()),
            "response_polls" => Some(self.engine.response_polls.to_string()),
            "connect_attempts" => Some(self.engine.connect_attempts.to_string()),
            "name_scan_rounds" => Some(self.engine.name_scan_rounds.to_string()),
            _ => None,
        }
    }

    /// List all config values
    pub fn list(&self) -> Vec<(String, String)> {
        vec![
            (
                "default_address".to_string(),
                self.default_address
                    .clone()
                    .unwrap_or_else(|| "(none)".to_string()),
            ),
            ("adapter_index".to_string(), self.adapter_index.to_string()),
            ("verbose".to_string(), self.verbose.to_string()),
            ("debug".to_string(), self.engine.debug.to_string()),
            (
                "checksum_policy".to_string(),
                self.engine.checksum_policy.to_string(),
            ),
            (
                "poll_interval_ms".to_string(),
                format!("{}ms", self.engine.poll_interval_ms),
            ),
            (
                "discovery_polls".to_string(),
                self.engine.discovery_polls.to_string(),
            ),
            (
                "response_polls".to_string(),
                self.engine.response_polls.to_string(),
            ),
            (
                "connect_attempts".to_string(),
                self.engine.connect_attempts.to_string(),
            ),
            (
                "name_scan_rounds".to_string(),
                self.engine.name_scan_rounds.to_string(),
            ),
        ]
    }
}
