//! Configuration management with file persistence

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::domain::booking::BookingPolicy;

/// Skillswap configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseSettings,
    pub booking: BookingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Path to the SQLite database file; empty means the default location
    pub path: Option<PathBuf>,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingSettings {
    /// Longest allowed session in hours
    pub max_duration_hours: i64,
    /// Student cancellation cutoff in hours before the start
    pub cancel_cutoff_hours: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseSettings {
                path: None,
                max_connections: 5,
            },
            booking: BookingSettings {
                max_duration_hours: 4,
                cancel_cutoff_hours: 24,
            },
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var("SKILLSWAP_CONFIG_DIR") {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("skillswap")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, or create default if it doesn't exist
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            config.validate()?;
            Ok(config)
        } else {
            // Return default config without creating file
            Ok(Config::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        self.validate()?;

        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;

        let path = Self::config_path()?;
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database.max_connections == 0 {
            return Err(anyhow!("database.max_connections must be at least 1"));
        }
        if self.booking.max_duration_hours < 1 {
            return Err(anyhow!("booking.max_duration_hours must be at least 1"));
        }
        if self.booking.cancel_cutoff_hours < 0 {
            return Err(anyhow!("booking.cancel_cutoff_hours must be non-negative"));
        }
        Ok(())
    }

    /// The booking policy described by this configuration
    pub fn booking_policy(&self) -> BookingPolicy {
        BookingPolicy::from_hours(
            self.booking.max_duration_hours,
            self.booking.cancel_cutoff_hours,
        )
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        match key {
            "database.path" => Ok(self
                .database
                .path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(default)".to_string())),
            "database.max_connections" => Ok(self.database.max_connections.to_string()),
            "booking.max_duration_hours" => Ok(self.booking.max_duration_hours.to_string()),
            "booking.cancel_cutoff_hours" => Ok(self.booking.cancel_cutoff_hours.to_string()),
            _ => Err(anyhow!(
                "Unknown configuration key: {}. Use `skillswap config list` to see available keys.",
                key
            )),
        }
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "database.path" => {
                self.database.path = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
            "database.max_connections" => {
                let max: u32 = value
                    .parse()
                    .with_context(|| format!("Invalid max_connections value: {}", value))?;
                if max == 0 {
                    return Err(anyhow!("max_connections must be at least 1"));
                }
                self.database.max_connections = max;
            }
            "booking.max_duration_hours" => {
                let hours: i64 = value
                    .parse()
                    .with_context(|| format!("Invalid max_duration_hours value: {}", value))?;
                if hours < 1 {
                    return Err(anyhow!("max_duration_hours must be at least 1"));
                }
                self.booking.max_duration_hours = hours;
            }
            "booking.cancel_cutoff_hours" => {
                let hours: i64 = value
                    .parse()
                    .with_context(|| format!("Invalid cancel_cutoff_hours value: {}", value))?;
                if hours < 0 {
                    return Err(anyhow!("cancel_cutoff_hours must be non-negative"));
                }
                self.booking.cancel_cutoff_hours = hours;
            }
            _ => {
                return Err(anyhow!(
                    "Unknown configuration key: {}. Use `skillswap config list` to see available keys.",
                    key
                ));
            }
        }
        Ok(())
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        let keys = vec![
            "database.path",
            "database.max_connections",
            "booking.max_duration_hours",
            "booking.cancel_cutoff_hours",
        ];

        keys.into_iter()
            .map(|key| {
                let value = self.get(key)?;
                Ok((key.to_string(), value))
            })
            .collect()
    }

    /// Reset configuration to defaults
    pub fn reset() -> anyhow::Result<()> {
        let path = Self::config_path()?;
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove config file: {}", path.display()))?;
        }
        Ok(())
    }
}
