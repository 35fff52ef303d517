use crate::models::{MainConfig, UserConfig};
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Serialize, de::DeserializeOwned};
use std::fs;

pub const MAIN_CONFIG_FILE: &str = "Remap Main.yaml";
pub const USER_CONFIG_FILE: &str = "Remap Config.yaml";

/// Configuration manager for loading and saving YAML configuration files.
///
/// Manages two configuration files:
/// - Main config (`Remap Main.yaml`): mod types and their asset replacement tables
/// - User config (`Remap Config.yaml`): which types and variants to generate, logging
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    main_config_path: Utf8PathBuf,
    user_config_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the specified configuration directory.
    ///
    /// # Arguments
    /// * `config_dir` - Directory containing configuration files (e.g., "Remap Data")
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            main_config_path: config_dir.join(MAIN_CONFIG_FILE),
            user_config_path: config_dir.join(USER_CONFIG_FILE),
            config_dir,
        })
    }

    fn load<T: DeserializeOwned>(path: &Utf8Path, what: &str) -> Result<T> {
        let file_contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}: {}", what, path))?;

        let config = serde_yaml_ng::from_str(&file_contents)
            .with_context(|| format!("Failed to parse {}: {}", what, path))?;

        tracing::info!("Loaded {} from {}", what, path);
        Ok(config)
    }

    fn save<T: Serialize>(path: &Utf8Path, config: &T, what: &str) -> Result<()> {
        let yaml_string = serde_yaml_ng::to_string(config)
            .with_context(|| format!("Failed to serialize {} to YAML", what))?;

        fs::write(path, yaml_string)
            .with_context(|| format!("Failed to write {}: {}", what, path))?;

        tracing::info!("Saved {} to {}", what, path);
        Ok(())
    }

    /// Load the main configuration file.
    ///
    /// # Returns
    /// The loaded MainConfig, or the built-in mod types if the file doesn't exist
    pub fn load_main_config(&self) -> Result<MainConfig> {
        if !self.main_config_path.exists() {
            tracing::warn!(
                "Main config file not found at {}, using built-in mod types",
                self.main_config_path
            );
            return Ok(MainConfig::default());
        }

        Self::load(&self.main_config_path, "main config")
    }

    pub fn save_main_config(&self, config: &MainConfig) -> Result<()> {
        Self::save(&self.main_config_path, config, "main config")
    }

    /// Load the user configuration file.
    ///
    /// # Returns
    /// The loaded UserConfig, or default if file doesn't exist
    pub fn load_user_config(&self) -> Result<UserConfig> {
        if !self.user_config_path.exists() {
            tracing::warn!(
                "User config file not found at {}, using defaults",
                self.user_config_path
            );
            return Ok(UserConfig::default());
        }

        Self::load(&self.user_config_path, "user config")
    }

    pub fn save_user_config(&self, config: &UserConfig) -> Result<()> {
        Self::save(&self.user_config_path, config, "user config")
    }

    /// Get the configuration directory path.
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    pub fn main_config_path(&self) -> &Utf8Path {
        &self.main_config_path
    }

    pub fn user_config_path(&self) -> &Utf8Path {
        &self.user_config_path
    }
}
