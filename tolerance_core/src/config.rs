//! Configuration file support for tolr.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/tolr/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub subject: SubjectConfig,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub display: DisplayConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Which subject commands act on when none is given
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubjectConfig {
    #[serde(default = "default_subject_id")]
    pub default_id: String,
}

impl Default for SubjectConfig {
    fn default() -> Self {
        Self {
            default_id: default_subject_id(),
        }
    }
}

/// Engine behaviour switches
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Open a profile with a placeholder session when a recommendation is
    /// requested for a subject with no history
    #[serde(default = "default_seed_new_subjects")]
    pub seed_new_subjects: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed_new_subjects: default_seed_new_subjects(),
        }
    }
}

/// Rendering options
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_dose_unit")]
    pub dose_unit: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            dose_unit: default_dose_unit(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("tolr")
}

fn default_subject_id() -> String {
    std::env::var("USER")
        .ok()
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| "default".into())
}

fn default_seed_new_subjects() -> bool {
    true
}

fn default_dose_unit() -> String {
    "mg".into()
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("tolr").join("config.toml")
    }

    fn validate(&self) -> Result<()> {
        if self.subject.default_id.trim().is_empty() {
            return Err(Error::Config("subject.default_id must not be empty".into()));
        }
        if self.display.dose_unit.trim().is_empty() {
            return Err(Error::Config("display.dose_unit must not be empty".into()));
        }
        Ok(())
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.engine.seed_new_subjects);
        assert_eq!(config.display.dose_unit, "mg");
        assert!(config.data.data_dir.ends_with("tolr"));
        assert!(!config.subject.default_id.is_empty());
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[engine]
seed_new_subjects = false

[subject]
default_id = "alice"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert!(!config.engine.seed_new_subjects);
        assert_eq!(config.subject.default_id, "alice");
        assert_eq!(config.display.dose_unit, "mg"); // default
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.display.dose_unit = "g".into();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.display.dose_unit, "g");
    }

    #[test]
    fn test_blank_subject_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[subject]\ndefault_id = \"  \"\n").unwrap();

        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }
}
