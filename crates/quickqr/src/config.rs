//! Configuration management for quickqr.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::log::DEFAULT_CAPACITY;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "quickqr";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "history.db";

/// Default ceiling for one serialized history record, in bytes.
pub const DEFAULT_MAX_PERSIST_BYTES: usize = 102_400;

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `QUICKQR_`, sections split on `__`)
/// 2. TOML config file at `~/.config/quickqr/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// History storage configuration.
    pub storage: StorageConfig,
    /// QR rendering configuration.
    pub generator: GeneratorConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/quickqr/history.db`
    pub database_path: Option<PathBuf>,
    /// Entries kept per history log before the oldest are evicted.
    pub max_entries: usize,
    /// Largest serialized history record that will be written, in bytes.
    pub max_persist_bytes: usize,
}

/// QR error-correction level handed to the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ErrorCorrection {
    /// ~7% recovery.
    L,
    /// ~15% recovery.
    M,
    /// ~25% recovery.
    Q,
    /// ~30% recovery.
    #[default]
    H,
}

/// Rendering options for generated codes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Minimum rendered width in pixels.
    pub width: u32,
    /// Quiet-zone margin in modules. Zero disables the quiet zone.
    pub margin: u32,
    /// Error-correction level.
    pub error_correction: ErrorCorrection,
    /// Color of dark modules, `#RRGGBB`.
    pub dark_color: String,
    /// Color of light modules, `#RRGGBB`.
    pub light_color: String,
    /// Directory that downloaded images are written to.
    /// Defaults to the user's download directory.
    pub output_dir: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None, // Will be resolved to default at runtime
            max_entries: DEFAULT_CAPACITY,
            max_persist_bytes: DEFAULT_MAX_PERSIST_BYTES,
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            width: 300,
            margin: 2,
            error_correction: ErrorCorrection::H,
            dark_color: "#000000".to_string(),
            light_color: "#FFFFFF".to_string(),
            output_dir: None,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file).nested())
            .merge(Env::prefixed("QUICKQR_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.storage.max_entries == 0 {
            return Err(Error::ConfigValidation {
                message: "max_entries must be greater than 0".to_string(),
            });
        }

        if self.storage.max_persist_bytes == 0 {
            return Err(Error::ConfigValidation {
                message: "max_persist_bytes must be greater than 0".to_string(),
            });
        }

        if self.generator.width == 0 {
            return Err(Error::ConfigValidation {
                message: "width must be greater than 0".to_string(),
            });
        }

        for (name, color) in [
            ("dark_color", &self.generator.dark_color),
            ("light_color", &self.generator.light_color),
        ] {
            if !is_hex_color(color) {
                return Err(Error::ConfigValidation {
                    message: format!("{name} must be a #RRGGBB color, got {color:?}"),
                });
            }
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the image output directory, resolving defaults if not set.
    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.generator
            .output_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.storage.max_entries, 50);
        assert_eq!(config.storage.max_persist_bytes, 102_400);
        assert_eq!(config.generator.width, 300);
        assert_eq!(config.generator.margin, 2);
        assert_eq!(config.generator.error_correction, ErrorCorrection::H);
    }

    #[test]
    fn test_default_storage_config() {
        let storage = StorageConfig::default();
        assert!(storage.database_path.is_none());
        assert_eq!(storage.max_entries, DEFAULT_CAPACITY);
    }

    #[test]
    fn test_default_generator_colors() {
        let generator = GeneratorConfig::default();
        assert_eq!(generator.dark_color, "#000000");
        assert_eq!(generator.light_color, "#FFFFFF");
        assert!(generator.output_dir.is_none());
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_zero_max_entries() {
        let mut config = Config::default();
        config.storage.max_entries = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("max_entries"));
    }

    #[test]
    fn test_validate_zero_persist_ceiling() {
        let mut config = Config::default();
        config.storage.max_persist_bytes = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("max_persist_bytes"));
    }

    #[test]
    fn test_validate_zero_width() {
        let mut config = Config::default();
        config.generator.width = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("width"));
    }

    #[test]
    fn test_validate_bad_color() {
        let mut config = Config::default();
        config.generator.dark_color = "black".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("dark_color"));
    }

    #[test]
    fn test_is_hex_color() {
        assert!(is_hex_color("#a0B1c2"));
        assert!(!is_hex_color("#fff"));
        assert!(!is_hex_color("000000"));
        assert!(!is_hex_color("#00000g"));
    }

    #[test]
    fn test_database_path_default() {
        let path = Config::default().database_path();
        assert!(path.to_string_lossy().contains("history.db"));
    }

    #[test]
    fn test_database_path_custom() {
        let mut config = Config::default();
        config.storage.database_path = Some(PathBuf::from("/custom/path/db.sqlite"));

        assert_eq!(
            config.database_path(),
            PathBuf::from("/custom/path/db.sqlite")
        );
    }

    #[test]
    fn test_output_dir_custom() {
        let mut config = Config::default();
        config.generator.output_dir = Some(PathBuf::from("/tmp/codes"));
        assert_eq!(config.output_dir(), PathBuf::from("/tmp/codes"));
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("quickqr"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        let config = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml"))).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[storage]\nmax_entries = 10\n\n[generator]\nerror_correction = \"M\"\n",
        )
        .unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert_eq!(config.storage.max_entries, 10);
        assert_eq!(config.storage.max_persist_bytes, DEFAULT_MAX_PERSIST_BYTES);
        assert_eq!(config.generator.error_correction, ErrorCorrection::M);
    }

    #[test]
    fn test_load_rejects_invalid_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[storage]\nmax_entries = 0\n").unwrap();

        let result = Config::load_from(Some(path));
        assert!(matches!(result, Err(Error::ConfigValidation { .. })));
    }

    #[test]
    fn test_storage_config_deserialize() {
        let json = r#"{"max_entries": 20}"#;
        let storage: StorageConfig = serde_json::from_str(json).unwrap();
        assert_eq!(storage.max_entries, 20);
        assert_eq!(storage.max_persist_bytes, DEFAULT_MAX_PERSIST_BYTES);
    }
}
