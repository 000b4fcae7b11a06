//! Configuration loading and types for voskpipe
//!
//! Configuration is loaded in layers:
//! 1. Built-in defaults
//! 2. Config file (~/.config/voskpipe/config.toml)
//! 3. Environment variables (VOSKPIPE_*)
//! 4. CLI arguments (highest priority)

use crate::error::VoskpipeError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file content
pub const DEFAULT_CONFIG: &str = r#"# Voskpipe Configuration
#
# Location: ~/.config/voskpipe/config.toml
# All settings can be overridden via CLI flags

[recognizer]
# Path to the recognizer CLI binary.
# Omit to search PATH and the usual install locations.
# path = "/usr/local/bin/vosk-cli"

# Audio capture device index, as listed by `voskpipe devices`
device_index = 0

[model]
# Model directory name under the models dir, or an absolute path
name = "vosk-model-small-ja-0.22"

# Archive URL used by `voskpipe model ensure`
# url = "https://example.com/models/vosk-model-small-ja-0.22.tar.gz"

# Where installed models live ("auto" uses the XDG data dir)
# dir = "auto"

# Scratch space for downloads ("auto" uses the system temp dir)
# temp_root = "auto"
"#;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub recognizer: RecognizerConfig,
    #[serde(default)]
    pub model: ModelConfig,
}

/// Settings for the recognizer subprocess
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecognizerConfig {
    /// Explicit binary path; `None` means search PATH and known locations
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Capture device index passed to the recognizer
    #[serde(default)]
    pub device_index: i32,
}

/// Settings for model provisioning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    /// Model directory name, or an absolute path to a model directory
    #[serde(default = "default_model_name")]
    pub name: String,

    /// Archive URL for `model ensure`
    #[serde(default)]
    pub url: Option<String>,

    /// Models directory; "auto" or absent uses the XDG data dir
    #[serde(default)]
    pub dir: Option<String>,

    /// Scratch root for downloads; "auto" or absent uses the system temp dir
    #[serde(default)]
    pub temp_root: Option<String>,
}

fn default_model_name() -> String {
    "vosk-model-small-ja-0.22".to_string()
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model_name(),
            url: None,
            dir: None,
            temp_root: None,
        }
    }
}

impl ModelConfig {
    /// Resolve the models directory
    pub fn resolve_dir(&self) -> PathBuf {
        match self.dir.as_deref() {
            None | Some("auto") => Config::models_dir(),
            Some(dir) => PathBuf::from(dir),
        }
    }

    /// Resolve the scratch root for provisioning attempts
    pub fn resolve_temp_root(&self) -> PathBuf {
        match self.temp_root.as_deref() {
            None | Some("auto") => std::env::temp_dir().join("voskpipe"),
            Some(dir) => PathBuf::from(dir),
        }
    }

    /// Resolve the configured model to a directory path
    ///
    /// An absolute `name` is used as-is; otherwise it names a directory
    /// under the models dir.
    pub fn model_path(&self) -> PathBuf {
        let as_path = Path::new(&self.name);
        if as_path.is_absolute() {
            as_path.to_path_buf()
        } else {
            self.resolve_dir().join(&self.name)
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "voskpipe")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get the config directory path
    pub fn config_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "voskpipe")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the data directory path (for models)
    pub fn data_dir() -> PathBuf {
        directories::ProjectDirs::from("", "", "voskpipe")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Get the models directory path
    pub fn models_dir() -> PathBuf {
        Self::data_dir().join("models")
    }

    /// Ensure config and models directories exist
    pub fn ensure_directories() -> std::io::Result<()> {
        if let Some(config_dir) = Self::config_dir() {
            std::fs::create_dir_all(&config_dir)?;
            tracing::debug!("Ensured config directory exists: {:?}", config_dir);
        }

        let models_dir = Self::models_dir();
        std::fs::create_dir_all(&models_dir)?;
        tracing::debug!("Ensured models directory exists: {:?}", models_dir);

        Ok(())
    }
}

/// Load configuration from file, with defaults for missing values
pub fn load_config(path: Option<&Path>) -> Result<Config, VoskpipeError> {
    let mut config = Config::default();

    let config_path = path.map(PathBuf::from).or_else(Config::default_path);

    if let Some(ref path) = config_path {
        if path.exists() {
            tracing::debug!("Loading config from {:?}", path);
            let contents = std::fs::read_to_string(path)
                .map_err(|e| VoskpipeError::Config(format!("Failed to read config: {}", e)))?;

            config = toml::from_str(&contents)
                .map_err(|e| VoskpipeError::Config(format!("Invalid config: {}", e)))?;
        } else {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
        }
    }

    // Override from environment variables
    if let Ok(path) = std::env::var("VOSKPIPE_RECOGNIZER") {
        config.recognizer.path = Some(PathBuf::from(path));
    }
    if let Ok(device) = std::env::var("VOSKPIPE_DEVICE") {
        config.recognizer.device_index = device
            .parse()
            .map_err(|_| VoskpipeError::Config(format!("Invalid VOSKPIPE_DEVICE: {}", device)))?;
    }
    if let Ok(url) = std::env::var("VOSKPIPE_MODEL_URL") {
        config.model.url = Some(url);
    }

    Ok(config)
}

/// Write the commented default config template if no file exists yet
///
/// Returns true when the template was written; an existing file is left
/// untouched.
pub fn write_default_config(path: &Path) -> std::io::Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, DEFAULT_CONFIG)?;
    tracing::info!("Created default config at {:?}", path);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.recognizer.device_index, 0);
        assert!(config.recognizer.path.is_none());
        assert_eq!(config.model.name, "vosk-model-small-ja-0.22");
    }

    #[test]
    fn test_default_config_template_parses() {
        let config: Config = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.recognizer.device_index, 0);
    }

    #[test]
    fn test_parse_config_toml() {
        let toml_str = r#"
            [recognizer]
            path = "/opt/vosk/vosk-cli"
            device_index = 2

            [model]
            name = "vosk-model-en-us-0.22"
            url = "https://example.com/model.tar.gz"
            dir = "/srv/models"
            temp_root = "/var/tmp"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.recognizer.path.as_deref(),
            Some(Path::new("/opt/vosk/vosk-cli"))
        );
        assert_eq!(config.recognizer.device_index, 2);
        assert_eq!(config.model.model_path(), PathBuf::from("/srv/models/vosk-model-en-us-0.22"));
        assert_eq!(config.model.resolve_temp_root(), PathBuf::from("/var/tmp"));
    }

    #[test]
    fn test_first_run_writes_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voskpipe/config.toml");

        assert!(write_default_config(&path).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), DEFAULT_CONFIG);

        // The written template loads as the default configuration.
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.recognizer.device_index, 0);
    }

    #[test]
    fn test_existing_config_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[recognizer]\ndevice_index = 5\n").unwrap();

        assert!(!write_default_config(&path).unwrap());

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.recognizer.device_index, 5);
    }

    #[test]
    fn test_absolute_model_name_used_verbatim() {
        let config = ModelConfig {
            name: "/data/models/custom".to_string(),
            ..Default::default()
        };
        assert_eq!(config.model_path(), PathBuf::from("/data/models/custom"));
    }

    #[test]
    fn test_auto_temp_root_under_system_tmp() {
        let config = ModelConfig::default();
        assert!(config.resolve_temp_root().ends_with("voskpipe"));
    }
}
