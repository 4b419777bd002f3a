//! Application configuration
//!
//! Window, version, device and capability settings consumed by the bootstrap
//! sequence. The configuration is never modified during initialization.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{Config, ConfigError};
use crate::render::backend::ApplicationInfo;
use crate::render::device::DevicePick;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Window title, also used as the application name
    pub title: String,
    /// Window width in pixels
    pub width: u32,
    /// Window height in pixels
    pub height: u32,
    /// Application version (major, minor, patch)
    pub version: (u32, u32, u32),
    /// Device index, `-1` to choose at startup
    pub device_pick: i64,
    /// Instance extensions enabled when available
    pub requested_extensions: Vec<String>,
    /// Instance layers enabled when available
    pub requested_layers: Vec<String>,
    /// Device extensions enabled when available
    pub requested_device_extensions: Vec<String>,
    /// Log filter level (`off`, `error`, `warn`, `info`, `debug`, `trace`)
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "hwfractal".to_string(),
            width: 800,
            height: 600,
            version: (0, 1, 0),
            device_pick: -1,
            requested_extensions: Vec::new(),
            requested_layers: vec!["VK_LAYER_KHRONOS_validation".to_string()],
            requested_device_extensions: Vec::new(),
            log_level: "info".to_string(),
        }
    }
}

impl Config for AppConfig {}

impl AppConfig {
    /// Set the window title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the window size
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the application version
    pub fn with_version(mut self, major: u32, minor: u32, patch: u32) -> Self {
        self.version = (major, minor, patch);
        self
    }

    /// Set the device index, `-1` to choose at startup
    pub fn with_device_pick(mut self, pick: i64) -> Self {
        self.device_pick = pick;
        self
    }

    /// Set the requested instance extensions
    pub fn with_requested_extensions<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requested_extensions = names.into_iter().map(Into::into).collect();
        self
    }

    /// Set the requested instance layers
    pub fn with_requested_layers<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requested_layers = names.into_iter().map(Into::into).collect();
        self
    }

    /// Set the requested device extensions
    pub fn with_requested_device_extensions<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requested_device_extensions = names.into_iter().map(Into::into).collect();
        self
    }

    /// How the device should be picked
    pub fn device_pick(&self) -> DevicePick {
        DevicePick::from_config(self.device_pick)
    }

    /// Application metadata for instance creation
    pub fn application_info(&self) -> ApplicationInfo {
        ApplicationInfo {
            name: self.title.clone(),
            version: self.version,
        }
    }

    /// Parsed log filter level
    pub fn log_level_filter(&self) -> Result<log::LevelFilter, ConfigError> {
        self.log_level.parse().map_err(|_| ConfigError::Invalid {
            field: "log_level",
            reason: format!("unknown level {:?}", self.log_level),
        })
    }

    /// Check values that would otherwise fail deep inside initialization
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid {
                field: "width/height",
                reason: format!("window size {}x{} is empty", self.width, self.height),
            });
        }
        if self.title.contains('\0') {
            return Err(ConfigError::Invalid {
                field: "title",
                reason: "contains a NUL byte".to_string(),
            });
        }
        self.log_level_filter().map(|_| ())
    }

    /// Write a device picked by the operator back to `path`
    ///
    /// Nothing is written unless this configuration asked for an interactive
    /// pick and `operator_chose` is set. A failed save is logged and ignored.
    /// Returns whether the file was written.
    pub fn remember_device_choice(&self, path: &Path, index: usize, operator_chose: bool) -> bool {
        if !operator_chose || self.device_pick() != DevicePick::Interactive {
            return false;
        }
        let Ok(pick) = i64::try_from(index) else {
            log::warn!("Device index {} cannot be stored", index);
            return false;
        };

        match self.clone().with_device_pick(pick).save_to_file(path) {
            Ok(()) => {
                log::info!("Saved device {} to {}", pick, path.display());
                true
            }
            Err(e) => {
                log::warn!("Could not save device choice to {}: {}", path.display(), e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("hwfractal-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.device_pick(), DevicePick::Interactive);
        assert_eq!(config.log_level_filter().unwrap(), log::LevelFilter::Info);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let path = temp_path("partial.toml");
        std::fs::write(
            &path,
            "title = \"fractal\"\nversion = [1, 2, 3]\ndevice_pick = 1\nrequested_layers = []\n",
        )
        .unwrap();

        let config = AppConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.title, "fractal");
        assert_eq!(config.version, (1, 2, 3));
        assert_eq!(config.device_pick(), DevicePick::Index(1));
        assert!(config.requested_layers.is_empty());
        assert_eq!(config.width, 800);
    }

    #[test]
    fn test_ron_save_and_load() {
        let path = temp_path("saved.ron");
        let config = AppConfig::default()
            .with_title("ron")
            .with_device_pick(2)
            .with_requested_extensions(["VK_EXT_debug_utils"]);

        config.save_to_file(&path).unwrap();
        let loaded = AppConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_unsupported_extension() {
        let result = AppConfig::load_from_file("settings.json");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_validation() {
        assert!(AppConfig::default().with_size(0, 600).validate().is_err());
        assert!(AppConfig::default().with_title("a\0b").validate().is_err());

        let mut config = AppConfig::default();
        config.log_level = "loud".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field: "log_level", .. })));
    }

    #[test]
    fn test_operator_choice_is_saved() {
        let path = temp_path("operator.toml");
        let config = AppConfig::default().with_title("picked");
        config.save_to_file(&path).unwrap();

        assert!(config.remember_device_choice(&path, 1, true));
        let loaded = AppConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded.device_pick(), DevicePick::Index(1));
        assert_eq!(loaded.title, "picked");
    }

    #[test]
    fn test_automatic_choice_leaves_file_alone() {
        let path = temp_path("automatic.toml");
        let original = "# keep me\ndevice_pick = -1\n";
        std::fs::write(&path, original).unwrap();

        let config = AppConfig::load_from_file(&path).unwrap();
        assert!(!config.remember_device_choice(&path, 0, false));
        let contents = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(contents, original);
    }

    #[test]
    fn test_explicit_pick_is_not_rewritten() {
        let path = temp_path("explicit.toml");

        assert!(!AppConfig::default().with_device_pick(2).remember_device_choice(&path, 2, true));
        assert!(!path.exists());
    }

    #[test]
    fn test_failed_save_is_not_an_error() {
        let path = temp_path("missing-dir").join("config.toml");

        assert!(!AppConfig::default().remember_device_choice(&path, 0, true));
        assert!(!path.exists());
    }

    #[test]
    fn test_application_info() {
        let info = AppConfig::default().with_title("demo").with_version(2, 0, 1).application_info();
        assert_eq!(info.name, "demo");
        assert_eq!(info.version, (2, 0, 1));
    }
}
