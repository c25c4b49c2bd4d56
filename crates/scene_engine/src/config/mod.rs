//! Configuration system
//!
//! Engine settings are plain serde structs loaded from `.toml` or `.ron`
//! files. Every section has defaults, so a config file only needs the keys
//! it changes.

use serde::de::DeserializeOwned;
pub use serde::{Deserialize, Serialize};

use crate::foundation::math::Rotation;
use crate::render::{Frustum, RenderError};

/// Configuration trait
pub trait Config: Serialize + DeserializeOwned + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;

        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Values that parse but cannot be used
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<RenderError> for ConfigError {
    fn from(error: RenderError) -> Self {
        Self::Invalid(error.to_string())
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// `env_logger` filter used by binaries (`error` .. `trace`)
    pub log_level: String,
    /// Initial window size
    pub viewport: ViewportConfig,
    /// Fallback camera
    pub camera: CameraConfig,
    /// Recording device limits
    pub device: DeviceConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            viewport: ViewportConfig::default(),
            camera: CameraConfig::default(),
            device: DeviceConfig::default(),
        }
    }
}

impl Config for EngineConfig {}

impl EngineConfig {
    /// Check values serde cannot reject on its own
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.log_level
            .parse::<log::LevelFilter>()
            .map_err(|_| ConfigError::Invalid(format!("unknown log level '{}'", self.log_level)))?;
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "viewport must be non-empty, got {}x{}",
                self.viewport.width, self.viewport.height
            )));
        }
        Frustum::try_from(self.camera.frustum)?;
        if self.device.max_matrix_depth < 2 {
            return Err(ConfigError::Invalid("max_matrix_depth must allow at least one push".to_string()));
        }
        if self.device.max_list_nesting == 0 {
            return Err(ConfigError::Invalid("max_list_nesting must be positive".to_string()));
        }
        Ok(())
    }

    /// Parsed log level
    pub fn level_filter(&self) -> Result<log::LevelFilter, ConfigError> {
        self.log_level
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("unknown log level '{}'", self.log_level)))
    }
}

/// Window size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self { width: 800, height: 600 }
    }
}

/// The renderer's fallback camera
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Camera name
    pub name: String,
    /// View volume
    pub frustum: FrustumConfig,
    /// World position
    pub position: [f32; 3],
    /// Rotation in degrees
    pub rotation: Rotation,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            name: crate::render::renderer::DEFAULT_CAMERA_NAME.to_string(),
            frustum: FrustumConfig::default(),
            position: [0.0; 3],
            rotation: Rotation::IDENTITY,
        }
    }
}

/// Unvalidated frustum parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrustumConfig {
    /// Vertical view angle in degrees
    pub view_angle: f32,
    /// Near distance
    pub near: f32,
    /// Far distance
    pub far: f32,
}

impl Default for FrustumConfig {
    fn default() -> Self {
        Self { view_angle: 90.0, near: 5.0, far: 60.0 }
    }
}

impl TryFrom<FrustumConfig> for Frustum {
    type Error = RenderError;

    fn try_from(config: FrustumConfig) -> Result<Self, Self::Error> {
        Frustum::new(config.view_angle, config.near, config.far)
    }
}

/// Limits of the in-memory recording device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Deepest matrix stack per mode
    pub max_matrix_depth: usize,
    /// Deepest nesting of `call_list` inside compiled lists
    pub max_list_nesting: usize,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self { max_matrix_depth: 32, max_list_nesting: 64 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_in(dir: &tempfile::TempDir, name: &str) -> String {
        dir.path().join(name).to_string_lossy().into_owned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.camera.frustum, FrustumConfig { view_angle: 90.0, near: 5.0, far: 60.0 });
        assert_eq!(config.device.max_matrix_depth, 32);
        assert_eq!(config.level_filter().unwrap(), log::LevelFilter::Info);
    }

    #[test]
    fn test_toml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = path_in(&dir, "engine.toml");
        let mut config = EngineConfig::default();
        config.viewport.width = 1024;
        config.camera.position = [1.0, 2.0, 3.0];

        config.save_to_file(&path).unwrap();
        let loaded = EngineConfig::load_from_file(&path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_ron_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = path_in(&dir, "engine.ron");
        std::fs::write(&path, "(log_level: \"debug\", camera: (frustum: (near: 1.0)))").unwrap();

        let loaded = EngineConfig::load_from_file(&path).unwrap();

        assert_eq!(loaded.log_level, "debug");
        assert_eq!(loaded.camera.frustum.near, 1.0);
        assert_eq!(loaded.camera.frustum.far, 60.0);
        assert_eq!(loaded.viewport, ViewportConfig::default());
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = path_in(&dir, "engine.json");
        std::fs::write(&path, "{}").unwrap();

        assert!(matches!(EngineConfig::load_from_file(&path), Err(ConfigError::UnsupportedFormat(_))));
        assert!(matches!(EngineConfig::default().save_to_file(&path), Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = path_in(&dir, "absent.toml");

        assert!(matches!(EngineConfig::load_from_file(&path), Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = path_in(&dir, "broken.toml");
        std::fs::write(&path, "viewport = [").unwrap();

        assert!(matches!(EngineConfig::load_from_file(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_frustum_conversion_validates() {
        let inverted = FrustumConfig { view_angle: 60.0, near: 10.0, far: 5.0 };
        assert!(matches!(Frustum::try_from(inverted), Err(RenderError::InvalidConfiguration(_))));

        let frustum = Frustum::try_from(FrustumConfig::default()).unwrap();
        assert_eq!(frustum.view_angle(), 90.0);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = EngineConfig::default();
        config.camera.frustum.near = -1.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = EngineConfig::default();
        config.viewport.height = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = EngineConfig::default();
        config.log_level = "loud".to_string();
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.device.max_matrix_depth = 1;
        assert!(config.validate().is_err());
    }
}
