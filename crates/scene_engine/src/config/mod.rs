//! Configuration system
//!
//! Configuration files are TOML or RON, picked by file extension.

use std::path::Path;

pub use serde::{Serialize, Deserialize};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        match Format::of(path)? {
            Format::Toml => toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            Format::Ron => ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match Format::of(path)? {
            Format::Toml => toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?,
            Format::Ron => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

enum Format {
    Toml,
    Ron,
}

impl Format {
    fn of(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("ron") => Ok(Self::Ron),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
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
}

/// Settings of a [`World`](crate::ecs::World)'s frame clock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Multiplier applied to every frame delta
    pub time_scale: f32,
    /// Longest frame delta, in seconds, before scaling
    pub max_delta_time: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            max_delta_time: 0.25,
        }
    }
}

impl Config for WorldConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("scene_engine_{}_{name}", std::process::id()))
    }

    #[test]
    fn test_world_config_toml_round_trip() {
        let path = temp_path("world.toml");
        let config = WorldConfig { time_scale: 0.5, max_delta_time: 0.1 };
        config.save_to_file(&path).expect("save");
        let loaded = WorldConfig::load_from_file(&path).expect("load");
        assert_eq!(loaded, config);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_world_config_ron_round_trip() {
        let path = temp_path("world.ron");
        let config = WorldConfig { time_scale: 2.0, max_delta_time: 0.05 };
        config.save_to_file(&path).expect("save");
        let loaded = WorldConfig::load_from_file(&path).expect("load");
        assert_eq!(loaded, config);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let config: WorldConfig = toml::from_str("time_scale = 3.0").expect("parse");
        assert_eq!(config.time_scale, 3.0);
        assert_eq!(config.max_delta_time, WorldConfig::default().max_delta_time);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = WorldConfig::default().save_to_file(temp_path("world.json")).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }
}
