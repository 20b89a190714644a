//! World configuration

use std::fs;
use std::path::Path;

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::ecs::PipelineMode;

/// Configuration for building an `EcsWorld`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Mode the pipeline starts in
    pub initial_mode: PipelineMode,
    /// Camera used for rendering when no entity is the active camera
    pub default_camera: DefaultCamera,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            initial_mode: PipelineMode::Play,
            default_camera: DefaultCamera::default(),
        }
    }
}

impl WorldConfig {
    /// Set the initial pipeline mode
    pub fn with_initial_mode(mut self, mode: PipelineMode) -> Self {
        self.initial_mode = mode;
        self
    }

    /// Set the fallback camera placement
    pub fn with_default_camera(mut self, position: Vec3, target: Vec3) -> Self {
        self.default_camera.position = position;
        self.default_camera.target = target;
        self
    }

    /// Set the fallback camera lens
    pub fn with_default_lens(
        mut self,
        fov: f32,
        aspect_ratio: f32,
        near_plane: f32,
        far_plane: f32,
    ) -> Self {
        self.default_camera.fov = fov;
        self.default_camera.aspect_ratio = aspect_ratio;
        self.default_camera.near_plane = near_plane;
        self.default_camera.far_plane = far_plane;
        self
    }

    /// Parse a config from RON text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid config
    pub fn from_ron_str(content: &str) -> Result<Self, ConfigError> {
        ron::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load a config from a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_ron_str(&content)
    }

    /// Save the config to a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails
    pub fn save_ron(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let content = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;
        fs::write(path, content).map_err(|e| ConfigError::Io(e.to_string()))
    }
}

/// Fallback camera placement and lens
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultCamera {
    pub position: Vec3,
    pub target: Vec3,
    /// Vertical field of view in degrees
    pub fov: f32,
    pub aspect_ratio: f32,
    pub near_plane: f32,
    pub far_plane: f32,
}

impl Default for DefaultCamera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 10.0),
            target: Vec3::ZERO,
            fov: 45.0,
            aspect_ratio: 16.0 / 9.0,
            near_plane: 0.1,
            far_plane: 100.0,
        }
    }
}

impl DefaultCamera {
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh_gl(
            self.fov.to_radians(),
            self.aspect_ratio,
            self.near_plane,
            self.far_plane,
        )
    }
}

/// Errors that can occur loading or saving a config
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// IO error
    Io(String),
    /// RON text did not describe a config
    Parse(String),
    /// Config could not be written as RON
    Serialize(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {e}"),
            Self::Parse(e) => write!(f, "Config parse error: {e}"),
            Self::Serialize(e) => write!(f, "Config serialization error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = WorldConfig::default()
            .with_initial_mode(PipelineMode::Edit)
            .with_default_camera(Vec3::new(0.0, 0.0, 10.0), Vec3::Y)
            .with_default_lens(60.0, 1.0, 0.5, 50.0);

        assert_eq!(config.initial_mode, PipelineMode::Edit);
        assert_eq!(config.default_camera.target, Vec3::Y);
        assert_eq!(config.default_camera.fov, 60.0);
    }

    #[test]
    fn test_partial_ron_fills_defaults() {
        let config = WorldConfig::from_ron_str("(initial_mode: Edit)").unwrap();
        assert_eq!(config.initial_mode, PipelineMode::Edit);
        assert_eq!(config.default_camera, DefaultCamera::default());
    }

    #[test]
    fn test_ron_round_trip() {
        let config =
            WorldConfig::default().with_default_camera(Vec3::new(1.0, 2.0, 3.0), Vec3::ZERO);
        let text = ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::default())
            .unwrap();
        assert_eq!(WorldConfig::from_ron_str(&text).unwrap(), config);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            WorldConfig::from_ron_str("(initial_mode: Paused)"),
            Err(ConfigError::Parse(_))
        ));
        let err = WorldConfig::load_ron("/nonexistent/world.ron").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
        assert!(err.to_string().starts_with("IO error"));
    }
}
