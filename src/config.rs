//! TOML render configuration.
//!
//! ```toml
//! [render]
//! width = 400
//! height = 200
//! max_depth = 3
//!
//! [camera]
//! position = [0.0, 0.0, 0.0]
//! yaw = 3.141592653589793
//! pitch = 0.0
//! fov = 90.0
//!
//! [lights]
//! light1_directional = false
//! light2_enabled = true
//! ```
//!
//! Every table and key is optional. A missing file is not an error.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::camera::Camera;
use crate::scene::{SceneError, SceneState};
use crate::tracer::MAX_DEPTH;

/// Config loading failures.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File exists but could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// File is not valid TOML for this schema
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        source: toml::de::Error,
    },
}

/// `[render]` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSection {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Bounce budget
    pub max_depth: u32,
}

impl Default for RenderSection {
    fn default() -> Self {
        Self {
            width: 400,
            height: 200,
            max_depth: MAX_DEPTH,
        }
    }
}

/// `[lights]` table: the two toggles exposed to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightsSection {
    /// Switch light 1 from a point light to a directional one
    pub light1_directional: bool,
    /// Enable light 2
    pub light2_enabled: bool,
}

impl Default for LightsSection {
    fn default() -> Self {
        Self {
            light1_directional: false,
            light2_enabled: true,
        }
    }
}

/// Whole configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Output size and depth
    pub render: RenderSection,
    /// Starting camera
    pub camera: Camera,
    /// Light toggles
    pub lights: LightsSection,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            render: RenderSection::default(),
            // Turned around so the reference spheres at -Z are in view
            camera: Camera {
                yaw: std::f64::consts::PI,
                ..Camera::default()
            },
            lights: LightsSection::default(),
        }
    }
}

impl RenderConfig {
    /// Load `path`, falling back to defaults when the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        Self::parse(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse TOML text and clamp the camera into its supported range.
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        let mut config: Self = toml::from_str(text)?;
        let clamped = config.camera.clamped();
        if clamped != config.camera {
            warn!(
                "Camera pitch/fov out of range ({}, {}), clamped to ({}, {})",
                config.camera.pitch, config.camera.fov, clamped.pitch, clamped.fov
            );
            config.camera = clamped;
        }
        Ok(config)
    }

    /// Reference scene with this config's camera and light toggles applied.
    pub fn scene_state(&self) -> Result<SceneState, SceneError> {
        let mut state = SceneState::new();
        state.set_camera(self.camera);
        state.set_light_directional(0, self.lights.light1_directional)?;
        state.set_light_enabled(1, self.lights.light2_enabled)?;
        Ok(state)
    }
}
