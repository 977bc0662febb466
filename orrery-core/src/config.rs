/// Viewer configuration, read from an optional TOML file
use std::path::{Path, PathBuf};

use log::info;
use serde::Deserialize;

use crate::body::BodyGenerator;
use crate::error::ConfigError;
use crate::projection::{CameraSpeeds, CameraState, Projection};
use crate::vector::Vec3;

/// Looked up in the working directory at startup
pub const DEFAULT_CONFIG_PATH: &str = "orrery.toml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub scene: SceneConfig,
    pub camera: CameraConfig,
    pub display: DisplayConfig,
}

/// What to load and how many bodies to scatter
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub mesh_path: PathBuf,
    pub texture_path: PathBuf,
    pub body_count: usize,
    pub sun_scale: f32,
    pub sun_self_speed: f32,
    /// Fixed seed for body placement; entropy when absent
    pub seed: Option<u64>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            mesh_path: PathBuf::from("model.obj"),
            texture_path: PathBuf::from("model_diffuse.png"),
            body_count: 100,
            sun_scale: 4.0,
            sun_self_speed: 0.2,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub yaw: f32,
    pub pitch: f32,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub move_speed: f32,
    pub rotation_speed: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 3.0, 12.0],
            yaw: -90.0,
            pitch: -15.0,
            fov_degrees: 60.0,
            near: 0.1,
            far: 1000.0,
            move_speed: 7.0,
            rotation_speed: 50.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub target_fps: u32,
    pub clear_color: [f32; 3],
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            target_fps: 60,
            clear_color: [0.02, 0.02, 0.05],
        }
    }
}

impl ViewerConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Load `path` if it exists, otherwise fall back to the defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            info!("Loading configuration from {}", path.display());
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn camera_state(&self) -> CameraState {
        let [x, y, z] = self.camera.position;
        CameraState::new(Vec3::new(x, y, z), self.camera.yaw, self.camera.pitch)
    }

    pub fn camera_speeds(&self) -> CameraSpeeds {
        CameraSpeeds {
            movement: self.camera.move_speed,
            rotation: self.camera.rotation_speed,
        }
    }

    pub fn projection(&self) -> Projection {
        Projection {
            fov_y_degrees: self.camera.fov_degrees,
            near: self.camera.near,
            far: self.camera.far,
        }
    }

    pub fn body_generator(&self) -> BodyGenerator {
        BodyGenerator {
            count: self.scene.body_count,
            sun_scale: self.scene.sun_scale,
            sun_self_speed: self.scene.sun_self_speed,
            ..BodyGenerator::default()
        }
    }
}
