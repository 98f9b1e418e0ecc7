use std::f32::consts::FRAC_PI_2;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ViewerError};

/// Largest viewport edge; the 2D texture limit of `wgpu::Limits::default()`
pub const MAX_VIEWPORT_DIMENSION: u32 = 8192;

/// Size of the drawing region in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub width: u32,
    pub height: u32,
}

impl ViewportConfig {
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 500,
            height: 500,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 75.0,
            near: 0.1,
            far: 500.0,
            position: [0.0, 1.0, 5.0],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightsConfig {
    pub ambient_color: [f32; 3],
    pub ambient_intensity: f32,
    pub directional_color: [f32; 3],
    pub directional_intensity: f32,
    /// Light sits here and shines towards the origin
    pub directional_position: [f32; 3],
}

impl Default for LightsConfig {
    fn default() -> Self {
        Self {
            ambient_color: [1.0, 1.0, 1.0],
            ambient_intensity: 1.0,
            directional_color: [1.0, 1.0, 1.0],
            directional_intensity: 0.5,
            directional_position: [5.0, 5.0, 5.0],
        }
    }
}

/// Orbit control tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    /// Fraction of velocity consumed per update, in (0, 1]
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub min_radius: f32,
    pub max_radius: f32,
    pub min_polar: f32,
    pub max_polar: f32,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            damping_factor: 0.25,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            min_radius: 0.5,
            max_radius: 100.0,
            min_polar: 0.0,
            max_polar: FRAC_PI_2,
        }
    }
}

/// Fixed rotation/scale given to every model after centring
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresentationConfig {
    /// Radians about +Y
    pub rotation_y: f32,
    pub scale: [f32; 3],
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            rotation_y: FRAC_PI_2,
            scale: [30.0, 15.0, 15.0],
        }
    }
}

/// Complete viewer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub model_url: String,
    pub viewport: ViewportConfig,
    pub clear_color: [f32; 4],
    pub camera: CameraConfig,
    pub lights: LightsConfig,
    pub controls: ControlsConfig,
    pub presentation: PresentationConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            model_url: "model/scene.gltf".to_string(),
            viewport: ViewportConfig::default(),
            clear_color: [1.0, 1.0, 1.0, 1.0],
            camera: CameraConfig::default(),
            lights: LightsConfig::default(),
            controls: ControlsConfig::default(),
            presentation: PresentationConfig::default(),
        }
    }
}

impl ViewerConfig {
    /// Reads a JSON config; missing fields take their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ViewerError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| ViewerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let fail = |msg: &str| Err(ViewerError::Config(msg.to_string()));

        if self.viewport.width == 0 || self.viewport.height == 0 {
            return fail("viewport must be non-empty");
        }
        if self.viewport.width.max(self.viewport.height) > MAX_VIEWPORT_DIMENSION {
            return fail("viewport exceeds the 8192 pixel texture limit");
        }
        if !(self.camera.near > 0.0 && self.camera.near < self.camera.far) {
            return fail("camera requires 0 < near < far");
        }
        if !(self.camera.fov_degrees > 0.0 && self.camera.fov_degrees < 180.0) {
            return fail("camera fov must be in (0, 180) degrees");
        }

        let c = &self.controls;
        if !(c.damping_factor > 0.0 && c.damping_factor <= 1.0) {
            return fail("damping factor must be in (0, 1]");
        }
        if !(c.min_radius > 0.0 && c.min_radius <= c.max_radius) {
            return fail("radius bounds require 0 < min <= max");
        }
        if !(0.0 <= c.min_polar && c.min_polar <= c.max_polar && c.max_polar <= FRAC_PI_2) {
            return fail("polar bounds must lie within [0, pi/2]");
        }
        if self.presentation.scale.iter().any(|s| !s.is_finite() || *s == 0.0) {
            return fail("presentation scale must be finite and non-zero");
        }

        Ok(())
    }
}
