//! Scene configuration.
//!
//! Every tweakable constant of the scene (asset paths, text layout, torus shape,
//! scatter bounds, animation rates, camera) lives here. All structs use
//! `#[serde(default)]`, so a TOML file only has to name the values it overrides:
//!
//! ```toml
//! [scatter]
//! count = 1000
//!
//! [text]
//! content = "Hello!"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SceneError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SceneConfig {
    pub assets: AssetConfig,
    pub text: TextConfig,
    pub torus: TorusConfig,
    pub scatter: ScatterConfig,
    pub animation: AnimationConfig,
    pub camera: CameraConfig,
    pub view: ViewConfig,
}

impl SceneConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SceneConfig =
            toml::from_str(content).map_err(|e| SceneError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load options from a TOML file. Missing fields use defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SceneError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| SceneError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(SceneError::Config(msg.to_string()));
        if !(self.scatter.spread >= 0.0) {
            return invalid("scatter.spread must be a non-negative number");
        }
        if self.torus.radial_segments < 3 || self.torus.tubular_segments < 3 {
            return invalid("torus needs at least 3 radial and 3 tubular segments");
        }
        if !(self.torus.radius > 0.0) || !(self.torus.tube > 0.0) {
            return invalid("torus radius and tube must be positive");
        }
        if self.text.content.trim().is_empty() {
            return invalid("text.content must contain at least one visible character");
        }
        if !(self.text.size > 0.0) {
            return invalid("text.size must be positive");
        }
        if self.text.depth < 0.0 || self.text.bevel_thickness < 0.0 {
            return invalid("text.depth and text.bevel_thickness must not be negative");
        }
        if self.text.curve_segments == 0 {
            return invalid("text.curve_segments must be at least 1");
        }
        if !(self.camera.near > 0.0) || self.camera.far <= self.camera.near {
            return invalid("camera planes must satisfy 0 < near < far");
        }
        if self.assets.timeout_ms == 0 {
            return invalid("assets.timeout_ms must be positive");
        }
        Ok(())
    }
}

/// Asset copy made by the build script, or `assets` under the working directory.
pub const DEFAULT_ASSET_ROOT: &str = match option_env!("MATCAP_FLOW_ASSET_DIR") {
    Some(dir) => dir,
    None => "assets",
};

/// Where the matcap texture and the typeface live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Directory the asset paths are resolved against (native only; wasm uses the page origin).
    pub asset_root: String,
    pub texture: String,
    pub font: String,
    /// Upper bound for each asset fetch. A font that does not arrive in time is an error.
    pub timeout_ms: u64,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            asset_root: DEFAULT_ASSET_ROOT.to_string(),
            texture: "textures/matcaps/10.png".to_string(),
            font: "fonts/blocky_regular.typeface.json".to_string(),
            timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    pub content: String,
    pub size: f32,
    /// Extrusion depth along +z.
    pub depth: f32,
    pub curve_segments: u32,
    pub bevel_enabled: bool,
    /// Extra depth added on both faces when `bevel_enabled` is set.
    pub bevel_thickness: f32,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            content: "3D Awesomeness!".to_string(),
            size: 0.5,
            depth: 0.2,
            curve_segments: 5,
            bevel_enabled: true,
            bevel_thickness: 0.02,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TorusConfig {
    pub radius: f32,
    pub tube: f32,
    pub radial_segments: u32,
    pub tubular_segments: u32,
}

impl Default for TorusConfig {
    fn default() -> Self {
        Self {
            radius: 0.3,
            tube: 0.2,
            radial_segments: 20,
            tubular_segments: 45,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScatterConfig {
    pub count: usize,
    /// Edge length of the cube the instances are spread over, centered at the origin.
    pub spread: f32,
    /// Fixed seed for reproducible layouts. `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for ScatterConfig {
    fn default() -> Self {
        Self {
            count: 400,
            spread: 10.0,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Radians per second around y for the text.
    pub text_yaw_rate: f32,
    /// Radians per second around x for the text.
    pub text_pitch_rate: f32,
    /// Upper bound of the random per-frame increment of each torus angle.
    pub bulk_jitter: f32,
    /// Wrap accumulated torus angles into `[0, 2π)`. Off keeps them unbounded.
    pub wrap_rotation: bool,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            text_yaw_rate: 0.15,
            text_pitch_rate: -0.2,
            bulk_jitter: 0.01,
            wrap_rotation: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_deg: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_deg: 75.0,
            near: 0.1,
            far: 100.0,
            position: [1.0, 1.0, 2.0],
            target: [0.0, 0.0, 0.0],
            damping: true,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub max_pixel_ratio: f64,
    pub clear_colour: [f64; 4],
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            title: "matcap-flow".to_string(),
            width: 1280,
            height: 720,
            max_pixel_ratio: 2.0,
            clear_colour: [0.0, 0.0, 0.0, 1.0],
        }
    }
}
