use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use tracing::{error, info};

use crate::error::RenderError;

const SETTINGS_FILE: &str = "raycaster";
const ENV_PREFIX: &str = "RAYCASTER";

/// Screen geometry, camera and movement tuning.
///
/// Loaded from defaults, then an optional `raycaster.toml`, then
/// `RAYCASTER_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub width: usize,
    pub height: usize,
    pub fov_degrees: f32,
    pub num_rays: usize,
    pub max_depth: usize,
    pub texture_size: usize,
    pub floor_plane: f32,
    pub move_speed: f32,
    pub turn_speed: f32,
    pub fps_cap: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            width: 960,
            height: 540,
            fov_degrees: 60.0,
            num_rays: 480,
            max_depth: 20,
            texture_size: 64,
            floor_plane: 0.66,
            move_speed: 2.5,
            turn_speed: 2.0,
            fps_cap: 60,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        info!("Loading settings from {}.toml and {}_* environment", SETTINGS_FILE, ENV_PREFIX);

        let d = Settings::default();
        let settings = Config::builder()
            .set_default("width", d.width as i64)?
            .set_default("height", d.height as i64)?
            .set_default("fov_degrees", d.fov_degrees as f64)?
            .set_default("num_rays", d.num_rays as i64)?
            .set_default("max_depth", d.max_depth as i64)?
            .set_default("texture_size", d.texture_size as i64)?
            .set_default("floor_plane", d.floor_plane as f64)?
            .set_default("move_speed", d.move_speed as f64)?
            .set_default("turn_speed", d.turn_speed as f64)?
            .set_default("fps_cap", d.fps_cap as i64)?
            .add_source(File::new(SETTINGS_FILE, FileFormat::Toml).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .and_then(|c| c.try_deserialize::<Settings>());

        match settings {
            Ok(settings) => {
                info!("Settings loaded: {:?}", settings);
                Ok(settings)
            }
            Err(e) => {
                error!("Failed to load settings: {}", e);
                Err(e)
            }
        }
    }

    pub fn validate(&self) -> Result<(), RenderError> {
        if self.width == 0 || self.height < 4 {
            return Err(RenderError::InvalidSettings("screen must be at least 1x4 pixels"));
        }
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return Err(RenderError::InvalidSettings("fov_degrees must be in (0, 180)"));
        }
        if self.num_rays == 0 || self.num_rays > self.width {
            return Err(RenderError::InvalidSettings("num_rays must be in 1..=width"));
        }
        if self.width % self.num_rays != 0 {
            return Err(RenderError::InvalidSettings("width must be a multiple of num_rays"));
        }
        if self.max_depth == 0 {
            return Err(RenderError::InvalidSettings("max_depth must be positive"));
        }
        if self.texture_size == 0 {
            return Err(RenderError::InvalidSettings("texture_size must be positive"));
        }
        if !(self.floor_plane > 0.0) {
            return Err(RenderError::InvalidSettings("floor_plane must be positive"));
        }
        if self.fps_cap == 0 {
            return Err(RenderError::InvalidSettings("fps_cap must be positive"));
        }
        Ok(())
    }

    /// Same view at `1 / divisor` of the resolution and ray count.
    pub fn scaled(&self, divisor: usize) -> Self {
        let divisor = divisor.max(1);
        Self {
            width: self.width / divisor,
            height: self.height / divisor,
            num_rays: self.num_rays / divisor,
            ..self.clone()
        }
    }

    #[inline]
    pub fn half_fov(&self) -> f32 {
        0.5 * self.fov_degrees.to_radians()
    }

    #[inline]
    pub fn half_height(&self) -> usize {
        self.height / 2
    }

    /// Distance to the projection plane so that the FOV spans the full width.
    #[inline]
    pub fn screen_dist(&self) -> f32 {
        0.5 * self.width as f32 / self.half_fov().tan()
    }

    /// Screen pixels covered by one ray.
    #[inline]
    pub fn column_width(&self) -> usize {
        self.width / self.num_rays
    }
}
