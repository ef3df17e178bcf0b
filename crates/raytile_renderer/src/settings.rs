//! Render settings: the knobs of the control panel.
//!
//! Settings are plain serde data so they can come from a JSON file with
//! the same camelCase keys the worker protocol uses. Values are checked
//! by [`RenderSettings::validate`] before a render starts.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codec::byte_len;
use crate::job::ShadingParams;
use crate::supersample::MAX_SUPER_SAMPLING_RATE;
use crate::tile::{tile_size_from_exponent, DEFAULT_TILE_EXPONENT, MAX_TILE_EXPONENT, MIN_TILE_EXPONENT};

pub const MAX_RECURSION_DEPTH: u32 = 5;
pub const MIN_WORKERS: usize = 1;
pub const MAX_WORKERS: usize = 32;
pub const MIN_PHONG_MAGNITUDE: f32 = 1.0;
pub const MAX_PHONG_MAGNITUDE: f32 = 100.0;
/// Largest accepted output width or height, in pixels.
pub const MAX_IMAGE_DIMENSION: u32 = 16384;

/// Errors from loading or checking settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid settings file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{name} = {value} is outside {min}..={max}")]
    OutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Image size {width}x{height} is empty")]
    EmptyImage { width: u32, height: u32 },

    #[error("Image size {width}x{height} exceeds {max}x{max}")]
    ImageTooLarge { width: u32, height: u32, max: u32 },
}

/// Result type for settings operations.
pub type SettingsResult<T> = Result<T, SettingsError>;

/// Everything configurable about a render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderSettings {
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    #[serde(flatten)]
    pub shading: ShadingParams,
    /// Tile edge is `2^section_width` pixels
    pub section_width: u32,
    /// Number of worker threads
    pub worker_count: usize,
    /// How often the worker pool is resized, in milliseconds
    pub pool_interval_ms: u64,
    /// Re-dispatch missing tiles after this long without progress.
    /// `None` waits forever.
    pub stall_timeout_ms: Option<u64>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 960,
            height: 720,
            shading: ShadingParams::default(),
            section_width: DEFAULT_TILE_EXPONENT,
            worker_count: 15,
            pool_interval_ms: 1000,
            stall_timeout_ms: None,
        }
    }
}

fn check_range(name: &'static str, value: f64, min: f64, max: f64) -> SettingsResult<()> {
    if value < min || value > max || value.is_nan() {
        return Err(SettingsError::OutOfRange { name, value, min, max });
    }
    Ok(())
}

impl RenderSettings {
    /// Load settings from a JSON file. Missing keys keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> SettingsResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let settings: Self = serde_json::from_str(&text)?;
        log::debug!("Loaded settings from {}", path.as_ref().display());
        Ok(settings)
    }

    /// Check every value against its allowed range.
    pub fn validate(&self) -> SettingsResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(SettingsError::EmptyImage {
                width: self.width,
                height: self.height,
            });
        }
        if self.width > MAX_IMAGE_DIMENSION
            || self.height > MAX_IMAGE_DIMENSION
            || byte_len(self.width, self.height).is_none()
        {
            return Err(SettingsError::ImageTooLarge {
                width: self.width,
                height: self.height,
                max: MAX_IMAGE_DIMENSION,
            });
        }
        check_range(
            "superSamplingRate",
            self.shading.super_sampling_rate as f64,
            0.0,
            MAX_SUPER_SAMPLING_RATE as f64,
        )?;
        check_range(
            "maxRecursionDepth",
            self.shading.max_recursion_depth as f64,
            0.0,
            MAX_RECURSION_DEPTH as f64,
        )?;
        check_range(
            "phongMagnitude",
            self.shading.phong_magnitude as f64,
            MIN_PHONG_MAGNITUDE as f64,
            MAX_PHONG_MAGNITUDE as f64,
        )?;
        check_range(
            "sectionWidth",
            self.section_width as f64,
            MIN_TILE_EXPONENT as f64,
            MAX_TILE_EXPONENT as f64,
        )?;
        check_range(
            "workerCount",
            self.worker_count as f64,
            MIN_WORKERS as f64,
            MAX_WORKERS as f64,
        )?;
        Ok(())
    }

    /// Tile edge length in pixels.
    pub fn tile_size(&self) -> u32 {
        tile_size_from_exponent(self.section_width)
    }

    pub fn pool_interval(&self) -> Duration {
        Duration::from_millis(self.pool_interval_ms)
    }

    pub fn stall_timeout(&self) -> Option<Duration> {
        self.stall_timeout_ms.map(Duration::from_millis)
    }
}
