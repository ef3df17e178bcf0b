//! Command line arguments.
//!
//! Every render setting can come from a JSON file (`--config`) and be
//! overridden by a flag. Flags left unset keep the file's value, or the
//! built-in default when there is no file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use raytile_renderer::RenderSettings;

#[derive(Parser, Debug, Clone)]
#[command(name = "raytile")]
#[command(about = "Render the raytile showcase scene to a PNG", long_about = None)]
pub struct Cli {
    /// Load render settings from a JSON file
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Where to write the rendered image
    #[arg(long, short = 'o', value_name = "PATH", default_value = "render.png")]
    pub output: PathBuf,

    /// Render in-process on the rayon pool instead of the worker pool
    #[arg(long)]
    pub local: bool,

    #[arg(long)]
    pub width: Option<u32>,

    #[arg(long)]
    pub height: Option<u32>,

    /// Sub-pixel samples minus one (0-3)
    #[arg(long, value_name = "RATE")]
    pub super_sampling_rate: Option<u32>,

    /// Maximum mirror bounces (0-5)
    #[arg(long, value_name = "DEPTH")]
    pub max_recursion_depth: Option<u32>,

    /// Specular multiplier (1-100)
    #[arg(long, value_name = "MAGNITUDE")]
    pub phong_magnitude: Option<f32>,

    /// Tile edge as a power of two (1-8)
    #[arg(long, value_name = "EXPONENT")]
    pub section_width: Option<u32>,

    /// Number of worker threads (1-32)
    #[arg(long, short = 'j', value_name = "COUNT")]
    pub workers: Option<usize>,

    /// Re-dispatch missing tiles after this many milliseconds without progress
    #[arg(long, value_name = "MS")]
    pub stall_timeout: Option<u64>,

    /// Shade with the first light only
    #[arg(long)]
    pub single_light: bool,

    #[arg(long)]
    pub no_diffuse: bool,

    #[arg(long)]
    pub no_phong: bool,

    #[arg(long)]
    pub no_mirrors: bool,
}

impl Cli {
    /// Settings from the config file (if any) with flag overrides applied,
    /// validated.
    pub fn settings(&self) -> Result<RenderSettings> {
        let mut settings = match &self.config {
            Some(path) => RenderSettings::load(path)
                .with_context(|| format!("Failed to load settings from {}", path.display()))?,
            None => RenderSettings::default(),
        };
        self.apply_to(&mut settings);
        settings.validate().context("Invalid render settings")?;
        Ok(settings)
    }

    fn apply_to(&self, settings: &mut RenderSettings) {
        if let Some(width) = self.width {
            settings.width = width;
        }
        if let Some(height) = self.height {
            settings.height = height;
        }
        if let Some(rate) = self.super_sampling_rate {
            settings.shading.super_sampling_rate = rate;
        }
        if let Some(depth) = self.max_recursion_depth {
            settings.shading.max_recursion_depth = depth;
        }
        if let Some(magnitude) = self.phong_magnitude {
            settings.shading.phong_magnitude = magnitude;
        }
        if let Some(exponent) = self.section_width {
            settings.section_width = exponent;
        }
        if let Some(workers) = self.workers {
            settings.worker_count = workers;
        }
        if self.stall_timeout.is_some() {
            settings.stall_timeout_ms = self.stall_timeout;
        }

        // Switches only ever turn features off
        if self.single_light {
            settings.shading.all_lights = false;
        }
        if self.no_diffuse {
            settings.shading.calc_diffuse = false;
        }
        if self.no_phong {
            settings.shading.calc_phong = false;
        }
        if self.no_mirrors {
            settings.shading.use_mirrors = false;
        }
    }
}
