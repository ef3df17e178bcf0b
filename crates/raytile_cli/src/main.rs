use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use raytile_core::{showcase, Scene};
use raytile_renderer::{render_local, Coordinator, Frame, RenderEvent, RenderSettings};

mod cli;

use cli::Cli;

/// How long the main loop sleeps between polls of the coordinator.
const POLL_INTERVAL: Duration = Duration::from_millis(5);

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::parse();
    let settings = cli.settings()?;
    let scene = showcase::scene();

    log::info!(
        "Rendering '{}' at {}x{} ({} objects, {} lights)",
        scene.name,
        settings.width,
        settings.height,
        scene.objects.len(),
        scene.lights.len()
    );

    let frame = if cli.local {
        render_local(&scene, &settings)?
    } else {
        render_coordinated(scene, settings)?
    };

    save_png(frame, &cli.output)?;
    log::info!("Wrote {}", cli.output.display());
    Ok(())
}

/// Drive the worker pool the way an interactive host would: poll, react
/// to events, repeat until the frame completes.
fn render_coordinated(scene: Scene, settings: RenderSettings) -> Result<Frame> {
    let mut coordinator = Coordinator::new(Arc::new(scene), settings)?;
    log::info!("Started {} workers", coordinator.worker_count());

    coordinator.request_render()?;
    let mut last_percent = 0;
    while coordinator.is_rendering() {
        for event in coordinator.poll()? {
            match event {
                RenderEvent::TileComposited { calculated, total, .. } => {
                    let percent = calculated * 100 / total.max(1);
                    if percent / 10 > last_percent / 10 {
                        log::info!("{}% ({}/{} tiles)", percent, calculated, total);
                    }
                    last_percent = percent;
                }
                RenderEvent::Completed { elapsed, .. } => {
                    log::info!("Render finished in {:.2?}", elapsed);
                }
            }
        }
        thread::sleep(POLL_INTERVAL);
    }

    Ok(coordinator.frame().clone())
}

fn save_png(frame: Frame, path: &Path) -> Result<()> {
    let (width, height) = (frame.width, frame.height);
    let image = image::RgbaImage::from_raw(width, height, frame.into_bytes())
        .context("Frame buffer does not match its dimensions")?;
    image
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
