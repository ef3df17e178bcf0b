//! In-process render using rayon.
//!
//! Tiles are rendered in parallel on the rayon pool and composited into
//! the frame through the same codec the worker protocol uses, so the
//! result is pixel-identical to a coordinated render.

use rayon::prelude::*;

use raytile_core::{Scene, SceneResult};

use crate::codec::{ColorBuffer, Frame};
use crate::settings::RenderSettings;
use crate::shading::Shader;
use crate::tile::{render_tile, Tile, TileGrid};

/// Render the whole frame of `scene` with `settings`.
pub fn render_local(scene: &Scene, settings: &RenderSettings) -> SceneResult<Frame> {
    let (width, height) = (settings.width, settings.height);
    let shader = Shader::for_scene(scene, width, height, settings.shading.clone())?;
    let grid = TileGrid::new(width, height, settings.tile_size());

    let start = std::time::Instant::now();
    let tiles: Vec<Tile> = grid.tiles().collect();
    let rendered: Vec<(Tile, ColorBuffer)> = tiles
        .into_par_iter()
        .map(|tile| (tile, render_tile(&tile, &shader, width, height)))
        .collect();

    let mut frame = Frame::new(width, height);
    for (tile, data) in &rendered {
        frame.composite(data, tile.x, tile.y);
    }

    log::info!(
        "Rendered {}x{} locally ({} tiles) in {:.2?}",
        width,
        height,
        grid.total(),
        start.elapsed()
    );
    Ok(frame)
}
