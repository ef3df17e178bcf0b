//! Tile partitioning.
//!
//! Divides the image into square tiles that can be rendered
//! independently. Tiles are indexed row-major and handed to workers in a
//! strided round-robin: worker `i` of `n` gets tiles `i, i+n, i+2n, ...`.

use crate::codec::ColorBuffer;
use crate::hittable::IntersectionOracle;
use crate::shading::Shader;
use crate::supersample::render_pixel;

/// Smallest and largest tile-size exponent (tile edge = 2^exponent).
pub const MIN_TILE_EXPONENT: u32 = 1;
pub const MAX_TILE_EXPONENT: u32 = 8;

/// Default tile-size exponent (64 px tiles).
pub const DEFAULT_TILE_EXPONENT: u32 = 6;

/// Tile edge length for an exponent, clamped to the supported range.
pub fn tile_size_from_exponent(exponent: u32) -> u32 {
    1 << exponent.clamp(MIN_TILE_EXPONENT, MAX_TILE_EXPONENT)
}

/// A rectangular region of the image to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    /// X coordinate of the tile's top-left corner
    pub x: u32,
    /// Y coordinate of the tile's top-left corner
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Row-major index in the grid
    pub index: usize,
}

impl Tile {
    /// Get the total number of pixels in this tile.
    pub fn pixel_count(&self) -> u32 {
        self.width * self.height
    }
}

/// The tile grid for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
    pub width: u32,
    pub height: u32,
    pub tile_size: u32,
    pub tiles_x: u32,
    pub tiles_y: u32,
}

impl TileGrid {
    /// Grid of `tile_size` tiles covering a `width` x `height` image.
    ///
    /// Edge tiles are clipped to the image, so the tiles are a disjoint
    /// cover of the frame.
    pub fn new(width: u32, height: u32, tile_size: u32) -> Self {
        let tile_size = tile_size.max(1);
        Self {
            width,
            height,
            tile_size,
            tiles_x: width.div_ceil(tile_size),
            tiles_y: height.div_ceil(tile_size),
        }
    }

    /// Total number of tiles.
    pub fn total(&self) -> usize {
        self.tiles_x as usize * self.tiles_y as usize
    }

    /// Tile at a row-major index. `index` must be below [`Self::total`].
    pub fn tile(&self, index: usize) -> Tile {
        let col = (index % self.tiles_x as usize) as u32;
        let row = (index / self.tiles_x as usize) as u32;
        let x = col * self.tile_size;
        let y = row * self.tile_size;
        Tile {
            x,
            y,
            width: self.tile_size.min(self.width - x),
            height: self.tile_size.min(self.height - y),
            index,
        }
    }

    /// All tiles, row-major.
    pub fn tiles(&self) -> impl Iterator<Item = Tile> + '_ {
        (0..self.total()).map(move |i| self.tile(i))
    }

    /// The strided share of worker `worker_index` out of `worker_count`.
    pub fn assigned(&self, worker_index: usize, worker_count: usize) -> impl Iterator<Item = Tile> + '_ {
        (worker_index..self.total())
            .step_by(worker_count.max(1))
            .map(move |i| self.tile(i))
    }
}

/// Render a single tile of a `width` x `height` frame.
///
/// Returns the tile's pixels, fully opaque, in a buffer of the tile's size.
pub fn render_tile<O: IntersectionOracle + ?Sized>(
    tile: &Tile,
    shader: &Shader<'_, O>,
    width: u32,
    height: u32,
) -> ColorBuffer {
    let mut buffer = ColorBuffer::new(tile.width, tile.height);

    for local_y in 0..tile.height {
        for local_x in 0..tile.width {
            let color = render_pixel(shader, tile.x + local_x, tile.y + local_y, width, height);
            buffer.set_color(local_x, local_y, color, 1.0);
        }
    }

    buffer
}
