//! RGBA8 pixel buffers for tiles and frames.
//!
//! Colors are 0-1 floats in the shading code and 0-255 bytes on the wire.
//! Encoding clamps and rounds, so a decode of an encoded color is within
//! half a quantization step of the original.

use raytile_core::Color;
use serde::{Deserialize, Serialize};

/// A rectangular raster of packed RGBA8 pixels, row-major.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorBuffer {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// The full output image is just a big buffer.
pub type Frame = ColorBuffer;

/// Bytes needed for a `width` x `height` buffer, or `None` if that does
/// not fit in memory addressing.
pub fn byte_len(width: u32, height: u32) -> Option<usize> {
    (width as usize).checked_mul(height as usize)?.checked_mul(4)
}

/// Encode one 0-1 channel value as a byte.
#[inline]
pub fn encode_channel(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Decode one byte back into a 0-1 channel value.
#[inline]
pub fn decode_channel(value: u8) -> f32 {
    value as f32 / 255.0
}

impl ColorBuffer {
    /// Create a transparent black buffer.
    ///
    /// Sizes come from validated settings; see [`byte_len`] for the limit.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        }
    }

    /// True when `data` holds exactly `width * height` pixels.
    pub fn is_well_formed(&self) -> bool {
        self.data.len() == (self.width as usize) * (self.height as usize) * 4
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        self.index(x, y) * 4
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        x as usize + y as usize * self.width as usize
    }

    /// Store `color` with `alpha` at (x, y).
    pub fn set_color(&mut self, x: u32, y: u32, color: Color, alpha: f32) {
        let i = self.offset(x, y);
        self.data[i] = encode_channel(color.x);
        self.data[i + 1] = encode_channel(color.y);
        self.data[i + 2] = encode_channel(color.z);
        self.data[i + 3] = encode_channel(alpha);
    }

    /// Read the color and alpha stored at (x, y).
    pub fn read_color(&self, x: u32, y: u32) -> (Color, f32) {
        let [r, g, b, a] = self.pixels()[self.index(x, y)];
        (
            Color::new(decode_channel(r), decode_channel(g), decode_channel(b)),
            decode_channel(a),
        )
    }

    /// Pixels as `[r, g, b, a]` quads.
    pub fn pixels(&self) -> &[[u8; 4]] {
        bytemuck::cast_slice(&self.data)
    }

    /// Consume the buffer, returning the raw RGBA bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Copy `tile` into this buffer with its top-left corner at
    /// (`start_x`, `start_y`). Parts falling outside are clipped.
    pub fn composite(&mut self, tile: &ColorBuffer, start_x: u32, start_y: u32) {
        if start_x >= self.width || start_y >= self.height {
            return;
        }
        let cols = tile.width.min(self.width - start_x) as usize;
        let rows = tile.height.min(self.height - start_y);

        for row in 0..rows {
            let src = tile.offset(0, row);
            let dst = self.offset(start_x, start_y + row);
            self.data[dst..dst + cols * 4].copy_from_slice(&tile.data[src..src + cols * 4]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_round_trip_within_quantization() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut buffer = ColorBuffer::new(8, 8);

        for y in 0..8 {
            for x in 0..8 {
                let color = Color::new(rng.gen(), rng.gen(), rng.gen());
                let alpha: f32 = rng.gen();
                buffer.set_color(x, y, color, alpha);

                let (decoded, decoded_alpha) = buffer.read_color(x, y);
                assert!((decoded - color).abs().max_element() <= 1.0 / 255.0);
                assert!((decoded_alpha - alpha).abs() <= 1.0 / 255.0);
            }
        }
    }

    #[test]
    fn test_encode_clamps_out_of_range() {
        assert_eq!(encode_channel(1.7), 255);
        assert_eq!(encode_channel(-0.3), 0);
        assert_eq!(encode_channel(f32::NAN), 0);
    }

    #[test]
    fn test_pixel_layout() {
        let mut buffer = ColorBuffer::new(2, 1);
        buffer.set_color(1, 0, Color::new(1.0, 0.0, 0.0), 1.0);

        assert_eq!(buffer.data, vec![0, 0, 0, 0, 255, 0, 0, 255]);
        assert_eq!(buffer.pixels()[1], [255, 0, 0, 255]);
    }

    #[test]
    fn test_composite_places_tile() {
        let mut frame = ColorBuffer::new(4, 4);
        let mut tile = ColorBuffer::new(2, 2);
        for y in 0..2 {
            for x in 0..2 {
                tile.set_color(x, y, Color::new(0.0, 1.0, 0.0), 1.0);
            }
        }

        frame.composite(&tile, 2, 1);

        assert_eq!(frame.pixels()[2 + 4], [0, 255, 0, 255]);
        assert_eq!(frame.pixels()[3 + 2 * 4], [0, 255, 0, 255]);
        assert_eq!(frame.pixels()[1 + 4], [0, 0, 0, 0]);
        assert_eq!(frame.pixels()[2 + 3 * 4], [0, 0, 0, 0]);
    }

    #[test]
    fn test_composite_clips_at_edges() {
        let mut frame = ColorBuffer::new(3, 3);
        let mut tile = ColorBuffer::new(2, 2);
        tile.set_color(1, 1, Color::ONE, 1.0);
        tile.set_color(0, 0, Color::ONE, 1.0);

        frame.composite(&tile, 2, 2);
        assert_eq!(frame.pixels()[2 + 2 * 3], [255, 255, 255, 255]);

        // Entirely outside: no-op
        frame.composite(&tile, 3, 0);
        assert!(frame.is_well_formed());
    }

    #[test]
    fn test_well_formed() {
        let mut buffer = ColorBuffer::new(2, 2);
        assert!(buffer.is_well_formed());
        buffer.data.pop();
        assert!(!buffer.is_well_formed());
    }

    #[test]
    fn test_byte_len() {
        assert_eq!(byte_len(3, 2), Some(24));
        assert_eq!(byte_len(0, 100), Some(0));
        assert_eq!(byte_len(u32::MAX, u32::MAX), None);
    }
}
