//! Sub-pixel sampling.
//!
//! Rate `k` takes `k + 1` samples along the pixel's diagonal at offsets
//! `i / (k + 1)`, `i = 0..=k`, and averages them. Rate 0 is the single
//! sample at the pixel's top-left corner.

use raytile_core::Color;
use raytile_math::Vec2;

use crate::hittable::IntersectionOracle;
use crate::shading::Shader;

/// Highest supported supersampling rate.
pub const MAX_SUPER_SAMPLING_RATE: u32 = 3;

/// NDC positions sampled for pixel (`x`, `y`) of a `width` x `height` image.
pub fn sample_positions(x: u32, y: u32, width: u32, height: u32, rate: u32) -> impl Iterator<Item = Vec2> {
    let n = rate.min(MAX_SUPER_SAMPLING_RATE) + 1;
    let span_x = (width.max(1) * n) as f32;
    let span_y = (height.max(1) * n) as f32;

    (0..n).map(move |i| {
        let ndc_x = (n * x + i) as f32 / span_x * 2.0 - 1.0;
        let ndc_y = (n * y + i) as f32 / span_y * 2.0 - 1.0;
        // Image rows grow downward, NDC y grows upward.
        Vec2::new(ndc_x, -ndc_y)
    })
}

/// Average of `evaluate` over the sample positions of a pixel.
pub fn supersample<F>(x: u32, y: u32, width: u32, height: u32, rate: u32, mut evaluate: F) -> Color
where
    F: FnMut(Vec2) -> Color,
{
    let mut sum = Color::ZERO;
    let mut count = 0;
    for ndc in sample_positions(x, y, width, height, rate) {
        sum += evaluate(ndc);
        count += 1;
    }
    sum / count as f32
}

/// Final color of pixel (`x`, `y`).
pub fn render_pixel<O: IntersectionOracle + ?Sized>(
    shader: &Shader<'_, O>,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
) -> Color {
    let rate = shader.params().super_sampling_rate;
    supersample(x, y, width, height, rate, |ndc| shader.evaluate_primary_ray(ndc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_zero_is_pixel_corner() {
        let samples: Vec<Vec2> = sample_positions(0, 0, 100, 50, 0).collect();
        assert_eq!(samples, vec![Vec2::new(-1.0, 1.0)]);

        let samples: Vec<Vec2> = sample_positions(50, 25, 100, 50, 0).collect();
        assert_eq!(samples, vec![Vec2::new(0.0, 0.0)]);
    }

    #[test]
    fn test_rate_counts() {
        for rate in 0..=3 {
            assert_eq!(sample_positions(3, 4, 10, 10, rate).count(), rate as usize + 1);
        }
        // Clamped above the supported maximum
        assert_eq!(sample_positions(3, 4, 10, 10, 9).count(), 4);
    }

    #[test]
    fn test_diagonal_offsets() {
        let samples: Vec<Vec2> = sample_positions(1, 2, 10, 10, 1).collect();
        // (2*1 + i) / 20 * 2 - 1 and the same for y = 2
        assert!((samples[0] - Vec2::new(-0.8, 0.6)).length() < 1e-6);
        assert!((samples[1] - Vec2::new(-0.7, 0.5)).length() < 1e-6);
    }

    #[test]
    fn test_rate_two_averages_three_samples() {
        let colors = [
            Color::new(0.9, 0.0, 0.3),
            Color::new(0.0, 0.6, 0.3),
            Color::new(0.3, 0.3, 0.9),
        ];
        let mut next = colors.iter();

        let color = supersample(5, 5, 10, 10, 2, |_| *next.next().unwrap());

        let expected = (colors[0] + colors[1] + colors[2]) / 3.0;
        assert!((color - expected).length() < 1e-6);
        assert!(next.next().is_none());
    }
}
