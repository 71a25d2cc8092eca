//! Aggregate pixel statistics used by the heuristic analyzers

use image::RgbImage;

use super::config::SkinToneRule;
use super::error::ModerationError;

/// Whole-image statistics over every channel of every pixel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelStats {
    /// Mean channel value on the 0-255 scale
    pub mean_brightness: f64,
    /// Population variance of channel values
    pub variance: f64,
    /// Scaled fraction of skin-tone pixels, capped at 1.0
    pub skin_tone_ratio: f64,
    /// width / height; no score depends on it yet
    #[cfg(test)]
    pub aspect_ratio: f64,
}

impl PixelStats {
    /// 1.0 for a black image, 0.0 for a white one
    pub fn darkness(&self) -> f64 {
        1.0 - self.mean_brightness / 255.0
    }
}

/// Compute statistics in a single pass.
///
/// Sums are kept as integers so the variance is exact before the final
/// division.
pub fn compute(pixels: &RgbImage, skin_tone: &SkinToneRule) -> Result<PixelStats, ModerationError> {
    let (width, height) = pixels.dimensions();
    if width == 0 || height == 0 {
        return Err(ModerationError::invalid_image(format!(
            "image has no pixels ({}x{})",
            width, height
        )));
    }

    let mut sum: u128 = 0;
    let mut sum_sq: u128 = 0;
    let mut skin_pixels: u64 = 0;

    for pixel in pixels.pixels() {
        let [r, g, b] = pixel.0;
        for channel in [r, g, b] {
            let v = channel as u128;
            sum += v;
            sum_sq += v * v;
        }
        if skin_tone.matches(r, g, b) {
            skin_pixels += 1;
        }
    }

    let pixel_count = width as u64 * height as u64;
    let samples = pixel_count as u128 * 3;

    let mean_brightness = sum as f64 / samples as f64;
    // n * sum(x^2) - sum(x)^2 is never negative for integer samples
    let variance = (samples * sum_sq - sum * sum) as f64 / (samples * samples) as f64;
    let skin_fraction = skin_pixels as f64 / pixel_count as f64;

    Ok(PixelStats {
        mean_brightness,
        variance,
        skin_tone_ratio: (skin_fraction * skin_tone.ratio_scale).min(1.0),
        #[cfg(test)]
        aspect_ratio: width as f64 / height as f64,
    })
}
