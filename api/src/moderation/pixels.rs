//! Pixel buffer intake: color-mode normalization, plus raw buffers for tests

use image::{DynamicImage, RgbImage};
#[cfg(test)]
use image::{GrayAlphaImage, GrayImage, RgbaImage};

use super::error::ModerationError;

/// Channel layout of a raw 8-bit pixel buffer
#[cfg(test)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLayout {
    Rgb8,
    Rgba8,
    Luma8,
    LumaA8,
}

#[cfg(test)]
impl PixelLayout {
    pub fn channels(self) -> usize {
        match self {
            PixelLayout::Rgb8 => 3,
            PixelLayout::Rgba8 => 4,
            PixelLayout::Luma8 => 1,
            PixelLayout::LumaA8 => 2,
        }
    }
}

/// Build an image from a raw interleaved buffer.
///
/// Fails with `InvalidImage` if either dimension is zero or the buffer length
/// does not equal `width * height * channels`.
#[cfg(test)]
pub fn from_raw(
    width: u32,
    height: u32,
    layout: PixelLayout,
    data: Vec<u8>,
) -> Result<DynamicImage, ModerationError> {
    ensure_non_empty(width, height)?;

    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(layout.channels()))
        .ok_or_else(|| {
            ModerationError::invalid_image(format!("dimensions {}x{} overflow", width, height))
        })?;

    if data.len() != expected {
        return Err(ModerationError::invalid_image(format!(
            "buffer holds {} bytes, {}x{} {:?} needs {}",
            data.len(),
            width,
            height,
            layout,
            expected
        )));
    }

    let image = match layout {
        PixelLayout::Rgb8 => RgbImage::from_raw(width, height, data).map(DynamicImage::ImageRgb8),
        PixelLayout::Rgba8 => {
            RgbaImage::from_raw(width, height, data).map(DynamicImage::ImageRgba8)
        }
        PixelLayout::Luma8 => GrayImage::from_raw(width, height, data).map(DynamicImage::ImageLuma8),
        PixelLayout::LumaA8 => {
            GrayAlphaImage::from_raw(width, height, data).map(DynamicImage::ImageLumaA8)
        }
    };

    image.ok_or_else(|| ModerationError::invalid_image("inconsistent pixel buffer dimensions"))
}

/// Normalize any decoded image to 8-bit RGB, rejecting empty images.
///
/// RGB input is moved through without copying.
pub fn into_rgb(image: DynamicImage) -> Result<RgbImage, ModerationError> {
    ensure_non_empty(image.width(), image.height())?;
    Ok(image.into_rgb8())
}

/// Cheap size check, usable before any pixel is touched
pub fn ensure_non_empty(width: u32, height: u32) -> Result<(), ModerationError> {
    if width == 0 || height == 0 {
        return Err(ModerationError::invalid_image(format!(
            "image has no pixels ({}x{})",
            width, height
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_rgb_buffer_round_trips_dimensions() {
        let image = from_raw(2, 3, PixelLayout::Rgb8, vec![7; 18]).unwrap();
        assert_eq!((image.width(), image.height()), (2, 3));
        assert!(matches!(image, DynamicImage::ImageRgb8(_)));
    }

    #[test]
    fn short_buffer_is_invalid() {
        let err = from_raw(4, 4, PixelLayout::Rgba8, vec![0; 63]).unwrap_err();
        assert!(err.is_invalid_image());
        assert!(err.to_string().contains("needs 64"));
    }

    #[test]
    fn zero_dimension_is_invalid() {
        assert!(from_raw(0, 4, PixelLayout::Rgb8, vec![]).unwrap_err().is_invalid_image());
        assert!(from_raw(4, 0, PixelLayout::Luma8, vec![]).unwrap_err().is_invalid_image());
    }

    #[test]
    fn grayscale_converts_to_rgb() {
        let image = from_raw(2, 1, PixelLayout::Luma8, vec![10, 200]).unwrap();
        let rgb = into_rgb(image).unwrap();
        assert_eq!(rgb.get_pixel(0, 0).0, [10, 10, 10]);
        assert_eq!(rgb.get_pixel(1, 0).0, [200, 200, 200]);
    }

    #[test]
    fn rgba_drops_alpha() {
        let image = from_raw(1, 1, PixelLayout::Rgba8, vec![1, 2, 3, 0]).unwrap();
        let rgb = into_rgb(image).unwrap();
        assert_eq!(rgb.get_pixel(0, 0).0, [1, 2, 3]);
    }

    #[test]
    fn empty_decoded_image_is_rejected() {
        let err = into_rgb(DynamicImage::new_rgb8(0, 0)).unwrap_err();
        assert!(err.is_invalid_image());
    }
}
