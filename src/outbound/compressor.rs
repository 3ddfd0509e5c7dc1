use std::io::Cursor;

use image::{codecs::jpeg::JpegEncoder, imageops::FilterType, DynamicImage, GenericImageView};
use tracing::debug;

use crate::domain::{
    models::{CompressionOptions, PhotoError},
    ports::ImageCompressor,
};

/// Resizes a captured frame into its bounding box and re-encodes it as a
/// lossy JPEG. Downscale only; small images are still re-encoded at the
/// target quality.
#[derive(Debug, Default)]
pub struct JpegCompressor;

impl JpegCompressor {
    pub fn new() -> Self {
        Self
    }
}

/// Fit `width` x `height` into the configured box, preserving the aspect
/// ratio. The longer side picks which bound applies; nothing is ever
/// scaled up.
fn target_dimensions(width: u32, height: u32, options: &CompressionOptions) -> (u32, u32) {
    let aspect = f64::from(width) / f64::from(height);

    if width >= height {
        if width > options.max_width {
            let new_width = options.max_width;
            let new_height = (f64::from(new_width) / aspect).round() as u32;
            return (new_width, new_height.max(1));
        }
    } else if height > options.max_height {
        let new_height = options.max_height;
        let new_width = (f64::from(new_height) * aspect).round() as u32;
        return (new_width.max(1), new_height);
    }

    (width, height)
}

impl ImageCompressor for JpegCompressor {
    fn compress(&self, bytes: &[u8], options: &CompressionOptions) -> Result<Vec<u8>, PhotoError> {
        // Load the image from the raw bytes.
        let image = image::load_from_memory(bytes)
            .map_err(|e| PhotoError::DecodeFailure(e.to_string()))?;

        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(PhotoError::DecodeFailure(format!(
                "zero-dimension image ({width}x{height})"
            )));
        }

        let (new_width, new_height) = target_dimensions(width, height, options);
        let resized = if (new_width, new_height) == (width, height) {
            image
        } else {
            image.resize_exact(new_width, new_height, FilterType::Lanczos3)
        };

        // JPEG has no alpha channel, so flatten to RGB before encoding.
        let rgb = DynamicImage::ImageRgb8(resized.to_rgb8());

        let quality = (options.quality * 100.0).round().clamp(1.0, 100.0) as u8;

        // Create a buffer to hold the encoded image.
        let mut buffer = Vec::new();
        let mut cursor = Cursor::new(&mut buffer);

        rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut cursor, quality))
            .map_err(|e| PhotoError::DecodeFailure(e.to_string()))?;

        debug!(
            "compressed {width}x{height} -> {new_width}x{new_height} at quality {quality}, {} bytes",
            buffer.len()
        );
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::DeviceProfile;
    use image::RgbImage;
    use rand::Rng;

    /// A PNG-encoded gradient of the given dimensions.
    fn gradient_png(width: u32, height: u32) -> Vec<u8> {
        let image = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        });
        let mut buffer = Vec::new();
        DynamicImage::ImageRgb8(image)
            .write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
            .unwrap();
        buffer
    }

    fn noise_png(width: u32, height: u32) -> Vec<u8> {
        let mut rng = rand::thread_rng();
        let image = RgbImage::from_fn(width, height, |_, _| {
            image::Rgb([rng.gen(), rng.gen(), rng.gen()])
        });
        let mut buffer = Vec::new();
        DynamicImage::ImageRgb8(image)
            .write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
            .unwrap();
        buffer
    }

    fn decoded_dimensions(bytes: &[u8]) -> (u32, u32) {
        image::load_from_memory(bytes).unwrap().dimensions()
    }

    #[test]
    fn test_small_image_is_not_upscaled() {
        let options = CompressionOptions::for_profile(DeviceProfile::Desktop);
        let input = gradient_png(800, 600);

        let output = JpegCompressor::new().compress(&input, &options).unwrap();

        assert_eq!(decoded_dimensions(&output), (800, 600));
    }

    #[test]
    fn test_landscape_downscale_preserves_aspect_ratio() {
        let options = CompressionOptions::for_profile(DeviceProfile::Mobile);
        let input = gradient_png(3000, 2000);

        let output = JpegCompressor::new().compress(&input, &options).unwrap();

        // 3:2 at a 2048 bound.
        assert_eq!(decoded_dimensions(&output), (2048, 1365));
    }

    #[test]
    fn test_portrait_downscale_bounds_height() {
        let options = CompressionOptions::for_profile(DeviceProfile::Mobile);
        let input = gradient_png(2000, 3000);

        let output = JpegCompressor::new().compress(&input, &options).unwrap();

        assert_eq!(decoded_dimensions(&output), (1365, 2048));
    }

    #[test]
    fn test_aspect_ratio_within_one_pixel() {
        let options = CompressionOptions::for_profile(DeviceProfile::Desktop);
        let input = gradient_png(4000, 2250); // 16:9

        let output = JpegCompressor::new().compress(&input, &options).unwrap();
        let (width, height) = decoded_dimensions(&output);

        assert_eq!(width, 2560);
        let expected_height = f64::from(width) * 2250.0 / 4000.0;
        assert!((f64::from(height) - expected_height).abs() <= 1.0);
    }

    #[test]
    fn test_downscale_shrinks_payload() {
        let options = CompressionOptions::for_profile(DeviceProfile::Mobile);
        let input = noise_png(3000, 2000);

        let output = JpegCompressor::new().compress(&input, &options).unwrap();

        assert!(output.len() < input.len());
    }

    #[test]
    fn test_undecodable_bytes_fail_with_decode_error() {
        let options = CompressionOptions::default();
        let result = JpegCompressor::new().compress(b"definitely not an image", &options);

        assert!(matches!(result, Err(PhotoError::DecodeFailure(_))));
    }

    #[test]
    fn test_square_image_at_bound_is_untouched() {
        let options = CompressionOptions::for_profile(DeviceProfile::Mobile);
        let input = gradient_png(2048, 2048);

        let output = JpegCompressor::new().compress(&input, &options).unwrap();

        assert_eq!(decoded_dimensions(&output), (2048, 2048));
    }
}
