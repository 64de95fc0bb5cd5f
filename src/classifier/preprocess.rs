// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Photo preprocessing: RGBA normalization, resize, and per-channel
//! standardization into the model's NHWC input layout.

use image::{imageops::FilterType, DynamicImage, RgbaImage};
use std::borrow::Cow;

/// Square input resolution expected by the model.
pub const INPUT_SIZE: u32 = 224;

/// Color channels fed to the model (RGB; alpha is discarded).
pub const CHANNELS: usize = 3;

/// Per-channel mean (ImageNet).
pub const CHANNEL_MEAN: [f32; CHANNELS] = [0.485, 0.456, 0.406];

/// Per-channel standard deviation (ImageNet).
pub const CHANNEL_STD: [f32; CHANNELS] = [0.229, 0.224, 0.225];

/// Flat, row-major model input: `height * width * 3` floats.
#[derive(Debug, Clone, PartialEq)]
pub struct InputTensor {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl InputTensor {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Tensor shape in NHWC order (batch of one).
    pub fn shape(&self) -> [usize; 4] {
        [1, self.height as usize, self.width as usize, CHANNELS]
    }

    /// Serialize as platform-native-endian f32 bytes, the layout runtimes
    /// that take raw buffers expect.
    pub fn to_ne_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.data.len() * std::mem::size_of::<f32>());
        for value in &self.data {
            bytes.extend_from_slice(&value.to_ne_bytes());
        }
        bytes
    }
}

/// Preprocessing errors (always caused by the input image).
#[derive(Debug, thiserror::Error)]
pub enum PreprocessError {
    #[error("Image has no pixels ({width}x{height})")]
    Empty { width: u32, height: u32 },
}

/// Standardize one RGB pixel: scale to [0,1], then `(x - mean) / std`.
pub fn normalize_pixel(rgb: [u8; CHANNELS]) -> [f32; CHANNELS] {
    let mut out = [0.0; CHANNELS];
    for c in 0..CHANNELS {
        let scaled = rgb[c] as f32 / 255.0;
        out[c] = (scaled - CHANNEL_MEAN[c]) / CHANNEL_STD[c];
    }
    out
}

/// Convert to RGBA8 if needed and resize to the model resolution.
///
/// Images already at `INPUT_SIZE` square are passed through untouched.
pub fn prepare_image(image: &DynamicImage) -> Result<RgbaImage, PreprocessError> {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Err(PreprocessError::Empty { width, height });
    }

    let rgba: Cow<'_, RgbaImage> = match image {
        DynamicImage::ImageRgba8(buf) => Cow::Borrowed(buf),
        other => Cow::Owned(other.to_rgba8()),
    };

    if width == INPUT_SIZE && height == INPUT_SIZE {
        return Ok(rgba.into_owned());
    }

    Ok(image::imageops::resize(
        &*rgba,
        INPUT_SIZE,
        INPUT_SIZE,
        FilterType::CatmullRom,
    ))
}

/// Pack an RGBA image into a normalized input tensor, row-major, three
/// floats per pixel.
pub fn pack_tensor(rgba: &RgbaImage) -> InputTensor {
    let (width, height) = rgba.dimensions();
    let mut data = Vec::with_capacity(width as usize * height as usize * CHANNELS);

    for pixel in rgba.pixels() {
        let [r, g, b, _a] = pixel.0;
        data.extend_from_slice(&normalize_pixel([r, g, b]));
    }

    InputTensor {
        width,
        height,
        data,
    }
}

/// Full preprocessing pipeline for one photo.
pub fn preprocess(image: &DynamicImage) -> Result<InputTensor, PreprocessError> {
    let prepared = prepare_image(image)?;
    Ok(pack_tensor(&prepared))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba};

    const EPSILON: f32 = 1e-5;

    fn assert_close(actual: [f32; 3], expected: [f32; 3]) {
        for c in 0..3 {
            assert!(
                (actual[c] - expected[c]).abs() < EPSILON,
                "channel {}: got {}, expected {}",
                c,
                actual[c],
                expected[c]
            );
        }
    }

    #[test]
    fn test_black_pixel_normalization() {
        let out = normalize_pixel([0, 0, 0]);
        assert_close(out, [-0.485 / 0.229, -0.456 / 0.224, -0.406 / 0.225]);
    }

    #[test]
    fn test_white_pixel_normalization() {
        let out = normalize_pixel([255, 255, 255]);
        assert_close(
            out,
            [
                (1.0 - 0.485) / 0.229,
                (1.0 - 0.456) / 0.224,
                (1.0 - 0.406) / 0.225,
            ],
        );
    }

    #[test]
    fn test_tensor_size_and_shape() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(640, 480, Rgb([10, 20, 30])));
        let tensor = preprocess(&img).unwrap();

        assert_eq!(tensor.data().len(), 224 * 224 * 3);
        assert_eq!(tensor.shape(), [1, 224, 224, 3]);
        assert_eq!(tensor.to_ne_bytes().len(), 224 * 224 * 3 * 4);
    }

    #[test]
    fn test_resize_idempotent_at_input_size() {
        let mut rgba = RgbaImage::new(INPUT_SIZE, INPUT_SIZE);
        for (x, y, pixel) in rgba.enumerate_pixels_mut() {
            *pixel = Rgba([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8, 255]);
        }

        let direct = pack_tensor(&rgba);
        let via_pipeline = preprocess(&DynamicImage::ImageRgba8(rgba)).unwrap();

        assert_eq!(direct.data().len(), via_pipeline.data().len());
        for (a, b) in direct.data().iter().zip(via_pipeline.data()) {
            assert!((a - b).abs() < EPSILON);
        }
    }

    #[test]
    fn test_non_rgba_input_is_converted() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(224, 224, Rgb([255, 255, 255])));
        let tensor = preprocess(&img).unwrap();

        let first: [f32; 3] = [tensor.data()[0], tensor.data()[1], tensor.data()[2]];
        assert_close(first, normalize_pixel([255, 255, 255]));
    }

    #[test]
    fn test_row_major_pixel_order() {
        let mut rgba = RgbaImage::from_pixel(INPUT_SIZE, INPUT_SIZE, Rgba([0, 0, 0, 255]));
        // Second pixel of the first row is white.
        rgba.put_pixel(1, 0, Rgba([255, 255, 255, 255]));

        let tensor = pack_tensor(&rgba);
        let second: [f32; 3] = [tensor.data()[3], tensor.data()[4], tensor.data()[5]];
        assert_close(second, normalize_pixel([255, 255, 255]));
    }

    #[test]
    fn test_empty_image_rejected() {
        let img = DynamicImage::new_rgba8(0, 0);
        assert!(matches!(
            preprocess(&img),
            Err(PreprocessError::Empty { .. })
        ));
    }
}
