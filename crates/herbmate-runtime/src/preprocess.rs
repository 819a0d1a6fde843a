//! Image decoding and normalisation
//!
//! Any decodable image becomes a `(1, 224, 224, 3)` tensor: forced to RGB,
//! squashed to 224x224 without preserving aspect ratio, and scaled to `[0, 1]`.

use herbmate_core::{ImageTensor, PredictError, PredictResult, INPUT_SIZE};
use image::imageops::{self, FilterType};
use image::DynamicImage;

/// Resampling filter used for the resize step (bicubic)
pub const RESIZE_FILTER: FilterType = FilterType::CatmullRom;

/// Decode raw bytes, guessing the format from the content
pub fn decode(bytes: &[u8]) -> PredictResult<DynamicImage> {
    image::load_from_memory(bytes).map_err(|e| PredictError::Decode(e.to_string()))
}

/// Convert a decoded image into the model input tensor
pub fn to_tensor(image: &DynamicImage) -> PredictResult<ImageTensor> {
    let rgb = image.to_rgb8();
    let size = INPUT_SIZE as u32;
    let resized = imageops::resize(&rgb, size, size, RESIZE_FILTER);

    ImageTensor::from_rgb_bytes(resized.as_raw()).ok_or_else(|| {
        PredictError::Inference(format!(
            "Resized image has {} values, expected {}",
            resized.as_raw().len(),
            ImageTensor::LEN
        ))
    })
}

/// Decode and normalise in one step
pub fn preprocess(bytes: &[u8]) -> PredictResult<ImageTensor> {
    let image = decode(bytes)?;
    to_tensor(&image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{
        GrayImage, ImageBuffer, ImageOutputFormat, Luma, LumaA, Rgb, RgbImage, Rgba, RgbaImage,
    };
    use std::io::Cursor;

    fn encode(image: DynamicImage, format: ImageOutputFormat) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        image.write_to(&mut buf, format).unwrap();
        buf.into_inner()
    }

    fn assert_valid(tensor: &ImageTensor) {
        assert_eq!(tensor.shape(), [1, 224, 224, 3]);
        assert_eq!(tensor.as_slice().len(), 224 * 224 * 3);
        assert!(tensor.as_slice().iter().all(|v| (0.0..=1.0).contains(v)));
    }

    fn gradient(width: u32, height: u32) -> RgbImage {
        ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x + y) % 256) as u8])
        })
    }

    #[test]
    fn test_rgb_png() {
        let bytes = encode(DynamicImage::ImageRgb8(gradient(300, 120)), ImageOutputFormat::Png);
        assert_valid(&preprocess(&bytes).unwrap());
    }

    #[test]
    fn test_rgb_jpeg() {
        let bytes = encode(
            DynamicImage::ImageRgb8(gradient(64, 48)),
            ImageOutputFormat::Jpeg(90),
        );
        assert_valid(&preprocess(&bytes).unwrap());
    }

    #[test]
    fn test_grayscale_png() {
        let gray: GrayImage = ImageBuffer::from_fn(50, 80, |x, _| Luma([(x * 5) as u8]));
        let bytes = encode(DynamicImage::ImageLuma8(gray), ImageOutputFormat::Png);
        let tensor = preprocess(&bytes).unwrap();
        assert_valid(&tensor);

        // Grey pixels expand to identical channels
        let px = &tensor.as_slice()[..3];
        assert_eq!(px[0], px[1]);
        assert_eq!(px[1], px[2]);
    }

    #[test]
    fn test_grayscale_alpha_png() {
        let image: ImageBuffer<LumaA<u8>, Vec<u8>> =
            ImageBuffer::from_pixel(16, 16, LumaA([90, 10]));
        let bytes = encode(DynamicImage::ImageLumaA8(image), ImageOutputFormat::Png);
        assert_valid(&preprocess(&bytes).unwrap());
    }

    #[test]
    fn test_rgba_png() {
        let rgba: RgbaImage = ImageBuffer::from_pixel(500, 20, Rgba([10, 200, 30, 0]));
        let bytes = encode(DynamicImage::ImageRgba8(rgba), ImageOutputFormat::Png);
        let tensor = preprocess(&bytes).unwrap();
        assert_valid(&tensor);

        // Alpha is dropped, colour is kept
        assert!((tensor.as_slice()[1] - 200.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_palette_gif() {
        let rgba: RgbaImage = ImageBuffer::from_fn(40, 40, |x, _| {
            if x < 20 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            }
        });
        let bytes = encode(DynamicImage::ImageRgba8(rgba), ImageOutputFormat::Gif);
        assert_valid(&preprocess(&bytes).unwrap());
    }

    #[test]
    fn test_sixteen_bit_png() {
        let image: ImageBuffer<Rgb<u16>, Vec<u16>> =
            ImageBuffer::from_pixel(30, 30, Rgb([65535, 0, 32768]));
        let bytes = encode(DynamicImage::ImageRgb16(image), ImageOutputFormat::Png);
        let tensor = preprocess(&bytes).unwrap();
        assert_valid(&tensor);
        assert!((tensor.as_slice()[0] - 1.0).abs() < 1e-6);
        assert!(tensor.as_slice()[1].abs() < 1e-6);
    }

    #[test]
    fn test_resize_is_resolution_independent_for_solid_colour() {
        let colour = Rgb([200, 40, 90]);
        let small = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(10, 10, colour));
        let large = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(1000, 1000, colour));

        let small = to_tensor(&small).unwrap();
        let large = to_tensor(&large).unwrap();

        assert_eq!(small.as_slice(), large.as_slice());
        let expected = [200.0 / 255.0, 40.0 / 255.0, 90.0 / 255.0];
        for px in small.as_slice().chunks(3) {
            for (v, e) in px.iter().zip(expected.iter()) {
                assert!((v - e).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_decode_error() {
        let err = preprocess(b"definitely not an image").unwrap_err();
        assert!(matches!(err, PredictError::Decode(_)));
    }

    #[test]
    fn test_empty_payload_is_decode_error() {
        let err = preprocess(&[]).unwrap_err();
        assert!(matches!(err, PredictError::Decode(_)));
    }

    #[test]
    fn test_truncated_png_is_decode_error() {
        let bytes = encode(DynamicImage::ImageRgb8(gradient(64, 64)), ImageOutputFormat::Png);
        let err = preprocess(&bytes[..bytes.len() / 2]).unwrap_err();
        assert!(matches!(err, PredictError::Decode(_)));
    }
}
