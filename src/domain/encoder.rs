//! Image Encoder
//!
//! Turns an arbitrary color image into the 4-bit grayscale bitmap the
//! e-paper controller expects.
//!
//! ```text
//! decode -> resize -> luma -> (dither) -> level = v / 16 -> pack
//!
//! byte = (even pixel << 4) | odd pixel
//! ```
//!
//! With an odd width the low nibble of each row's last byte stays zero.

use crate::domain::error::DecodeError;
use crate::domain::models::{EncodeOptions, EncodedImage, ResizeMode};
use image::imageops::{dither, ColorMap, FilterType};
use image::{DynamicImage, GrayImage, ImageReader, Luma};
use std::path::Path;
use tracing::{debug, info};

/// Number of gray levels representable in a nibble
pub const GRAY_LEVELS: u8 = 16;

/// Decode the image at `path` and encode it at `width` x `height`.
pub fn encode(path: &Path, width: u32, height: u32) -> Result<EncodedImage, DecodeError> {
    encode_with(path, &EncodeOptions::new(width, height))
}

pub fn encode_with(path: &Path, options: &EncodeOptions) -> Result<EncodedImage, DecodeError> {
    check_dimensions(options)?;

    let img = ImageReader::open(path)
        .map_err(|e| DecodeError::Unreadable {
            path: path.to_path_buf(),
            source: image::ImageError::IoError(e),
        })?
        .with_guessed_format()
        .map_err(|e| DecodeError::Unreadable {
            path: path.to_path_buf(),
            source: image::ImageError::IoError(e),
        })?
        .decode()?;
    info!(
        "Opened image {} ({}x{})",
        path.display(),
        img.width(),
        img.height()
    );

    encode_image(&img, options)
}

/// Encode an already decoded image.
pub fn encode_image(
    img: &DynamicImage,
    options: &EncodeOptions,
) -> Result<EncodedImage, DecodeError> {
    check_dimensions(options)?;
    let (width, height) = (options.width, options.height);

    let resized;
    let img = if img.width() == width && img.height() == height {
        img
    } else {
        resized = match options.resize {
            ResizeMode::Stretch => img.resize_exact(width, height, FilterType::Triangle),
            ResizeMode::Fill => img.resize_to_fill(width, height, FilterType::Lanczos3),
        };
        debug!("Resized to {}x{}", width, height);
        &resized
    };

    let mut gray = img.to_luma8();
    if options.dither {
        dither(&mut gray, &Gray16Map);
        debug!("Dithered to {} levels", GRAY_LEVELS);
    }

    let data = pack_gray4(&gray);
    info!(
        "Image packed to 4bit format: {}x{}, {} bytes",
        width,
        height,
        data.len()
    );

    Ok(EncodedImage {
        data,
        width,
        height,
    })
}

fn check_dimensions(options: &EncodeOptions) -> Result<(), DecodeError> {
    if options.width == 0 || options.height == 0 {
        return Err(DecodeError::InvalidDimensions {
            width: options.width,
            height: options.height,
        });
    }
    Ok(())
}

/// Reduce an 8-bit intensity to one of 16 levels.
#[inline]
pub fn quantize(intensity: u8) -> u8 {
    intensity / GRAY_LEVELS
}

/// Quantize and pack a grayscale image, two pixels per byte.
pub fn pack_gray4(gray: &GrayImage) -> Vec<u8> {
    let (width, height) = gray.dimensions();
    let stride = EncodedImage::row_stride(width);
    let mut packed = vec![0u8; EncodedImage::expected_len(width, height)];

    for (y, row) in gray.rows().enumerate() {
        let out = &mut packed[y * stride..(y + 1) * stride];
        for (x, pixel) in row.enumerate() {
            let level = quantize(pixel.0[0]);
            if x % 2 == 0 {
                out[x / 2] = level << 4;
            } else {
                out[x / 2] |= level;
            }
        }
    }

    packed
}

/// Expand a packed bitmap back into an 8-bit grayscale image.
///
/// Level `n` becomes intensity `n * 17`, so 15 maps to full white.
pub fn unpack(data: &[u8], width: u32, height: u32) -> GrayImage {
    let stride = EncodedImage::row_stride(width);
    GrayImage::from_fn(width, height, |x, y| {
        let byte = data
            .get(y as usize * stride + x as usize / 2)
            .copied()
            .unwrap_or(0);
        let level = if x % 2 == 0 { byte >> 4 } else { byte & 0x0F };
        Luma([level * 17])
    })
}

/// Palette of the 16 displayable gray levels, for error diffusion.
pub struct Gray16Map;

impl ColorMap for Gray16Map {
    type Color = Luma<u8>; // dither requires this to be u8

    fn index_of(&self, color: &Self::Color) -> usize {
        quantize(color.0[0]) as usize
    }

    fn lookup(&self, index: usize) -> Option<Self::Color> {
        u8::try_from(index)
            .ok()
            .filter(|level| *level < GRAY_LEVELS)
            .map(|level| Luma([level * 17]))
    }

    fn has_lookup(&self) -> bool {
        true
    }

    fn map_color(&self, color: &mut Self::Color) {
        color.0[0] = quantize(color.0[0]) * 17;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_4x2() -> GrayImage {
        GrayImage::from_raw(4, 2, vec![16, 32, 48, 64, 0, 255, 128, 200]).unwrap()
    }

    #[test]
    fn test_pack_known_image() {
        let img = DynamicImage::ImageLuma8(sample_4x2());
        let encoded = encode_image(&img, &EncodeOptions::new(4, 2)).unwrap();
        assert_eq!(encoded.data, vec![0x12, 0x34, 0x0F, 0x8C]);
        assert_eq!((encoded.width, encoded.height), (4, 2));
    }

    #[test]
    fn test_quantize_bounds() {
        assert_eq!(quantize(0), 0);
        assert_eq!(quantize(15), 0);
        assert_eq!(quantize(16), 1);
        assert_eq!(quantize(255), 15);
    }

    #[test]
    fn test_nibbles_recoverable() {
        for p1 in 0..16u8 {
            for p2 in 0..16u8 {
                let gray = GrayImage::from_raw(2, 1, vec![p1 * 16, p2 * 16]).unwrap();
                let byte = pack_gray4(&gray)[0];
                assert_eq!(byte >> 4, p1);
                assert_eq!(byte & 0x0F, p2);
            }
        }
    }

    #[test]
    fn test_odd_width_pads_low_nibble() {
        let gray = GrayImage::from_pixel(5, 3, Luma([255]));
        let packed = pack_gray4(&gray);
        assert_eq!(packed.len(), 9);
        for row in packed.chunks(3) {
            assert_eq!(row, &[0xFF, 0xFF, 0xF0]);
        }
    }

    #[test]
    fn test_output_length_after_resize() {
        let img = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            40,
            30,
            image::Rgb([200, 10, 90]),
        ));
        for (w, h) in [(1, 1), (7, 3), (300, 396), (13, 17)] {
            let encoded = encode_image(&img, &EncodeOptions::new(w, h)).unwrap();
            assert_eq!(encoded.data.len(), (w as usize).div_ceil(2) * h as usize);
        }

        let mut fill = EncodeOptions::new(9, 4);
        fill.resize = ResizeMode::Fill;
        fill.dither = true;
        let encoded = encode_image(&img, &fill).unwrap();
        assert_eq!(encoded.data.len(), 5 * 4);
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        let img = DynamicImage::ImageLuma8(sample_4x2());
        let err = encode_image(&img, &EncodeOptions::new(0, 2)).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::InvalidDimensions {
                width: 0,
                height: 2
            }
        ));
    }

    #[test]
    fn test_unpack_matches_levels() {
        let packed = pack_gray4(&sample_4x2());
        let img = unpack(&packed, 4, 2);
        let levels: Vec<u8> = img.pixels().map(|p| p.0[0] / 17).collect();
        assert_eq!(levels, vec![1, 2, 3, 4, 0, 15, 8, 12]);
    }

    #[test]
    fn test_dither_keeps_palette() {
        let gray = GrayImage::from_fn(8, 8, |x, y| Luma([(x * 30 + y * 3) as u8]));
        let mut dithered = gray.clone();
        dither(&mut dithered, &Gray16Map);
        assert!(dithered.pixels().all(|p| p.0[0] % 17 == 0));
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let err = encode(Path::new("/nonexistent/dir/img.png"), 4, 4).unwrap_err();
        assert!(matches!(err, DecodeError::Unreadable { .. }));
    }

    #[test]
    fn test_garbage_file_is_undecodable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.png");
        std::fs::write(&path, b"definitely not a png").unwrap();
        assert!(encode(&path, 4, 4).is_err());
    }

    #[test]
    fn test_encode_png_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.png");
        sample_4x2().save(&path).unwrap();
        let encoded = encode(&path, 4, 2).unwrap();
        assert_eq!(encoded.data, vec![0x12, 0x34, 0x0F, 0x8C]);
    }
}
