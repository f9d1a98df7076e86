//! Raster decode, downscale and JPEG re-encode
//!
//! Every input, PNG included, leaves this module as a baseline RGB JPEG.
//! Transparent pixels are composited onto white first since JPEG has no alpha.

use crate::error::PdfToolsError;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader, Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use tracing::debug;

/// Caller-supplied image bytes plus the MIME type the file picker reported
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceImage {
    #[serde(default)]
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl SourceImage {
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes,
        }
    }
}

/// A JPEG ready to embed, with its final pixel dimensions
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    pub width: u32,
    pub height: u32,
    pub jpeg: Vec<u8>,
}

/// Dimensions and detected format, read without a full decode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageProbe {
    pub width: u32,
    pub height: u32,
    #[serde(serialize_with = "serialize_format")]
    pub format: ImageFormat,
}

fn serialize_format<S: serde::Serializer>(
    format: &ImageFormat,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(format.to_mime_type())
}

/// Shrink factor that fits `width` x `height` inside the cap; never above 1
pub fn downscale_ratio(width: u32, height: u32, max_width: u32, max_height: u32) -> f64 {
    let width = f64::from(width.max(1));
    let height = f64::from(height.max(1));
    (f64::from(max_width) / width)
        .min(f64::from(max_height) / height)
        .min(1.0)
}

/// Target pixel size after applying [`downscale_ratio`]
pub fn normalized_dimensions(
    width: u32,
    height: u32,
    max_width: u32,
    max_height: u32,
) -> (u32, u32) {
    let ratio = downscale_ratio(width, height, max_width, max_height);
    if ratio >= 1.0 {
        return (width, height);
    }
    let scaled = |v: u32| ((f64::from(v) * ratio).round() as u32).max(1);
    (scaled(width), scaled(height))
}

fn reader_for<'a>(
    mime_type: &str,
    bytes: &'a [u8],
) -> std::io::Result<ImageReader<Cursor<&'a [u8]>>> {
    // Sniff the header first; fall back to the declared MIME type for
    // formats without a reliable signature
    let mut reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    if reader.format().is_none() {
        if let Some(format) = ImageFormat::from_mime_type(mime_type) {
            reader.set_format(format);
        }
    }
    Ok(reader)
}

/// Read format and dimensions from the image header
pub fn probe_image(mime_type: &str, bytes: &[u8]) -> Result<ImageProbe, PdfToolsError> {
    let decode_err = PdfToolsError::UnreadableImage;

    let reader = reader_for(mime_type, bytes).map_err(|e| decode_err(e.to_string()))?;
    let format = reader
        .format()
        .ok_or_else(|| decode_err("Unrecognized image format".into()))?;
    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| decode_err(e.to_string()))?;

    Ok(ImageProbe {
        width,
        height,
        format,
    })
}

/// Decode `source`, shrink it under the configured cap and re-encode as JPEG
///
/// `index` is the image's position in the batch, carried into errors.
pub fn normalize_image(
    index: usize,
    source: &SourceImage,
    max_width: u32,
    max_height: u32,
    quality: u8,
) -> Result<NormalizedImage, PdfToolsError> {
    let decoded = reader_for(&source.mime_type, &source.bytes)
        .map_err(|e| PdfToolsError::ImageDecode {
            index,
            reason: e.to_string(),
        })?
        .decode()
        .map_err(|e| PdfToolsError::ImageDecode {
            index,
            reason: e.to_string(),
        })?;

    let (intrinsic_width, intrinsic_height) = (decoded.width(), decoded.height());
    let (width, height) =
        normalized_dimensions(intrinsic_width, intrinsic_height, max_width, max_height);

    debug!(
        index,
        intrinsic_width, intrinsic_height, width, height, "normalizing image"
    );

    let resized = if (width, height) == (intrinsic_width, intrinsic_height) {
        decoded
    } else {
        decoded.resize_exact(width, height, FilterType::Triangle)
    };

    let rgb = flatten_onto_white(resized);

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, quality)
        .encode_image(&rgb)
        .map_err(|e| PdfToolsError::ImageEncode {
            index,
            reason: e.to_string(),
        })?;

    Ok(NormalizedImage {
        width: rgb.width(),
        height: rgb.height(),
        jpeg,
    })
}

fn flatten_onto_white(img: DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.into_rgb8();
    }

    let rgba = img.into_rgba8();
    let (width, height) = rgba.dimensions();
    RgbImage::from_fn(width, height, |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = u16::from(a);
        let blend = |c: u8| ((u16::from(c) * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{create_jpeg, create_png, create_transparent_png};

    #[test]
    fn test_ratio_is_one_inside_cap() {
        assert_eq!(downscale_ratio(1600, 1600, 1600, 1600), 1.0);
        assert_eq!(downscale_ratio(10, 1200, 1600, 1600), 1.0);
    }

    #[test]
    fn test_ratio_uses_tighter_axis() {
        assert_eq!(downscale_ratio(3200, 1600, 1600, 1600), 0.5);
        assert_eq!(downscale_ratio(1000, 6400, 1600, 1600), 0.25);
    }

    #[test]
    fn test_dimensions_unchanged_within_cap() {
        assert_eq!(normalized_dimensions(800, 600, 1600, 1600), (800, 600));
        assert_eq!(normalized_dimensions(1600, 1600, 1600, 1600), (1600, 1600));
    }

    #[test]
    fn test_dimensions_halved_for_wide_image() {
        assert_eq!(normalized_dimensions(3200, 1600, 1600, 1600), (1600, 800));
    }

    #[test]
    fn test_dimensions_never_reach_zero() {
        assert_eq!(normalized_dimensions(100_000, 1, 1600, 1600), (1600, 1));
    }

    #[test]
    fn test_normalize_png_becomes_jpeg() {
        let source = SourceImage::new("image/png", create_png(40, 20));
        let normalized = normalize_image(0, &source, 1600, 1600, 80).unwrap();

        assert_eq!((normalized.width, normalized.height), (40, 20));
        assert_eq!(
            image::guess_format(&normalized.jpeg).unwrap(),
            ImageFormat::Jpeg
        );
    }

    #[test]
    fn test_normalize_downscales_to_cap() {
        let source = SourceImage::new("image/jpeg", create_jpeg(320, 160));
        let normalized = normalize_image(0, &source, 160, 160, 80).unwrap();
        assert_eq!((normalized.width, normalized.height), (160, 80));

        let reencoded = image::load_from_memory(&normalized.jpeg).unwrap();
        assert_eq!((reencoded.width(), reencoded.height()), (160, 80));
    }

    #[test]
    fn test_transparent_pixels_become_white() {
        let source = SourceImage::new("image/png", create_transparent_png(16, 16));
        let normalized = normalize_image(0, &source, 1600, 1600, 100).unwrap();

        let decoded = image::load_from_memory(&normalized.jpeg).unwrap().to_rgb8();
        let corner = decoded.get_pixel(0, 0).0;
        assert!(corner.iter().all(|&c| c > 230), "got {:?}", corner);
    }

    #[test]
    fn test_garbage_is_decode_error_with_index() {
        let source = SourceImage::new("image/png", b"definitely not an image".to_vec());
        let err = normalize_image(3, &source, 1600, 1600, 80).unwrap_err();
        assert!(matches!(err, PdfToolsError::ImageDecode { index: 3, .. }));
    }

    #[test]
    fn test_probe_reads_header() {
        let probe = probe_image("image/png", &create_png(33, 7)).unwrap();
        assert_eq!((probe.width, probe.height), (33, 7));
        assert_eq!(probe.format, ImageFormat::Png);
    }

    #[test]
    fn test_probe_ignores_wrong_mime() {
        let probe = probe_image("image/png", &create_jpeg(12, 12)).unwrap();
        assert_eq!(probe.format, ImageFormat::Jpeg);
    }

    #[test]
    fn test_probe_rejects_unknown_bytes() {
        let err = probe_image("application/octet-stream", b"????????").unwrap_err();
        assert!(matches!(err, PdfToolsError::UnreadableImage(_)));
        assert_eq!(err.kind(), crate::ErrorKind::Decode);
        assert!(!err.to_string().contains("image 0"));
    }
}
