//! Image-to-PDF composition
//!
//! One page per input image, in input order. Each image is normalized to a
//! bounded JPEG, embedded, then scaled to fill the page's margin-bounded
//! content area and centered.
//!
//! Images are processed strictly one at a time so that at most one decoded
//! raster is alive at once. The first failure aborts the batch and the
//! partially built document is dropped.

pub mod builder;
pub mod layout;
pub mod options;
pub mod transcode;

pub use builder::{ImageDocument, ImageHandle};
pub use layout::PageLayout;
pub use options::ComposeOptions;
pub use transcode::{
    downscale_ratio, normalize_image, normalized_dimensions, probe_image, ImageProbe,
    NormalizedImage, SourceImage,
};

use crate::error::PdfToolsError;
use tracing::{debug, info};

/// A finished composition plus the geometry used for each page
#[derive(Debug, Clone)]
pub struct ComposedDocument {
    pub bytes: Vec<u8>,
    pub layouts: Vec<PageLayout>,
}

impl ComposedDocument {
    pub fn page_count(&self) -> usize {
        self.layouts.len()
    }
}

/// Compose `images` into a PDF using `options`
///
/// Returns `Ok(None)` for an empty batch: nothing is built and nothing fails.
pub fn compose_images(
    images: &[SourceImage],
    options: &ComposeOptions,
) -> Result<Option<ComposedDocument>, PdfToolsError> {
    compose_images_with_progress(images, options, |_, _| {})
}

/// Like [`compose_images`], calling `on_image(done, total)` after each page
pub fn compose_images_with_progress(
    images: &[SourceImage],
    options: &ComposeOptions,
    mut on_image: impl FnMut(usize, usize),
) -> Result<Option<ComposedDocument>, PdfToolsError> {
    if images.is_empty() {
        debug!("no images to compose");
        return Ok(None);
    }
    options.validate()?;

    let total = images.len();
    let mut document = ImageDocument::new(options.page_width, options.page_height);
    let mut layouts = Vec::with_capacity(total);

    for (index, source) in images.iter().enumerate() {
        let normalized = normalize_image(
            index,
            source,
            options.max_image_width,
            options.max_image_height,
            options.jpeg_quality,
        )?;

        let handle = document.embed_jpeg(normalized);

        let layout = PageLayout::fit(
            options.page_width,
            options.page_height,
            options.margin,
            handle.width,
            handle.height,
        )?;
        document.add_image_page(handle, &layout)?;
        layouts.push(layout);

        on_image(index + 1, total);
    }

    let bytes = document.finish()?;
    info!(
        pages = layouts.len(),
        size_bytes = bytes.len(),
        "composed images into PDF"
    );

    Ok(Some(ComposedDocument { bytes, layouts }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{create_jpeg, create_png};
    use lopdf::content::Content;
    use lopdf::Document;
    use pretty_assertions::assert_eq;

    fn floats(objects: &[lopdf::Object]) -> Vec<f32> {
        objects.iter().map(|o| o.as_float().unwrap()).collect()
    }

    fn png(width: u32, height: u32) -> SourceImage {
        SourceImage::new("image/png", create_png(width, height))
    }

    #[test]
    fn test_empty_batch_is_noop() {
        let result = compose_images(&[], &ComposeOptions::default()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_one_page_per_image_in_order() {
        let images = vec![
            png(40, 20),
            SourceImage::new("image/jpeg", create_jpeg(20, 40)),
            png(10, 10),
        ];
        let composed = compose_images(&images, &ComposeOptions::default())
            .unwrap()
            .unwrap();

        assert_eq!(composed.page_count(), 3);
        let doc = Document::load_mem(&composed.bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 3);

        // Landscape first, portrait second
        assert!((composed.layouts[0].draw_width - 540.0).abs() < 1e-9);
        assert!((composed.layouts[1].draw_height - 720.0).abs() < 1e-9);
    }

    #[test]
    fn test_oversized_image_is_capped_before_layout() {
        let options = ComposeOptions {
            max_image_width: 100,
            max_image_height: 100,
            ..Default::default()
        };
        let composed = compose_images(&[png(400, 200)], &options)
            .unwrap()
            .unwrap();

        let doc = Document::load_mem(&composed.bytes).unwrap();
        let image = doc
            .objects
            .values()
            .filter_map(|o| o.as_stream().ok())
            .find(|s| s.dict.get(b"Subtype").and_then(|v| v.as_name()).ok() == Some(&b"Image"[..]))
            .unwrap();
        assert_eq!(image.dict.get(b"Width").unwrap().as_i64().unwrap(), 100);
        assert_eq!(image.dict.get(b"Height").unwrap().as_i64().unwrap(), 50);

        // 100x50 fills the 540pt content width
        let layout = composed.layouts[0];
        assert!((layout.draw_width - 540.0).abs() < 1e-9);
        assert!((layout.draw_height - 270.0).abs() < 1e-9);
        assert!((layout.draw_y - 261.0).abs() < 1e-9);
    }

    #[test]
    fn test_repeat_composition_has_identical_geometry() {
        let images = vec![png(300, 120), png(64, 900)];
        let options = ComposeOptions::default();

        let first = compose_images(&images, &options).unwrap().unwrap();
        let second = compose_images(&images, &options).unwrap().unwrap();

        assert_eq!(first.page_count(), second.page_count());
        assert_eq!(first.layouts, second.layouts);
    }

    #[test]
    fn test_bad_image_fails_whole_batch() {
        let images = vec![
            png(20, 20),
            SourceImage::new("image/png", b"not an image".to_vec()),
            png(20, 20),
        ];
        let mut progress = Vec::new();
        let err = compose_images_with_progress(&images, &ComposeOptions::default(), |done, _| {
            progress.push(done)
        })
        .unwrap_err();

        assert!(matches!(err, PdfToolsError::ImageDecode { index: 1, .. }));
        assert_eq!(err.kind(), crate::ErrorKind::Decode);
        // The third image was never touched
        assert_eq!(progress, vec![1]);
    }

    #[test]
    fn test_invalid_options_rejected_before_decoding() {
        let options = ComposeOptions {
            jpeg_quality: 0,
            ..Default::default()
        };
        let err = compose_images(&[png(5, 5)], &options).unwrap_err();
        assert!(matches!(err, PdfToolsError::OperationError(_)));
    }

    #[test]
    fn test_custom_page_size_is_used() {
        let options = ComposeOptions {
            page_width: 595.0,
            page_height: 842.0,
            margin: 0.0,
            ..Default::default()
        };
        let composed = compose_images(&[png(10, 10)], &options).unwrap().unwrap();
        let layout = composed.layouts[0];
        assert_eq!(layout.page_width, 595.0);
        assert!((layout.draw_width - 595.0).abs() < 1e-9);
        assert!((layout.draw_x).abs() < 1e-9);
    }

    #[test]
    fn test_landscape_page_content_draws_fitted_rectangle() {
        let composed = compose_images(&[png(3200, 1600)], &ComposeOptions::default())
            .unwrap()
            .unwrap();

        let doc = Document::load_mem(&composed.bytes).unwrap();
        let page_id = doc.get_pages()[&1];

        let page = doc.get_dictionary(page_id).unwrap();
        let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
        assert_eq!(floats(media_box), vec![0.0, 0.0, 612.0, 792.0]);

        let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
        let cm = content
            .operations
            .iter()
            .find(|op| op.operator == "cm")
            .unwrap();
        assert_eq!(
            floats(&cm.operands),
            vec![540.0, 0.0, 0.0, 270.0, 36.0, 261.0]
        );
    }
}
