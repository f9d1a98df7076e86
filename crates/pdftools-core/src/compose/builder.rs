//! Minimal page-at-a-time PDF writer on top of lopdf

use super::layout::PageLayout;
use super::transcode::NormalizedImage;
use crate::error::PdfToolsError;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

/// An embedded image XObject that pages can draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHandle {
    pub id: ObjectId,
    pub width: u32,
    pub height: u32,
}

pub struct ImageDocument {
    doc: Document,
    pages_id: ObjectId,
    page_ids: Vec<ObjectId>,
    page_width: f64,
    page_height: f64,
}

impl ImageDocument {
    /// Start an empty document whose pages default to `page_width` x `page_height` points
    pub fn new(page_width: f64, page_height: f64) -> Self {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            page_ids: Vec::new(),
            page_width,
            page_height,
        }
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Add a JPEG as a DCTDecode image XObject, moving its bytes into the document
    pub fn embed_jpeg(&mut self, image: NormalizedImage) -> ImageHandle {
        let dict = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"XObject".to_vec())),
            ("Subtype", Object::Name(b"Image".to_vec())),
            ("Width", Object::Integer(image.width as i64)),
            ("Height", Object::Integer(image.height as i64)),
            ("ColorSpace", Object::Name(b"DeviceRGB".to_vec())),
            ("BitsPerComponent", Object::Integer(8)),
            ("Filter", Object::Name(b"DCTDecode".to_vec())),
        ]);
        // Already compressed; keep lopdf from deflating it again
        let stream = Stream::new(dict, image.jpeg).with_compression(false);
        let id = self.doc.add_object(stream);

        ImageHandle {
            id,
            width: image.width,
            height: image.height,
        }
    }

    /// Append a page of the default size that draws `image` into `layout`'s rectangle
    pub fn add_image_page(
        &mut self,
        image: ImageHandle,
        layout: &PageLayout,
    ) -> Result<ObjectId, PdfToolsError> {
        let name = format!("Im{}", self.page_ids.len() + 1);

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        real(layout.draw_width),
                        real(0.0),
                        real(0.0),
                        real(layout.draw_height),
                        real(layout.draw_x),
                        real(layout.draw_y),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(name.clone().into_bytes())]),
                Operation::new("Q", vec![]),
            ],
        };
        let encoded = content
            .encode()
            .map_err(|e| PdfToolsError::SerializationError(e.to_string()))?;
        let content_id = self.doc.add_object(Stream::new(Dictionary::new(), encoded));

        let mut xobjects = Dictionary::new();
        xobjects.set(name.into_bytes(), Object::Reference(image.id));
        let resources = Dictionary::from_iter(vec![("XObject", Object::Dictionary(xobjects))]);

        let page = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(self.pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    real(0.0),
                    real(0.0),
                    real(self.page_width),
                    real(self.page_height),
                ]),
            ),
            ("Resources", Object::Dictionary(resources)),
            ("Contents", Object::Reference(content_id)),
        ]);
        let page_id = self.doc.add_object(page);
        self.page_ids.push(page_id);

        Ok(page_id)
    }

    /// Write the page tree and catalog, then serialize
    pub fn finish(mut self) -> Result<Vec<u8>, PdfToolsError> {
        let pages = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Count", Object::Integer(self.page_ids.len() as i64)),
            (
                "Kids",
                Object::Array(
                    self.page_ids
                        .iter()
                        .map(|id| Object::Reference(*id))
                        .collect(),
                ),
            ),
        ]);
        self.doc
            .objects
            .insert(self.pages_id, Object::Dictionary(pages));

        let catalog = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(self.pages_id)),
        ]);
        let catalog_id = self.doc.add_object(catalog);
        self.doc.trailer.set("Root", Object::Reference(catalog_id));

        self.doc.compress();

        let mut buffer = Vec::new();
        self.doc
            .save_to(&mut buffer)
            .map_err(|e| PdfToolsError::SerializationError(e.to_string()))?;
        Ok(buffer)
    }
}

fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::transcode::{normalize_image, SourceImage};
    use crate::fixtures::create_png;

    fn sample_image(width: u32, height: u32) -> NormalizedImage {
        let source = SourceImage::new("image/png", create_png(width, height));
        normalize_image(0, &source, 1600, 1600, 80).unwrap()
    }

    #[test]
    fn test_empty_builder_serializes_zero_pages() {
        let bytes = ImageDocument::new(612.0, 792.0).finish().unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 0);
    }

    #[test]
    fn test_embed_reports_pixel_dimensions() {
        let mut builder = ImageDocument::new(612.0, 792.0);
        let handle = builder.embed_jpeg(sample_image(30, 20));
        assert_eq!((handle.width, handle.height), (30, 20));
    }

    #[test]
    fn test_image_page_references_xobject() {
        let mut builder = ImageDocument::new(612.0, 792.0);
        let handle = builder.embed_jpeg(sample_image(30, 20));
        let layout = PageLayout::fit(612.0, 792.0, 36.0, 30, 20).unwrap();
        builder.add_image_page(handle, &layout).unwrap();
        assert_eq!(builder.page_count(), 1);

        let bytes = builder.finish().unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 1);

        let page_id = pages[&1];
        let page = doc.get_dictionary(page_id).unwrap();
        let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
        let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
        let image_id = xobjects.get(b"Im1").unwrap().as_reference().unwrap();

        let image = doc.get_object(image_id).unwrap().as_stream().unwrap();
        assert_eq!(
            image.dict.get(b"Filter").unwrap().as_name().unwrap(),
            b"DCTDecode"
        );
        assert_eq!(image.dict.get(b"Width").unwrap().as_i64().unwrap(), 30);
        assert!(image.content.starts_with(&[0xFF, 0xD8]));
    }

    #[test]
    fn test_page_draws_layout_rectangle() {
        let mut builder = ImageDocument::new(400.0, 300.0);
        let handle = builder.embed_jpeg(sample_image(8, 8));
        let layout = PageLayout {
            page_width: 400.0,
            page_height: 300.0,
            margin: 10.0,
            draw_x: 12.5,
            draw_y: 40.0,
            draw_width: 100.0,
            draw_height: 75.0,
        };
        builder.add_image_page(handle, &layout).unwrap();

        let bytes = builder.finish().unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        let page_id = doc.get_pages()[&1];
        let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();

        let ops: Vec<&str> = content
            .operations
            .iter()
            .map(|op| op.operator.as_str())
            .collect();
        assert_eq!(ops, vec!["q", "cm", "Do", "Q"]);

        let cm: Vec<f32> = content.operations[1]
            .operands
            .iter()
            .map(|o| o.as_float().unwrap())
            .collect();
        assert_eq!(cm, vec![100.0, 0.0, 0.0, 75.0, 12.5, 40.0]);
    }
}
