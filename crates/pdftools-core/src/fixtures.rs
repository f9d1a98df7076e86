//! In-memory document and image builders for tests
//!
//! Available to this crate's unit tests and, via the `fixtures` feature, to
//! downstream crates' test suites.

use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use lopdf::{content::Content, content::Operation, Dictionary, Document, Object, Stream};
use std::io::Cursor;

/// Build a PDF with `num_pages` Letter-sized pages, each showing `"{label}-Page-{n}"`
pub fn create_test_pdf(num_pages: u32, label: &str) -> Vec<u8> {
    build_pdf(num_pages, label, false)
}

/// Same as [`create_test_pdf`] but the MediaBox lives on the page tree root
/// and is only inherited by the pages
pub fn create_test_pdf_inherited_media_box(num_pages: u32, label: &str) -> Vec<u8> {
    build_pdf(num_pages, label, true)
}

fn build_pdf(num_pages: u32, label: &str, inherit_media_box: bool) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let media_box = Object::Array(vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Integer(612),
        Object::Integer(792),
    ]);

    let mut page_ids = Vec::new();

    for i in 0..num_pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new(
                    "Tf",
                    vec![Object::Name(b"F1".to_vec()), Object::Integer(12)],
                ),
                Operation::new("Td", vec![Object::Integer(100), Object::Integer(700)]),
                Operation::new(
                    "Tj",
                    vec![Object::String(
                        format!("{}-Page-{}", label, i + 1).into_bytes(),
                        lopdf::StringFormat::Literal,
                    )],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            Dictionary::new(),
            content.encode().expect("content encodes"),
        ));

        let mut page = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("Contents", Object::Reference(content_id)),
        ]);
        if !inherit_media_box {
            page.set("MediaBox", media_box.clone());
        }
        page_ids.push(doc.add_object(page));
    }

    let mut pages = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(num_pages as i64)),
        (
            "Kids",
            Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
        ),
    ]);
    if inherit_media_box {
        pages.set("MediaBox", media_box);
    }
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]);
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).expect("fixture PDF saves");
    buffer
}

/// Opaque PNG filled with a horizontal gradient
pub fn create_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, _| {
        Rgb([(x % 256) as u8, 96, 200])
    });
    encode(img.into(), ImageFormat::Png)
}

/// PNG whose left half is fully transparent
pub fn create_transparent_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, _| {
        if x < width / 2 {
            Rgba([0, 0, 0, 0])
        } else {
            Rgba([20, 40, 60, 255])
        }
    });
    encode(img.into(), ImageFormat::Png)
}

/// Baseline JPEG of a flat color
pub fn create_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([180, 30, 30]));
    encode(img.into(), ImageFormat::Jpeg)
}

fn encode(img: image::DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format).expect("fixture image encodes");
    out.into_inner()
}
