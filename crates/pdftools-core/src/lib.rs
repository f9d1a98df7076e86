//! PDF merge, split and image composition
//!
//! This crate provides client-side document manipulation using lopdf for PDF
//! structure, `image` for raster decoding and `zip` for multi-file output.
//!
//! - `merge_documents`: concatenate PDFs in order
//! - `split_document` / `split_pages` / `split_to_zip`: extract pages
//! - `compose_images`: one page per image, fitted and centered

pub mod archive;
pub mod command;
pub mod compose;
pub mod error;
pub mod merge;
pub mod split;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

pub use archive::{bundle_files, page_entry_name, split_to_zip};
pub use command::{OutputKind, PdfCommand, ProcessMetrics, ProcessResult};
pub use compose::{
    compose_images, compose_images_with_progress, probe_image, ComposeOptions, ComposedDocument,
    ImageProbe, PageLayout, SourceImage,
};
pub use error::{ErrorKind, PdfToolsError};
pub use merge::merge_documents;
pub use split::{split_document, split_pages};

/// Parse PDF bytes and return page count
pub fn get_page_count(bytes: &[u8]) -> Result<u32, PdfToolsError> {
    let doc =
        lopdf::Document::load_mem(bytes).map_err(|e| PdfToolsError::ParseError(e.to_string()))?;
    Ok(doc.get_pages().len() as u32)
}

/// Parse page range string like "1-3, 5, 8-10" into sorted unique page numbers
///
/// Every page must fall within `1..=max_page`. Bounds are checked before a
/// range is expanded, so a huge span fails without allocating.
pub fn parse_ranges(input: &str, max_page: u32) -> Result<Vec<u32>, PdfToolsError> {
    use std::collections::BTreeSet;

    let mut pages = BTreeSet::new();

    for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.split_once('-') {
            Some((start, end)) => {
                let start = parse_page(start, "start")?;
                let end = parse_page(end, "end")?;
                if start > end {
                    return Err(PdfToolsError::InvalidRange(format!(
                        "Start {} > end {}",
                        start, end
                    )));
                }
                check_page(start, max_page)?;
                check_page(end, max_page)?;
                pages.extend(start..=end);
            }
            None => {
                let page = parse_page(part, "page")?;
                check_page(page, max_page)?;
                pages.insert(page);
            }
        }
    }

    Ok(pages.into_iter().collect())
}

/// Reject page numbers outside `1..=max_page`
pub(crate) fn check_page(page: u32, max_page: u32) -> Result<(), PdfToolsError> {
    if page == 0 || page > max_page {
        return Err(PdfToolsError::InvalidRange(format!(
            "Page {} is out of range (1-{})",
            page, max_page
        )));
    }
    Ok(())
}

fn parse_page(raw: &str, what: &str) -> Result<u32, PdfToolsError> {
    raw.trim()
        .parse()
        .map_err(|_| PdfToolsError::InvalidRange(format!("Invalid {}: {}", what, raw.trim())))
}
