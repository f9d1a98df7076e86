//! PDF Split algorithm
//!
//! Extracts pages by deleting everything else from a copy of the document
//! and pruning what the remaining pages no longer reference.

use crate::error::PdfToolsError;
use lopdf::Document;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Split a PDF, extracting only the specified pages (1-indexed) into one document
pub fn split_document(bytes: &[u8], pages: Vec<u32>) -> Result<Vec<u8>, PdfToolsError> {
    let doc = load(bytes)?;
    let keep = validate_selection(&doc, &pages)?;
    extract_pages(&doc, &keep)
}

/// Split a PDF into one single-page document per selected page, in page order
///
/// The source is parsed once; each output starts from a clone of it.
pub fn split_pages(bytes: &[u8], pages: &[u32]) -> Result<Vec<(u32, Vec<u8>)>, PdfToolsError> {
    let doc = load(bytes)?;
    let keep = validate_selection(&doc, pages)?;

    let mut outputs = Vec::with_capacity(keep.len());
    for page in keep {
        debug!(page, "extracting page");
        let single = BTreeSet::from([page]);
        outputs.push((page, extract_pages(&doc, &single)?));
    }

    info!(pages = outputs.len(), "split PDF into single pages");
    Ok(outputs)
}

fn load(bytes: &[u8]) -> Result<Document, PdfToolsError> {
    Document::load_mem(bytes).map_err(|e| PdfToolsError::ParseError(e.to_string()))
}

/// Reject empty, zero or out-of-range selections; returns the sorted unique set
fn validate_selection(doc: &Document, pages: &[u32]) -> Result<BTreeSet<u32>, PdfToolsError> {
    if pages.is_empty() {
        return Err(PdfToolsError::InvalidRange("No pages specified".into()));
    }

    if pages.contains(&0) {
        return Err(PdfToolsError::InvalidRange(
            "Page numbers must be >= 1".into(),
        ));
    }

    let page_count = doc.get_pages().len() as u32;
    if let Some(&page) = pages.iter().find(|&&p| p > page_count) {
        return Err(PdfToolsError::InvalidRange(format!(
            "Page {} does not exist (document has {} pages)",
            page, page_count
        )));
    }

    Ok(pages.iter().copied().collect())
}

fn extract_pages(doc: &Document, keep: &BTreeSet<u32>) -> Result<Vec<u8>, PdfToolsError> {
    let page_count = doc.get_pages().len() as u32;
    let to_delete: Vec<u32> = (1..=page_count).filter(|p| !keep.contains(p)).collect();

    let mut new_doc = doc.clone();
    if !to_delete.is_empty() {
        new_doc.delete_pages(&to_delete);
    }

    // Drop fonts, images and content streams only deleted pages used
    new_doc.prune_objects();
    new_doc.compress();

    let mut buffer = Vec::new();
    new_doc
        .save_to(&mut buffer)
        .map_err(|e| PdfToolsError::OperationError(format!("Save failed: {}", e)))?;

    Ok(buffer)
}
