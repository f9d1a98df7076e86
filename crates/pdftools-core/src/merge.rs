//! PDF Merge algorithm
//!
//! Concatenates the pages of several PDFs into one document.

use crate::error::PdfToolsError;
use lopdf::{Document, Object, ObjectId};
use tracing::{debug, info};

/// Page attributes a page may inherit from its ancestors in the page tree
const INHERITABLE: [&[u8]; 4] = [b"MediaBox", b"Resources", b"CropBox", b"Rotate"];

/// Guard against cyclic `Parent` chains in malformed files
const MAX_TREE_DEPTH: usize = 64;

/// Merge multiple PDFs into one, keeping input order
///
/// The algorithm:
/// 1. If empty, return error
/// 2. If single document, return it as-is
/// 3. Use the first document as the destination
/// 4. For each further document:
///    a. Renumber its objects past the destination's highest id
///    b. Pin inherited attributes onto each of its pages
///    c. Move all of its objects into the destination
/// 5. Hang every page directly off the destination's page tree root
/// 6. Drop orphaned objects, compress and serialize
pub fn merge_documents(documents: Vec<Vec<u8>>) -> Result<Vec<u8>, PdfToolsError> {
    if documents.is_empty() {
        return Err(PdfToolsError::OperationError("No documents to merge".into()));
    }

    if documents.len() == 1 {
        return Ok(documents.into_iter().next().unwrap_or_default());
    }

    let total = documents.len();
    let mut loaded = Vec::with_capacity(total);
    for (i, bytes) in documents.iter().enumerate() {
        let doc = Document::load_mem(bytes).map_err(|e| {
            PdfToolsError::ParseError(format!("Failed to load document {}: {}", i + 1, e))
        })?;
        loaded.push(doc);
    }

    let mut sources = loaded.into_iter();
    let mut dest = sources
        .next()
        .ok_or_else(|| PdfToolsError::OperationError("No documents to merge".into()))?;

    let root_id = page_tree_root(&dest)?;
    let mut page_refs: Vec<ObjectId> = dest.get_pages().into_values().collect();
    for &page_id in &page_refs {
        pin_inherited_attributes(&mut dest, page_id);
    }

    for (i, mut source) in sources.enumerate() {
        source.renumber_objects_with(dest.max_id + 1);

        let source_pages: Vec<ObjectId> = source.get_pages().into_values().collect();
        for &page_id in &source_pages {
            pin_inherited_attributes(&mut source, page_id);
        }
        debug!(document = i + 2, pages = source_pages.len(), "appending document");

        dest.max_id = dest.max_id.max(source.max_id);
        dest.objects.extend(source.objects);
        page_refs.extend(source_pages);
    }

    for &page_id in &page_refs {
        if let Ok(page) = dest.get_dictionary_mut(page_id) {
            page.set("Parent", Object::Reference(root_id));
        }
    }

    let root = dest
        .get_dictionary_mut(root_id)
        .map_err(|_| PdfToolsError::OperationError("Invalid pages dictionary".into()))?;
    root.set(
        "Kids",
        Object::Array(page_refs.iter().map(|&id| Object::Reference(id)).collect()),
    );
    root.set("Count", Object::Integer(page_refs.len() as i64));

    // Source catalogs and intermediate page tree nodes are unreachable now
    dest.prune_objects();
    dest.renumber_objects();
    dest.compress();

    let mut buffer = Vec::new();
    dest.save_to(&mut buffer).map_err(|e| {
        PdfToolsError::OperationError(format!("Failed to save merged PDF: {}", e))
    })?;

    info!(
        documents = total,
        pages = page_refs.len(),
        size_bytes = buffer.len(),
        "merged PDFs"
    );

    Ok(buffer)
}

/// Object id of the catalog's `/Pages` node
fn page_tree_root(doc: &Document) -> Result<ObjectId, PdfToolsError> {
    doc.catalog()
        .map_err(|_| PdfToolsError::OperationError("Catalog not found".into()))?
        .get(b"Pages")
        .and_then(|pages| pages.as_reference())
        .map_err(|_| PdfToolsError::OperationError("No Pages in catalog".into()))
}

/// Copy attributes the page only inherits onto the page itself, so it
/// renders the same after being re-parented
fn pin_inherited_attributes(doc: &mut Document, page_id: ObjectId) {
    let mut inherited = Vec::new();

    if let Ok(page) = doc.get_dictionary(page_id) {
        let mut missing: Vec<&[u8]> = INHERITABLE
            .iter()
            .copied()
            .filter(|key| !page.has(key))
            .collect();
        let mut parent = page.get(b"Parent").and_then(|p| p.as_reference()).ok();
        let mut depth = 0;

        while let Some(node_id) = parent {
            if missing.is_empty() || depth >= MAX_TREE_DEPTH {
                break;
            }
            let Ok(node) = doc.get_dictionary(node_id) else {
                break;
            };
            missing.retain(|key| match node.get(key) {
                Ok(value) => {
                    inherited.push((key.to_vec(), value.clone()));
                    false
                }
                Err(_) => true,
            });
            parent = node.get(b"Parent").and_then(|p| p.as_reference()).ok();
            depth += 1;
        }
    }

    if inherited.is_empty() {
        return;
    }
    if let Ok(page) = doc.get_dictionary_mut(page_id) {
        for (key, value) in inherited {
            page.set(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{create_test_pdf, create_test_pdf_inherited_media_box};

    fn page_contains(doc: &Document, page_num: u32, label: &str) -> bool {
        let page_id = doc.get_pages()[&page_num];
        let content = doc.get_page_content(page_id).unwrap();
        content
            .windows(label.len())
            .any(|w| w == label.as_bytes())
    }

    #[test]
    fn test_merge_empty_fails() {
        let result = merge_documents(vec![]);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("No documents to merge"));
    }

    #[test]
    fn test_merge_single_document_returns_same() {
        let pdf = create_test_pdf(2, "Single");
        let result = merge_documents(vec![pdf.clone()]).unwrap();
        assert_eq!(result, pdf);
    }

    #[test]
    fn test_merge_two_documents_combines_pages() {
        let doc_a = create_test_pdf(2, "DocA");
        let doc_b = create_test_pdf(3, "DocB");

        let merged = merge_documents(vec![doc_a, doc_b]).unwrap();

        let doc = Document::load_mem(&merged).unwrap();
        assert_eq!(doc.get_pages().len(), 5, "Merged document should have 5 pages");
    }

    #[test]
    fn test_merge_handles_different_sizes() {
        let doc1 = create_test_pdf(10, "Large");
        let doc2 = create_test_pdf(1, "Small");
        let doc3 = create_test_pdf(5, "Medium");

        let merged = merge_documents(vec![doc1, doc2, doc3]).unwrap();

        let doc = Document::load_mem(&merged).unwrap();
        assert_eq!(doc.get_pages().len(), 16);
    }

    #[test]
    fn test_merge_preserves_page_order() {
        let doc1 = create_test_pdf(2, "First");
        let doc2 = create_test_pdf(1, "Second");
        let doc3 = create_test_pdf(2, "Third");

        let merged = merge_documents(vec![doc1, doc2, doc3]).unwrap();
        let doc = Document::load_mem(&merged).unwrap();

        let expected = [
            "First-Page-1",
            "First-Page-2",
            "Second-Page-1",
            "Third-Page-1",
            "Third-Page-2",
        ];
        for (i, label) in expected.iter().enumerate() {
            assert!(
                page_contains(&doc, i as u32 + 1, label),
                "page {} should show {}",
                i + 1,
                label
            );
        }
    }

    #[test]
    fn test_merge_pins_inherited_media_box() {
        let doc1 = create_test_pdf(1, "Explicit");
        let doc2 = create_test_pdf_inherited_media_box(2, "Inherited");

        let merged = merge_documents(vec![doc1, doc2]).unwrap();
        let doc = Document::load_mem(&merged).unwrap();

        for (_, page_id) in doc.get_pages() {
            let page = doc.get_dictionary(page_id).unwrap();
            assert!(page.has(b"MediaBox"), "page {:?} lost its MediaBox", page_id);
        }
    }

    #[test]
    fn test_merge_rejects_invalid_input() {
        let good = create_test_pdf(1, "Good");
        let err = merge_documents(vec![good, b"garbage".to_vec()]).unwrap_err();
        assert!(err.to_string().contains("document 2"), "{}", err);
    }

    #[test]
    fn test_merged_document_has_single_catalog() {
        let merged = merge_documents(vec![
            create_test_pdf(1, "A"),
            create_test_pdf(1, "B"),
        ])
        .unwrap();
        let doc = Document::load_mem(&merged).unwrap();

        let catalogs = doc
            .objects
            .values()
            .filter_map(|o| o.as_dict().ok())
            .filter(|d| d.get(b"Type").and_then(|t| t.as_name()).ok() == Some(&b"Catalog"[..]))
            .count();
        assert_eq!(catalogs, 1);
    }
}
