//! Input validation for the file pickers
//!
//! PDFs are checked for a header, a trailer marker and at least one page;
//! images are probed for format and dimensions without a full decode.

use lopdf::Document;
use pdftools_core::probe_image;
use serde::Serialize;

/// Image formats the images tab accepts
const ACCEPTED_IMAGE_TYPES: [&str; 2] = ["image/jpeg", "image/png"];

/// PDF file information extracted during validation
#[derive(Debug, Clone, Serialize, Default)]
pub struct PdfInfo {
    /// Number of pages in the document
    pub page_count: u32,
    /// PDF version string (e.g., "1.7")
    pub version: String,
    /// Whether the document is encrypted
    pub encrypted: bool,
    /// File size in bytes
    pub size_bytes: usize,
    /// Document title from metadata (if available)
    pub title: Option<String>,
}

/// Image file information for the images tab list
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    /// MIME type detected from the file contents
    pub mime_type: String,
    pub size_bytes: usize,
}

/// Validate a PDF file and extract basic info
pub fn validate_pdf(bytes: &[u8]) -> Result<PdfInfo, String> {
    quick_validate(bytes)?;

    let document = Document::load_mem(bytes).map_err(|e| format!("Failed to parse PDF: {}", e))?;

    let page_count = document.get_pages().len() as u32;
    if page_count == 0 {
        return Err("PDF has no pages".to_string());
    }

    Ok(PdfInfo {
        page_count,
        version: extract_version(bytes),
        encrypted: document.is_encrypted(),
        size_bytes: bytes.len(),
        title: extract_title(&document),
    })
}

/// Quick validation without full parsing (for large files)
pub fn quick_validate(bytes: &[u8]) -> Result<(), String> {
    if bytes.len() < 8 {
        return Err("File too small to be a valid PDF".to_string());
    }

    if !bytes.starts_with(b"%PDF-") {
        return Err("Not a valid PDF file (missing %PDF- header)".to_string());
    }

    // %%EOF should sit within the last kilobyte
    let tail = &bytes[bytes.len().saturating_sub(1024)..];
    if !tail.windows(5).any(|w| w == b"%%EOF") {
        return Err("PDF appears truncated (missing %%EOF marker)".to_string());
    }

    Ok(())
}

/// Check an image is a JPEG or PNG and read its dimensions
pub fn validate_image(mime_type: &str, bytes: &[u8]) -> Result<ImageInfo, String> {
    if bytes.is_empty() {
        return Err("Image file is empty".to_string());
    }

    let probe = probe_image(mime_type, bytes).map_err(|e| e.to_string())?;
    let detected = probe.format.to_mime_type();
    if !ACCEPTED_IMAGE_TYPES.contains(&detected) {
        return Err(format!("Unsupported image type: {}", detected));
    }
    if probe.width == 0 || probe.height == 0 {
        return Err("Image has no pixels".to_string());
    }

    Ok(ImageInfo {
        width: probe.width,
        height: probe.height,
        mime_type: detected.to_string(),
        size_bytes: bytes.len(),
    })
}

/// Extract PDF version from header (`%PDF-1.7`)
fn extract_version(bytes: &[u8]) -> String {
    bytes
        .get(5..8)
        .and_then(|v| std::str::from_utf8(v).ok())
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| "1.4".to_string())
}

fn extract_title(document: &Document) -> Option<String> {
    let info_id = document.trailer.get(b"Info").ok()?.as_reference().ok()?;
    let title = document
        .get_dictionary(info_id)
        .ok()?
        .get(b"Title")
        .ok()?
        .as_str()
        .ok()?;
    let decoded = String::from_utf8_lossy(title);
    (!decoded.is_empty()).then(|| decoded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdftools_core::fixtures::{create_jpeg, create_png, create_test_pdf};

    #[test]
    fn test_quick_validate_rejects_non_pdf() {
        assert!(quick_validate(b"not a pdf file").is_err());
    }

    #[test]
    fn test_quick_validate_rejects_small_file() {
        assert!(quick_validate(b"tiny").is_err());
    }

    #[test]
    fn test_quick_validate_rejects_truncated() {
        let pdf = create_test_pdf(1, "Doc");
        let truncated = &pdf[..pdf.len() - 10];
        assert!(quick_validate(truncated).unwrap_err().contains("truncated"));
    }

    #[test]
    fn test_quick_validate_accepts_valid_pdf() {
        assert!(quick_validate(&create_test_pdf(1, "Doc")).is_ok());
    }

    #[test]
    fn test_validate_pdf_reports_pages_and_version() {
        let info = validate_pdf(&create_test_pdf(5, "Doc")).unwrap();
        assert_eq!(info.page_count, 5);
        assert_eq!(info.version, "1.7");
        assert!(!info.encrypted);
        assert!(info.title.is_none());
    }

    #[test]
    fn test_validate_pdf_rejects_invalid_data() {
        assert!(validate_pdf(b"not a valid pdf").is_err());
    }

    #[test]
    fn test_extract_version() {
        assert_eq!(extract_version(b"%PDF-1.7\n"), "1.7");
        assert_eq!(extract_version(b"%PDF-2.0\n"), "2.0");
        assert_eq!(extract_version(b"%PDF"), "1.4");
    }

    #[test]
    fn test_validate_image_png() {
        let info = validate_image("image/png", &create_png(64, 48)).unwrap();
        assert_eq!((info.width, info.height), (64, 48));
        assert_eq!(info.mime_type, "image/png");
    }

    #[test]
    fn test_validate_image_trusts_contents_over_declared_type() {
        let info = validate_image("image/png", &create_jpeg(8, 8)).unwrap();
        assert_eq!(info.mime_type, "image/jpeg");
    }

    #[test]
    fn test_validate_image_rejects_pdf() {
        let pdf = create_test_pdf(1, "Doc");
        assert!(validate_image("image/png", &pdf).is_err());
    }

    #[test]
    fn test_validate_image_rejects_empty() {
        assert!(validate_image("image/jpeg", &[]).is_err());
    }
}
