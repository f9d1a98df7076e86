//! Zip bundling for multi-file outputs

use crate::error::PdfToolsError;
use crate::split::split_pages;
use std::collections::HashSet;
use std::io::{Cursor, Write};
use tracing::info;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Write `(name, bytes)` entries into a deflate-compressed zip, in order
pub fn bundle_files(entries: &[(String, Vec<u8>)]) -> Result<Vec<u8>, PdfToolsError> {
    let mut seen = HashSet::new();
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    for (name, bytes) in entries {
        if !seen.insert(name.as_str()) {
            return Err(PdfToolsError::ArchiveError(format!(
                "Duplicate entry name: {}",
                name
            )));
        }
        writer.start_file(name.as_str(), options)?;
        writer
            .write_all(bytes)
            .map_err(|e| PdfToolsError::ArchiveError(e.to_string()))?;
    }

    Ok(writer.finish()?.into_inner())
}

/// Entry name for one page: `{stem}-page-{n}.pdf`, `n` padded to the
/// width of the largest page number
pub fn page_entry_name(stem: &str, page: u32, page_count: u32) -> String {
    let width = page_count.max(1).to_string().len();
    format!("{}-page-{:0width$}.pdf", stem, page, width = width)
}

/// Split `bytes` into single-page PDFs and zip them
pub fn split_to_zip(bytes: &[u8], stem: &str, pages: &[u32]) -> Result<Vec<u8>, PdfToolsError> {
    let page_count = crate::get_page_count(bytes)?;
    let entries: Vec<(String, Vec<u8>)> = split_pages(bytes, pages)?
        .into_iter()
        .map(|(page, pdf)| (page_entry_name(stem, page, page_count), pdf))
        .collect();

    let archive = bundle_files(&entries)?;
    info!(
        entries = entries.len(),
        size_bytes = archive.len(),
        "bundled pages into zip"
    );
    Ok(archive)
}
