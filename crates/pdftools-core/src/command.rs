use crate::archive::split_to_zip;
use crate::compose::{compose_images, ComposeOptions, SourceImage};
use crate::error::{ErrorKind, PdfToolsError};
use crate::{check_page, get_page_count, merge_documents, split_document};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum PdfCommand {
    Merge {
        files: Vec<Vec<u8>>,
    },
    Split {
        file: Vec<u8>,
        ranges: Vec<(u32, u32)>,
    },
    /// One PDF per page, bundled as a zip
    SplitPages {
        file: Vec<u8>,
        #[serde(default = "default_stem")]
        name: String,
        #[serde(default)]
        ranges: Vec<(u32, u32)>,
    },
    Compose {
        images: Vec<SourceImage>,
        #[serde(default)]
        options: ComposeOptions,
    },
}

fn default_stem() -> String {
    "document".to_string()
}

/// What a successful command produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    Pdf,
    Zip,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessResult {
    pub success: bool,
    /// Base64-encoded output data
    pub data: Option<String>,
    pub output: Option<OutputKind>,
    pub error: Option<String>,
    pub error_kind: Option<ErrorKind>,
    pub metrics: Option<ProcessMetrics>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessMetrics {
    pub input_size_bytes: usize,
    pub output_size_bytes: usize,
    /// Pages in the output; for zips, the number of entries
    pub page_count: u32,
}

impl ProcessResult {
    fn ok(bytes: &[u8], output: OutputKind, metrics: ProcessMetrics) -> Self {
        Self {
            success: true,
            data: Some(STANDARD.encode(bytes)),
            output: Some(output),
            error: None,
            error_kind: None,
            metrics: Some(metrics),
        }
    }

    /// Successful run that produced nothing (an empty image batch)
    fn empty() -> Self {
        Self {
            success: true,
            data: None,
            output: None,
            error: None,
            error_kind: None,
            metrics: None,
        }
    }

    fn failed(err: &PdfToolsError) -> Self {
        Self {
            success: false,
            data: None,
            output: None,
            error: Some(err.to_string()),
            error_kind: Some(err.kind()),
            metrics: None,
        }
    }
}

/// Expand inclusive `(start, end)` pairs into page numbers within `1..=max_page`
fn expand_ranges(ranges: &[(u32, u32)], max_page: u32) -> Result<Vec<u32>, PdfToolsError> {
    let mut pages = Vec::new();
    for &(start, end) in ranges {
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
    Ok(pages)
}

impl PdfCommand {
    /// Parse a command from its JSON form
    pub fn from_json(json: &str) -> Result<Self, PdfToolsError> {
        serde_json::from_str(json).map_err(|e| PdfToolsError::SerializationError(e.to_string()))
    }

    fn input_size(&self) -> usize {
        match self {
            PdfCommand::Merge { files } => files.iter().map(Vec::len).sum(),
            PdfCommand::Split { file, .. } | PdfCommand::SplitPages { file, .. } => file.len(),
            PdfCommand::Compose { images, .. } => images.iter().map(|i| i.bytes.len()).sum(),
        }
    }

    /// Execute the command; failures are reported in the result, not returned
    pub fn run(self) -> ProcessResult {
        let input_size_bytes = self.input_size();
        match self.execute() {
            Ok(Some((bytes, output, page_count))) => ProcessResult::ok(
                &bytes,
                output,
                ProcessMetrics {
                    input_size_bytes,
                    output_size_bytes: bytes.len(),
                    page_count,
                },
            ),
            Ok(None) => ProcessResult::empty(),
            Err(e) => {
                tracing::warn!(kind = ?e.kind(), "command failed: {}", e);
                ProcessResult::failed(&e)
            }
        }
    }

    fn execute(self) -> Result<Option<(Vec<u8>, OutputKind, u32)>, PdfToolsError> {
        match self {
            PdfCommand::Merge { files } => {
                let merged = merge_documents(files)?;
                let pages = get_page_count(&merged)?;
                Ok(Some((merged, OutputKind::Pdf, pages)))
            }
            PdfCommand::Split { file, ranges } => {
                let pages = expand_ranges(&ranges, get_page_count(&file)?)?;
                let split = split_document(&file, pages)?;
                let count = get_page_count(&split)?;
                Ok(Some((split, OutputKind::Pdf, count)))
            }
            PdfCommand::SplitPages { file, name, ranges } => {
                let page_count = get_page_count(&file)?;
                let pages = if ranges.is_empty() {
                    (1..=page_count).collect()
                } else {
                    expand_ranges(&ranges, page_count)?
                };
                let count = pages
                    .iter()
                    .copied()
                    .collect::<std::collections::BTreeSet<_>>()
                    .len() as u32;
                let archive = split_to_zip(&file, &name, &pages)?;
                Ok(Some((archive, OutputKind::Zip, count)))
            }
            PdfCommand::Compose { images, options } => {
                Ok(compose_images(&images, &options)?.map(|composed| {
                    let pages = composed.page_count() as u32;
                    (composed.bytes, OutputKind::Pdf, pages)
                }))
            }
        }
    }
}
