use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfToolsError {
    #[error("Failed to parse PDF: {0}")]
    ParseError(String),

    #[error("Invalid page range: {0}")]
    InvalidRange(String),

    #[error("PDF operation failed: {0}")]
    OperationError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Input bytes at `index` are not a decodable raster image
    #[error("Failed to decode image {index}: {reason}")]
    ImageDecode { index: usize, reason: String },

    /// Header probe of a single image outside a batch failed
    #[error("Failed to read image: {0}")]
    UnreadableImage(String),

    /// Re-encoding the image at `index` failed
    #[error("Failed to encode image {index}: {reason}")]
    ImageEncode { index: usize, reason: String },

    #[error("Archive error: {0}")]
    ArchiveError(String),
}

/// Coarse failure category, stable enough to hand across the wasm boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Parse,
    InvalidRange,
    Operation,
    Decode,
    Encode,
    Serialization,
    Archive,
}

impl PdfToolsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PdfToolsError::ParseError(_) => ErrorKind::Parse,
            PdfToolsError::InvalidRange(_) => ErrorKind::InvalidRange,
            PdfToolsError::OperationError(_) => ErrorKind::Operation,
            PdfToolsError::SerializationError(_) => ErrorKind::Serialization,
            PdfToolsError::ImageDecode { .. } | PdfToolsError::UnreadableImage(_) => {
                ErrorKind::Decode
            }
            PdfToolsError::ImageEncode { .. } => ErrorKind::Encode,
            PdfToolsError::ArchiveError(_) => ErrorKind::Archive,
        }
    }
}

impl From<zip::result::ZipError> for PdfToolsError {
    fn from(e: zip::result::ZipError) -> Self {
        PdfToolsError::ArchiveError(e.to_string())
    }
}
