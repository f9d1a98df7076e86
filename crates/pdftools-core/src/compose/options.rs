//! Tunable policy for image-to-PDF composition
//!
//! Every field has a default matching the browser tool's behavior, so an
//! empty JSON object (`{}`) deserializes to [`ComposeOptions::default`].

use super::layout::check_page_geometry;
use crate::error::PdfToolsError;
use serde::{Deserialize, Serialize};

/// US Letter width in points (1 point = 1/72 inch)
pub const LETTER_WIDTH: f64 = 612.0;
/// US Letter height in points
pub const LETTER_HEIGHT: f64 = 792.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ComposeOptions {
    /// Largest width in pixels an image keeps after normalization
    pub max_image_width: u32,
    /// Largest height in pixels an image keeps after normalization
    pub max_image_height: u32,
    /// JPEG quality, 1-100
    pub jpeg_quality: u8,
    /// Blank border on every side of the page, in points
    pub margin: f64,
    pub page_width: f64,
    pub page_height: f64,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            max_image_width: 1600,
            max_image_height: 1600,
            jpeg_quality: 80,
            margin: 36.0,
            page_width: LETTER_WIDTH,
            page_height: LETTER_HEIGHT,
        }
    }
}

impl ComposeOptions {
    /// Reject settings that would leave no drawable area or no pixels
    pub fn validate(&self) -> Result<(), PdfToolsError> {
        if self.max_image_width == 0 || self.max_image_height == 0 {
            return Err(PdfToolsError::OperationError(
                "Maximum image dimensions must be at least 1 pixel".into(),
            ));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(PdfToolsError::OperationError(format!(
                "JPEG quality must be between 1 and 100, got {}",
                self.jpeg_quality
            )));
        }
        check_page_geometry(self.page_width, self.page_height, self.margin)?;
        Ok(())
    }
}
