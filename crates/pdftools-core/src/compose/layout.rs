//! Fit-to-page geometry
//!
//! Coordinates are PDF user space: points, origin at the bottom-left.

use crate::error::PdfToolsError;
use serde::Serialize;

/// Where one image lands on its page
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageLayout {
    pub page_width: f64,
    pub page_height: f64,
    pub margin: f64,
    pub draw_x: f64,
    pub draw_y: f64,
    pub draw_width: f64,
    pub draw_height: f64,
}

impl PageLayout {
    /// Scale an image of `image_width` x `image_height` pixels to fill the
    /// margin-bounded content area, preserving aspect ratio, and center it.
    ///
    /// Small images are scaled up. The draw size is clamped to at least 1pt
    /// and at most the content area on each axis. Fails when the page and
    /// margin leave less than that.
    pub fn fit(
        page_width: f64,
        page_height: f64,
        margin: f64,
        image_width: u32,
        image_height: u32,
    ) -> Result<Self, PdfToolsError> {
        check_page_geometry(page_width, page_height, margin)?;

        let max_width = page_width - 2.0 * margin;
        let max_height = page_height - 2.0 * margin;

        let image_width = f64::from(image_width.max(1));
        let image_height = f64::from(image_height.max(1));

        let scale = (max_width / image_width).min(max_height / image_height);

        let draw_width = (image_width * scale).clamp(1.0, max_width);
        let draw_height = (image_height * scale).clamp(1.0, max_height);

        Ok(Self {
            page_width,
            page_height,
            margin,
            draw_x: (page_width - draw_width) / 2.0,
            draw_y: (page_height - draw_height) / 2.0,
            draw_width,
            draw_height,
        })
    }

    pub fn content_width(&self) -> f64 {
        self.page_width - 2.0 * self.margin
    }

    pub fn content_height(&self) -> f64 {
        self.page_height - 2.0 * self.margin
    }
}

/// Reject a page whose margin-bounded content area cannot hold a 1pt draw
pub(crate) fn check_page_geometry(
    page_width: f64,
    page_height: f64,
    margin: f64,
) -> Result<(), PdfToolsError> {
    if !page_width.is_finite() || !page_height.is_finite() {
        return Err(PdfToolsError::OperationError(
            "Page size must be finite".into(),
        ));
    }
    if !margin.is_finite() || margin < 0.0 {
        return Err(PdfToolsError::OperationError(format!(
            "Margin must be a non-negative number, got {}",
            margin
        )));
    }
    if page_width - 2.0 * margin < 1.0 || page_height - 2.0 * margin < 1.0 {
        return Err(PdfToolsError::OperationError(format!(
            "Margin {} leaves no content area on a {}x{} page",
            margin, page_width, page_height
        )));
    }
    Ok(())
}
