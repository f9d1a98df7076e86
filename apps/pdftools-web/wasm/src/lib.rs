//! WASM bindings for the merge, split and images-to-PDF tabs
//!
//! This module provides a stateful, session-based API per tab.
//! All state is held in Rust, minimizing JavaScript complexity.
//!
//! ## Architecture
//!
//! - State management in Rust via `ToolSession`
//! - PDF and image validation in Rust
//! - Document work delegated to `pdftools-core`
//! - JavaScript only handles tab switching, DOM events and file I/O
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { ToolSession, SessionMode } from './pkg/pdftools_wasm.js';
//!
//! await init();
//!
//! // Images tab
//! const session = new ToolSession(SessionMode.Images);
//! session.setProgressCallback((current, total, msg) => updateUI(current, total, msg));
//! session.addImage("photo.jpg", file.type, bytes);
//! const result = session.execute(); // undefined when no images were added
//! if (result) downloadBlob(result, session.outputFileName()); // "images.pdf"
//! showStatus(session.status()); // { state: "success", message: "..." }
//!
//! // Split tab
//! const split = new ToolSession(SessionMode.Split);
//! split.addDocument("report.pdf", bytes);
//! split.setPageSelection("1-3, 5");
//! downloadBlob(split.execute(), split.outputFileName()); // "report-pages.zip"
//! ```

pub mod session;
pub mod status;
pub mod validation;

use wasm_bindgen::prelude::*;

// Re-export main types for JavaScript
pub use session::{SessionMode, ToolSession};
pub use status::{Status, StatusState};
pub use validation::{ImageInfo, PdfInfo};

/// Initialize the WASM module
/// Called automatically by wasm-bindgen
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    web_sys::console::log_1(&"pdftools WASM initialized".into());
}

/// Get the library version
#[wasm_bindgen(js_name = getVersion)]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Quick validation check for a PDF file
/// Returns Ok(()) if valid, Err with message if not
#[wasm_bindgen(js_name = quickValidate)]
pub fn quick_validate(bytes: &[u8]) -> Result<(), JsValue> {
    validation::quick_validate(bytes).map_err(|e| JsValue::from_str(&e))
}

/// Get detailed PDF info without creating a session
/// Useful for showing file info before user commits to an operation
#[wasm_bindgen(js_name = getPdfInfo)]
pub fn get_pdf_info(bytes: &[u8]) -> Result<JsValue, JsValue> {
    let info = validation::validate_pdf(bytes).map_err(|e| JsValue::from_str(&e))?;

    serde_wasm_bindgen::to_value(&info)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// Get page count from PDF bytes (convenience function)
#[wasm_bindgen(js_name = getPageCount)]
pub fn get_page_count(bytes: &[u8]) -> Result<u32, JsValue> {
    pdftools_core::get_page_count(bytes).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Get image dimensions and detected type without creating a session
#[wasm_bindgen(js_name = getImageInfo)]
pub fn get_image_info(mime_type: &str, bytes: &[u8]) -> Result<JsValue, JsValue> {
    let info = validation::validate_image(mime_type, bytes).map_err(|e| JsValue::from_str(&e))?;

    serde_wasm_bindgen::to_value(&info)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// Format bytes as human-readable string
#[wasm_bindgen(js_name = formatBytes)]
pub fn format_bytes(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    match bytes {
        b if b < KB => format!("{} B", b),
        b if b < MB => format!("{:.1} KB", b as f64 / KB as f64),
        b => format!("{:.1} MB", b as f64 / MB as f64),
    }
}
