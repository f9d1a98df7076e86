//! Stateful tool session, one per tab
//!
//! Holds the selected files in Rust memory so JavaScript only wires DOM
//! events and file I/O. Each mode owns one list: PDFs for merge and split,
//! images for the images tab.

use crate::status::Status;
use crate::validation::{validate_image, validate_pdf, ImageInfo, PdfInfo};
use pdftools_core::{
    compose_images_with_progress, merge_documents, parse_ranges, split_to_zip, ComposeOptions,
    PdfToolsError, SourceImage,
};
use wasm_bindgen::prelude::*;

/// PDF entry with metadata
struct DocumentEntry {
    name: String,
    bytes: Vec<u8>,
    info: PdfInfo,
}

/// Image entry for the images tab
struct ImageEntry {
    name: String,
    source: SourceImage,
    info: ImageInfo,
}

/// Session mode determines available operations
#[wasm_bindgen]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// Merge mode: multiple PDFs, combine in order
    Merge,
    /// Split mode: single PDF, one output file per selected page
    Split,
    /// Images mode: JPEG/PNG files, one page per image
    Images,
}

/// Stateful session that holds the tab's files in Rust memory
#[wasm_bindgen]
pub struct ToolSession {
    mode: SessionMode,
    documents: Vec<DocumentEntry>,
    images: Vec<ImageEntry>,
    selected_pages: Vec<u32>,
    compose_options: ComposeOptions,
    status: Status,
    progress_callback: Option<js_sys::Function>,
}

#[wasm_bindgen]
impl ToolSession {
    /// Create a new session in the specified mode
    #[wasm_bindgen(constructor)]
    pub fn new(mode: SessionMode) -> Self {
        Self {
            mode,
            documents: Vec::new(),
            images: Vec::new(),
            selected_pages: Vec::new(),
            compose_options: ComposeOptions::default(),
            status: Status::idle(),
            progress_callback: None,
        }
    }

    #[wasm_bindgen(getter)]
    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    /// Set a progress callback function
    /// Callback signature: (current: number, total: number, message: string) => void
    #[wasm_bindgen(js_name = setProgressCallback)]
    pub fn set_progress_callback(&mut self, callback: js_sys::Function) {
        self.progress_callback = Some(callback);
    }

    /// Add a PDF (merge and split tabs); returns its info
    #[wasm_bindgen(js_name = addDocument)]
    pub fn add_document(&mut self, name: &str, bytes: &[u8]) -> Result<JsValue, JsValue> {
        let info = self
            .add_document_internal(name, bytes)
            .map_err(|e| JsValue::from_str(&e))?;
        to_js(&info)
    }

    /// Add an image (images tab); returns its dimensions
    #[wasm_bindgen(js_name = addImage)]
    pub fn add_image(
        &mut self,
        name: &str,
        mime_type: &str,
        bytes: &[u8],
    ) -> Result<JsValue, JsValue> {
        let info = self
            .add_image_internal(name, mime_type, bytes)
            .map_err(|e| JsValue::from_str(&e))?;
        to_js(&info)
    }

    /// Remove a file from the current mode's list
    #[wasm_bindgen(js_name = removeItem)]
    pub fn remove_item(&mut self, index: usize) -> Result<(), JsValue> {
        self.remove_item_internal(index)
            .map_err(|e| JsValue::from_str(&e))
    }

    /// Reorder files (merge and images tabs)
    /// new_order is an array of current indices in the desired new order
    #[wasm_bindgen(js_name = reorderItems)]
    pub fn reorder_items(&mut self, new_order: &[usize]) -> Result<(), JsValue> {
        self.reorder_items_internal(new_order)
            .map_err(|e| JsValue::from_str(&e))
    }

    /// Set page selection for split mode
    /// Input: "1-3, 5, 8-10" format
    #[wasm_bindgen(js_name = setPageSelection)]
    pub fn set_page_selection(&mut self, range_str: &str) -> Result<(), JsValue> {
        self.set_page_selection_internal(range_str)
            .map_err(|e| JsValue::from_str(&e))
    }

    #[wasm_bindgen(js_name = getSelectedPages)]
    pub fn get_selected_pages(&self) -> Vec<u32> {
        self.selected_pages.clone()
    }

    /// Override composition settings (images tab); missing fields keep defaults
    #[wasm_bindgen(js_name = setComposeOptions)]
    pub fn set_compose_options(&mut self, options: JsValue) -> Result<(), JsValue> {
        let options: ComposeOptions = serde_wasm_bindgen::from_value(options)
            .map_err(|e| JsValue::from_str(&format!("Invalid options: {}", e)))?;
        self.set_compose_options_internal(options)
            .map_err(|e| JsValue::from_str(&e))
    }

    /// Names and sizes of the files in the current mode's list
    #[wasm_bindgen(js_name = getItemInfos)]
    pub fn get_item_infos(&self) -> Result<JsValue, JsValue> {
        to_js(&self.item_infos())
    }

    #[wasm_bindgen(js_name = getItemCount)]
    pub fn get_item_count(&self) -> usize {
        match self.mode {
            SessionMode::Merge | SessionMode::Split => self.documents.len(),
            SessionMode::Images => self.images.len(),
        }
    }

    /// Get total page count across all PDFs
    #[wasm_bindgen(js_name = getTotalPageCount)]
    pub fn get_total_page_count(&self) -> u32 {
        self.documents.iter().map(|d| d.info.page_count).sum()
    }

    /// Check if session is ready for execution
    #[wasm_bindgen(js_name = canExecute)]
    pub fn can_execute(&self) -> bool {
        match self.mode {
            SessionMode::Merge => self.documents.len() >= 2,
            SessionMode::Split => !self.documents.is_empty() && !self.selected_pages.is_empty(),
            SessionMode::Images => !self.images.is_empty(),
        }
    }

    /// File name the browser should save the output under
    #[wasm_bindgen(js_name = outputFileName)]
    pub fn output_file_name(&self) -> String {
        match self.mode {
            SessionMode::Merge => "merged.pdf".to_string(),
            SessionMode::Split => {
                let stem = self
                    .documents
                    .first()
                    .map(|d| file_stem(&d.name))
                    .unwrap_or("document");
                format!("{}-pages.zip", stem)
            }
            SessionMode::Images => "images.pdf".to_string(),
        }
    }

    /// Current status line: `{ state, message, kind? }`
    pub fn status(&self) -> Result<JsValue, JsValue> {
        to_js(&self.status)
    }

    /// Run the tab's operation
    ///
    /// Returns `undefined` when the images tab has nothing to convert.
    pub fn execute(&mut self) -> Result<Option<js_sys::Uint8Array>, JsValue> {
        let output = self
            .execute_internal()
            .map_err(|e| JsValue::from_str(&e))?;

        Ok(output.map(|bytes| {
            let array = js_sys::Uint8Array::new_with_length(bytes.len() as u32);
            array.copy_from(&bytes);
            array
        }))
    }
}

impl ToolSession {
    fn add_document_internal(&mut self, name: &str, bytes: &[u8]) -> Result<PdfInfo, String> {
        match self.mode {
            SessionMode::Images => {
                return Err("The images tab only accepts JPEG and PNG files".to_string())
            }
            SessionMode::Split if !self.documents.is_empty() => {
                return Err(
                    "Split mode only allows one document. Remove existing document first."
                        .to_string(),
                )
            }
            _ => {}
        }

        let info = validate_pdf(bytes)?;

        // In split mode, start with every page selected
        if self.mode == SessionMode::Split {
            self.selected_pages = (1..=info.page_count).collect();
        }

        self.documents.push(DocumentEntry {
            name: name.to_string(),
            bytes: bytes.to_vec(),
            info: info.clone(),
        });
        self.status = Status::idle();

        Ok(info)
    }

    fn add_image_internal(
        &mut self,
        name: &str,
        mime_type: &str,
        bytes: &[u8],
    ) -> Result<ImageInfo, String> {
        if self.mode != SessionMode::Images {
            return Err("Images can only be added in the images tab".to_string());
        }

        let info = validate_image(mime_type, bytes)?;
        self.images.push(ImageEntry {
            name: name.to_string(),
            source: SourceImage::new(mime_type, bytes.to_vec()),
            info: info.clone(),
        });
        self.status = Status::idle();

        Ok(info)
    }

    fn remove_item_internal(&mut self, index: usize) -> Result<(), String> {
        let len = self.get_item_count();
        if index >= len {
            return Err("Item index out of bounds".to_string());
        }

        match self.mode {
            SessionMode::Merge => {
                self.documents.remove(index);
            }
            SessionMode::Split => {
                self.documents.remove(index);
                self.selected_pages.clear();
            }
            SessionMode::Images => {
                self.images.remove(index);
            }
        }
        Ok(())
    }

    fn reorder_items_internal(&mut self, new_order: &[usize]) -> Result<(), String> {
        match self.mode {
            SessionMode::Merge => reorder(&mut self.documents, new_order),
            SessionMode::Images => reorder(&mut self.images, new_order),
            SessionMode::Split => Err("Reorder not available in split mode".to_string()),
        }
    }

    fn set_page_selection_internal(&mut self, range_str: &str) -> Result<(), String> {
        if self.mode != SessionMode::Split {
            return Err("Page selection only available in split mode".to_string());
        }

        let max_page = self
            .documents
            .first()
            .map(|d| d.info.page_count)
            .ok_or_else(|| "No document loaded".to_string())?;

        let pages =
            parse_ranges(range_str, max_page).map_err(|e| format!("Invalid range: {}", e))?;

        self.selected_pages = pages;
        Ok(())
    }

    fn set_compose_options_internal(&mut self, options: ComposeOptions) -> Result<(), String> {
        if self.mode != SessionMode::Images {
            return Err("Options only apply to the images tab".to_string());
        }
        options.validate().map_err(|e| e.to_string())?;
        self.compose_options = options;
        Ok(())
    }

    fn item_infos(&self) -> Vec<ItemInfoJs> {
        match self.mode {
            SessionMode::Merge | SessionMode::Split => self
                .documents
                .iter()
                .map(|d| ItemInfoJs {
                    name: d.name.clone(),
                    size_bytes: d.bytes.len(),
                    page_count: Some(d.info.page_count),
                    width: None,
                    height: None,
                })
                .collect(),
            SessionMode::Images => self
                .images
                .iter()
                .map(|i| ItemInfoJs {
                    name: i.name.clone(),
                    size_bytes: i.info.size_bytes,
                    page_count: None,
                    width: Some(i.info.width),
                    height: Some(i.info.height),
                })
                .collect(),
        }
    }

    fn execute_internal(&mut self) -> Result<Option<Vec<u8>>, String> {
        // Empty images tab: nothing to do, nothing to report
        if self.mode == SessionMode::Images && self.images.is_empty() {
            self.status = Status::idle();
            return Ok(None);
        }

        if !self.can_execute() {
            let message = "Session not ready for execution";
            self.status = Status::rejected(message);
            return Err(message.to_string());
        }

        let operation = match self.mode {
            SessionMode::Merge => "Merge",
            SessionMode::Split => "Split",
            SessionMode::Images => "Image conversion",
        };
        self.status = Status::busy(format!("{} in progress...", operation));
        self.report_progress(0, 100, "Starting...");

        let result = match self.mode {
            SessionMode::Merge => self.execute_merge().map(Some),
            SessionMode::Split => self.execute_split().map(Some),
            SessionMode::Images => self.execute_images(),
        };

        match result {
            Ok(output) => {
                self.report_progress(100, 100, "Complete");
                self.status = Status::success(self.success_message());
                Ok(output)
            }
            Err(e) => {
                self.status = Status::failed(operation, &e);
                Err(self.status.message.clone())
            }
        }
    }

    fn execute_merge(&self) -> Result<Vec<u8>, PdfToolsError> {
        self.report_progress(5, 100, "Preparing documents...");
        let docs: Vec<Vec<u8>> = self.documents.iter().map(|d| d.bytes.clone()).collect();

        self.report_progress(50, 100, "Merging...");
        merge_documents(docs)
    }

    fn execute_split(&self) -> Result<Vec<u8>, PdfToolsError> {
        self.report_progress(10, 100, "Extracting pages...");
        let doc = &self.documents[0];
        split_to_zip(&doc.bytes, file_stem(&doc.name), &self.selected_pages)
    }

    fn execute_images(&self) -> Result<Option<Vec<u8>>, PdfToolsError> {
        let sources: Vec<SourceImage> = self.images.iter().map(|i| i.source.clone()).collect();

        let composed =
            compose_images_with_progress(&sources, &self.compose_options, |done, total| {
                self.report_progress(
                    (done * 95 / total) as u32,
                    100,
                    &format!("Converted image {}/{}...", done, total),
                );
            })?;

        Ok(composed.map(|c| c.bytes))
    }

    fn success_message(&self) -> String {
        match self.mode {
            SessionMode::Merge => format!(
                "Merged {} files ({} pages)",
                self.documents.len(),
                self.get_total_page_count()
            ),
            SessionMode::Split => format!("Split into {} files", self.selected_pages.len()),
            SessionMode::Images => format!("Created PDF with {} pages", self.images.len()),
        }
    }

    /// Report progress to JavaScript callback
    fn report_progress(&self, current: u32, total: u32, message: &str) {
        if let Some(ref callback) = self.progress_callback {
            let this = JsValue::null();
            let _ = callback.call3(
                &this,
                &JsValue::from(current),
                &JsValue::from(total),
                &JsValue::from_str(message),
            );
        }
    }
}

/// Move items into the order given by `new_order` (a permutation of indices)
fn reorder<T>(items: &mut Vec<T>, new_order: &[usize]) -> Result<(), String> {
    if new_order.len() != items.len() {
        return Err("Invalid order: wrong number of indices".to_string());
    }

    let mut slots: Vec<Option<T>> = items.drain(..).map(Some).collect();
    let mut reordered = Vec::with_capacity(slots.len());
    for &idx in new_order {
        match slots.get_mut(idx).and_then(Option::take) {
            Some(item) => reordered.push(item),
            None => {
                // Put back whatever is left so a bad order leaves the list intact
                let error = if idx >= slots.len() {
                    "Invalid order: index out of bounds"
                } else {
                    "Invalid order: duplicate index"
                };
                restore(items, reordered, slots, new_order);
                return Err(error.to_string());
            }
        }
    }

    *items = reordered;
    Ok(())
}

/// Undo a partial reorder: taken items go back to their original slots
fn restore<T>(items: &mut Vec<T>, taken: Vec<T>, mut slots: Vec<Option<T>>, order: &[usize]) {
    for (item, &idx) in taken.into_iter().zip(order) {
        slots[idx] = Some(item);
    }
    items.extend(slots.into_iter().flatten());
}

fn file_stem(name: &str) -> &str {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    match base.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => base,
    }
}

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// File list entry for JS serialization
#[derive(serde::Serialize)]
struct ItemInfoJs {
    name: String,
    size_bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    page_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    height: Option<u32>,
}
