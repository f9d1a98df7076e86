//! User-facing status line shared by all three tabs

use pdftools_core::{ErrorKind, PdfToolsError};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusState {
    Idle,
    Busy,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Status {
    pub state: StatusState,
    pub message: String,
    /// Failure category, only set in the error state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
}

impl Default for Status {
    fn default() -> Self {
        Self::idle()
    }
}

impl Status {
    pub fn idle() -> Self {
        Self {
            state: StatusState::Idle,
            message: String::new(),
            kind: None,
        }
    }

    pub fn busy(message: impl Into<String>) -> Self {
        Self {
            state: StatusState::Busy,
            message: message.into(),
            kind: None,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            state: StatusState::Success,
            message: message.into(),
            kind: None,
        }
    }

    /// One generic line per operation; the detail goes to the browser console
    pub fn failed(operation: &str, err: &PdfToolsError) -> Self {
        log_failure(&failure_detail(operation, err));
        Self {
            state: StatusState::Error,
            message: format!("{} failed. Please check your files and try again.", operation),
            kind: Some(err.kind()),
        }
    }

    /// Error that did not come from the core library (misuse of the session)
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            state: StatusState::Error,
            message: message.into(),
            kind: None,
        }
    }
}

/// Console line carrying what the status message leaves out
fn failure_detail(operation: &str, err: &PdfToolsError) -> String {
    format!("{} failed [{:?}]: {}", operation, err.kind(), err)
}

#[cfg(target_arch = "wasm32")]
fn log_failure(detail: &str) {
    web_sys::console::error_1(&detail.into());
}

// No console outside the browser
#[cfg(not(target_arch = "wasm32"))]
fn log_failure(_detail: &str) {}
