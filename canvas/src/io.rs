//! File I/O: the text load/save seam plus the browser implementations.
//!
//! Declining a save is a normal outcome ([`SaveOutcome::Declined`]), not an
//! error. Read and write failures map to [`ViewerError::ReadFailure`] and
//! [`ViewerError::WriteFailure`].

#[cfg(test)]
#[path = "io_test.rs"]
mod io_test;

use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Blob, BlobPropertyBag, File, HtmlAnchorElement, Url};

use crate::error::ViewerError;

/// MIME type offered for exported documents.
pub const EXPORT_MIME: &str = "image/svg+xml";

/// Result of a save request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// The user (or the host's policy) chose not to write.
    Declined,
}

/// Reads the document to open and writes the exported one.
pub trait TextFileIo {
    /// # Errors
    ///
    /// [`ViewerError::ReadFailure`] when the source cannot be read.
    fn read_text_file(&mut self) -> Result<String, ViewerError>;

    /// # Errors
    ///
    /// [`ViewerError::WriteFailure`] when the target cannot be written.
    fn write_text_file(&mut self, content: &str) -> Result<SaveOutcome, ViewerError>;
}

/// In-memory document slot; handy for hosts that already hold the text.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFile {
    /// Text returned by reads; `None` makes reads fail.
    pub content: Option<String>,
    /// Every successfully written document, oldest first.
    pub written: Vec<String>,
    /// When set, writes are declined.
    pub decline_writes: bool,
}

impl InMemoryFile {
    #[must_use]
    pub fn with_content(content: impl Into<String>) -> Self {
        Self { content: Some(content.into()), ..Self::default() }
    }
}

impl TextFileIo for InMemoryFile {
    fn read_text_file(&mut self) -> Result<String, ViewerError> {
        self.content.clone().ok_or_else(|| ViewerError::ReadFailure("no content".into()))
    }

    fn write_text_file(&mut self, content: &str) -> Result<SaveOutcome, ViewerError> {
        if self.decline_writes {
            return Ok(SaveOutcome::Declined);
        }
        self.written.push(content.to_owned());
        Ok(SaveOutcome::Saved)
    }
}

// ── Browser ─────────────────────────────────────────────────────

/// Read a user-selected file as UTF-8 text.
///
/// # Errors
///
/// [`ViewerError::ReadFailure`] if the browser rejects the read.
pub async fn read_file_text(file: &File) -> Result<String, ViewerError> {
    let value = JsFuture::from(file.text()).await.map_err(|e| ViewerError::ReadFailure(describe(&e)))?;
    value
        .as_string()
        .ok_or_else(|| ViewerError::ReadFailure(format!("{} did not yield text", file.name())))
}

/// Hand `content` to the browser as a download named `file_name`.
///
/// The browser owns the save prompt from here, so a dismissed prompt is not
/// observable and the result is always [`SaveOutcome::Saved`].
///
/// # Errors
///
/// [`ViewerError::WriteFailure`] if the blob, object URL or anchor cannot be created.
pub fn offer_download(file_name: &str, content: &str) -> Result<SaveOutcome, ViewerError> {
    let parts = js_sys::Array::new();
    parts.push(&JsValue::from_str(content));
    let options = BlobPropertyBag::new();
    options.set_type(EXPORT_MIME);
    let blob = Blob::new_with_str_sequence_and_options(&parts, &options).map_err(write_failure)?;
    let url = Url::create_object_url_with_blob(&blob).map_err(write_failure)?;

    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| ViewerError::WriteFailure("no document".into()))?;
    let anchor = document
        .create_element("a")
        .map_err(write_failure)?
        .dyn_into::<HtmlAnchorElement>()
        .map_err(|_| ViewerError::WriteFailure("anchor element cast failed".into()))?;
    anchor.set_href(&url);
    anchor.set_download(file_name);
    anchor.click();

    if let Err(e) = Url::revoke_object_url(&url) {
        tracing::debug!(error = %describe(&e), "failed to revoke object url");
    }
    tracing::info!(file_name, bytes = content.len(), "export offered for download");
    Ok(SaveOutcome::Saved)
}

fn write_failure(e: JsValue) -> ViewerError {
    ViewerError::WriteFailure(describe(&e))
}

fn describe(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}
