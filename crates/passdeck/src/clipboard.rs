//! Clipboard access for copying entry keys

use thiserror::Error;
use tracing::{debug, warn};

use crate::store::{EntryStore, Slot};

/// Clipboard failures
#[derive(Error, Debug)]
pub enum ClipboardError {
    #[error("Clipboard unavailable: {0}")]
    Unavailable(String),

    #[error("Clipboard write failed: {0}")]
    Write(String),
}

/// Something text can be copied to
pub trait Clipboard {
    fn copy(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// The desktop clipboard. Connected lazily so headless sessions only fail
/// when a copy is actually requested.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clipboard for SystemClipboard {
    fn copy(&mut self, text: &str) -> Result<(), ClipboardError> {
        if self.inner.is_none() {
            let clipboard = arboard::Clipboard::new()
                .map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
            self.inner = Some(clipboard);
        }

        match self.inner.as_mut() {
            Some(clipboard) => clipboard
                .set_text(text.to_string())
                .map_err(|e| ClipboardError::Write(e.to_string())),
            None => Err(ClipboardError::Unavailable("not connected".to_string())),
        }
    }
}

/// Copy the key of a stored entry. The buffer is never copied.
///
/// Failures are logged and reported as `false`; they are not errors for
/// the caller to handle.
pub fn copy_key(clipboard: &mut dyn Clipboard, store: &EntryStore, slot: Slot) -> bool {
    let Slot::Entry(_) = slot else {
        debug!("Copy requested on the buffer row; ignored");
        return false;
    };

    let Some(entry) = store.get(slot) else {
        debug!(row = slot.row(), "Copy requested on a missing row");
        return false;
    };

    match clipboard.copy(&entry.key) {
        Ok(()) => true,
        Err(e) => {
            warn!("Error copying text: {}", e);
            false
        }
    }
}
