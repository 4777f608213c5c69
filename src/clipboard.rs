//! Clipboard access

use crate::{Error, Result};

/// Copies text to a clipboard
pub trait Clipboard: Send + Sync {
    /// Replace the clipboard contents with `text`
    ///
    /// # Errors
    ///
    /// Returns error if the clipboard is unavailable
    fn copy(&self, text: &str) -> Result<()>;
}

/// The operating system clipboard of the machine running the process
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn copy(&self, text: &str) -> Result<()> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| Error::Clipboard(e.to_string()))?;
        clipboard
            .set_text(text.to_string())
            .map_err(|e| Error::Clipboard(e.to_string()))?;
        tracing::debug!(chars = text.len(), "copied to clipboard");
        Ok(())
    }
}
