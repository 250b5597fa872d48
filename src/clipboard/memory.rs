//! In-process clipboard

use super::{ClipboardAccess, ClipboardFormat};
use crate::blob::HTML_FORMAT_NAME;
use crate::error::ClipboardError;

/// Id the fake hands out for `HTML Format`; registered ids start at 0xC000
pub const MEMORY_HTML_FORMAT_ID: u32 = 0xC0C6;

/// Clipboard held in memory, for tests and dry runs
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    formats: Vec<ClipboardFormat>,
    html: Option<Vec<u8>>,
    writes: usize,
}

impl MemoryClipboard {
    /// Empty clipboard
    pub fn new() -> Self {
        Self::default()
    }

    /// Clipboard holding an `HTML Format` entry
    pub fn with_html(blob: impl Into<Vec<u8>>) -> Self {
        Self {
            formats: vec![ClipboardFormat::new(MEMORY_HTML_FORMAT_ID, Some(HTML_FORMAT_NAME))],
            html: Some(blob.into()),
            writes: 0,
        }
    }

    /// Add another format to the listing
    pub fn with_format(mut self, id: u32, name: Option<&str>) -> Self {
        self.formats.push(ClipboardFormat::new(id, name));
        self
    }

    /// Current `HTML Format` bytes
    pub fn html(&self) -> Option<&[u8]> {
        self.html.as_deref()
    }

    /// Number of successful writes
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl ClipboardAccess for MemoryClipboard {
    fn formats(&mut self) -> Result<Vec<ClipboardFormat>, ClipboardError> {
        Ok(self.formats.clone())
    }

    fn read_html(&mut self) -> Result<Vec<u8>, ClipboardError> {
        let html = self
            .html
            .as_ref()
            .ok_or_else(|| ClipboardError::FormatUnavailable(HTML_FORMAT_NAME.to_string()))?;

        let end = html.iter().position(|&b| b == 0).unwrap_or(html.len());
        Ok(html[..end].to_vec())
    }

    fn write_html(&mut self, blob: &[u8]) -> Result<(), ClipboardError> {
        self.formats = vec![ClipboardFormat::new(MEMORY_HTML_FORMAT_ID, Some(HTML_FORMAT_NAME))];
        self.html = Some(blob.to_vec());
        self.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_stops_at_nul() {
        let mut clipboard = MemoryClipboard::with_html(b"abc\0def".to_vec());
        assert_eq!(clipboard.read_html().unwrap(), b"abc");
    }

    #[test]
    fn test_read_without_html() {
        let mut clipboard = MemoryClipboard::new().with_format(13, None);

        let err = clipboard.read_html().unwrap_err();
        assert_eq!(err, ClipboardError::FormatUnavailable("HTML Format".to_string()));
    }

    #[test]
    fn test_write_replaces_contents() {
        let mut clipboard = MemoryClipboard::new().with_format(1, None).with_format(13, None);
        clipboard.write_html(b"blob\0").unwrap();

        let formats = clipboard.formats().unwrap();
        assert_eq!(formats.len(), 1);
        assert_eq!(formats[0].name.as_deref(), Some("HTML Format"));
        assert_eq!(clipboard.html(), Some(&b"blob\0"[..]));
        assert_eq!(clipboard.writes(), 1);
    }
}
