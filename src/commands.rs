//! Operations behind the command-line flags
//!
//! Each takes the clipboard as a [`ClipboardAccess`] so it runs unchanged
//! against the system clipboard or [`MemoryClipboard`](crate::clipboard::MemoryClipboard).

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::clipboard::ClipboardAccess;
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::reformat::RuleSet;

/// What `-o` writes to the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    /// The CF_HTML blob exactly as read
    Raw,
    /// The text between the fragment markers
    Fragment,
    /// The HTML document with the header stripped
    Document,
}

/// Print every clipboard format, one per line
pub fn list_formats<C: ClipboardAccess, W: Write>(clipboard: &mut C, out: &mut W) -> Result<()> {
    let formats = clipboard.formats().context("listing clipboard formats")?;
    for format in &formats {
        writeln!(out, "{}", format)?;
    }
    Ok(())
}

/// Write the clipboard HTML to `path`
pub fn save_html<C: ClipboardAccess>(clipboard: &mut C, path: &Path, mode: SaveMode) -> Result<()> {
    let blob = clipboard.read_html()?;
    let decoder = Decoder::new();

    let bytes: &[u8] = match mode {
        SaveMode::Raw => &blob,
        SaveMode::Fragment => decoder.decode(&blob)?.as_bytes(),
        SaveMode::Document => decoder.document(&blob)?.as_bytes(),
    };

    fs::write(path, bytes).with_context(|| format!("Failed to write: {}", path.display()))?;
    info!(path = %path.display(), ?mode, len = bytes.len(), "saved clipboard HTML");
    Ok(())
}

/// Read the clipboard HTML, run the rule table over it and put the re-encoded
/// result back. The clipboard is untouched if any step fails.
pub fn reformat_clipboard<C: ClipboardAccess>(clipboard: &mut C, rules: &RuleSet, encoder: &Encoder) -> Result<()> {
    let blob = clipboard.read_html()?;
    let html = std::str::from_utf8(&blob).context("clipboard HTML is not valid UTF-8")?;

    let reformatted = rules.reformat(html)?;
    let encoded = encoder.encode(&reformatted)?;

    clipboard.write_html(&encoded)?;
    info!(before = blob.len(), after = encoded.len(), "reformatted clipboard HTML");
    Ok(())
}
