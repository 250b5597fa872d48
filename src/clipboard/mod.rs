//! Clipboard access
//!
//! Commands talk to the clipboard through [`ClipboardAccess`] so they can run
//! against [`MemoryClipboard`] in tests. [`SystemClipboard`] is the real
//! Windows clipboard; every `unsafe` call lives in the `win32` module.

use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::error::ClipboardError;

mod memory;
#[cfg(windows)]
mod win32;

pub use memory::MemoryClipboard;
#[cfg(windows)]
pub use win32::Win32Clipboard;

/// How long to keep retrying while another process holds the clipboard
pub const OPEN_TIMEOUT: Duration = Duration::from_secs(1);
/// Pause between attempts to open the clipboard
pub const RETRY_INTERVAL: Duration = Duration::from_millis(1);

/// Call `try_open` every `interval` until it succeeds or `timeout` has
/// passed; the first attempt is always made. Returns the attempt count.
#[cfg_attr(not(windows), allow(dead_code))]
pub(crate) fn poll_open(
    timeout: Duration,
    interval: Duration,
    mut try_open: impl FnMut() -> bool,
) -> Result<u32, ClipboardError> {
    let deadline = Instant::now() + timeout;
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        if try_open() {
            debug!(attempts, "opened clipboard");
            return Ok(attempts);
        }
        if Instant::now() >= deadline {
            debug!(attempts, "clipboard stayed busy");
            return Err(ClipboardError::Timeout(timeout));
        }
        trace!(attempts, "clipboard busy, retrying");
        thread::sleep(interval);
    }
}

/// Capability to read and write the CF_HTML clipboard entry
pub trait ClipboardAccess {
    /// Formats currently on the clipboard, in enumeration order
    fn formats(&mut self) -> Result<Vec<ClipboardFormat>, ClipboardError>;

    /// Raw `HTML Format` bytes, up to the first NUL
    fn read_html(&mut self) -> Result<Vec<u8>, ClipboardError>;

    /// Empty the clipboard and place `blob` under `HTML Format`
    fn write_html(&mut self, blob: &[u8]) -> Result<(), ClipboardError>;
}

/// One entry of the clipboard format list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardFormat {
    pub id: u32,
    /// Registered name, absent for predefined formats
    pub name: Option<String>,
}

impl ClipboardFormat {
    pub fn new(id: u32, name: Option<&str>) -> Self {
        Self {
            id,
            name: name.map(str::to_string),
        }
    }

    /// Registered name, or the `CF_*` constant name for predefined formats
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().or_else(|| standard_format_name(self.id))
    }
}

impl fmt::Display for ClipboardFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.display_name() {
            Some(name) => write!(f, "CF={} : {}", self.id, name),
            None => write!(f, "CF={}", self.id),
        }
    }
}

/// Name of a predefined clipboard format
pub fn standard_format_name(id: u32) -> Option<&'static str> {
    let name = match id {
        1 => "CF_TEXT",
        2 => "CF_BITMAP",
        3 => "CF_METAFILEPICT",
        4 => "CF_SYLK",
        5 => "CF_DIF",
        6 => "CF_TIFF",
        7 => "CF_OEMTEXT",
        8 => "CF_DIB",
        9 => "CF_PALETTE",
        10 => "CF_PENDATA",
        11 => "CF_RIFF",
        12 => "CF_WAVE",
        13 => "CF_UNICODETEXT",
        14 => "CF_ENHMETAFILE",
        15 => "CF_HDROP",
        16 => "CF_LOCALE",
        17 => "CF_DIBV5",
        0x0080 => "CF_OWNERDISPLAY",
        0x0081 => "CF_DSPTEXT",
        0x0082 => "CF_DSPBITMAP",
        0x0083 => "CF_DSPMETAFILEPICT",
        0x008E => "CF_DSPENHMETAFILE",
        _ => return None,
    };
    Some(name)
}

/// The clipboard of the running system
#[cfg(windows)]
pub type SystemClipboard = Win32Clipboard;

/// The clipboard of the running system
#[cfg(not(windows))]
#[derive(Debug, Default)]
pub struct SystemClipboard;

#[cfg(not(windows))]
impl ClipboardAccess for SystemClipboard {
    fn formats(&mut self) -> Result<Vec<ClipboardFormat>, ClipboardError> {
        Err(ClipboardError::Unsupported)
    }

    fn read_html(&mut self) -> Result<Vec<u8>, ClipboardError> {
        Err(ClipboardError::Unsupported)
    }

    fn write_html(&mut self, _blob: &[u8]) -> Result<(), ClipboardError> {
        Err(ClipboardError::Unsupported)
    }
}
