//! Win32 clipboard adapter
//!
//! The only place that touches native handles. A [`Session`] is the span
//! between `OpenClipboard` and `CloseClipboard`; it is `!Send`, so the close
//! always runs on the thread that opened the clipboard. Closing on another
//! thread silently leaves the clipboard locked for every process.
//!
//! Memory blocks are owned by [`GlobalBlock`] and locked through
//! [`LockGuard`]; both release on drop, so error paths never leak a block or
//! a lock.

use std::ffi::c_void;
use std::marker::PhantomData;
use std::ptr;
use std::time::Duration;

use tracing::debug;
use windows_sys::Win32::Foundation::{GetLastError, GlobalFree, HGLOBAL};
use windows_sys::Win32::System::DataExchange::{
    CloseClipboard, EmptyClipboard, EnumClipboardFormats, GetClipboardData, GetClipboardFormatNameW,
    OpenClipboard, RegisterClipboardFormatW, SetClipboardData,
};
use windows_sys::Win32::System::Memory::{GlobalAlloc, GlobalLock, GlobalSize, GlobalUnlock, GMEM_MOVEABLE};

use super::{poll_open, ClipboardAccess, ClipboardFormat, OPEN_TIMEOUT, RETRY_INTERVAL};
use crate::blob::HTML_FORMAT_NAME;
use crate::error::ClipboardError;

// Legacy DDE-share flag, kept so other processes can read the block
const GMEM_SHARE: u32 = 0x2000;

const FORMAT_NAME_CAPACITY: usize = 256;

fn last_error(call: &'static str) -> ClipboardError {
    // SAFETY: reads thread-local error state only.
    let code = unsafe { GetLastError() };
    ClipboardError::Win32 { call, code }
}

fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Open clipboard, closed on drop
struct Session {
    _not_send: PhantomData<*const ()>,
}

impl Session {
    /// Poll `OpenClipboard` until it succeeds or `timeout` runs out
    fn open(timeout: Duration) -> Result<Self, ClipboardError> {
        // SAFETY: a null owner window is allowed; the matching close is in Drop.
        poll_open(timeout, RETRY_INTERVAL, || unsafe { OpenClipboard(ptr::null_mut()) } != 0).map_err(|err| {
            debug!(code = unsafe { GetLastError() }, "OpenClipboard kept failing");
            err
        })?;
        Ok(Self { _not_send: PhantomData })
    }

    fn formats(&self) -> Vec<ClipboardFormat> {
        let mut formats = Vec::new();
        let mut id = 0;
        loop {
            // SAFETY: the clipboard is open for the lifetime of self.
            id = unsafe { EnumClipboardFormats(id) };
            if id == 0 {
                break;
            }
            formats.push(ClipboardFormat {
                id,
                name: format_name(id),
            });
        }
        formats
    }

    fn find_format(&self, name: &str) -> Result<u32, ClipboardError> {
        self.formats()
            .into_iter()
            .find(|f| f.name.as_deref() == Some(name))
            .map(|f| f.id)
            .ok_or_else(|| ClipboardError::FormatUnavailable(name.to_string()))
    }

    /// Copy a format's bytes out, stopping at the first NUL
    fn read(&self, format: u32) -> Result<Vec<u8>, ClipboardError> {
        // SAFETY: the clipboard is open; the handle stays owned by the clipboard.
        let handle = unsafe { GetClipboardData(format) };
        if handle.is_null() {
            return Err(last_error("GetClipboardData"));
        }

        let lock = LockGuard::lock(handle)?;
        let bytes = lock.bytes();
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Ok(bytes[..end].to_vec())
    }

    fn empty(&self) -> Result<(), ClipboardError> {
        // SAFETY: the clipboard is open.
        if unsafe { EmptyClipboard() } == 0 {
            return Err(last_error("EmptyClipboard"));
        }
        Ok(())
    }

    /// Hand `block` to the clipboard; it is freed here only if that fails
    fn set(&self, format: u32, block: GlobalBlock) -> Result<(), ClipboardError> {
        // SAFETY: the clipboard is open and emptied by us; block is unlocked.
        if unsafe { SetClipboardData(format, block.handle) }.is_null() {
            return Err(last_error("SetClipboardData"));
        }
        block.into_raw();
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // SAFETY: opened in Session::open on this same thread.
        if unsafe { CloseClipboard() } == 0 {
            debug!(code = unsafe { GetLastError() }, "CloseClipboard failed");
        }
    }
}

fn format_name(id: u32) -> Option<String> {
    let mut buf = [0u16; FORMAT_NAME_CAPACITY];
    // SAFETY: buf outlives the call and its capacity is passed along.
    let len = unsafe { GetClipboardFormatNameW(id, buf.as_mut_ptr(), buf.len() as i32) };
    if len <= 0 {
        return None;
    }
    Some(String::from_utf16_lossy(&buf[..len as usize]))
}

/// Movable, shareable global memory block
struct GlobalBlock {
    handle: HGLOBAL,
}

impl GlobalBlock {
    fn alloc(len: usize) -> Result<Self, ClipboardError> {
        // SAFETY: plain allocation; ownership is tracked by the returned value.
        let handle = unsafe { GlobalAlloc(GMEM_MOVEABLE | GMEM_SHARE, len) };
        if handle.is_null() {
            return Err(last_error("GlobalAlloc"));
        }
        Ok(Self { handle })
    }

    fn with_bytes(data: &[u8]) -> Result<Self, ClipboardError> {
        let block = Self::alloc(data.len())?;
        {
            let lock = LockGuard::lock(block.handle)?;
            let len = data.len().min(lock.len);
            // SAFETY: the lock covers lock.len bytes and we copy no more.
            unsafe { ptr::copy_nonoverlapping(data.as_ptr(), lock.ptr, len) };
        }
        Ok(block)
    }

    /// Give up ownership without freeing
    fn into_raw(self) -> HGLOBAL {
        let handle = self.handle;
        std::mem::forget(self);
        handle
    }
}

impl Drop for GlobalBlock {
    fn drop(&mut self) {
        // SAFETY: we still own the block; into_raw skips this.
        unsafe { GlobalFree(self.handle) };
    }
}

/// Locked view of a global memory block
struct LockGuard {
    handle: *mut c_void,
    ptr: *mut u8,
    len: usize,
}

impl LockGuard {
    fn lock(handle: *mut c_void) -> Result<Self, ClipboardError> {
        // SAFETY: handle is a live global memory handle.
        let ptr = unsafe { GlobalLock(handle) } as *mut u8;
        if ptr.is_null() {
            return Err(last_error("GlobalLock"));
        }
        // SAFETY: as above.
        let len = unsafe { GlobalSize(handle) };
        Ok(Self { handle, ptr, len })
    }

    fn bytes(&self) -> &[u8] {
        // SAFETY: the block is locked and GlobalSize bytes long.
        unsafe { std::slice::from_raw_parts(self.ptr, self.len) }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        // SAFETY: locked in LockGuard::lock.
        unsafe { GlobalUnlock(self.handle) };
    }
}

/// The Windows clipboard
#[derive(Debug, Clone)]
pub struct Win32Clipboard {
    timeout: Duration,
}

impl Win32Clipboard {
    pub fn new() -> Self {
        Self { timeout: OPEN_TIMEOUT }
    }
}

impl Default for Win32Clipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl ClipboardAccess for Win32Clipboard {
    fn formats(&mut self) -> Result<Vec<ClipboardFormat>, ClipboardError> {
        let session = Session::open(self.timeout)?;
        Ok(session.formats())
    }

    fn read_html(&mut self) -> Result<Vec<u8>, ClipboardError> {
        let session = Session::open(self.timeout)?;
        let format = session.find_format(HTML_FORMAT_NAME)?;
        let blob = session.read(format)?;
        debug!(format, len = blob.len(), "read HTML Format");
        Ok(blob)
    }

    fn write_html(&mut self, blob: &[u8]) -> Result<(), ClipboardError> {
        let name = to_wide(HTML_FORMAT_NAME);
        // SAFETY: name is NUL-terminated and outlives the call.
        let format = unsafe { RegisterClipboardFormatW(name.as_ptr()) };
        if format == 0 {
            return Err(last_error("RegisterClipboardFormatW"));
        }

        // Built before the clipboard is emptied, so a failed allocation leaves
        // the current contents in place.
        let block = GlobalBlock::with_bytes(blob)?;
        let session = Session::open(self.timeout)?;
        session.empty()?;
        session.set(format, block)?;
        debug!(format, len = blob.len(), "wrote HTML Format");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_is_filled_without_an_open_clipboard() {
        let block = GlobalBlock::with_bytes(b"Version:0.9\r\n\0").unwrap();

        let lock = LockGuard::lock(block.handle).unwrap();
        assert!(lock.bytes().starts_with(b"Version:0.9\r\n\0"));
    }

    #[test]
    fn test_failed_allocation_reports_global_alloc() {
        // Larger than any process can commit
        let err = GlobalBlock::alloc(usize::MAX / 2).err().unwrap();

        assert!(matches!(err, ClipboardError::Win32 { call: "GlobalAlloc", .. }));
    }
}
