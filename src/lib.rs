//! # cfhtml-clip
//!
//! Reads, rewrites and writes the Windows `HTML Format` clipboard entry.
//!
//! ## CF_HTML
//!
//! Browsers and chat clients put HTML on the clipboard as a byte blob with a
//! short ASCII header of byte offsets in front of the document:
//!
//! ```text
//! Version:0.9
//! StartHTML:000089
//! EndHTML:000172
//! StartFragment:000125
//! EndFragment:000134
//! <html>
//! <body>
//! <!--StartFragment--><p>hi</p><!--EndFragment-->
//! </body>
//! </html>
//! ```
//!
//! Offsets count bytes, not characters, and satisfy
//! `StartHTML <= StartFragment <= EndFragment <= EndHTML <= len`.
//!
//! - [`Decoder`] returns the fragment between the two markers, and can parse
//!   the header or strip it off.
//! - [`Encoder`] wraps a fragment into a fresh blob with recomputed offsets.
//!
//! ## Reformatting
//!
//! [`RuleSet`] is an ordered table of literal and regex substitutions loaded
//! from TOML. The built-in table turns chat messages copied out of Teams into
//! something that pastes cleanly into mail: mentions are highlighted,
//! timestamps bolded, and reactions such as `like 3` become emoji.
//!
//! ## Clipboard
//!
//! All clipboard traffic goes through [`ClipboardAccess`]. The Windows
//! implementation keeps every native call in one adapter module;
//! [`MemoryClipboard`] stands in for it in tests.

pub mod blob;
pub mod clipboard;
pub mod commands;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod reformat;

pub use blob::{Header, FRAGMENT_TRAILER, HTML_FORMAT_NAME};
pub use clipboard::{ClipboardAccess, ClipboardFormat, MemoryClipboard, SystemClipboard};
pub use commands::SaveMode;
pub use decoder::Decoder;
pub use encoder::Encoder;
pub use error::{CfHtmlError, ClipboardError, RuleError};
pub use reformat::{Rule, RuleSet};
