//! Error types

use std::time::Duration;

use thiserror::Error;

/// Errors produced by the CF_HTML codec
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CfHtmlError {
    /// A required marker is missing from the blob
    #[error("{marker} not found")]
    NotFound { marker: &'static str },

    /// The input does not have the shape the encoder expects
    #[error("malformed input: {reason}")]
    MalformedInput { reason: String },

    /// The fragment bytes are not valid UTF-8
    #[error("fragment is not valid UTF-8 (at byte {valid_up_to})")]
    InvalidUtf8 { valid_up_to: usize },

    /// A header line could not be parsed
    #[error("invalid header line {line}: '{text}'")]
    InvalidHeader { line: usize, text: String },

    /// Header offsets violate StartHTML <= StartFragment <= EndFragment <= EndHTML <= len
    #[error("header offsets out of order: {detail}")]
    OffsetOrder { detail: String },
}

impl CfHtmlError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        CfHtmlError::MalformedInput { reason: reason.into() }
    }
}

/// Errors produced while talking to the clipboard
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClipboardError {
    /// The clipboard stayed owned by another process for the whole wait
    #[error("could not open the clipboard within {0:?}")]
    Timeout(Duration),

    /// The requested format is not on the clipboard
    #[error("clipboard does not contain '{0}'")]
    FormatUnavailable(String),

    /// A native call failed
    #[error("{call} failed (code {code})")]
    Win32 { call: &'static str, code: u32 },

    /// No system clipboard on this platform
    #[error("the system clipboard is only supported on Windows")]
    Unsupported,
}

/// Errors produced while loading or applying a rule table
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("invalid pattern in rule {index}: {source}")]
    Pattern {
        index: usize,
        #[source]
        source: regex::Error,
    },

    #[error("invalid rule table: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("cannot read rule table: {0}")]
    Io(#[from] std::io::Error),

    /// Content matched a reject guard
    #[error("clipboard content is malformed (contains '{guard}'); copy it again")]
    Rejected { guard: String },
}
