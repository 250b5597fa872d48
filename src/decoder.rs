//! CF_HTML decoder

use tracing::debug;

use crate::blob::{
    find_bytes, Header, END_FRAGMENT_MARKER, KEY_END_FRAGMENT, KEY_END_HTML, KEY_SOURCE_URL,
    KEY_START_FRAGMENT, KEY_START_HTML, KEY_VERSION, START_FRAGMENT_MARKER,
};
use crate::error::CfHtmlError;

/// Decodes CF_HTML blobs read from the clipboard
pub struct Decoder {
    // Currently stateless
}

impl Decoder {
    /// Create a new decoder
    pub fn new() -> Self {
        Self {}
    }

    /// Return the fragment between `<!--StartFragment-->` and `<!--EndFragment-->`.
    ///
    /// The markers are trusted over the numeric header fields, which are not
    /// consulted at all.
    pub fn decode<'a>(&self, blob: &'a [u8]) -> Result<&'a str, CfHtmlError> {
        let start = find_bytes(blob, START_FRAGMENT_MARKER.as_bytes())
            .ok_or(CfHtmlError::NotFound { marker: START_FRAGMENT_MARKER })?
            + START_FRAGMENT_MARKER.len();

        let len = find_bytes(&blob[start..], END_FRAGMENT_MARKER.as_bytes())
            .ok_or(CfHtmlError::NotFound { marker: END_FRAGMENT_MARKER })?;

        debug!(start, end = start + len, "located fragment markers");

        std::str::from_utf8(&blob[start..start + len]).map_err(|e| CfHtmlError::InvalidUtf8 {
            valid_up_to: start + e.valid_up_to(),
        })
    }

    /// Parse the `Key:Value` header lines at the top of a blob.
    ///
    /// Parsing stops at the first line that is not a header line, normally the
    /// one opening the HTML document.
    pub fn decode_header(&self, blob: &[u8]) -> Result<Header, CfHtmlError> {
        let mut version = String::new();
        let mut start_html = None;
        let mut end_html = None;
        let mut start_fragment = None;
        let mut end_fragment = None;
        let mut source_url = None;

        for (idx, raw) in blob.split(|&b| b == b'\n').enumerate() {
            let line_num = idx + 1;
            let Ok(line) = std::str::from_utf8(raw) else {
                break;
            };
            let line = line.trim_end_matches('\r');
            if line.starts_with('<') {
                break;
            }
            let Some((key, value)) = line.split_once(':') else {
                break;
            };

            match key {
                KEY_VERSION => version = value.to_string(),
                KEY_START_HTML => start_html = Self::parse_offset(line_num, line, value, true)?,
                KEY_END_HTML => end_html = Self::parse_offset(line_num, line, value, true)?,
                KEY_START_FRAGMENT => start_fragment = Self::parse_offset(line_num, line, value, false)?,
                KEY_END_FRAGMENT => end_fragment = Self::parse_offset(line_num, line, value, false)?,
                KEY_SOURCE_URL => source_url = Some(value.to_string()),
                // StartSelection, EndSelection and friends
                _ => {}
            }
        }

        let missing = |key: &str| CfHtmlError::InvalidHeader {
            line: 0,
            text: format!("missing {}", key),
        };

        Ok(Header {
            version,
            start_html,
            end_html,
            start_fragment: start_fragment.ok_or_else(|| missing(KEY_START_FRAGMENT))?,
            end_fragment: end_fragment.ok_or_else(|| missing(KEY_END_FRAGMENT))?,
            source_url,
        })
    }

    /// Return the HTML document with the header stripped.
    ///
    /// Uses `StartHTML`/`EndHTML` when present, otherwise everything from the
    /// first `<` to the end of the blob. A trailing NUL is dropped.
    pub fn document<'a>(&self, blob: &'a [u8]) -> Result<&'a str, CfHtmlError> {
        let header = self.decode_header(blob)?;

        let start = match header.start_html {
            Some(pos) => pos,
            None => blob
                .iter()
                .position(|&b| b == b'<')
                .ok_or_else(|| CfHtmlError::malformed("no HTML document after the header"))?,
        };
        let end = header.end_html.unwrap_or(blob.len());

        if start > end || end > blob.len() {
            return Err(CfHtmlError::OffsetOrder {
                detail: format!("document range {}..{} in a {} byte blob", start, end, blob.len()),
            });
        }

        let mut doc = &blob[start..end];
        while let [rest @ .., 0] = doc {
            doc = rest;
        }

        std::str::from_utf8(doc).map_err(|e| CfHtmlError::InvalidUtf8 {
            valid_up_to: start + e.valid_up_to(),
        })
    }

    fn parse_offset(line: usize, text: &str, value: &str, optional: bool) -> Result<Option<usize>, CfHtmlError> {
        let invalid = || CfHtmlError::InvalidHeader {
            line,
            text: text.to_string(),
        };

        let n: i64 = value.trim().parse().map_err(|_| invalid())?;
        match n {
            -1 if optional => Ok(None),
            n if n >= 0 => usize::try_from(n).map(Some).map_err(|_| invalid()),
            _ => Err(invalid()),
        }
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}
