//! CF_HTML blob layout

use crate::error::CfHtmlError;

// CF_HTML markers and header keys
pub const START_FRAGMENT_MARKER: &str = "<!--StartFragment-->";
pub const END_FRAGMENT_MARKER: &str = "<!--EndFragment-->";
pub const HTML_OPEN: &str = "<html>";
pub const CRLF: &str = "\r\n";
pub const VERSION: &str = "0.9";

pub const KEY_VERSION: &str = "Version";
pub const KEY_START_HTML: &str = "StartHTML";
pub const KEY_END_HTML: &str = "EndHTML";
pub const KEY_START_FRAGMENT: &str = "StartFragment";
pub const KEY_END_FRAGMENT: &str = "EndFragment";
pub const KEY_SOURCE_URL: &str = "SourceURL";

/// Closing sequence that clipboard documents end with after the fragment.
///
/// The encoder requires its input to end with exactly this text, and the
/// fragment end is the input length minus `FRAGMENT_TRAILER.len()`.
pub const FRAGMENT_TRAILER: &str = "<!--EndFragment-->\r\n</body>\r\n</html>";

/// Name the format is registered under on Windows
pub const HTML_FORMAT_NAME: &str = "HTML Format";

/// Minimum width of a header offset
pub const OFFSET_DIGITS: usize = 6;

/// Parsed CF_HTML header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub version: String,
    /// `None` when the header carries `-1` (no context)
    pub start_html: Option<usize>,
    pub end_html: Option<usize>,
    pub start_fragment: usize,
    pub end_fragment: usize,
    pub source_url: Option<String>,
}

impl Header {
    /// Header for the given offsets with the current version
    pub fn new(start_html: usize, end_html: usize, start_fragment: usize, end_fragment: usize) -> Self {
        Self {
            version: VERSION.to_string(),
            start_html: Some(start_html),
            end_html: Some(end_html),
            start_fragment,
            end_fragment,
            source_url: None,
        }
    }

    /// Render the header lines, each terminated by CRLF
    pub fn render(&self) -> String {
        let mut out = String::new();
        push_line(&mut out, KEY_VERSION, &self.version);
        push_line(&mut out, KEY_START_HTML, &format_offset(self.start_html));
        push_line(&mut out, KEY_END_HTML, &format_offset(self.end_html));
        push_line(&mut out, KEY_START_FRAGMENT, &format_offset(Some(self.start_fragment)));
        push_line(&mut out, KEY_END_FRAGMENT, &format_offset(Some(self.end_fragment)));
        if let Some(url) = &self.source_url {
            push_line(&mut out, KEY_SOURCE_URL, url);
        }
        out
    }

    /// Check `0 <= StartHTML <= StartFragment <= EndFragment <= EndHTML <= len`
    pub fn validate(&self, len: usize) -> Result<(), CfHtmlError> {
        let start_html = self.start_html.unwrap_or(0);
        let end_html = self.end_html.unwrap_or(len);

        let checks = [
            (KEY_START_HTML, start_html, KEY_START_FRAGMENT, self.start_fragment),
            (KEY_START_FRAGMENT, self.start_fragment, KEY_END_FRAGMENT, self.end_fragment),
            (KEY_END_FRAGMENT, self.end_fragment, KEY_END_HTML, end_html),
            (KEY_END_HTML, end_html, "length", len),
        ];

        for (lo_name, lo, hi_name, hi) in checks {
            if lo > hi {
                return Err(CfHtmlError::OffsetOrder {
                    detail: format!("{}={} > {}={}", lo_name, lo, hi_name, hi),
                });
            }
        }
        Ok(())
    }
}

fn push_line(out: &mut String, key: &str, value: &str) {
    out.push_str(key);
    out.push(':');
    out.push_str(value);
    out.push_str(CRLF);
}

/// Zero-padded decimal offset, `-1` for an absent one
pub fn format_offset(offset: Option<usize>) -> String {
    match offset {
        Some(n) => format!("{:0width$}", n, width = OFFSET_DIGITS),
        None => "-1".to_string(),
    }
}

/// Byte position of the first occurrence of `needle` in `haystack`
pub fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailer_length() {
        assert_eq!(FRAGMENT_TRAILER.len(), 36);
        assert!(FRAGMENT_TRAILER.starts_with(END_FRAGMENT_MARKER));
    }

    #[test]
    fn test_render_pads_offsets() {
        let header = Header::new(97, 190, 123, 150);
        let rendered = header.render();

        assert!(rendered.starts_with("Version:0.9\r\n"));
        assert!(rendered.contains("StartHTML:000097\r\n"));
        assert!(rendered.contains("EndHTML:000190\r\n"));
        assert!(rendered.contains("StartFragment:000123\r\n"));
        assert!(rendered.ends_with("EndFragment:000150\r\n"));
    }

    #[test]
    fn test_render_missing_context() {
        let mut header = Header::new(0, 0, 10, 20);
        header.start_html = None;
        header.end_html = None;

        let rendered = header.render();
        assert!(rendered.contains("StartHTML:-1\r\n"));
        assert!(rendered.contains("EndHTML:-1\r\n"));
    }

    #[test]
    fn test_validate_order() {
        assert!(Header::new(10, 100, 20, 80).validate(100).is_ok());

        let err = Header::new(10, 100, 90, 80).validate(100).unwrap_err();
        assert!(matches!(err, CfHtmlError::OffsetOrder { .. }));
        assert!(err.to_string().contains("StartFragment=90"));

        assert!(Header::new(10, 120, 20, 80).validate(100).is_err());
    }

    #[test]
    fn test_find_bytes() {
        assert_eq!(find_bytes(b"abc<html>", b"<html>"), Some(3));
        assert_eq!(find_bytes(b"abc", b"<html>"), None);
    }
}
