//! CF_HTML encoder

use tracing::{debug, warn};

use crate::blob::{Header, CRLF, END_FRAGMENT_MARKER, FRAGMENT_TRAILER, HTML_OPEN, START_FRAGMENT_MARKER};
use crate::error::CfHtmlError;

const DOCUMENT_HEAD: &str = "<html>\r\n<body>\r\n";
const DOCUMENT_TAIL: &str = "</body>\r\n</html>\r\n";

/// Encodes HTML into CF_HTML blobs ready for the clipboard
pub struct Encoder {
    /// Emit input-relative offsets instead of blob-relative ones
    legacy_offsets: bool,
}

impl Encoder {
    /// Create a new encoder
    pub fn new() -> Self {
        Self { legacy_offsets: false }
    }

    /// Write header offsets measured against the input document instead of
    /// the emitted one, for consumers that depend on the old numbers.
    pub fn with_legacy_offsets(mut self, legacy: bool) -> Self {
        self.legacy_offsets = legacy;
        self
    }

    /// Encode a clipboard-shaped HTML document.
    ///
    /// The input must contain `<html>` and `<!--StartFragment-->`, and must end
    /// with [`FRAGMENT_TRAILER`] (trailing CR, LF and NUL are ignored). The
    /// text between the start marker and the trailer becomes the fragment; it
    /// must not contain another `<!--EndFragment-->`.
    pub fn encode(&self, html: &str) -> Result<Vec<u8>, CfHtmlError> {
        let html_pos = html
            .find(HTML_OPEN)
            .ok_or_else(|| CfHtmlError::malformed(format!("{} not found", HTML_OPEN)))?;

        let frag_start = html
            .find(START_FRAGMENT_MARKER)
            .ok_or_else(|| CfHtmlError::malformed(format!("{} not found", START_FRAGMENT_MARKER)))?
            + START_FRAGMENT_MARKER.len();

        let html = html.trim_end_matches(['\r', '\n', '\0']);
        let frag_end = html
            .strip_suffix(FRAGMENT_TRAILER)
            .map(str::len)
            .ok_or_else(|| CfHtmlError::malformed("input does not end with the fragment trailer"))?;

        if frag_end < frag_start {
            return Err(CfHtmlError::malformed("fragment trailer overlaps the start marker"));
        }

        let fragment = &html[frag_start..frag_end];
        if fragment.contains(END_FRAGMENT_MARKER) {
            return Err(CfHtmlError::malformed(format!("{} appears inside the fragment", END_FRAGMENT_MARKER)));
        }

        if self.legacy_offsets {
            let header = Header::new(
                html_pos,
                html.len().saturating_sub(1),
                frag_start,
                html.len().saturating_sub(FRAGMENT_TRAILER.len() + 1),
            );
            warn!(?header, "writing legacy input-relative offsets");
            return Ok(Self::assemble(&header, &Self::document(fragment, CRLF)));
        }

        Ok(self.encode_fragment(fragment))
    }

    /// Wrap a bare fragment into a complete blob with offsets that point into
    /// the emitted bytes.
    ///
    /// `fragment` must not contain `<!--EndFragment-->`; decoding stops at the
    /// first one. [`Encoder::encode`] rejects such input.
    pub fn encode_fragment(&self, fragment: &str) -> Vec<u8> {
        let document = Self::document(fragment, "");
        let fragment_offset = DOCUMENT_HEAD.len() + START_FRAGMENT_MARKER.len();

        // Header width depends on the offsets it carries; settle on a fixed point.
        let mut header_len = 0;
        let header = loop {
            let header = Header::new(
                header_len,
                header_len + document.len(),
                header_len + fragment_offset,
                header_len + fragment_offset + fragment.len(),
            );
            let rendered_len = header.render().len();
            if rendered_len == header_len {
                break header;
            }
            header_len = rendered_len;
        };

        debug!(
            start_html = header.start_html,
            end_html = header.end_html,
            start_fragment = header.start_fragment,
            end_fragment = header.end_fragment,
            "encoded fragment"
        );

        Self::assemble(&header, &document)
    }

    /// `pad` goes between each marker and the fragment
    fn document(fragment: &str, pad: &str) -> String {
        let mut doc = String::with_capacity(fragment.len() + 128);
        doc.push_str(DOCUMENT_HEAD);
        doc.push_str(START_FRAGMENT_MARKER);
        doc.push_str(pad);
        doc.push_str(fragment);
        doc.push_str(pad);
        doc.push_str(END_FRAGMENT_MARKER);
        doc.push_str(CRLF);
        doc.push_str(DOCUMENT_TAIL);
        doc
    }

    fn assemble(header: &Header, document: &str) -> Vec<u8> {
        let header = header.render();
        let mut out = Vec::with_capacity(header.len() + document.len() + 1);
        out.extend_from_slice(header.as_bytes());
        out.extend_from_slice(document.as_bytes());
        out.push(0);
        out
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::find_bytes;
    use crate::decoder::Decoder;

    fn clipboard_doc(fragment: &str) -> String {
        format!("<html><!--StartFragment-->{}{}", fragment, FRAGMENT_TRAILER)
    }

    #[test]
    fn test_encode_fragment_round_trip() {
        let encoder = Encoder::new();
        let blob = encoder.encode_fragment("<p>hi</p>");

        let decoder = Decoder::new();
        assert_eq!(decoder.decode(&blob).unwrap(), "<p>hi</p>");
    }

    #[test]
    fn test_encode_round_trip() {
        let fragment = "<div><span>line one</span><br><span>line two</span></div>";

        let encoder = Encoder::new();
        let blob = encoder.encode(&clipboard_doc(fragment)).unwrap();

        let decoder = Decoder::new();
        assert_eq!(decoder.decode(&blob).unwrap(), fragment);
    }

    #[test]
    fn test_encode_header_ordering() {
        let encoder = Encoder::new();
        let blob = encoder.encode(&clipboard_doc("<p>hi</p>")).unwrap();

        let decoder = Decoder::new();
        let header = decoder.decode_header(&blob).unwrap();

        header.validate(blob.len()).unwrap();
        assert_eq!(header.version, "0.9");
        assert_eq!(*blob.last().unwrap(), 0);
    }

    #[test]
    fn test_encode_offsets_point_into_blob() {
        let encoder = Encoder::new();
        let blob = encoder.encode_fragment("<p>hi</p>");

        let decoder = Decoder::new();
        let header = decoder.decode_header(&blob).unwrap();

        let start_html = header.start_html.unwrap();
        let end_html = header.end_html.unwrap();
        assert_eq!(&blob[start_html..start_html + HTML_OPEN.len()], HTML_OPEN.as_bytes());
        assert_eq!(end_html, blob.len() - 1);

        let marker = find_bytes(&blob, START_FRAGMENT_MARKER.as_bytes()).unwrap();
        assert_eq!(header.start_fragment, marker + START_FRAGMENT_MARKER.len());
        assert_eq!(&blob[header.end_fragment..header.end_fragment + END_FRAGMENT_MARKER.len()], END_FRAGMENT_MARKER.as_bytes());
        assert_eq!(&blob[header.start_fragment..header.end_fragment], b"<p>hi</p>");
    }

    #[test]
    fn test_encode_multibyte_offsets_are_bytes() {
        let fragment = "<p>絵文字 👍 😣</p>";

        let encoder = Encoder::new();
        let blob = encoder.encode_fragment(fragment);

        let decoder = Decoder::new();
        let header = decoder.decode_header(&blob).unwrap();
        assert_eq!(header.end_fragment - header.start_fragment, fragment.len());
        assert_eq!(decoder.decode(&blob).unwrap(), fragment);
    }

    #[test]
    fn test_encode_wide_offsets() {
        let fragment = "x".repeat(1_000_000);

        let encoder = Encoder::new();
        let blob = encoder.encode_fragment(&fragment);

        let decoder = Decoder::new();
        let header = decoder.decode_header(&blob).unwrap();
        header.validate(blob.len()).unwrap();
        assert_eq!(header.end_html.unwrap(), blob.len() - 1);
        assert_eq!(header.end_fragment - header.start_fragment, fragment.len());
    }

    #[test]
    fn test_encode_missing_html_tag() {
        let encoder = Encoder::new();
        let err = encoder.encode("<body><!--StartFragment--><p>hi</p><!--EndFragment-->\r\n</body>\r\n</html>").unwrap_err();

        assert!(matches!(err, CfHtmlError::MalformedInput { .. }));
        assert!(err.to_string().contains("<html>"));
    }

    #[test]
    fn test_encode_missing_start_marker() {
        let encoder = Encoder::new();
        let err = encoder.encode(&format!("<html><p>hi</p>{}", FRAGMENT_TRAILER)).unwrap_err();

        assert!(err.to_string().contains(START_FRAGMENT_MARKER));
    }

    #[test]
    fn test_encode_missing_trailer() {
        let encoder = Encoder::new();
        let err = encoder.encode("<html><!--StartFragment--><p>hi</p><!--EndFragment--></html>").unwrap_err();

        assert!(err.to_string().contains("fragment trailer"));
    }

    #[test]
    fn test_encode_tolerates_trailing_newline_and_nul() {
        let mut doc = clipboard_doc("<p>hi</p>");
        doc.push_str("\r\n\0");

        let encoder = Encoder::new();
        let blob = encoder.encode(&doc).unwrap();
        assert_eq!(Decoder::new().decode(&blob).unwrap(), "<p>hi</p>");
    }

    #[test]
    fn test_encode_full_clipboard_text() {
        // What the clipboard hands back, header included
        let input = "Version:0.9\r\nStartHTML:000000105\r\nEndHTML:000000190\r\n\
StartFragment:000000141\r\nEndFragment:000000154\r\n\
<html>\r\n<body>\r\n<!--StartFragment--><p>reply</p><!--EndFragment-->\r\n</body>\r\n</html>";

        let encoder = Encoder::new();
        let blob = encoder.encode(input).unwrap();

        assert!(blob.starts_with(b"Version:0.9\r\nStartHTML:000089\r\n"));
        assert_eq!(Decoder::new().decode(&blob).unwrap(), "<p>reply</p>");
    }

    #[test]
    fn test_encode_legacy_offsets() {
        let input = clipboard_doc("<p>hi</p>");

        let encoder = Encoder::new().with_legacy_offsets(true);
        let blob = encoder.encode(&input).unwrap();

        let header = Decoder::new().decode_header(&blob).unwrap();
        assert_eq!(header.start_html, Some(0));
        assert_eq!(header.end_html, Some(input.len() - 1));
        assert_eq!(header.start_fragment, 26);
        assert_eq!(header.end_fragment, input.len() - 37);

        // Legacy layout puts CRLF between the markers and the fragment
        assert_eq!(Decoder::new().decode(&blob).unwrap(), "\r\n<p>hi</p>\r\n");
    }

    #[test]
    fn test_encode_legacy_offsets_ignore_trailing_bytes() {
        let input = clipboard_doc("<p>hi</p>");
        let padded = format!("{}\r\n\0", input);

        let encoder = Encoder::new().with_legacy_offsets(true);
        let blob = encoder.encode(&input).unwrap();
        let padded_blob = encoder.encode(&padded).unwrap();

        assert_eq!(padded_blob, blob);
        let header = Decoder::new().decode_header(&padded_blob).unwrap();
        assert_eq!(header.end_fragment, input.len() - FRAGMENT_TRAILER.len() - 1);
    }

    #[test]
    fn test_encode_rejects_end_marker_in_fragment() {
        let input = clipboard_doc("<p>a<!--EndFragment-->b</p>");

        let encoder = Encoder::new();
        let err = encoder.encode(&input).unwrap_err();

        assert!(matches!(err, CfHtmlError::MalformedInput { .. }));
        assert!(err.to_string().contains(END_FRAGMENT_MARKER));
    }
}
