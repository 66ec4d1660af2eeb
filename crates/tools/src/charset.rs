//! Charset labels, BOM sniffing and the streaming decoder front-end.

use crate::single_byte::{SingleByte, push_single_byte_chunk};
use crate::utf16::{finish_utf16, push_utf16_chunk};
use crate::utf8::{finish_utf8, push_utf8_chunk};

/// Charsets the decoder layer can switch between.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Charset {
    Utf8,
    Utf16Le,
    Utf16Be,
    Windows1252,
    Iso8859_1,
    Iso8859_15,
}

impl Charset {
    /// Resolve a charset label as found in `<meta>` declarations or caller
    /// hints. Matching is ASCII case-insensitive and ignores surrounding
    /// whitespace and quotes.
    pub fn for_label(label: &str) -> Option<Charset> {
        let label = label
            .trim_matches(|c: char| c.is_ascii_whitespace() || c == '"' || c == '\'')
            .to_ascii_lowercase();
        let charset = match label.as_str() {
            "utf-8" | "utf8" | "unicode-1-1-utf-8" | "x-unicode20utf8" => Charset::Utf8,
            "utf-16" | "utf-16le" | "utf16" | "unicode" | "ucs-2" | "csunicode" => Charset::Utf16Le,
            "utf-16be" | "unicodefffe" => Charset::Utf16Be,
            "windows-1252" | "cp1252" | "x-cp1252" | "us-ascii" | "ascii" | "ansi_x3.4-1968"
            | "iso646-us" | "cp367" => Charset::Windows1252,
            "iso-8859-1" | "iso8859-1" | "iso_8859-1" | "latin1" | "l1" | "cp819" | "ibm819"
            | "iso-ir-100" | "csisolatin1" => Charset::Iso8859_1,
            "iso-8859-15" | "iso8859-15" | "iso_8859-15" | "latin9" | "l9" | "csisolatin9" => {
                Charset::Iso8859_15
            }
            _ => return None,
        };
        Some(charset)
    }

    /// Canonical name, as reported in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Charset::Utf8 => "UTF-8",
            Charset::Utf16Le => "UTF-16LE",
            Charset::Utf16Be => "UTF-16BE",
            Charset::Windows1252 => "windows-1252",
            Charset::Iso8859_1 => "ISO-8859-1",
            Charset::Iso8859_15 => "ISO-8859-15",
        }
    }

    /// Whether ASCII bytes decode to themselves. Markup already scanned under
    /// one ASCII-compatible charset can be replayed under another.
    pub fn is_ascii_compatible(self) -> bool {
        !matches!(self, Charset::Utf16Le | Charset::Utf16Be)
    }

    pub fn new_decoder(self) -> Decoder {
        Decoder {
            charset: self,
            carry: Vec::new(),
        }
    }
}

/// Detect a byte-order mark. Returns the charset and the BOM length.
pub fn sniff_bom(bytes: &[u8]) -> Option<(Charset, usize)> {
    match bytes {
        [0xEF, 0xBB, 0xBF, ..] => Some((Charset::Utf8, 3)),
        [0xFF, 0xFE, ..] => Some((Charset::Utf16Le, 2)),
        [0xFE, 0xFF, ..] => Some((Charset::Utf16Be, 2)),
        _ => None,
    }
}

/// Streaming decoder bound to one charset.
#[derive(Clone, Debug)]
pub struct Decoder {
    charset: Charset,
    carry: Vec<u8>,
}

impl Decoder {
    pub fn charset(&self) -> Charset {
        self.charset
    }

    /// Decode `bytes`, appending complete characters to `text`.
    pub fn decode(&mut self, bytes: &[u8], text: &mut String) {
        match self.charset {
            Charset::Utf8 => push_utf8_chunk(text, &mut self.carry, bytes),
            Charset::Utf16Le => push_utf16_chunk(text, &mut self.carry, bytes, false),
            Charset::Utf16Be => push_utf16_chunk(text, &mut self.carry, bytes, true),
            Charset::Windows1252 => push_single_byte_chunk(text, bytes, SingleByte::Windows1252),
            Charset::Iso8859_1 => push_single_byte_chunk(text, bytes, SingleByte::Latin1),
            Charset::Iso8859_15 => push_single_byte_chunk(text, bytes, SingleByte::Latin9),
        }
    }

    /// Flush any incomplete trailing sequence.
    pub fn finish(&mut self, text: &mut String) {
        match self.charset {
            Charset::Utf8 => finish_utf8(text, &mut self.carry),
            Charset::Utf16Le | Charset::Utf16Be => finish_utf16(text, &mut self.carry),
            Charset::Windows1252 | Charset::Iso8859_1 | Charset::Iso8859_15 => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_resolve_case_insensitively() {
        assert_eq!(Charset::for_label(" UTF-8 "), Some(Charset::Utf8));
        assert_eq!(Charset::for_label("\"Latin1\""), Some(Charset::Iso8859_1));
        assert_eq!(Charset::for_label("US-ASCII"), Some(Charset::Windows1252));
        assert_eq!(Charset::for_label("utf-16"), Some(Charset::Utf16Le));
        assert_eq!(Charset::for_label("x-no-such-charset"), None);
    }

    #[test]
    fn bom_sniffing_reports_length() {
        assert_eq!(sniff_bom(&[0xEF, 0xBB, 0xBF, b'<']), Some((Charset::Utf8, 3)));
        assert_eq!(sniff_bom(&[0xFF, 0xFE]), Some((Charset::Utf16Le, 2)));
        assert_eq!(sniff_bom(&[0xFE, 0xFF, 0, b'<']), Some((Charset::Utf16Be, 2)));
        assert_eq!(sniff_bom(b"<html>"), None);
        assert_eq!(sniff_bom(&[0xEF, 0xBB]), None);
    }

    #[test]
    fn decoder_dispatches_by_charset() {
        let bytes = [b'a', 0xE9];
        let mut latin = String::new();
        Charset::Iso8859_1.new_decoder().decode(&bytes, &mut latin);
        assert_eq!(latin, "a\u{E9}");

        let mut utf8 = String::new();
        let mut decoder = Charset::Utf8.new_decoder();
        decoder.decode(&bytes, &mut utf8);
        decoder.finish(&mut utf8);
        assert_eq!(utf8, "a\u{FFFD}");
    }

    #[test]
    fn only_utf16_is_ascii_incompatible() {
        assert!(Charset::Utf8.is_ascii_compatible());
        assert!(Charset::Windows1252.is_ascii_compatible());
        assert!(!Charset::Utf16Be.is_ascii_compatible());
    }
}
