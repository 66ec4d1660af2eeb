//! Single-byte legacy charsets: windows-1252, ISO-8859-1 and ISO-8859-15.

/// windows-1252 code points for bytes 0x80..=0x9F. Unassigned slots map to the
/// C1 control with the same value.
const WINDOWS_1252_HIGH: [u16; 32] = [
    0x20AC, 0x0081, 0x201A, 0x0192, 0x201E, 0x2026, 0x2020, 0x2021, //
    0x02C6, 0x2030, 0x0160, 0x2039, 0x0152, 0x008D, 0x017D, 0x008F, //
    0x0090, 0x2018, 0x2019, 0x201C, 0x201D, 0x2022, 0x2013, 0x2014, //
    0x02DC, 0x2122, 0x0161, 0x203A, 0x0153, 0x009D, 0x017E, 0x0178, //
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SingleByte {
    Windows1252,
    Latin1,
    Latin9,
}

/// Map one windows-1252 byte to its character.
pub fn windows_1252_char(byte: u8) -> char {
    match byte {
        0x80..=0x9F => char::from_u32(u32::from(WINDOWS_1252_HIGH[usize::from(byte - 0x80)]))
            .unwrap_or(char::REPLACEMENT_CHARACTER),
        _ => char::from(byte),
    }
}

fn latin9_char(byte: u8) -> char {
    match byte {
        0xA4 => '\u{20AC}',
        0xA6 => '\u{0160}',
        0xA8 => '\u{0161}',
        0xB4 => '\u{017D}',
        0xB8 => '\u{017E}',
        0xBC => '\u{0152}',
        0xBD => '\u{0153}',
        0xBE => '\u{0178}',
        _ => char::from(byte),
    }
}

pub(crate) fn push_single_byte_chunk(text: &mut String, bytes: &[u8], table: SingleByte) {
    text.reserve(bytes.len());
    for &byte in bytes {
        if byte.is_ascii() {
            text.push(char::from(byte));
            continue;
        }
        let ch = match table {
            SingleByte::Windows1252 => windows_1252_char(byte),
            SingleByte::Latin1 => char::from(byte),
            SingleByte::Latin9 => latin9_char(byte),
        };
        text.push(ch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_1252_maps_smart_punctuation() {
        let mut text = String::new();
        push_single_byte_chunk(&mut text, &[0x93, b'h', b'i', 0x94, 0x96, 0x80], SingleByte::Windows1252);
        assert_eq!(text, "\u{201C}hi\u{201D}\u{2013}\u{20AC}");
    }

    #[test]
    fn latin1_is_identity_and_latin9_overrides_eight_slots() {
        let mut latin1 = String::new();
        push_single_byte_chunk(&mut latin1, &[0xA4, 0xE9], SingleByte::Latin1);
        assert_eq!(latin1, "\u{A4}\u{E9}");

        let mut latin9 = String::new();
        push_single_byte_chunk(&mut latin9, &[0xA4, 0xE9, 0xBE], SingleByte::Latin9);
        assert_eq!(latin9, "\u{20AC}\u{E9}\u{178}");
    }

    #[test]
    fn unassigned_windows_slots_pass_through_as_controls() {
        assert_eq!(windows_1252_char(0x81), '\u{81}');
        assert_eq!(windows_1252_char(0x9D), '\u{9D}');
        assert_eq!(windows_1252_char(b'A'), 'A');
    }
}
