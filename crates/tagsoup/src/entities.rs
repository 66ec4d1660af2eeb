//! Character references: the HTML 4 named entity table and numeric
//! references.

use tools::windows_1252_char;

/// Longest named entity in the table (`thetasym`).
pub(crate) const MAX_NAME_LEN: usize = 8;

/// Bytes of lookahead after `&` that always cover a complete reference.
pub(crate) const REFERENCE_LOOKAHEAD: usize = 16;

const MAX_HEX_DIGITS: usize = 6; // 0x10FFFF
const MAX_DEC_DIGITS: usize = 7; // 1114111

/// Named entities, sorted by name for binary search. Names are case-sensitive.
static ENTITIES: &[(&str, u32)] = &[
    ("AElig", 198), ("Aacute", 193), ("Acirc", 194), ("Agrave", 192), ("Alpha", 913),
    ("Aring", 197), ("Atilde", 195), ("Auml", 196), ("Beta", 914), ("Ccedil", 199),
    ("Chi", 935), ("Dagger", 8225), ("Delta", 916), ("ETH", 208), ("Eacute", 201),
    ("Ecirc", 202), ("Egrave", 200), ("Epsilon", 917), ("Eta", 919), ("Euml", 203),
    ("Gamma", 915), ("Iacute", 205), ("Icirc", 206), ("Igrave", 204), ("Iota", 921),
    ("Iuml", 207), ("Kappa", 922), ("Lambda", 923), ("Mu", 924), ("Ntilde", 209), ("Nu", 925),
    ("OElig", 338), ("Oacute", 211), ("Ocirc", 212), ("Ograve", 210), ("Omega", 937),
    ("Omicron", 927), ("Oslash", 216), ("Otilde", 213), ("Ouml", 214), ("Phi", 934),
    ("Pi", 928), ("Prime", 8243), ("Psi", 936), ("Rho", 929), ("Scaron", 352), ("Sigma", 931),
    ("THORN", 222), ("Tau", 932), ("Theta", 920), ("Uacute", 218), ("Ucirc", 219),
    ("Ugrave", 217), ("Upsilon", 933), ("Uuml", 220), ("Xi", 926), ("Yacute", 221),
    ("Yuml", 376), ("Zeta", 918), ("aacute", 225), ("acirc", 226), ("acute", 180),
    ("aelig", 230), ("agrave", 224), ("alefsym", 8501), ("alpha", 945), ("amp", 38),
    ("and", 8743), ("ang", 8736), ("apos", 39), ("aring", 229), ("asymp", 8776),
    ("atilde", 227), ("auml", 228), ("bdquo", 8222), ("beta", 946), ("brvbar", 166),
    ("bull", 8226), ("cap", 8745), ("ccedil", 231), ("cedil", 184), ("cent", 162), ("chi", 967),
    ("circ", 710), ("clubs", 9827), ("cong", 8773), ("copy", 169), ("crarr", 8629),
    ("cup", 8746), ("curren", 164), ("dArr", 8659), ("dagger", 8224), ("darr", 8595),
    ("deg", 176), ("delta", 948), ("diams", 9830), ("divide", 247), ("eacute", 233),
    ("ecirc", 234), ("egrave", 232), ("empty", 8709), ("emsp", 8195), ("ensp", 8194),
    ("epsilon", 949), ("equiv", 8801), ("eta", 951), ("eth", 240), ("euml", 235),
    ("euro", 8364), ("exist", 8707), ("fnof", 402), ("forall", 8704), ("frac12", 189),
    ("frac14", 188), ("frac34", 190), ("frasl", 8260), ("gamma", 947), ("ge", 8805), ("gt", 62),
    ("hArr", 8660), ("harr", 8596), ("hearts", 9829), ("hellip", 8230), ("iacute", 237),
    ("icirc", 238), ("iexcl", 161), ("igrave", 236), ("image", 8465), ("infin", 8734),
    ("int", 8747), ("iota", 953), ("iquest", 191), ("isin", 8712), ("iuml", 239),
    ("kappa", 954), ("lArr", 8656), ("lambda", 955), ("lang", 9001), ("laquo", 171),
    ("larr", 8592), ("lceil", 8968), ("ldquo", 8220), ("le", 8804), ("lfloor", 8970),
    ("lowast", 8727), ("loz", 9674), ("lrm", 8206), ("lsaquo", 8249), ("lsquo", 8216),
    ("lt", 60), ("macr", 175), ("mdash", 8212), ("micro", 181), ("middot", 183),
    ("minus", 8722), ("mu", 956), ("nabla", 8711), ("nbsp", 160), ("ndash", 8211), ("ne", 8800),
    ("ni", 8715), ("not", 172), ("notin", 8713), ("nsub", 8836), ("ntilde", 241), ("nu", 957),
    ("oacute", 243), ("ocirc", 244), ("oelig", 339), ("ograve", 242), ("oline", 8254),
    ("omega", 969), ("omicron", 959), ("oplus", 8853), ("or", 8744), ("ordf", 170),
    ("ordm", 186), ("oslash", 248), ("otilde", 245), ("otimes", 8855), ("ouml", 246),
    ("para", 182), ("part", 8706), ("permil", 8240), ("perp", 8869), ("phi", 966), ("pi", 960),
    ("piv", 982), ("plusmn", 177), ("pound", 163), ("prime", 8242), ("prod", 8719),
    ("prop", 8733), ("psi", 968), ("quot", 34), ("rArr", 8658), ("radic", 8730), ("rang", 9002),
    ("raquo", 187), ("rarr", 8594), ("rceil", 8969), ("rdquo", 8221), ("real", 8476),
    ("reg", 174), ("rfloor", 8971), ("rho", 961), ("rlm", 8207), ("rsaquo", 8250),
    ("rsquo", 8217), ("sbquo", 8218), ("scaron", 353), ("sdot", 8901), ("sect", 167),
    ("shy", 173), ("sigma", 963), ("sigmaf", 962), ("sim", 8764), ("spades", 9824),
    ("sub", 8834), ("sube", 8838), ("sum", 8721), ("sup", 8835), ("sup1", 185), ("sup2", 178),
    ("sup3", 179), ("supe", 8839), ("szlig", 223), ("tau", 964), ("there4", 8756),
    ("theta", 952), ("thetasym", 977), ("thinsp", 8201), ("thorn", 254), ("tilde", 732),
    ("times", 215), ("trade", 8482), ("uArr", 8657), ("uacute", 250), ("uarr", 8593),
    ("ucirc", 251), ("ugrave", 249), ("uml", 168), ("upsih", 978), ("upsilon", 965),
    ("uuml", 252), ("weierp", 8472), ("xi", 958), ("yacute", 253), ("yen", 165), ("yuml", 255),
    ("zeta", 950), ("zwj", 8205), ("zwnj", 8204),
];

/// Resolve a named entity without the surrounding `&` and `;`.
pub fn lookup_entity(name: &str) -> Option<char> {
    ENTITIES
        .binary_search_by(|(candidate, _)| (*candidate).cmp(name))
        .ok()
        .and_then(|index| char::from_u32(ENTITIES[index].1))
}

/// Map a numeric reference value to a character. Values that are not Unicode
/// scalars (and NUL) become U+FFFD; with `fix_windows`, 128..=159 are read as
/// windows-1252 bytes.
pub fn numeric_reference(value: u32, fix_windows: bool) -> char {
    if fix_windows && (0x80..=0x9F).contains(&value) {
        return windows_1252_char(value as u8);
    }
    if value == 0 {
        return char::REPLACEMENT_CHARACTER;
    }
    char::from_u32(value).unwrap_or(char::REPLACEMENT_CHARACTER)
}

/// A character reference recognized at the start of some text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Reference<'a> {
    /// Entity name as written, `amp` or `#38` or `#x26`.
    pub(crate) name: &'a str,
    pub(crate) value: char,
    /// Bytes consumed, including `&` and an optional `;`.
    pub(crate) len: usize,
    pub(crate) terminated: bool,
    pub(crate) numeric: bool,
    /// Numeric value outside Unicode, resolved to U+FFFD.
    pub(crate) invalid: bool,
}

/// Recognize a reference at the start of `text`, which must begin with `&`.
///
/// Known names resolve with or without the closing `;`. Numeric references
/// need at least one digit; out-of-range values resolve to U+FFFD. Anything
/// else returns `None` and the `&` stays literal.
pub(crate) fn match_reference(text: &str, fix_windows: bool) -> Option<Reference<'_>> {
    let bytes = text.as_bytes();
    if bytes.first() != Some(&b'&') {
        return None;
    }
    if bytes.get(1) == Some(&b'#') {
        let hex = matches!(bytes.get(2), Some(b'x' | b'X'));
        let digits_start = if hex { 3 } else { 2 };
        let digits = bytes[digits_start..]
            .iter()
            .take_while(|b| {
                if hex {
                    b.is_ascii_hexdigit()
                } else {
                    b.is_ascii_digit()
                }
            })
            .count();
        if digits == 0 {
            return None;
        }
        let end = digits_start + digits;
        let max_digits = if hex { MAX_HEX_DIGITS } else { MAX_DEC_DIGITS };
        let radix = if hex { 16 } else { 10 };
        let raw = if digits > max_digits {
            None
        } else {
            u32::from_str_radix(&text[digits_start..end], radix).ok()
        };
        let value = raw.map_or(char::REPLACEMENT_CHARACTER, |v| {
            numeric_reference(v, fix_windows)
        });
        let invalid = value == char::REPLACEMENT_CHARACTER && raw != Some(0xFFFD);
        let terminated = bytes.get(end) == Some(&b';');
        return Some(Reference {
            name: &text[1..end],
            value,
            len: end + usize::from(terminated),
            terminated,
            numeric: true,
            invalid,
        });
    }

    let name_len = bytes[1..]
        .iter()
        .take_while(|b| b.is_ascii_alphanumeric())
        .count();
    if name_len == 0 || name_len > MAX_NAME_LEN {
        return None;
    }
    let end = 1 + name_len;
    let name = &text[1..end];
    let value = lookup_entity(name)?;
    let terminated = bytes.get(end) == Some(&b';');
    Some(Reference {
        name,
        value,
        len: end + usize::from(terminated),
        terminated,
        numeric: false,
        invalid: false,
    })
}

/// Decode every reference in an attribute value. Unknown names and bare `&`
/// are kept as written.
pub(crate) fn decode_entities(s: &str, fix_windows: bool) -> String {
    let bytes = s.as_bytes();
    let mut out = String::with_capacity(s.len());
    let mut copy_start = 0;
    let mut i = 0;

    while let Some(rel) = memchr::memchr(b'&', &bytes[i..]) {
        let amp = i + rel;
        out.push_str(&s[copy_start..amp]);
        match match_reference(&s[amp..], fix_windows) {
            Some(reference) => {
                out.push(reference.value);
                i = amp + reference.len;
            }
            None => {
                out.push('&');
                i = amp + 1;
            }
        }
        copy_start = i;
    }

    out.push_str(&s[copy_start..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_table_is_sorted_and_complete() {
        assert_eq!(ENTITIES.len(), 253);
        for pair in ENTITIES.windows(2) {
            assert!(pair[0].0 < pair[1].0, "{} / {}", pair[0].0, pair[1].0);
        }
        assert!(ENTITIES.iter().all(|(name, _)| name.len() <= MAX_NAME_LEN));
    }

    #[test]
    fn lookup_is_case_sensitive() {
        assert_eq!(lookup_entity("Aacute"), Some('\u{C1}'));
        assert_eq!(lookup_entity("aacute"), Some('\u{E1}'));
        assert_eq!(lookup_entity("AMP"), None);
        assert_eq!(lookup_entity("nbsp"), Some('\u{A0}'));
        assert_eq!(lookup_entity("euro"), Some('\u{20AC}'));
    }

    #[test]
    fn decode_entities_preserves_utf8() {
        assert_eq!(decode_entities("120\u{D7}32 \u{3C0}", false), "120\u{D7}32 \u{3C0}");
    }

    #[test]
    fn decode_entities_decodes_named_and_numeric() {
        assert_eq!(decode_entities("a &amp; b", false), "a & b");
        assert_eq!(decode_entities("&lt;tag&gt;", false), "<tag>");
        assert_eq!(decode_entities("&quot;hi&quot;", false), "\"hi\"");
        assert_eq!(decode_entities("&#215;&#xD7;&#XD7;", false), "\u{D7}\u{D7}\u{D7}");
        assert_eq!(decode_entities("&copy 2001", false), "\u{A9} 2001");
    }

    #[test]
    fn decode_entities_passes_through_unknown_and_bare_ampersands() {
        assert_eq!(
            decode_entities("before &notanentity; after", false),
            "before &notanentity; after"
        );
        assert_eq!(decode_entities("a & b && c", false), "a & b && c");
        assert_eq!(decode_entities("&#;&#x;&;", false), "&#;&#x;&;");
        assert_eq!(decode_entities("q=1&page=2", false), "q=1&page=2");
    }

    #[test]
    fn invalid_numeric_values_become_replacement() {
        assert_eq!(decode_entities("&#xD800;", false), "\u{FFFD}");
        assert_eq!(decode_entities("&#x110000;", false), "\u{FFFD}");
        assert_eq!(decode_entities("&#0;", false), "\u{FFFD}");
        assert_eq!(decode_entities("&#99999999;", false), "\u{FFFD}");
        assert_eq!(decode_entities("&#1114111;", false), "\u{10FFFF}");
    }

    #[test]
    fn windows_fix_applies_only_to_c1_range() {
        assert_eq!(decode_entities("&#150;", false), "\u{96}");
        assert_eq!(decode_entities("&#150;", true), "\u{2013}");
        assert_eq!(decode_entities("&#x80;", true), "\u{20AC}");
        assert_eq!(decode_entities("&#160;", true), "\u{A0}");
    }

    #[test]
    fn match_reference_reports_shape() {
        let named = match_reference("&amp;rest", false).expect("named reference");
        assert_eq!((named.name, named.value, named.len), ("amp", '&', 5));
        assert!(named.terminated && !named.numeric);

        let hex = match_reference("&#x26 tail", false).expect("hex reference");
        assert_eq!((hex.name, hex.value, hex.len), ("#x26", '&', 5));
        assert!(!hex.terminated && hex.numeric);

        assert_eq!(match_reference("&unknown;", false), None);
        assert_eq!(match_reference("& ", false), None);
    }

    #[test]
    fn decoding_is_idempotent_on_adversarial_samples() {
        let samples = ["&", "&&", "&;", "&#;", "&#x;", "&unknown;", "&#xZZ;", "&amp;amp;"];
        for s in samples {
            let once = decode_entities(s, false);
            assert!(once.len() <= s.len());
            if !s.contains("&amp;") {
                assert_eq!(decode_entities(&once, false), once);
            }
        }
    }
}
