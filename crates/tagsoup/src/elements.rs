//! Static descriptor table for the HTML 4 and legacy tag set.
//!
//! Every recognized tag name maps to exactly one `ElementDescriptor`. The
//! table is sorted by canonical (upper-case) name and binary searched, so a
//! lookup never allocates. Names the table does not know resolve to
//! [`UNKNOWN`], which keeps the balancer total over arbitrary markup.

use bitflags::bitflags;
use std::cmp::Ordering;

bitflags! {
    /// Structural classification bits of an element.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ElementFlags: u8 {
        /// Phrase-level element; reopened after implicit closes.
        const INLINE = 1 << 0;
        /// Bounds end-tag and closes-set searches.
        const BLOCK = 1 << 1;
        /// Never has content; reported as a single empty-element event.
        const EMPTY = 1 << 2;
        /// Stops the closes-set scan; end tags search straight through blocks.
        const CONTAINER = 1 << 3;
        /// Body is raw text, scanned verbatim until the matching end tag.
        const SPECIAL = 1 << 4;
    }
}

/// Structural properties of one tag name.
#[derive(Debug, PartialEq, Eq)]
pub struct ElementDescriptor {
    /// Canonical upper-case name.
    pub name: &'static str,
    pub flags: ElementFlags,
    /// Natural parents, tried first to last. The first entry is the one
    /// synthesized when none is open.
    pub parents: &'static [&'static str],
    /// Ancestor at which the natural-parent search gives up.
    pub bounds: Option<&'static str>,
    /// Elements implicitly ended when this one opens.
    pub closes: &'static [&'static str],
}

impl ElementDescriptor {
    pub fn is_inline(&self) -> bool {
        self.flags.contains(ElementFlags::INLINE)
    }

    pub fn is_block(&self) -> bool {
        self.flags.contains(ElementFlags::BLOCK)
    }

    pub fn is_empty(&self) -> bool {
        self.flags.contains(ElementFlags::EMPTY)
    }

    pub fn is_container(&self) -> bool {
        self.flags.contains(ElementFlags::CONTAINER)
    }

    pub fn is_special(&self) -> bool {
        self.flags.contains(ElementFlags::SPECIAL)
    }

    /// Elements that pop trailing inline wrappers before they open. Unknown
    /// names are left nested in place.
    pub fn is_block_level(&self) -> bool {
        !self.is_inline() && !self.is_empty() && !self.is_special() && !self.is_unknown()
    }

    pub fn is_unknown(&self) -> bool {
        std::ptr::eq(self, &UNKNOWN)
    }

    /// Whether opening this element implicitly ends an open `name`.
    pub fn closes(&self, name: &str) -> bool {
        self.closes.iter().any(|tag| tag.eq_ignore_ascii_case(name))
    }

    /// Whether `name` is one of this element's natural parents.
    pub fn is_parent(&self, name: &str) -> bool {
        self.parents.iter().any(|tag| tag.eq_ignore_ascii_case(name))
    }

    pub fn first_parent(&self) -> Option<&'static str> {
        self.parents.first().copied()
    }
}

/// Descriptor for names outside the table.
pub static UNKNOWN: ElementDescriptor = ElementDescriptor {
    name: "",
    flags: ElementFlags::empty(),
    parents: BODY,
    bounds: None,
    closes: &[],
};

/// Case-insensitive, total lookup.
pub fn lookup(name: &str) -> &'static ElementDescriptor {
    find(name).unwrap_or(&UNKNOWN)
}

/// Case-insensitive lookup that reports unknown names as `None`.
pub fn find(name: &str) -> Option<&'static ElementDescriptor> {
    ELEMENTS
        .binary_search_by(|descriptor| compare_upper(descriptor.name, name))
        .ok()
        .map(|index| &ELEMENTS[index])
}

/// All known descriptors in name order.
pub fn descriptors() -> impl Iterator<Item = &'static ElementDescriptor> {
    ELEMENTS.iter()
}

fn compare_upper(canonical: &str, name: &str) -> Ordering {
    canonical
        .bytes()
        .cmp(name.bytes().map(|b| b.to_ascii_uppercase()))
}

const INLINE: ElementFlags = ElementFlags::INLINE;
const BLOCK: ElementFlags = ElementFlags::BLOCK;
const EMPTY: ElementFlags = ElementFlags::EMPTY;
const CONTAINER: ElementFlags = ElementFlags::CONTAINER;
const SPECIAL: ElementFlags = ElementFlags::SPECIAL;
const NONE: ElementFlags = ElementFlags::empty();

const BODY: &[&str] = &["BODY"];
const HEAD: &[&str] = &["HEAD"];
const HTML: &[&str] = &["HTML"];
const TABLE: &[&str] = &["TABLE"];
const HEAD_OR_BODY: &[&str] = &["HEAD", "BODY"];

const CLOSES_P: &[&str] = &["P"];
const CLOSES_HEADING: &[&str] = &["H1", "H2", "H3", "H4", "H5", "H6", "P"];
const CLOSES_CELL: &[&str] = &["TD", "TH"];
const CLOSES_ROW: &[&str] = &["TD", "TH", "TR"];
const CLOSES_SECTION: &[&str] = &["THEAD", "TBODY", "TFOOT", "TD", "TH", "TR", "COLGROUP"];
const CLOSES_DEF: &[&str] = &["DT", "DD"];
const CLOSES_OPTION: &[&str] = &["OPTION"];
const CLOSES_HEAD: &[&str] = &["HEAD"];

const fn el(
    name: &'static str,
    flags: ElementFlags,
    parents: &'static [&'static str],
    closes: &'static [&'static str],
) -> ElementDescriptor {
    ElementDescriptor {
        name,
        flags,
        parents,
        bounds: None,
        closes,
    }
}

const fn bounded(
    name: &'static str,
    flags: ElementFlags,
    parents: &'static [&'static str],
    bounds: &'static str,
    closes: &'static [&'static str],
) -> ElementDescriptor {
    ElementDescriptor {
        name,
        flags,
        parents,
        bounds: Some(bounds),
        closes,
    }
}

// Sorted by name; `table_is_sorted_and_unique` guards the order.
static ELEMENTS: &[ElementDescriptor] = &[
    el("A", INLINE, BODY, &["A"]),
    el("ABBR", INLINE, BODY, &[]),
    el("ACRONYM", INLINE, BODY, &[]),
    el("ADDRESS", BLOCK, BODY, CLOSES_P),
    el("APPLET", CONTAINER, BODY, &[]),
    el("AREA", EMPTY, &["MAP"], &[]),
    el("B", INLINE, BODY, &[]),
    el("BASE", EMPTY, HEAD, &[]),
    el("BASEFONT", EMPTY, HEAD, &[]),
    el("BDO", INLINE, BODY, &[]),
    el("BGSOUND", EMPTY, HEAD, &[]),
    el("BIG", INLINE, BODY, &[]),
    el("BLINK", INLINE, BODY, &[]),
    el("BLOCKQUOTE", BLOCK, BODY, CLOSES_P),
    el("BODY", CONTAINER, HTML, CLOSES_HEAD),
    el("BR", EMPTY, BODY, &[]),
    el("BUTTON", NONE, BODY, &["BUTTON"]),
    el("CAPTION", INLINE, TABLE, &[]),
    el("CENTER", BLOCK, BODY, CLOSES_P),
    el("CITE", INLINE, BODY, &[]),
    el("CODE", INLINE, BODY, &[]),
    el("COL", EMPTY, &["COLGROUP", "TABLE"], &[]),
    el("COLGROUP", NONE, TABLE, &["COL", "COLGROUP"]),
    el("COMMENT", SPECIAL, HTML, &[]),
    el("DD", NONE, &["DL"], CLOSES_DEF),
    el("DEL", INLINE, BODY, &[]),
    el("DFN", INLINE, BODY, &[]),
    el("DIR", NONE, BODY, CLOSES_P),
    el("DIV", BLOCK, BODY, CLOSES_P),
    el("DL", BLOCK.union(CONTAINER), BODY, CLOSES_P),
    el("DT", NONE, &["DL"], CLOSES_DEF),
    el("EM", INLINE, BODY, &[]),
    el("EMBED", EMPTY, BODY, &[]),
    el("FIELDSET", NONE, BODY, CLOSES_P),
    el("FONT", INLINE, BODY, &[]),
    el("FORM", CONTAINER, &["BODY", "TD", "DIV"], &["BUTTON", "P"]),
    el("FRAME", EMPTY, &["FRAMESET"], &[]),
    el("FRAMESET", NONE, HTML, CLOSES_HEAD),
    el("H1", BLOCK, BODY, CLOSES_HEADING),
    el("H2", BLOCK, BODY, CLOSES_HEADING),
    el("H3", BLOCK, BODY, CLOSES_HEADING),
    el("H4", BLOCK, BODY, CLOSES_HEADING),
    el("H5", BLOCK, BODY, CLOSES_HEADING),
    el("H6", BLOCK, BODY, CLOSES_HEADING),
    el("HEAD", NONE, HTML, &[]),
    el("HR", EMPTY, BODY, CLOSES_P),
    el("HTML", CONTAINER, &[], &[]),
    el("I", INLINE, BODY, &[]),
    el("IFRAME", BLOCK, BODY, &[]),
    el("ILAYER", BLOCK, BODY, &[]),
    el("IMG", EMPTY, BODY, &[]),
    el("INPUT", EMPTY, BODY, &[]),
    el("INS", INLINE, BODY, &[]),
    el("ISINDEX", EMPTY, HEAD, &[]),
    el("KBD", INLINE, BODY, &[]),
    el("KEYGEN", EMPTY, BODY, &[]),
    el("LABEL", INLINE, BODY, &[]),
    el("LAYER", BLOCK, BODY, &[]),
    el("LEGEND", NONE, &["FIELDSET"], &[]),
    el("LI", NONE, &["BODY", "UL", "OL", "DIR", "MENU"], &["LI"]),
    el("LINK", EMPTY, HEAD, &[]),
    el("LISTING", NONE, BODY, CLOSES_P),
    el("MAP", INLINE, BODY, &[]),
    el("MARQUEE", NONE, BODY, &[]),
    el("MENU", NONE, BODY, CLOSES_P),
    el("META", EMPTY, HEAD, &[]),
    el("MULTICOL", NONE, BODY, &[]),
    el("NEXTID", EMPTY, BODY, &[]),
    el("NOBR", INLINE, BODY, &["NOBR"]),
    el("NOEMBED", NONE, BODY, &[]),
    el("NOFRAMES", NONE, &["BODY", "FRAMESET"], &[]),
    el("NOLAYER", NONE, BODY, &[]),
    el("NOSCRIPT", NONE, HEAD_OR_BODY, &[]),
    el("OBJECT", CONTAINER, HEAD_OR_BODY, &[]),
    el("OL", BLOCK, BODY, CLOSES_P),
    el("OPTGROUP", NONE, &["SELECT"], CLOSES_OPTION),
    el("OPTION", NONE, &["SELECT"], CLOSES_OPTION),
    el("P", NONE, BODY, CLOSES_P),
    el("PARAM", EMPTY, &["OBJECT", "APPLET"], &[]),
    el("PLAINTEXT", SPECIAL, BODY, &[]),
    el("PRE", NONE, BODY, CLOSES_P),
    el("Q", INLINE, BODY, &[]),
    el("RB", INLINE, &["RBC", "RUBY"], &["RB"]),
    el("RBC", INLINE, &["RUBY"], &["RBC", "RTC"]),
    el("RP", INLINE, &["RUBY"], &["RB"]),
    el("RT", INLINE, &["RTC", "RUBY"], &["RB", "RP"]),
    el("RTC", INLINE, &["RUBY"], &["RBC"]),
    el("RUBY", INLINE, BODY, &[]),
    el("S", INLINE, BODY, &[]),
    el("SAMP", INLINE, BODY, &[]),
    el("SCRIPT", SPECIAL, HEAD_OR_BODY, &[]),
    el("SELECT", NONE, BODY, &["SELECT"]),
    el("SMALL", INLINE, BODY, &[]),
    el("SOUND", EMPTY, HEAD, &[]),
    el("SPACER", EMPTY, BODY, &[]),
    el("SPAN", INLINE, BODY, &[]),
    el("STRIKE", INLINE, BODY, &[]),
    el("STRONG", INLINE, BODY, &[]),
    el("STYLE", SPECIAL, HEAD_OR_BODY, &[]),
    el("SUB", INLINE, BODY, &[]),
    el("SUP", INLINE, BODY, &[]),
    el("TABLE", BLOCK.union(CONTAINER), BODY, CLOSES_P),
    el("TBODY", NONE, TABLE, CLOSES_SECTION),
    bounded("TD", CONTAINER, &["TR"], "TABLE", CLOSES_CELL),
    el("TEXTAREA", SPECIAL, BODY, &[]),
    el("TFOOT", NONE, TABLE, CLOSES_SECTION),
    bounded("TH", CONTAINER, &["TR"], "TABLE", CLOSES_CELL),
    el("THEAD", NONE, TABLE, CLOSES_SECTION),
    el("TITLE", SPECIAL, HEAD, &[]),
    bounded("TR", BLOCK, &["TABLE", "TBODY", "THEAD", "TFOOT"], "TABLE", CLOSES_ROW),
    el("TT", INLINE, BODY, &[]),
    el("U", INLINE, BODY, &[]),
    el("UL", BLOCK, BODY, CLOSES_P),
    el("VAR", INLINE, BODY, &[]),
    el("WBR", EMPTY, BODY, &[]),
    el("XML", NONE, BODY, &[]),
    el("XMP", SPECIAL, BODY, CLOSES_P),
];
