//! Byte-level helpers shared by the markup crates: charset labels, BOM
//! sniffing and incremental decoders.

mod charset;
mod single_byte;
mod utf16;
pub mod utf8;

pub use charset::{Charset, Decoder, sniff_bom};
pub use single_byte::windows_1252_char;
