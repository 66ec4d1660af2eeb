//! Incremental UTF-16 decoding. Odd trailing bytes and unpaired high
//! surrogates at a chunk edge wait in the carry buffer.

pub(crate) fn push_utf16_chunk(
    text: &mut String,
    carry: &mut Vec<u8>,
    bytes: &[u8],
    big_endian: bool,
) {
    if bytes.is_empty() {
        return;
    }
    let mut pending = std::mem::take(carry);
    pending.extend_from_slice(bytes);

    let units = pending.len() / 2;
    let unit_at = |index: usize| -> u16 {
        let pair = [pending[index * 2], pending[index * 2 + 1]];
        if big_endian {
            u16::from_be_bytes(pair)
        } else {
            u16::from_le_bytes(pair)
        }
    };

    let mut index = 0;
    while index < units {
        let unit = unit_at(index);
        match unit {
            0xD800..=0xDBFF => {
                if index + 1 == units {
                    break;
                }
                let low = unit_at(index + 1);
                if (0xDC00..=0xDFFF).contains(&low) {
                    let scalar =
                        0x10000 + ((u32::from(unit) - 0xD800) << 10) + (u32::from(low) - 0xDC00);
                    text.push(char::from_u32(scalar).unwrap_or(char::REPLACEMENT_CHARACTER));
                    index += 2;
                } else {
                    text.push(char::REPLACEMENT_CHARACTER);
                    index += 1;
                }
            }
            0xDC00..=0xDFFF => {
                text.push(char::REPLACEMENT_CHARACTER);
                index += 1;
            }
            _ => {
                text.push(char::from_u32(u32::from(unit)).unwrap_or(char::REPLACEMENT_CHARACTER));
                index += 1;
            }
        }
    }
    carry.extend_from_slice(&pending[index * 2..]);
}

pub(crate) fn finish_utf16(text: &mut String, carry: &mut Vec<u8>) {
    if !carry.is_empty() {
        text.push(char::REPLACEMENT_CHARACTER);
        carry.clear();
    }
}
