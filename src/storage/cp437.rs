//! Code page 437, the single-byte encoding raw files are written in.
//!
//! Bytes `0x00..=0x7F` map to the ASCII code points of the same value. The
//! upper half maps to the box-drawing, Latin and Greek characters of the
//! original IBM PC character set. The mapping is a bijection, so decoding
//! never fails and every decoded string encodes back to the same bytes.

/// Characters for bytes `0x80..=0xFF`.
const UPPER: [char; 128] = [
    // 0x80
    'Ç', 'ü', 'é', 'â', 'ä', 'à', 'å', 'ç', 'ê', 'ë', 'è', 'ï', 'î', 'ì', 'Ä', 'Å',
    // 0x90
    'É', 'æ', 'Æ', 'ô', 'ö', 'ò', 'û', 'ù', 'ÿ', 'Ö', 'Ü', '¢', '£', '¥', '₧', 'ƒ',
    // 0xA0
    'á', 'í', 'ó', 'ú', 'ñ', 'Ñ', 'ª', 'º', '¿', '⌐', '¬', '½', '¼', '¡', '«', '»',
    // 0xB0
    '░', '▒', '▓', '│', '┤', '╡', '╢', '╖', '╕', '╣', '║', '╗', '╝', '╜', '╛', '┐',
    // 0xC0
    '└', '┴', '┬', '├', '─', '┼', '╞', '╟', '╚', '╔', '╩', '╦', '╠', '═', '╬', '╧',
    // 0xD0
    '╨', '╤', '╥', '╙', '╘', '╒', '╓', '╫', '╪', '┘', '┌', '█', '▄', '▌', '▐', '▀',
    // 0xE0
    'α', '\u{df}', 'Γ', 'π', 'Σ', 'σ', '\u{b5}', 'τ', 'Φ', 'Θ', 'Ω', 'δ', '∞', '\u{3c6}', '\u{3b5}',
    '\u{2229}',
    // 0xF0
    '≡', '±', '≥', '≤', '⌠', '⌡', '÷', '≈', '°', '\u{2219}', '\u{b7}', '√', 'ⁿ', '²', '■',
    '\u{a0}',
];

/// A character with no CP437 byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("character {0:?} cannot be encoded in code page 437")]
pub struct EncodeError(pub char);

/// Decodes CP437 bytes into a string.
#[must_use]
pub fn decode(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| decode_byte(b)).collect()
}

/// Encodes a string into CP437 bytes.
///
/// # Errors
///
/// Returns [`EncodeError`] for the first character that has no byte in the
/// code page.
pub fn encode(text: &str) -> Result<Vec<u8>, EncodeError> {
    let mut bytes = Vec::with_capacity(text.len());
    for c in text.chars() {
        bytes.push(encode_char(c).ok_or(EncodeError(c))?);
    }
    Ok(bytes)
}

const fn decode_byte(byte: u8) -> char {
    if byte.is_ascii() {
        byte as char
    } else {
        UPPER[(byte - 0x80) as usize]
    }
}

fn encode_char(c: char) -> Option<u8> {
    if c.is_ascii() {
        return u8::try_from(c).ok();
    }
    UPPER
        .iter()
        .position(|&upper| upper == c)
        .and_then(|index| u8::try_from(index + 0x80).ok())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn every_byte_round_trips() {
        let bytes: Vec<u8> = (0..=255).collect();
        let text = decode(&bytes);
        assert_eq!(text.chars().count(), 256);
        assert_eq!(encode(&text).unwrap(), bytes);
    }

    #[test]
    fn upper_half_is_distinct_and_non_ascii() {
        let unique: HashSet<char> = UPPER.iter().copied().collect();
        assert_eq!(unique.len(), UPPER.len());
        assert!(UPPER.iter().all(|c| !c.is_ascii()));
    }

    #[test]
    fn known_characters() {
        assert_eq!(decode(&[0x82, 0xE1, 0xFB]), "éß√");
        assert_eq!(encode("Ç").unwrap(), vec![0x80]);
    }

    #[test]
    fn unencodable_character_is_rejected() {
        assert_eq!(encode("dragon 🐉"), Err(EncodeError('🐉')));
    }
}
