//! GPT-2 byte-level alphabet.
//!
//! GPT-2's `vocab.bpe` and `encoder.json` files never store raw bytes. Each
//! byte is written as a printable Unicode character instead, and the loader
//! in [`super::vocab`] has to undo that mapping to recover the byte sequences
//! the rank table is keyed by.
//!
//! # Mapping
//!
//! - Bytes 33-126 (`!` to `~`): themselves
//! - Bytes 161-172 (`¡` to `¬`): themselves
//! - Bytes 174-255 (`®` to `ÿ`): themselves
//! - Every other byte (0-32, 127-160, 173): U+0100 onwards, in byte order
//!
//! The same ordering (direct bytes first, then the rest) fixes the ranks of
//! the 256 base tokens in GPT-2 style vocabularies; see [`byte_level_rank_order`].

use rustc_hash::FxHashMap;
use std::sync::LazyLock;

fn is_direct(b: u8) -> bool {
    matches!(b, 33..=126 | 161..=172 | 174..=255)
}

static BYTE_TO_CHAR: LazyLock<[char; 256]> = LazyLock::new(|| {
    let mut mapping = ['\0'; 256];
    let mut next_char = 0x100u32;
    for b in 0u8..=255 {
        mapping[b as usize] = if is_direct(b) {
            b as char
        } else {
            let ch = char::from_u32(next_char).unwrap_or(char::REPLACEMENT_CHARACTER);
            next_char += 1;
            ch
        };
    }
    mapping
});

static CHAR_TO_BYTE: LazyLock<FxHashMap<char, u8>> = LazyLock::new(|| {
    BYTE_TO_CHAR
        .iter()
        .enumerate()
        .map(|(byte, &ch)| (ch, byte as u8))
        .collect()
});

/// Write raw bytes in the byte-level alphabet.
#[inline]
pub fn byte_level_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| BYTE_TO_CHAR[b as usize]).collect()
}

/// Recover raw bytes from a byte-level string.
///
/// Returns `None` if `text` contains a character outside the alphabet.
#[inline]
pub fn byte_level_decode(text: &str) -> Option<Vec<u8>> {
    text.chars()
        .map(|ch| CHAR_TO_BYTE.get(&ch).copied())
        .collect()
}

/// The 256 bytes in the order GPT-2 assigned them ranks 0..=255.
pub fn byte_level_rank_order() -> [u8; 256] {
    let mut order = [0u8; 256];
    let direct = (0u8..=255).filter(|&b| is_direct(b));
    let rest = (0u8..=255).filter(|&b| !is_direct(b));
    for (slot, b) in order.iter_mut().zip(direct.chain(rest)) {
        *slot = b;
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_level_mapping_is_bijective() {
        let mut seen: std::collections::HashSet<char> = std::collections::HashSet::new();
        for b in 0u8..=255 {
            let ch = BYTE_TO_CHAR[b as usize];
            assert!(seen.insert(ch), "Duplicate mapping for byte {}", b);
        }
        assert_eq!(seen.len(), 256);
    }

    #[test]
    fn test_byte_level_roundtrip() {
        for b in 0u8..=255 {
            let encoded = byte_level_encode(&[b]);
            let decoded = byte_level_decode(&encoded).unwrap();
            assert_eq!(decoded, vec![b], "Roundtrip failed for byte {}", b);
        }
    }

    #[test]
    fn test_space_mapping() {
        assert_eq!(BYTE_TO_CHAR[b' ' as usize], '\u{0120}');
        assert_eq!(byte_level_encode(b" hello"), "\u{0120}hello");
        assert_eq!(byte_level_decode("\u{0120}hello").unwrap(), b" hello");
    }

    #[test]
    fn test_printable_ascii_preserved() {
        for b in 33u8..=126 {
            assert_eq!(BYTE_TO_CHAR[b as usize] as u32, b as u32);
        }
    }

    #[test]
    fn test_decode_rejects_foreign_chars() {
        assert_eq!(byte_level_decode("a\u{4e16}"), None);
    }

    #[test]
    fn test_rank_order() {
        let order = byte_level_rank_order();
        assert_eq!(order[0], b'!');
        assert_eq!(order[93], b'~');
        assert_eq!(order[94], 161);
        // 188 direct bytes, then the remapped ones from 0 upwards.
        assert_eq!(order[188], 0);
        assert_eq!(order[188 + 32], b' ');
        assert_eq!(order[255], 173);

        let mut sorted = order.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, (0u8..=255).collect::<Vec<_>>());
    }

    #[test]
    fn test_full_roundtrip_string() {
        let original = "Hello, 世界! 🌍";
        let encoded = byte_level_encode(original.as_bytes());
        let decoded = String::from_utf8(byte_level_decode(&encoded).unwrap()).unwrap();
        assert_eq!(decoded, original);
    }
}
