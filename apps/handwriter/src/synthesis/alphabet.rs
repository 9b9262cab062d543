//! Alphabet Codec: the fixed symbol table the stroke model was trained on.
//!
//! Index 0 is the NUL terminator the model reserves for padding; it is never
//! produced from user text. Everything else maps 1:1 onto a printable symbol.
//! Characters outside the table are a validation failure, never dropped.

use thiserror::Error;

pub const ALPHABET_SIZE: usize = 75;

#[rustfmt::skip]
static ALPHABET: [char; ALPHABET_SIZE] = [
    '\0', ' ', '!', '"', '\'', '(', ')', ',', '-', '.',
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9',
    ':', ';', '?',
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M',
    'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z',
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm',
    'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];

/// A character that has no slot in the alphabet table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Unsupported character {character:?} at column {column}")]
pub struct UnsupportedCharacter {
    pub character: char,
    pub column: usize,
}

/// Encoded text, one alphabet index per character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterSequence(Vec<u8>);

impl CharacterSequence {
    pub fn indices(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `self`, a single space, then `other`. Used to glue a style primer's text
    /// in front of the line being written.
    pub fn joined_with_space(&self, other: &CharacterSequence) -> CharacterSequence {
        let mut indices = Vec::with_capacity(self.len() + 1 + other.len());
        indices.extend_from_slice(&self.0);
        indices.push(SPACE_INDEX);
        indices.extend_from_slice(&other.0);
        CharacterSequence(indices)
    }
}

const SPACE_INDEX: u8 = 1;

// ────────────────────────────────────────────────────────────────────────────
// Codec
// ────────────────────────────────────────────────────────────────────────────

pub fn index_of(c: char) -> Option<u8> {
    if c == '\0' {
        return None;
    }
    ALPHABET.iter().position(|&a| a == c).map(|i| i as u8)
}

/// Encodes text into alphabet indices, failing on the first unsupported character.
pub fn encode(text: &str) -> Result<CharacterSequence, UnsupportedCharacter> {
    text.chars()
        .enumerate()
        .map(|(column, character)| {
            index_of(character).ok_or(UnsupportedCharacter { character, column })
        })
        .collect::<Result<Vec<u8>, _>>()
        .map(CharacterSequence)
}

pub fn decode(sequence: &CharacterSequence) -> String {
    sequence
        .indices()
        .iter()
        .filter_map(|&i| ALPHABET.get(i as usize).copied())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_has_expected_size_and_no_duplicates() {
        let mut seen = std::collections::HashSet::new();
        for c in ALPHABET {
            assert!(seen.insert(c), "duplicate symbol {c:?}");
        }
        assert_eq!(seen.len(), ALPHABET_SIZE);
    }

    #[test]
    fn test_encode_indices_are_in_range() {
        let seq = encode("Hello, World 2024?").unwrap();
        assert_eq!(seq.len(), 18);
        assert!(seq.indices().iter().all(|&i| (i as usize) < ALPHABET_SIZE && i != 0));
    }

    #[test]
    fn test_encode_decode_preserves_text() {
        let text = "Quick brown fox (jumps) - \"over\" the lazy dog.";
        let seq = encode(text).unwrap();
        assert_eq!(decode(&seq), text);
    }

    #[test]
    fn test_unsupported_character_reports_column() {
        let err = encode("ab@c").unwrap_err();
        assert_eq!(
            err,
            UnsupportedCharacter {
                character: '@',
                column: 2
            }
        );
    }

    #[test]
    fn test_nul_is_not_encodable() {
        assert_eq!(index_of('\0'), None);
        assert!(encode("a\0b").is_err());
    }

    #[test]
    fn test_non_ascii_rejected() {
        assert!(encode("café").is_err());
    }

    #[test]
    fn test_empty_text_is_empty_sequence() {
        assert!(encode("").unwrap().is_empty());
    }

    #[test]
    fn test_joined_with_space() {
        let primer = encode("ab").unwrap();
        let line = encode("Hi").unwrap();
        assert_eq!(decode(&primer.joined_with_space(&line)), "ab Hi");
    }
}
