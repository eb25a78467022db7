//! Paste and comment identifiers.
//!
//! An identifier is exactly 16 lowercase hexadecimal characters: 8 bytes of
//! entropy rendered as hex. The same format is used for paste ids, comment ids
//! and parent ids.
//!
//! [`PasteId`] can only be built from a string that passes [`is_valid_id`],
//! so every storage key derived from it stays inside the storage root.

use crate::error::{Result, ZkbinError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Number of characters in a valid identifier.
pub const ID_LENGTH: usize = 16;

/// Returns true if `candidate` is exactly 16 characters from `[0-9a-f]`.
///
/// ```
/// use zkbinapp::id::is_valid_id;
///
/// assert!(is_valid_id("5b65a01b43987bc2"));
/// assert!(!is_valid_id("5B65A01B43987BC2"));
/// assert!(!is_valid_id("5b65a01b43987bc"));
/// assert!(!is_valid_id("../../etc/passwd"));
/// ```
pub fn is_valid_id(candidate: &str) -> bool {
    candidate.len() == ID_LENGTH && candidate.bytes().all(is_lower_hex)
}

fn is_lower_hex(b: u8) -> bool {
    b.is_ascii_digit() || (b'a'..=b'f').contains(&b)
}

/// A validated paste, comment or parent identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PasteId(String);

impl PasteId {
    /// Generates a fresh random identifier.
    pub fn generate() -> Self {
        let bytes: [u8; ID_LENGTH / 2] = rand::random();
        Self(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First shard segment (characters 0..2).
    pub fn shard_outer(&self) -> &str {
        &self.0[0..2]
    }

    /// Second shard segment (characters 2..4).
    pub fn shard_inner(&self) -> &str {
        &self.0[2..4]
    }
}

impl FromStr for PasteId {
    type Err = ZkbinError;

    fn from_str(s: &str) -> Result<Self> {
        if is_valid_id(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(ZkbinError::InvalidId(s.to_string()))
        }
    }
}

impl TryFrom<&str> for PasteId {
    type Error = ZkbinError;

    fn try_from(s: &str) -> Result<Self> {
        s.parse()
    }
}

impl AsRef<str> for PasteId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PasteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for PasteId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for PasteId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_ids() {
        assert!(is_valid_id("0000000000000000"));
        assert!(is_valid_id("ffffffffffffffff"));
        assert!(is_valid_id("0123456789abcdef"));
    }

    #[test]
    fn test_rejects_wrong_length() {
        assert!(!is_valid_id(""));
        assert!(!is_valid_id("0123456789abcde"));
        assert!(!is_valid_id("0123456789abcdef0"));
    }

    #[test]
    fn test_rejects_non_hex_and_uppercase() {
        assert!(!is_valid_id("0123456789abcdeg"));
        assert!(!is_valid_id("0123456789ABCDEF"));
        assert!(!is_valid_id("0123456789abcde "));
        assert!(!is_valid_id("0123456789abcd/e"));
    }

    #[test]
    fn test_rejects_multibyte_of_matching_byte_length() {
        // 14 hex chars plus a two-byte char is 16 bytes
        assert!(!is_valid_id("0123456789abcdé"));
    }

    #[test]
    fn test_generate_produces_valid_ids() {
        for _ in 0..32 {
            let id = PasteId::generate();
            assert!(is_valid_id(id.as_str()), "generated {}", id);
        }
    }

    #[test]
    fn test_parse_and_shards() {
        let id: PasteId = "5b65a01b43987bc2".parse().unwrap();
        assert_eq!(id.shard_outer(), "5b");
        assert_eq!(id.shard_inner(), "65");
        assert_eq!(id.to_string(), "5b65a01b43987bc2");
    }

    #[test]
    fn test_parse_error_carries_candidate() {
        let err = "nope".parse::<PasteId>().unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_serde_as_string() {
        let id: PasteId = "5b65a01b43987bc2".parse().unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"5b65a01b43987bc2\"");
        let back: PasteId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<PasteId>("\"zz\"").is_err());
    }
}
