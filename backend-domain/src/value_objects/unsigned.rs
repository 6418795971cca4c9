// Unsigned 64-bit identifiers stored in signed 64-bit columns

use thiserror::Error;

/// Maps a `u64` onto the `i64` column domain by two's-complement wraparound.
/// Values above `i64::MAX` land in the negative range.
pub fn encode_u64(value: u64) -> i64 {
    value as i64
}

/// Exact inverse of [`encode_u64`].
pub fn decode_u64(value: i64) -> u64 {
    value as u64
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid unsigned 64-bit id '{0}'")]
pub struct InvalidId(pub String);

/// Parses a decimal id as sent by upstream feeds and HTTP clients.
pub fn parse_u64(text: &str) -> Result<u64, InvalidId> {
    let trimmed = text.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(InvalidId(text.to_string()));
    }
    trimmed
        .parse::<u64>()
        .map_err(|_| InvalidId(text.to_string()))
}

/// Serde adapter writing `u64` ids as decimal strings; JSON numbers lose
/// precision above 2^53. Accepts both strings and numbers on input.
pub mod u64_string {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Text(String),
        Number(u64),
    }

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(value) => Ok(value),
            Repr::Text(text) => super::parse_u64(&text).map_err(D::Error::custom),
        }
    }
}
