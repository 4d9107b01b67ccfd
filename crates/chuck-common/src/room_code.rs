use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

pub const ROOM_CODE_LEN: usize = 5;
pub const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Five uppercase alphanumeric characters. Parsing is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    pub fn parse(value: &str) -> Result<Self, RoomCodeError> {
        let value = value.trim();
        let found = value.chars().count();
        if found != ROOM_CODE_LEN {
            return Err(RoomCodeError::InvalidLength {
                expected: ROOM_CODE_LEN,
                found,
            });
        }
        let upper = value.to_ascii_uppercase();
        for (index, ch) in upper.chars().enumerate() {
            if !ch.is_ascii_alphanumeric() {
                return Err(RoomCodeError::InvalidCharacter { ch, index });
            }
        }
        Ok(Self(upper))
    }

    pub fn random(rng: &mut impl Rng) -> Self {
        let code = (0..ROOM_CODE_LEN)
            .map(|_| ROOM_CODE_ALPHABET[rng.gen_range(0..ROOM_CODE_ALPHABET.len())] as char)
            .collect();
        Self(code)
    }

    /// Draw codes until `taken` rejects one.
    pub fn generate_unique(rng: &mut impl Rng, mut taken: impl FnMut(&RoomCode) -> bool) -> Self {
        loop {
            let code = Self::random(rng);
            if !taken(&code) {
                return code;
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for RoomCode {
    type Err = RoomCodeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for RoomCode {
    type Error = RoomCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomCodeError {
    #[error("room code must be {expected} chars, got {found}")]
    InvalidLength { expected: usize, found: usize },
    #[error("invalid character '{ch}' at position {index}")]
    InvalidCharacter { ch: char, index: usize },
}
