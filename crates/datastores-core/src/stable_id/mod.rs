//! Stable element identity.
//!
//! A [`StableId`] is a process-scoped signed 32-bit identifier, independent of
//! where the element is stored. `0` is reserved as the invalid sentinel, which
//! also names the hidden root of every element store.
//!
//! The canonical text form is a fixed-width base-62 string. The value is biased
//! into the unsigned range before conversion, so every `i32` has exactly one
//! six-character encoding and the lexicographic order of encodings matches the
//! numeric order of ids.

pub mod allocator;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::{DatastoresError, Result};

pub use allocator::{
    display_form, EntropySource, IdAllocator, RandEntropy, SequenceEntropy,
    MAX_ALLOCATION_ATTEMPTS,
};

/// Prefix used by the display form (`ID-0A1b2C`).
pub const ID_PREFIX: &str = "ID-";

/// Minimum width of an encoding; shorter values are left-padded with `0`.
pub const ENCODED_WIDTH: usize = 6;

const BASE62_ALPHABET: &[u8; 62] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

const BIAS: u32 = 0x8000_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct StableId(i32);

impl StableId {
    pub const INVALID: StableId = StableId(0);

    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    pub const fn value(self) -> i32 {
        self.0
    }

    pub const fn is_invalid(self) -> bool {
        self.0 == 0
    }

    /// Bare base-62 encoding (no `ID-` prefix).
    pub fn encode(self) -> String {
        let mut unsigned = (self.0 as u32).wrapping_add(BIAS);
        let mut digits = Vec::with_capacity(ENCODED_WIDTH);
        while unsigned > 0 {
            digits.push(BASE62_ALPHABET[(unsigned % 62) as usize]);
            unsigned /= 62;
        }
        while digits.len() < ENCODED_WIDTH {
            digits.push(b'0');
        }
        digits.reverse();
        // alphabet is ASCII
        digits.into_iter().map(char::from).collect()
    }

    /// Inverse of [`StableId::encode`].
    ///
    /// # Errors
    ///
    /// `InvalidIdEncoding` for empty input, characters outside `[0-9A-Za-z]`
    /// or a value that does not fit in 32 bits.
    pub fn decode(encoded: &str) -> Result<Self> {
        if encoded.is_empty() {
            return Err(invalid(encoded, "empty string"));
        }

        let mut acc: u64 = 0;
        for c in encoded.chars() {
            let digit = base62_digit(c)
                .ok_or_else(|| invalid(encoded, &format!("character '{}' is not base-62", c)))?;
            acc = acc * 62 + u64::from(digit);
            if acc > u64::from(u32::MAX) {
                return Err(invalid(encoded, "value exceeds 32 bits"));
            }
        }

        Ok(Self((acc as u32).wrapping_sub(BIAS) as i32))
    }
}

fn base62_digit(c: char) -> Option<u32> {
    match c {
        '0'..='9' => Some(c as u32 - '0' as u32),
        'A'..='Z' => Some(c as u32 - 'A' as u32 + 10),
        'a'..='z' => Some(c as u32 - 'a' as u32 + 36),
        _ => None,
    }
}

fn invalid(input: &str, reason: &str) -> DatastoresError {
    DatastoresError::InvalidIdEncoding {
        input: input.to_string(),
        reason: reason.to_string(),
    }
}

impl fmt::Display for StableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", ID_PREFIX, self.encode())
    }
}

impl FromStr for StableId {
    type Err = DatastoresError;

    /// Accepts both the display form (`ID-xxxxxx`) and the bare encoding.
    fn from_str(s: &str) -> Result<Self> {
        StableId::decode(s.strip_prefix(ID_PREFIX).unwrap_or(s))
    }
}

impl From<i32> for StableId {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl Serialize for StableId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for StableId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
