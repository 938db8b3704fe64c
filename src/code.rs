// 🔢 Code Generator - two-stage base-36 fold
// Pure: no I/O, no clock, no logging. Same canonical string => same code.

use crate::record::IdentityRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of characters in every registry code
pub const CODE_LENGTH: usize = 8;

/// Filler appended when the folds produce fewer than CODE_LENGTH symbols
pub const PAD_CHAR: char = '0';

/// Base-36 digit symbols, indexed by digit value
pub const ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

const RADIX: u128 = 36;

// ============================================================================
// REGISTRY CODE
// ============================================================================

/// An 8-character identifier over `[0-9A-Z]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RegistryCode(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodeParseError {
    #[error("registry code must be {expected} characters, got {0}", expected = CODE_LENGTH)]
    Length(usize),
    #[error("registry code contains '{0}', expected only 0-9 and A-Z")]
    Symbol(char),
}

impl RegistryCode {
    /// Accept an existing code, e.g. one typed back in for verification.
    pub fn parse(s: &str) -> Result<Self, CodeParseError> {
        let len = s.chars().count();
        if len != CODE_LENGTH {
            return Err(CodeParseError::Length(len));
        }
        if let Some(bad) = s.chars().find(|c| !c.is_ascii_digit() && !c.is_ascii_uppercase()) {
            return Err(CodeParseError::Symbol(bad));
        }
        Ok(RegistryCode(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegistryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RegistryCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RegistryCode {
    type Error = CodeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        RegistryCode::parse(&value)
    }
}

impl From<RegistryCode> for String {
    fn from(code: RegistryCode) -> Self {
        code.0
    }
}

// ============================================================================
// FOLDS
// ============================================================================

/// Sum of the Unicode scalar values of `s` (Fold A input).
pub fn character_sum(s: &str) -> u128 {
    s.chars().map(|c| c as u128).sum()
}

/// Sum of `(codepoint * position) mod 256` with 1-based positions (Fold B input).
pub fn position_weighted_sum(s: &str) -> u128 {
    s.chars()
        .enumerate()
        .map(|(i, c)| (c as u128 * (i as u128 + 1)) % 256)
        .sum()
}

/// Expand `total` into base-36 symbols, least significant digit first.
///
/// Digits are not reversed afterwards. Zero expands to the empty string.
pub fn fold_base36(mut total: u128) -> String {
    let mut out = String::new();
    while total > 0 {
        let digit = (total % RADIX) as usize;
        out.push(ALPHABET[digit] as char);
        total /= RADIX;
    }
    out
}

/// Run both folds over a prebuilt canonical string and fix the length to 8.
pub fn generate_from_canonical(canonical: &str) -> RegistryCode {
    // Symbols come out of ALPHABET already uppercase
    let mut raw = fold_base36(character_sum(canonical));
    raw.push_str(&fold_base36(position_weighted_sum(canonical)));

    // Fold output is ASCII, so byte length == char length here.
    // Truncation keeps the prefix and drops the tail of Fold B.
    if raw.len() < CODE_LENGTH {
        let missing = CODE_LENGTH - raw.len();
        raw.extend(std::iter::repeat(PAD_CHAR).take(missing));
    } else {
        raw.truncate(CODE_LENGTH);
    }

    RegistryCode(raw)
}

/// Derive the registry code of a validated record.
pub fn generate(record: &IdentityRecord) -> RegistryCode {
    generate_from_canonical(&record.canonical_string())
}

// ============================================================================
// TESTS
// ============================================================================
