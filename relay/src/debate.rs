//! Debate identifiers — validated before any store or bus lookup.

use serde::{Deserialize, Serialize};

/// Maximum accepted identifier length.
const MAX_ID_LEN: usize = 64;

/// Error type for identifier validation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    #[error("debate id is empty")]
    Empty,

    #[error("debate id exceeds {MAX_ID_LEN} characters")]
    TooLong,

    #[error("debate id contains invalid character '{0}'")]
    InvalidCharacter(char),
}

/// Opaque validated debate identifier.
///
/// Accepts 1..=64 characters of `[A-Za-z0-9_-]`. Anything else is rejected
/// up front so malformed ids never reach the signal store or the event bus.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DebateId(String);

impl DebateId {
    /// Parse and validate a raw identifier.
    pub fn parse(raw: &str) -> Result<Self, IdError> {
        if raw.is_empty() {
            return Err(IdError::Empty);
        }
        if raw.len() > MAX_ID_LEN {
            return Err(IdError::TooLong);
        }
        if let Some(c) = raw
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(IdError::InvalidCharacter(c));
        }
        Ok(Self(raw.to_string()))
    }

    /// The validated identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for DebateId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DebateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for DebateId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DebateId> for String {
    fn from(id: DebateId) -> String {
        id.0
    }
}
