//! The ZXDB game identifier.
//!
//! ZXDB keys every title by a zero-padded 7-digit decimal id (`"0003972"`).
//! The newtype validates at construction so downstream URL building never
//! has to re-check.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Invalid game id input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameIdError {
    #[error("game id must be exactly 7 characters, got {0}")]
    BadLength(usize),
    #[error("game id must be all decimal digits: {0:?}")]
    NotDigits(String),
}

/// A validated 7-digit ZXDB game id.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GameId(String);

impl GameId {
    /// Validate and wrap a candidate id.
    pub fn new(s: impl Into<String>) -> Result<Self, GameIdError> {
        let s = s.into();
        if s.len() != 7 {
            return Err(GameIdError::BadLength(s.len()));
        }
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(GameIdError::NotDigits(s));
        }
        Ok(GameId(s))
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for GameId {
    type Err = GameIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GameId::new(s)
    }
}

impl TryFrom<String> for GameId {
    type Error = GameIdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        GameId::new(s)
    }
}

impl From<GameId> for String {
    fn from(id: GameId) -> String {
        id.0
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_seven_digits() {
        let id = GameId::new("0003972").unwrap();
        assert_eq!(id.as_str(), "0003972");
        assert_eq!(id.to_string(), "0003972");
    }

    #[test]
    fn rejects_wrong_length() {
        assert_eq!(GameId::new("").unwrap_err(), GameIdError::BadLength(0));
        assert_eq!(GameId::new("123456").unwrap_err(), GameIdError::BadLength(6));
        assert_eq!(
            GameId::new("12345678").unwrap_err(),
            GameIdError::BadLength(8)
        );
    }

    #[test]
    fn rejects_non_digits() {
        assert!(matches!(
            GameId::new("123456a"),
            Err(GameIdError::NotDigits(_))
        ));
        assert!(matches!(
            GameId::new("_003972"),
            Err(GameIdError::NotDigits(_))
        ));
    }

    #[test]
    fn parses_from_str() {
        let id: GameId = "0005795".parse().unwrap();
        assert_eq!(id.as_str(), "0005795");
    }
}
