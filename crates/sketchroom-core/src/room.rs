//! Room names.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised when validating a room name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomNameError {
    #[error("room name must not be empty")]
    Empty,
}

/// Name of the room whose history a client shares.
///
/// Opaque apart from being non-empty; surrounding whitespace is trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomName(String);

impl RoomName {
    pub fn parse(name: &str) -> Result<Self, RoomNameError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(RoomNameError::Empty);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RoomName {
    type Error = RoomNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RoomName> for String {
    fn from(room: RoomName) -> Self {
        room.0
    }
}

impl std::str::FromStr for RoomName {
    type Err = RoomNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims() {
        let room = RoomName::parse("  sketch-club \n").unwrap();
        assert_eq!(room.as_str(), "sketch-club");
        assert_eq!(room.to_string(), "sketch-club");
    }

    #[test]
    fn test_empty_rejected() {
        assert_eq!(RoomName::parse(""), Err(RoomNameError::Empty));
        assert_eq!(RoomName::parse("   "), Err(RoomNameError::Empty));
        assert!(serde_json::from_str::<RoomName>(r#""""#).is_err());
    }

    #[test]
    fn test_serde_as_plain_string() {
        let room: RoomName = serde_json::from_str(r#""lobby""#).unwrap();
        assert_eq!(serde_json::to_string(&room).unwrap(), r#""lobby""#);
    }
}
