//! Asset error types
//!
//! Errors raised while loading scene descriptions and other resources.
//! Resource failures never affect session state; callers log them and move on.

use std::io;
use std::fmt;

/// Error type for asset operations
#[derive(Debug)]
pub enum AssetError {
    /// IO error (file not found, permission denied, etc.)
    Io(io::Error),
    /// Parse error (invalid file format, deserialization failure)
    Parse(String),
    /// Serialization error while saving
    Serialize(String),
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetError::Io(err) => write!(f, "Asset IO error: {}", err),
            AssetError::Parse(msg) => write!(f, "Asset parse error: {}", msg),
            AssetError::Serialize(msg) => write!(f, "Asset serialize error: {}", msg),
        }
    }
}

impl std::error::Error for AssetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AssetError::Io(err) => Some(err),
            AssetError::Parse(_) | AssetError::Serialize(_) => None,
        }
    }
}

impl From<io::Error> for AssetError {
    fn from(err: io::Error) -> Self {
        AssetError::Io(err)
    }
}

impl From<ron::error::SpannedError> for AssetError {
    fn from(err: ron::error::SpannedError) -> Self {
        AssetError::Parse(err.to_string())
    }
}

impl From<ron::Error> for AssetError {
    fn from(err: ron::Error) -> Self {
        AssetError::Serialize(err.to_string())
    }
}
