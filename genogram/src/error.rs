use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failure to read or write a serialized editor document.
#[derive(Debug)]
pub enum DocumentError {
    Json(serde_json::Error),
    InvalidDocument(String),
}

impl DocumentError {
    /// Stable machine-readable code, used by the wasm error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Json(_) => "invalid_json",
            Self::InvalidDocument(_) => "invalid_document",
        }
    }
}

impl Display for DocumentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "malformed document json: {err}"),
            Self::InvalidDocument(message) => write!(f, "invalid document: {message}"),
        }
    }
}

impl Error for DocumentError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::InvalidDocument(_) => None,
        }
    }
}

impl From<serde_json::Error> for DocumentError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}
