//! Error types for Gist.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Stable name of the variant, reported to callers alongside the message.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Provider(_) => "ProviderError",
            Error::Http(_) => "HttpError",
            Error::Database(_) => "DatabaseError",
            Error::NotFound(_) => "NotFound",
            Error::Config(_) => "ConfigError",
            Error::Io(_) => "IoError",
            Error::Json(_) => "JsonError",
            Error::Internal(_) => "InternalError",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_displays_bare_message() {
        let err = Error::NotFound("Simulation 7 not found".into());
        assert_eq!(err.to_string(), "Simulation 7 not found");
        assert!(err.is_not_found());
        assert_eq!(err.kind(), "NotFound");
    }

    #[test]
    fn test_json_error_converts() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: Error = parse.unwrap_err().into();
        assert_eq!(err.kind(), "JsonError");
        assert!(!err.is_not_found());
    }
}
