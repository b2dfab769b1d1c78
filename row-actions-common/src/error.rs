//! Error types for the row action engine

use thiserror::Error;

/// Row action error types
///
/// The evaluation path never surfaces these; they describe the fallible
/// internals (token decoding, configuration loading) and the host CLI.
#[derive(Error, Debug)]
pub enum Error {
    // Attribute Errors
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token payload is not valid base64: {0}")]
    TokenEncoding(String),

    #[error("Token claims are not valid JSON: {0}")]
    TokenClaims(String),

    // Action Errors
    #[error("Action not visible for this row: {0}")]
    ActionNotVisible(String),

    // General Errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type alias for row action operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Stable error code for host-facing output
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidToken(_) => "invalid_token",
            Self::TokenEncoding(_) => "token_encoding",
            Self::TokenClaims(_) => "token_claims",
            Self::ActionNotVisible(_) => "action_not_visible",
            Self::ConfigError(_) => "config_error",
            Self::IoError(_) => "io_error",
            Self::JsonError(_) => "json_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            Error::InvalidToken("no payload".to_string()).error_code(),
            "invalid_token"
        );
        assert_eq!(
            Error::ActionNotVisible("edit".to_string()).error_code(),
            "action_not_visible"
        );
    }

    #[test]
    fn test_json_error_conversion() {
        let err: Error = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert_eq!(err.error_code(), "json_error");
    }
}
