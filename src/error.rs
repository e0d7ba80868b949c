//! Error types for the MCP server.

use thiserror::Error;

use crate::wiki::TokenKind;

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// MCP server errors.
#[derive(Error, Debug)]
pub enum Error {
    /// Tool not found.
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    /// Invalid parameters.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    /// A token-fetch response did not carry the expected token.
    #[error("failed to obtain {kind} token from MediaWiki API")]
    TokenMissing {
        /// Which token was requested.
        kind: TokenKind,
    },

    /// The wiki rejected the supplied credentials.
    #[error("MediaWiki login failed: {0}")]
    LoginFailed(String),

    /// Transport failure talking to the wiki.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid configuration (endpoint URL, HTTP client setup).
    #[error("configuration error: {0}")]
    Config(String),

    /// A wiki response body was not valid JSON.
    #[error("wiki returned a non-JSON body: {0}")]
    InvalidResponse(#[source] serde_json::Error),

    /// Well-formed JSON that is not a JSON-RPC message.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get the JSON-RPC error code for this error.
    pub fn code(&self) -> i32 {
        match self {
            Error::ToolNotFound(_) => codes::METHOD_NOT_FOUND,
            Error::InvalidParams(_) => codes::INVALID_PARAMS,
            Error::TokenMissing { .. } => -32001,
            Error::LoginFailed(_) => -32002,
            Error::Http(_) => -32003,
            Error::Config(_) => -32004,
            Error::InvalidResponse(_) => -32006,
            Error::InvalidRequest(_) => codes::INVALID_REQUEST,
            Error::Serialization(_) => codes::PARSE_ERROR,
            Error::Io(_) => -32005,
        }
    }
}

/// Standard JSON-RPC error codes.
pub mod codes {
    /// Parse error.
    pub const PARSE_ERROR: i32 = -32700;
    /// Invalid request.
    pub const INVALID_REQUEST: i32 = -32600;
    /// Method not found.
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid params.
    pub const INVALID_PARAMS: i32 = -32602;
    /// Internal error.
    pub const INTERNAL_ERROR: i32 = -32603;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_map_to_invalid_params() {
        let err = Error::InvalidParams("missing text".into());
        assert_eq!(err.code(), codes::INVALID_PARAMS);
        assert_eq!(err.to_string(), "invalid parameters: missing text");
    }

    #[test]
    fn token_error_names_the_token_kind() {
        let err = Error::TokenMissing {
            kind: TokenKind::Csrf,
        };
        assert_eq!(
            err.to_string(),
            "failed to obtain csrf token from MediaWiki API"
        );
    }

    #[test]
    fn undecodable_wiki_body_is_not_a_parse_error() {
        let decode = serde_json::from_str::<serde_json::Value>("<html>").unwrap_err();
        let err = Error::InvalidResponse(decode);
        assert_ne!(err.code(), codes::PARSE_ERROR);
        assert!(err.to_string().starts_with("wiki returned a non-JSON body"));
    }

    #[test]
    fn login_failure_carries_remote_result() {
        let err = Error::LoginFailed("WrongPass".into());
        assert_eq!(err.to_string(), "MediaWiki login failed: WrongPass");
        assert_eq!(err.code(), -32002);
    }
}
