// src/error.rs

use reqwest::header::InvalidHeaderValue;
use serde_json::Value;
use thiserror::Error;

/// Parse Server error code returned when deleting a class that still has objects.
pub const CLASS_NOT_EMPTY_CODE: u16 = 255;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("HTTP request failed: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("URL parsing failed: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("JSON processing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("JSON deserialization failed: {0}")]
    JsonDeserializationFailed(String),

    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid class name: {0}")]
    InvalidClassName(String),

    #[error("Class is not empty: {0}")]
    ClassNotEmpty(String),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Operation forbidden: {0}")]
    OperationForbidden(String),

    #[error("Other Parse error (Code: {code}): {message}")]
    OtherParseError { code: u16, message: String },

    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Duplicate value: {0}")]
    DuplicateValue(String),

    #[error("Internal server error: {0}")]
    InternalServerError(String),

    #[error("Invalid header value: {0}")]
    InvalidHeaderValue(InvalidHeaderValue),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Profile store error: {0}")]
    Storage(#[from] std::io::Error),
}

/// The coarse buckets a failure falls into when it is reported to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// No connectivity, bad URL, TLS failure and the like.
    Transport,
    /// The server answered with `{"error": ..., "code": ...}`.
    Server,
    /// The server answered, but not with the shape we expected.
    MalformedResponse,
    /// Rejected before anything was sent, or a local storage failure.
    Local,
}

impl ParseError {
    /// Creates a `ParseError` from an HTTP status code and a JSON response body.
    pub(crate) fn from_response(status_code: u16, response_body: Value) -> Self {
        let error_code = response_body
            .get("code")
            .and_then(|v| v.as_u64())
            .and_then(|code| u16::try_from(code).ok())
            .unwrap_or(0);
        let error_message = response_body
            .get("error")
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown error")
            .to_string();

        match error_code {
            100 => ParseError::ConnectionFailed(format!("({}) {}", error_code, error_message)),
            101 => ParseError::ObjectNotFound(format!("({}) {}", error_code, error_message)),
            102 => ParseError::InvalidQuery(format!("({}) {}", error_code, error_message)),
            103 => ParseError::InvalidClassName(format!("({}) {}", error_code, error_message)),
            111 => ParseError::InvalidInput(format!(
                "Invalid field type: ({}) {}",
                error_code, error_message
            )),
            119 => ParseError::OperationForbidden(format!(
                "Missing master key for operation: ({}) {}",
                error_code, error_message
            )),
            137 => ParseError::DuplicateValue(format!("({}) {}", error_code, error_message)),
            CLASS_NOT_EMPTY_CODE => {
                ParseError::ClassNotEmpty(format!("({}) {}", error_code, error_message))
            }
            _ => {
                if status_code >= 500 {
                    ParseError::InternalServerError(format!(
                        "Server error (HTTP {}): ({}) {}",
                        status_code, error_code, error_message
                    ))
                } else if status_code == 401 || status_code == 403 {
                    ParseError::AuthenticationError(format!(
                        "Auth error (HTTP {}): ({}) {}",
                        status_code, error_code, error_message
                    ))
                } else if status_code == 404 {
                    ParseError::ObjectNotFound(format!(
                        "Not found (HTTP {}): ({}) {}",
                        status_code, error_code, error_message
                    ))
                } else {
                    ParseError::OtherParseError {
                        code: error_code,
                        message: error_message,
                    }
                }
            }
        }
    }

    /// Which of the reporting buckets this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            ParseError::ReqwestError(e) if e.is_decode() => ErrorCategory::MalformedResponse,
            ParseError::ReqwestError(_)
            | ParseError::UrlParseError(_)
            | ParseError::InvalidUrl(_)
            | ParseError::ConnectionFailed(_) => ErrorCategory::Transport,
            ParseError::JsonError(_)
            | ParseError::JsonDeserializationFailed(_)
            | ParseError::UnexpectedResponse(_) => ErrorCategory::MalformedResponse,
            ParseError::ObjectNotFound(_)
            | ParseError::InvalidClassName(_)
            | ParseError::ClassNotEmpty(_)
            | ParseError::OperationForbidden(_)
            | ParseError::OtherParseError { .. }
            | ParseError::AuthenticationError(_)
            | ParseError::InvalidQuery(_)
            | ParseError::DuplicateValue(_)
            | ParseError::InternalServerError(_) => ErrorCategory::Server,
            ParseError::InvalidInput(_)
            | ParseError::InvalidHeaderValue(_)
            | ParseError::Config(_)
            | ParseError::Storage(_) => ErrorCategory::Local,
        }
    }

    /// True when the server refused to drop a class because it still holds rows.
    pub fn is_class_not_empty(&self) -> bool {
        matches!(self, ParseError::ClassNotEmpty(_))
    }

    /// The single line shown to the user when a request fails.
    pub fn user_message(&self) -> String {
        match self.category() {
            ErrorCategory::Transport => format!("Could not reach the server: {}", self),
            ErrorCategory::Server => self.to_string(),
            ErrorCategory::MalformedResponse => {
                format!("The server sent a response that could not be read: {}", self)
            }
            ErrorCategory::Local => self.to_string(),
        }
    }
}
