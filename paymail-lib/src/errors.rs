//! Error types for Paymail operations.
//!
//! Every failure surfaced by the client maps onto one of four classes:
//! precondition errors raised before any I/O, transport errors, protocol
//! errors reported by the provider, and malformed responses that decoded
//! at the HTTP layer but break the protocol contract.

use std::fmt;

/// Error codes for FFI and log correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum PaymailErrorCode {
    /// Transport/network layer error
    Transport = 2000,
    /// Connection failed
    ConnectionFailed = 2001,
    /// Connection timeout
    ConnectionTimeout = 2002,
    /// DNS lookup or wire decoding error
    Dns = 2100,
    /// Paymail address or record not found
    NotFound = 4000,
    /// Provider answered with a non-success status
    BadResponse = 4001,
    /// Invalid request/data
    InvalidData = 5000,
    /// Validation failed
    ValidationFailed = 5001,
    /// Serialization error
    Serialization = 5002,
    /// Response decoded but violates the protocol contract
    MalformedResponse = 5003,
    /// Output script could not be turned into an address
    InvalidScript = 5004,
    /// Message signing or verification failed
    Signature = 6000,
    /// Internal/unexpected error
    Internal = 9999,
}

/// Comprehensive error type for Paymail operations.
#[derive(Debug, Clone, PartialEq)]
pub enum PaymailError {
    /// Transport/network layer error.
    Transport(String),

    /// Connection failed.
    ConnectionFailed {
        /// Target endpoint or service
        target: String,
        /// Underlying error message
        reason: String,
    },

    /// Connection timeout.
    ConnectionTimeout {
        /// Operation that timed out
        operation: String,
        /// Timeout duration in milliseconds
        timeout_ms: u64,
    },

    /// DNS resolution failed.
    Dns(String),

    /// Resource not found (paymail address, SRV record, etc.).
    NotFound {
        /// Type of resource (e.g., "paymail address", "srv record")
        resource_type: String,
        /// Resource identifier
        identifier: String,
    },

    /// Provider returned a non-success status with a decodable error body.
    BadResponse {
        /// HTTP status code
        status: u16,
        /// Message taken from the error body
        message: String,
    },

    /// Invalid input provided by the caller.
    InvalidData {
        /// Field or parameter name
        field: String,
        /// Reason for invalidity
        reason: String,
    },

    /// Validation failed.
    ValidationFailed(String),

    /// Serialization/deserialization error.
    Serialization(String),

    /// Response decoded but is missing required data.
    MalformedResponse(String),

    /// Output script is not a standard pay-to-pubkey-hash script.
    InvalidScript(String),

    /// Signing or signature verification failed.
    Signature(String),

    /// Internal/unexpected error.
    Internal(String),
}

impl PaymailError {
    /// Get the error code.
    pub fn code(&self) -> PaymailErrorCode {
        match self {
            Self::Transport(_) => PaymailErrorCode::Transport,
            Self::ConnectionFailed { .. } => PaymailErrorCode::ConnectionFailed,
            Self::ConnectionTimeout { .. } => PaymailErrorCode::ConnectionTimeout,
            Self::Dns(_) => PaymailErrorCode::Dns,
            Self::NotFound { .. } => PaymailErrorCode::NotFound,
            Self::BadResponse { .. } => PaymailErrorCode::BadResponse,
            Self::InvalidData { .. } => PaymailErrorCode::InvalidData,
            Self::ValidationFailed(_) => PaymailErrorCode::ValidationFailed,
            Self::Serialization(_) => PaymailErrorCode::Serialization,
            Self::MalformedResponse(_) => PaymailErrorCode::MalformedResponse,
            Self::InvalidScript(_) => PaymailErrorCode::InvalidScript,
            Self::Signature(_) => PaymailErrorCode::Signature,
            Self::Internal(_) => PaymailErrorCode::Internal,
        }
    }

    /// Get the error message as an owned String.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Returns true if this error is potentially recoverable by retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_)
                | Self::ConnectionFailed { .. }
                | Self::ConnectionTimeout { .. }
                | Self::Dns(_)
        )
    }

    /// Returns true for the 404 class, where the peer has no paymail at the alias.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Create a transport error from any error type.
    pub fn transport<E: std::error::Error>(err: E) -> Self {
        Self::Transport(err.to_string())
    }

    /// Create a not found error.
    pub fn not_found(resource_type: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            identifier: identifier.into(),
        }
    }

    /// Create an invalid data error.
    pub fn invalid_data(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidData {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a malformed response error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedResponse(reason.into())
    }
}

impl fmt::Display for PaymailError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(msg) => write!(f, "transport error: {}", msg),
            Self::ConnectionFailed { target, reason } => {
                write!(f, "connection to {} failed: {}", target, reason)
            }
            Self::ConnectionTimeout {
                operation,
                timeout_ms,
            } => {
                write!(f, "{} timed out after {}ms", operation, timeout_ms)
            }
            Self::Dns(msg) => write!(f, "dns error: {}", msg),
            Self::NotFound {
                resource_type,
                identifier,
            } => {
                write!(f, "{} not found: {}", resource_type, identifier)
            }
            Self::BadResponse { status, message } => write!(
                f,
                "bad response from paymail provider: code {}, message: {}",
                status, message
            ),
            Self::InvalidData { field, reason } => {
                write!(f, "invalid {}: {}", field, reason)
            }
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::Serialization(msg) => write!(f, "serialization error: {}", msg),
            Self::MalformedResponse(msg) => write!(f, "malformed response: {}", msg),
            Self::InvalidScript(msg) => write!(f, "invalid output script: {}", msg),
            Self::Signature(msg) => write!(f, "signature error: {}", msg),
            Self::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for PaymailError {}

impl From<serde_json::Error> for PaymailError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<hex::FromHexError> for PaymailError {
    fn from(err: hex::FromHexError) -> Self {
        Self::InvalidData {
            field: "hex".to_string(),
            reason: err.to_string(),
        }
    }
}

/// An error that travels together with whatever response the call produced.
///
/// Protocol and malformed-response failures still hand back the decoded
/// response so callers can inspect the status code and body. Precondition
/// and transport failures carry no response.
#[derive(Debug, Clone)]
pub struct ResponseError<T> {
    /// The failure.
    pub error: PaymailError,
    /// The response assembled before the failure was detected.
    pub response: Option<T>,
}

impl<T> ResponseError<T> {
    /// Pair an error with a response.
    pub fn with_response(error: PaymailError, response: T) -> Self {
        Self {
            error,
            response: Some(response),
        }
    }

    /// Discard the response and keep the error.
    pub fn into_error(self) -> PaymailError {
        self.error
    }

    /// Borrow the response, if any.
    pub fn response(&self) -> Option<&T> {
        self.response.as_ref()
    }
}

impl<T> From<PaymailError> for ResponseError<T> {
    fn from(error: PaymailError) -> Self {
        Self {
            error,
            response: None,
        }
    }
}

impl<T> fmt::Display for ResponseError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.error.fmt(f)
    }
}

impl<T: fmt::Debug> std::error::Error for ResponseError<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Result alias for endpoint operations that may return a response with an error.
pub type ResponseResult<T> = std::result::Result<T, ResponseError<T>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = PaymailError::Dns("timeout".into());
        assert_eq!(err.code(), PaymailErrorCode::Dns);
        assert!(err.is_retryable());

        let err = PaymailError::BadResponse {
            status: 400,
            message: "nope".into(),
        };
        assert_eq!(err.code(), PaymailErrorCode::BadResponse);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = PaymailError::BadResponse {
            status: 400,
            message: "invalid alias".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "bad response from paymail provider: code 400, message: invalid alias"
        );

        let err = PaymailError::not_found("paymail address", "mrz@test.com");
        assert!(err.to_string().contains("paymail address not found"));
    }

    #[test]
    fn test_helper_constructors() {
        let err = PaymailError::invalid_data("alias", "missing alias");
        assert_eq!(err.code(), PaymailErrorCode::InvalidData);

        let err = PaymailError::malformed("missing a returned output");
        assert_eq!(err.code(), PaymailErrorCode::MalformedResponse);
        assert!(err.to_string().contains("missing a returned output"));
    }

    #[test]
    fn test_response_error_keeps_response() {
        let err: ResponseError<u16> =
            ResponseError::with_response(PaymailError::malformed("missing bsvalias"), 200);
        assert_eq!(err.response(), Some(&200));
        assert!(err.to_string().contains("missing bsvalias"));

        let err: ResponseError<u16> = PaymailError::invalid_data("domain", "missing domain").into();
        assert!(err.response().is_none());
        assert_eq!(err.into_error().code(), PaymailErrorCode::InvalidData);
    }
}
