//! Shared error type across rubyguard crates.
//!
//! A policy denial is not an error: it is reported through
//! [`crate::policy::Evaluation`]. Errors here cover input that never reached
//! the policy (malformed trees, oversized requests) and host misconfiguration.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Invalid input / malformed request.
    BadRequest,
    /// Tree violates the node wire contract.
    MalformedTree,
    /// Tree nests deeper than the configured bound.
    TreeTooDeep,
    /// Payload too large.
    PayloadTooLarge,
    /// No policy profile under the requested id.
    UnknownProfile,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Internal error.
    Internal,
}

impl ErrorCode {
    /// String representation used in JSON responses and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::MalformedTree => "MALFORMED_TREE",
            ErrorCode::TreeTooDeep => "TREE_TOO_DEEP",
            ErrorCode::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            ErrorCode::UnknownProfile => "UNKNOWN_PROFILE",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, RubyGuardError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum RubyGuardError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("malformed tree: {0}")]
    MalformedTree(String),
    #[error("tree deeper than {max_depth} levels")]
    TreeTooDeep { max_depth: usize },
    #[error("payload too large")]
    PayloadTooLarge,
    #[error("unknown profile: {0}")]
    UnknownProfile(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl RubyGuardError {
    /// Map internal error to a stable client-facing code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            RubyGuardError::BadRequest(_) => ErrorCode::BadRequest,
            RubyGuardError::MalformedTree(_) => ErrorCode::MalformedTree,
            RubyGuardError::TreeTooDeep { .. } => ErrorCode::TreeTooDeep,
            RubyGuardError::PayloadTooLarge => ErrorCode::PayloadTooLarge,
            RubyGuardError::UnknownProfile(_) => ErrorCode::UnknownProfile,
            RubyGuardError::UnsupportedVersion => ErrorCode::UnsupportedVersion,
            RubyGuardError::Internal(_) => ErrorCode::Internal,
        }
    }
}
