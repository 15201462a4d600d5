// SPDX-License-Identifier: MIT

//! The error kinds shared by every service crate.
//!
//! Every library crate in the workspace returns `hearth_core::Result<T>`.
//! The HTTP surface (`hearth-server`) owns the fixed kind -> status mapping;
//! this crate only owns the kinds themselves and their wire `code` strings.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Every failure kind the core components can surface, per the uniform
/// error envelope `{error, code, details?}`.
#[derive(Debug, Error)]
pub enum Error {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not a directory: {0}")]
    NotDirectory(String),

    #[error("not a file: {0}")]
    NotFile(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("unknown mount: {0}")]
    MountNotFound(String),

    #[error("path escapes mount boundary: {0}")]
    PathTraversal(String),

    #[error("mount is read-only: {0}")]
    ReadOnly(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("job not found: {0}")]
    JobNotFound(String),

    #[error("job cannot be cancelled: {0}")]
    NotCancellable(String),

    #[error("invalid job type: {0}")]
    InvalidJobType(String),

    #[error("invalid job parameters: {0}")]
    InvalidJobParams(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("token expired")]
    TokenExpired,

    #[error("token revoked")]
    TokenRevoked,

    #[error("search query must not be empty")]
    EmptyQuery,

    #[error("checksum mismatch")]
    ChecksumMismatch,

    #[error("too many requests")]
    TooManyRequests,

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Wire `code` string for the uniform error envelope (spec.md §7/§10).
    pub fn code(&self) -> &'static str {
        match self {
            Error::NotFound(_) => "not_found",
            Error::Conflict(_) => "conflict",
            Error::NotDirectory(_) => "not_directory",
            Error::NotFile(_) => "not_file",
            Error::PermissionDenied(_) => "permission_denied",
            Error::MountNotFound(_) => "mount_not_found",
            Error::PathTraversal(_) => "path_traversal",
            Error::ReadOnly(_) => "read_only",
            Error::Validation(_) => "validation",
            Error::JobNotFound(_) => "job_not_found",
            Error::NotCancellable(_) => "not_cancellable",
            Error::InvalidJobType(_) => "invalid_job_type",
            Error::InvalidJobParams(_) => "invalid_job_params",
            Error::InvalidCredentials => "invalid_credentials",
            Error::InvalidToken(_) => "invalid_token",
            Error::TokenExpired => "token_expired",
            Error::TokenRevoked => "token_revoked",
            Error::EmptyQuery => "empty_query",
            Error::ChecksumMismatch => "checksum_mismatch",
            Error::TooManyRequests => "too_many_requests",
            Error::Internal(_) => "internal",
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Error::Internal(msg.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Error::NotFound(err.to_string()),
            std::io::ErrorKind::PermissionDenied => Error::PermissionDenied(err.to_string()),
            std::io::ErrorKind::AlreadyExists => Error::Conflict(err.to_string()),
            _ => Error::Internal(err.to_string()),
        }
    }
}
