// SPDX-License-Identifier: MIT

//! Uniform error envelope and status-code mapping (spec.md §7, §6 "Status
//! codes").

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use hearth_core::Error;
use serde::Serialize;

/// Wraps [`hearth_core::Error`] so this crate can implement [`IntoResponse`]
/// for it (the orphan rule forbids doing so directly on a foreign type).
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

/// Fixed kind -> status mapping (spec.md §7 "the HTTP surface applies a
/// fixed mapping kind -> status + code string").
fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::Conflict(_) => StatusCode::CONFLICT,
        Error::NotDirectory(_) => StatusCode::BAD_REQUEST,
        Error::NotFile(_) => StatusCode::BAD_REQUEST,
        Error::PermissionDenied(_) => StatusCode::FORBIDDEN,
        Error::MountNotFound(_) => StatusCode::NOT_FOUND,
        Error::PathTraversal(_) => StatusCode::FORBIDDEN,
        Error::ReadOnly(_) => StatusCode::FORBIDDEN,
        Error::Validation(_) => StatusCode::BAD_REQUEST,
        Error::JobNotFound(_) => StatusCode::NOT_FOUND,
        Error::NotCancellable(_) => StatusCode::CONFLICT,
        Error::InvalidJobType(_) => StatusCode::BAD_REQUEST,
        Error::InvalidJobParams(_) => StatusCode::BAD_REQUEST,
        Error::InvalidCredentials => StatusCode::UNAUTHORIZED,
        Error::InvalidToken(_) => StatusCode::UNAUTHORIZED,
        Error::TokenExpired => StatusCode::UNAUTHORIZED,
        Error::TokenRevoked => StatusCode::UNAUTHORIZED,
        Error::EmptyQuery => StatusCode::BAD_REQUEST,
        Error::ChecksumMismatch => StatusCode::UNPROCESSABLE_ENTITY,
        Error::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
        Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, code = self.0.code(), "internal error");
        }
        let body = ErrorBody { error: self.0.to_string(), code: self.0.code() };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_only_maps_to_forbidden() {
        assert_eq!(status_for(&Error::ReadOnly("backups".into())), StatusCode::FORBIDDEN);
    }

    #[test]
    fn checksum_mismatch_maps_to_unprocessable_entity() {
        assert_eq!(status_for(&Error::ChecksumMismatch), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn too_many_requests_maps_to_429() {
        assert_eq!(status_for(&Error::TooManyRequests), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn path_traversal_maps_to_forbidden() {
        assert_eq!(status_for(&Error::PathTraversal("media/../..".into())), StatusCode::FORBIDDEN);
    }
}
