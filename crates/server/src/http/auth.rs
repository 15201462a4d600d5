// SPDX-License-Identifier: MIT

//! Authentication routes and the bearer-credential extractor (spec.md §4.8,
//! §6 "Authentication and identity").

use super::error::ApiError;
use crate::state::SharedState;
use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use hearth_core::{Clock, Error};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    pub refresh: String,
}

#[derive(Debug, Serialize)]
pub struct CredentialPairResponse {
    pub access: String,
    pub refresh: String,
    pub expires_at: u64,
}

impl From<hearth_auth::CredentialPair> for CredentialPairResponse {
    fn from(pair: hearth_auth::CredentialPair) -> Self {
        Self { access: pair.access, refresh: pair.refresh, expires_at: pair.access_expires_at_ms }
    }
}

pub async fn login<C: Clock>(
    State(state): State<SharedState<C>>,
    headers: HeaderMap,
    peer: axum::extract::ConnectInfo<std::net::SocketAddr>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<CredentialPairResponse>, ApiError> {
    let ip = client_ip_from(&headers, peer.0.ip());
    let now = state.clock.epoch_ms();
    if !state.login_limiter.check(ip, now) {
        return Err(ApiError(Error::TooManyRequests));
    }
    let pair = state.auth.login(&body.username, &body.password)?;
    Ok(Json(pair.into()))
}

pub async fn refresh<C: Clock>(
    State(state): State<SharedState<C>>,
    Json(body): Json<RefreshRequest>,
) -> Result<Json<CredentialPairResponse>, ApiError> {
    let pair = state.auth.refresh(&body.refresh)?;
    Ok(Json(pair.into()))
}

pub async fn logout<C: Clock>(
    State(state): State<SharedState<C>>,
    Json(body): Json<LogoutRequest>,
) -> Result<StatusCode, ApiError> {
    state.auth.logout(&body.refresh)?;
    Ok(StatusCode::NO_CONTENT)
}

fn client_ip_from(headers: &HeaderMap, peer: IpAddr) -> IpAddr {
    let forwarded_for = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok());
    let real_ip = headers.get("x-real-ip").and_then(|v| v.to_str().ok());
    crate::admission::client_ip(forwarded_for, real_ip, peer)
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?.strip_prefix("Bearer ")
}

/// The authenticated subject, extracted from the `Authorization: Bearer`
/// header and validated against [`hearth_auth::AuthService`]. Every
/// authenticated route takes this as a handler argument.
pub struct AuthUser {
    pub subject: String,
}

impl<C: Clock> FromRequestParts<SharedState<C>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &SharedState<C>) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or_else(|| {
            ApiError(Error::InvalidToken("missing bearer token".into()))
        })?;
        let claims = state.auth.validate(token)?;
        Ok(AuthUser { subject: claims.subject })
    }
}
