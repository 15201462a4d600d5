// SPDX-License-Identifier: MIT

//! `GET /search` (spec.md §4.4, §6).

use super::auth::AuthUser;
use super::error::ApiError;
use crate::state::SharedState;
use axum::extract::{Query, State};
use axum::Json;
use hearth_core::{Clock, FileEntry};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub path: String,
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub path: String,
    pub query: String,
    pub results: Vec<FileEntry>,
    pub count: usize,
}

pub async fn search<C: Clock>(
    State(state): State<SharedState<C>>,
    _user: AuthUser,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, ApiError> {
    let cancel = CancellationToken::new();
    let results = state.search.search(&query.path, &query.q, &cancel).await?;
    let count = results.len();
    Ok(Json(SearchResponse { path: query.path, query: query.q, results, count }))
}
