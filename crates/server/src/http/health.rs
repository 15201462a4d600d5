// SPDX-License-Identifier: MIT

//! `GET /health` — unauthenticated liveness probe (spec.md §6).

use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthBody {
    pub status: &'static str,
}

pub async fn health() -> Json<HealthBody> {
    Json(HealthBody { status: "ok" })
}
