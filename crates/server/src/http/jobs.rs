// SPDX-License-Identifier: MIT

//! `/jobs` routes (spec.md §4.6, §6).

use super::auth::AuthUser;
use super::error::ApiError;
use crate::state::SharedState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use hearth_core::{Clock, Job, JobId};
use hearth_jobs::JobParams;
use serde::Deserialize;

pub async fn list_jobs<C: Clock>(State(state): State<SharedState<C>>, _user: AuthUser) -> Json<Vec<Job>> {
    Json(state.jobs.list())
}

pub async fn get_job<C: Clock>(
    State(state): State<SharedState<C>>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Job>, ApiError> {
    let job = state.jobs.get(JobId::from_string(id))?;
    Ok(Json(job))
}

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    #[serde(rename = "type")]
    pub job_type: hearth_core::JobType,
    pub source_path: String,
    #[serde(default)]
    pub dest_path: Option<String>,
}

pub async fn create_job<C: Clock>(
    State(state): State<SharedState<C>>,
    _user: AuthUser,
    Json(body): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<Job>), ApiError> {
    let job = state.jobs.create(JobParams {
        job_type: body.job_type,
        source_path: body.source_path,
        dest_path: body.dest_path,
    })?;
    Ok((StatusCode::ACCEPTED, Json(job)))
}

pub async fn cancel_job<C: Clock>(
    State(state): State<SharedState<C>>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.jobs.cancel(JobId::from_string(id))?;
    Ok(StatusCode::OK)
}
