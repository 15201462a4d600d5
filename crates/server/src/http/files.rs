// SPDX-License-Identifier: MIT

//! `/files` routes (spec.md §4.3, §6): mount listing, directory listing/file
//! metadata, directory creation, rename, delete.

use super::auth::AuthUser;
use super::error::ApiError;
use crate::state::SharedState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use hearth_core::{Clock, Error, ListOptions, SortBy, SortDir};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct MountSummary {
    pub name: String,
    pub read_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk_usage: Option<DiskUsageBody>,
}

#[derive(Debug, Serialize)]
pub struct DiskUsageBody {
    pub total_bytes: u64,
    pub free_bytes: u64,
}

#[derive(Debug, Serialize)]
pub struct RootsResponse {
    pub roots: Vec<MountSummary>,
}

pub async fn list_roots<C: Clock>(State(state): State<SharedState<C>>, _user: AuthUser) -> Json<RootsResponse> {
    let roots = state
        .registry
        .list_mounts()
        .iter()
        .map(|mount| MountSummary {
            name: mount.name().to_string(),
            read_only: mount.read_only(),
            display_name: state.display_names.get(mount.name()).cloned(),
            disk_usage: state.stat_probe.usage(mount.path()).ok().map(|u| DiskUsageBody {
                total_bytes: u.total_bytes,
                free_bytes: u.free_bytes,
            }),
        })
        .collect();
    Json(RootsResponse { roots })
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<String>,
    pub filter: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum FileOrListing {
    Listing(hearth_core::ListResult),
    Entry(hearth_core::FileEntry),
}

pub async fn get_path<C: Clock>(
    State(state): State<SharedState<C>>,
    _user: AuthUser,
    Path(path): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<FileOrListing>, ApiError> {
    let info = state.files.get_info(&path).await?;
    if !info.is_dir {
        return Ok(Json(FileOrListing::Entry(info)));
    }

    let opts = ListOptions::new(
        query.page,
        query.page_size,
        query.sort_by.as_deref().and_then(|s| s.parse::<SortBy>().ok()),
        query.sort_dir.as_deref().and_then(|s| s.parse::<SortDir>().ok()),
        query.filter,
    );
    let listing = state.files.list(&path, opts).await?;
    Ok(Json(FileOrListing::Listing(listing)))
}

#[derive(Debug, Deserialize)]
pub struct CreateDirRequest {
    pub name: String,
}

pub async fn create_dir<C: Clock>(
    State(state): State<SharedState<C>>,
    _user: AuthUser,
    Path(path): Path<String>,
    Json(body): Json<CreateDirRequest>,
) -> Result<StatusCode, ApiError> {
    if body.name.trim().is_empty() || body.name.contains('/') {
        return Err(ApiError(Error::Validation("name must be a single non-empty path segment".into())));
    }
    let child = format!("{}/{}", path.trim_matches('/'), body.name);
    state.files.create_dir(&child).await?;
    Ok(StatusCode::CREATED)
}

#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    pub new_path: String,
}

pub async fn rename<C: Clock>(
    State(state): State<SharedState<C>>,
    _user: AuthUser,
    Path(path): Path<String>,
    Json(body): Json<RenameRequest>,
) -> Result<StatusCode, ApiError> {
    state.files.rename(&path, &body.new_path).await?;
    Ok(StatusCode::OK)
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub confirm: bool,
}

pub async fn delete<C: Clock>(
    State(state): State<SharedState<C>>,
    _user: AuthUser,
    Path(path): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> Result<StatusCode, ApiError> {
    let info = state.files.get_info(&path).await?;
    if info.is_dir && !query.confirm {
        return Err(ApiError(Error::Validation("deleting a directory requires confirm=true".into())));
    }
    state.files.delete(&path, info.is_dir).await?;
    Ok(StatusCode::OK)
}
