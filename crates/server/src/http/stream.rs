// SPDX-License-Identifier: MIT

//! `/stream/*` routes (spec.md §4.5, §6): range-aware download/preview and
//! chunked resumable upload.

use super::auth::AuthUser;
use super::error::ApiError;
use crate::state::SharedState;
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::Response;
use axum::Json;
use futures_util::TryStreamExt;
use hearth_core::{Clock, Error, UploadId};
use hearth_transfer::{open_download, ChunkRequest, Disposition};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncReadExt;
use tokio_util::io::ReaderStream;

pub async fn download<C: Clock>(
    State(state): State<SharedState<C>>,
    _user: AuthUser,
    Path(path): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    serve(&state, &path, &headers, Disposition::Attachment).await
}

pub async fn preview<C: Clock>(
    State(state): State<SharedState<C>>,
    _user: AuthUser,
    Path(path): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    serve(&state, &path, &headers, Disposition::Inline).await
}

async fn serve<C: Clock>(
    state: &SharedState<C>,
    path: &str,
    headers: &HeaderMap,
    disposition: Disposition,
) -> Result<Response, ApiError> {
    let range_header = headers.get(header::RANGE).and_then(|v| v.to_str().ok());
    let result = open_download(&state.files, path, range_header, disposition).await?;

    let status = if result.range.is_some() { StatusCode::PARTIAL_CONTENT } else { StatusCode::OK };
    let content_length = result.content_length;
    let boxed_reader = result.reader.take(content_length);
    let body = Body::from_stream(ReaderStream::new(boxed_reader));

    let mut response = Response::builder()
        .status(status)
        .header(header::CONTENT_LENGTH, content_length)
        .header(header::ACCEPT_RANGES, "bytes")
        .header(
            header::CONTENT_TYPE,
            result.entry.mime_type.as_deref().unwrap_or("application/octet-stream"),
        )
        .header(
            header::CONTENT_DISPOSITION,
            match disposition {
                Disposition::Attachment => format!("attachment; filename=\"{}\"", result.entry.name),
                Disposition::Inline => format!("inline; filename=\"{}\"", result.entry.name),
            },
        );
    if let Some(range) = result.range {
        response = response.header(header::CONTENT_RANGE, range.header_value());
    }
    response.body(body).map_err(|err| ApiError(Error::internal(err.to_string())))
}

/// `X-*` upload headers (spec.md §6).
pub struct UploadHeaders {
    pub upload_id: UploadId,
    pub chunk_index: u32,
    pub total_chunks: u32,
    pub chunk_size: u64,
    pub total_size: u64,
    pub checksum: Option<String>,
}

fn parse_upload_headers(headers: &HeaderMap) -> Result<UploadHeaders, ApiError> {
    fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, ApiError> {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError(Error::Validation(format!("missing or invalid header {name}"))))
    }
    fn header_num<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Result<T, ApiError> {
        header_str(headers, name)?
            .parse()
            .map_err(|_| ApiError(Error::Validation(format!("malformed header {name}"))))
    }

    Ok(UploadHeaders {
        upload_id: UploadId::from(header_str(headers, "x-upload-id")?),
        chunk_index: header_num(headers, "x-chunk-index")?,
        total_chunks: header_num(headers, "x-total-chunks")?,
        chunk_size: header_num(headers, "x-chunk-size")?,
        total_size: header_num(headers, "x-total-size")?,
        checksum: headers.get("x-checksum").and_then(|v| v.to_str().ok()).map(str::to_string),
    })
}

#[derive(Debug, Serialize)]
pub struct UploadStatusBody {
    pub upload_id: String,
    /// The virtual path the assembled file lands at (spec.md §4.5.2: a
    /// terminal success names the virtual path).
    pub path: String,
    pub received_count: u32,
    pub total_chunks: u32,
    pub missing_indices: Vec<u32>,
    pub complete: bool,
}

impl From<hearth_transfer::UploadStatus> for UploadStatusBody {
    fn from(status: hearth_transfer::UploadStatus) -> Self {
        Self {
            upload_id: status.upload_id.to_string(),
            path: status.target_virtual_path,
            received_count: status.received_count,
            total_chunks: status.total_chunks,
            missing_indices: status.missing,
            complete: status.complete,
        }
    }
}

pub async fn upload_chunk<C: Clock>(
    State(state): State<SharedState<C>>,
    _user: AuthUser,
    Path(path): Path<String>,
    headers: HeaderMap,
    body: Body,
) -> Result<(StatusCode, Json<UploadStatusBody>), ApiError> {
    let parsed = parse_upload_headers(&headers)?;
    let req = ChunkRequest {
        upload_id: parsed.upload_id,
        chunk_index: parsed.chunk_index,
        total_chunks: parsed.total_chunks,
        chunk_size: parsed.chunk_size,
        total_size: parsed.total_size,
        checksum: parsed.checksum,
    };

    let body_reader = tokio_util::io::StreamReader::new(
        body.into_data_stream().map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err)),
    );
    let status = state.transfer.accept_chunk(&path, req, body_reader).await?;
    let code = if status.complete { StatusCode::CREATED } else { StatusCode::ACCEPTED };
    Ok((code, Json(status.into())))
}

#[derive(Debug, Deserialize)]
pub struct UploadStatusQuery {
    #[serde(rename = "uploadId")]
    pub upload_id: String,
}

pub async fn upload_status<C: Clock>(
    State(state): State<SharedState<C>>,
    _user: AuthUser,
    Query(query): Query<UploadStatusQuery>,
) -> Result<Json<UploadStatusBody>, ApiError> {
    let status = state.transfer.status(&UploadId::from(query.upload_id)).await?;
    Ok(Json(status.into()))
}
