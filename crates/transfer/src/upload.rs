// SPDX-License-Identifier: MIT

//! Resumable chunked upload sessions (spec.md §4.5.2).
//!
//! The engine never computes a byte offset from `chunk_size` — it tracks
//! only the *set* of received chunk indices and each chunk's on-disk
//! scratch file, and assembly walks `0..total_chunks` copying each scratch
//! file's actual length. See `DESIGN.md` for why.

use hearth_core::{Error, Result, UploadId};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Per-session state, guarded by a `parking_lot::Mutex` in the registry so
/// overlapping chunk requests for the same session serialize cheaply.
pub struct UploadSession {
    pub upload_id: UploadId,
    pub target_virtual_path: String,
    pub total_chunks: u32,
    pub chunk_size: u64,
    pub total_size: u64,
    pub scratch_dir: PathBuf,
    pub received: BTreeSet<u32>,
    pub checksum: Option<String>,
    pub created_at_ms: u64,
    pub last_activity_ms: u64,
}

impl UploadSession {
    pub fn new(
        upload_id: UploadId,
        target_virtual_path: String,
        total_chunks: u32,
        chunk_size: u64,
        total_size: u64,
        scratch_dir: PathBuf,
        now_ms: u64,
    ) -> Self {
        Self {
            upload_id,
            target_virtual_path,
            total_chunks,
            chunk_size,
            total_size,
            scratch_dir,
            received: BTreeSet::new(),
            checksum: None,
            created_at_ms: now_ms,
            last_activity_ms: now_ms,
        }
    }

    pub fn scratch_chunk_path(&self, index: u32) -> PathBuf {
        self.scratch_dir.join(format!("chunk_{index}"))
    }

    pub fn is_complete(&self) -> bool {
        self.received.len() as u32 == self.total_chunks
    }

    pub fn missing_indices(&self) -> Vec<u32> {
        (0..self.total_chunks).filter(|i| !self.received.contains(i)).collect()
    }
}

/// Headers describing a single chunk request (spec.md §6 `X-*` headers).
#[derive(Debug, Clone)]
pub struct ChunkRequest {
    pub upload_id: UploadId,
    pub chunk_index: u32,
    pub total_chunks: u32,
    pub chunk_size: u64,
    pub total_size: u64,
    /// Present only on the final chunk; hex sha-256, optionally `sha256:`-prefixed.
    pub checksum: Option<String>,
}

impl ChunkRequest {
    pub fn validate(&self) -> Result<()> {
        if self.total_chunks == 0 {
            return Err(Error::Validation("total_chunks must be >= 1".into()));
        }
        if self.chunk_index >= self.total_chunks {
            return Err(Error::Validation(format!(
                "chunk_index {} out of range for total_chunks {}",
                self.chunk_index, self.total_chunks
            )));
        }
        Ok(())
    }

    /// Strip an optional `sha256:` prefix from a client-supplied checksum.
    pub fn checksum_hex(&self) -> Option<&str> {
        self.checksum.as_deref().map(|c| c.strip_prefix("sha256:").unwrap_or(c))
    }
}

/// Progress snapshot returned by the status endpoint (spec.md §4.5.2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadStatus {
    pub upload_id: UploadId,
    pub target_virtual_path: String,
    pub total_chunks: u32,
    pub received_count: u32,
    pub missing: Vec<u32>,
    pub complete: bool,
    pub created_at_ms: u64,
    pub last_activity_ms: u64,
}

impl From<&UploadSession> for UploadStatus {
    fn from(session: &UploadSession) -> Self {
        Self {
            upload_id: session.upload_id.clone(),
            target_virtual_path: session.target_virtual_path.clone(),
            total_chunks: session.total_chunks,
            received_count: session.received.len() as u32,
            missing: session.missing_indices(),
            complete: session.is_complete(),
            created_at_ms: session.created_at_ms,
            last_activity_ms: session.last_activity_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> UploadSession {
        UploadSession::new(
            UploadId::from("u-1"),
            "media/a.bin".into(),
            3,
            1024,
            3000,
            PathBuf::from("/tmp/scratch/u-1"),
            0,
        )
    }

    #[test]
    fn missing_indices_cover_the_whole_range_when_empty() {
        let session = session();
        assert_eq!(session.missing_indices(), vec![0, 1, 2]);
        assert!(!session.is_complete());
    }

    #[test]
    fn is_complete_when_every_index_received() {
        let mut session = session();
        session.received.extend([0, 1, 2]);
        assert!(session.is_complete());
        assert!(session.missing_indices().is_empty());
    }

    #[test]
    fn checksum_hex_strips_prefix() {
        let mut req = ChunkRequest {
            upload_id: UploadId::from("u-1"),
            chunk_index: 2,
            total_chunks: 3,
            chunk_size: 1024,
            total_size: 3000,
            checksum: Some("sha256:abcd".into()),
        };
        assert_eq!(req.checksum_hex(), Some("abcd"));
        req.checksum = Some("abcd".into());
        assert_eq!(req.checksum_hex(), Some("abcd"));
    }

    #[test]
    fn validate_rejects_out_of_range_index() {
        let req = ChunkRequest {
            upload_id: UploadId::from("u-1"),
            chunk_index: 3,
            total_chunks: 3,
            chunk_size: 1024,
            total_size: 3000,
            checksum: None,
        };
        assert_eq!(req.validate().unwrap_err().code(), "validation");
    }
}
