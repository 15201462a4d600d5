// SPDX-License-Identifier: MIT

//! The upload half of the transfer engine: session creation, per-chunk
//! idempotent acceptance, and serialized assembly (spec.md §4.5.2, §5).

use crate::upload::{ChunkRequest, UploadSession, UploadStatus};
use hearth_core::{Clock, Error, Result, UploadId};
use hearth_vfs::{FileSystem, MountRegistry};
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::sync::Mutex as AsyncMutex;

/// The transfer engine: owns the upload session registry and the mount
/// registry/filesystem needed to resolve and assemble targets.
pub struct TransferEngine<C: Clock> {
    registry: Arc<MountRegistry>,
    fs: Arc<dyn FileSystem>,
    scratch_root: PathBuf,
    clock: C,
    sessions: RwLock<HashMap<UploadId, Arc<AsyncMutex<UploadSession>>>>,
}

impl<C: Clock> TransferEngine<C> {
    pub fn new(registry: Arc<MountRegistry>, fs: Arc<dyn FileSystem>, scratch_root: PathBuf, clock: C) -> Self {
        Self { registry, fs, scratch_root, clock, sessions: RwLock::new(HashMap::new()) }
    }

    fn session_handle(&self, req: &ChunkRequest, target_virtual_path: &str) -> Arc<AsyncMutex<UploadSession>> {
        if let Some(existing) = self.sessions.read().get(&req.upload_id) {
            return existing.clone();
        }
        let mut sessions = self.sessions.write();
        sessions
            .entry(req.upload_id.clone())
            .or_insert_with(|| {
                let scratch_dir = self.scratch_root.join(sanitize_upload_id(&req.upload_id));
                Arc::new(AsyncMutex::new(UploadSession::new(
                    req.upload_id.clone(),
                    target_virtual_path.to_string(),
                    req.total_chunks,
                    req.chunk_size,
                    req.total_size,
                    scratch_dir,
                    self.clock.epoch_ms(),
                )))
            })
            .clone()
    }

    /// Accept one chunk. Idempotent on retry of an already-received index.
    /// Assembles automatically once every index has arrived.
    pub async fn accept_chunk(
        &self,
        target_virtual_path: &str,
        req: ChunkRequest,
        mut body: impl AsyncRead + Unpin,
    ) -> Result<UploadStatus> {
        req.validate()?;
        self.registry.resolve(target_virtual_path, true)?;

        let handle = self.session_handle(&req, target_virtual_path);
        {
            let mut session = handle.lock().await;
            if !session.received.contains(&req.chunk_index) {
                self.fs.mkdir_all(&session.scratch_dir).await?;
                let chunk_path = session.scratch_chunk_path(req.chunk_index);
                let mut writer = self.fs.open_write_create(&chunk_path).await?;
                match tokio::io::copy(&mut body, &mut writer).await {
                    Ok(_) => {
                        let _ = writer.shutdown().await;
                        session.received.insert(req.chunk_index);
                        session.last_activity_ms = self.clock.epoch_ms();
                        if let Some(checksum) = req.checksum_hex() {
                            session.checksum = Some(checksum.to_string());
                        }
                    }
                    Err(err) => {
                        // Leave the chunk index unreceived so a retry succeeds.
                        let _ = self.fs.remove_file(&chunk_path).await;
                        return Err(Error::internal(format!("chunk write failed: {err}")));
                    }
                }
            }
        }

        // Hold the per-session lock across assembly, the thread that
        // delivered the final chunk owns it exclusively (spec.md §5).
        let mut session = handle.lock().await;
        if session.is_complete() {
            self.assemble(&mut session).await?;
            self.sessions.write().remove(&req.upload_id);
        }
        Ok(UploadStatus::from(&*session))
    }

    async fn assemble(&self, session: &mut UploadSession) -> Result<()> {
        let resolved = self.registry.resolve(&session.target_virtual_path, true)?;
        if let Some(parent) = resolved.host_path.parent() {
            self.fs.mkdir_all(parent).await?;
        }

        let mut hasher = Sha256::new();
        let mut writer = self.fs.open_write_create(&resolved.host_path).await?;
        for index in 0..session.total_chunks {
            let chunk_path = session.scratch_chunk_path(index);
            let mut reader = self.fs.open_read(&chunk_path).await?;
            let mut buf = Vec::new();
            reader.read_to_end(&mut buf).await?;
            hasher.update(&buf);
            writer.write_all(&buf).await?;
        }
        let _ = writer.shutdown().await;

        if let Some(expected) = &session.checksum {
            let actual = hex_digest(hasher.finalize().as_slice());
            if !actual.eq_ignore_ascii_case(expected) {
                let _ = self.fs.remove_file(&resolved.host_path).await;
                return Err(Error::ChecksumMismatch);
            }
        }

        let cancel = tokio_util::sync::CancellationToken::new();
        let _ = self.fs.remove_tree(&session.scratch_dir, &cancel).await;
        Ok(())
    }

    pub async fn status(&self, upload_id: &UploadId) -> Result<UploadStatus> {
        let handle = self
            .sessions
            .read()
            .get(upload_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(upload_id.to_string()))?;
        let session = handle.lock().await;
        Ok(UploadStatus::from(&*session))
    }

    /// Evict sessions idle for longer than `timeout_ms`. Called by the
    /// sweeper on a fixed cadence.
    pub async fn sweep_idle(&self, timeout_ms: u64) {
        let now = self.clock.epoch_ms();
        let expired: Vec<UploadId> = {
            let sessions = self.sessions.read();
            let mut expired = Vec::new();
            for (id, handle) in sessions.iter() {
                if let Ok(session) = handle.try_lock() {
                    if now.saturating_sub(session.last_activity_ms) > timeout_ms {
                        expired.push(id.clone());
                    }
                }
            }
            expired
        };

        for id in expired {
            let handle = self.sessions.write().remove(&id);
            if let Some(handle) = handle {
                let session = handle.lock().await;
                let cancel = tokio_util::sync::CancellationToken::new();
                let _ = self.fs.remove_tree(&session.scratch_dir, &cancel).await;
            }
        }
    }
}

fn sanitize_upload_id(id: &UploadId) -> String {
    id.as_str().chars().map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' }).collect()
}

fn hex_digest(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
