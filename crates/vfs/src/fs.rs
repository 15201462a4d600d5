// SPDX-License-Identifier: MIT

//! The filesystem capability interface (spec.md §4.2 C2).
//!
//! A single trait, two implementations chosen at wiring time: [`OsFs`](crate::OsFs)
//! for the real host filesystem, [`MemFs`](crate::MemFs) for tests. Every
//! operation accepts a [`CancellationToken`] — long traversals check it
//! between entries (spec.md §5).

use async_trait::async_trait;
use hearth_core::Result;
use std::path::Path;
use tokio::io::{AsyncRead, AsyncSeek, AsyncWrite};
use tokio_util::sync::CancellationToken;

/// A readable, seekable file handle. The transfer engine's range-aware
/// download depends on the seek capability where the backend supports it
/// (spec.md §4.5.1).
pub trait ReadSeek: AsyncRead + AsyncSeek + Unpin + Send {}
impl<T: AsyncRead + AsyncSeek + Unpin + Send> ReadSeek for T {}

/// A writable file handle (chunk scratch files, upload assembly targets).
pub trait Writable: AsyncWrite + Unpin + Send {}
impl<T: AsyncWrite + Unpin + Send> Writable for T {}

/// Metadata about a single filesystem entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub size: u64,
    pub is_dir: bool,
    pub mod_time_ms: u64,
    /// Unix-style `rwxrwxrwx` rendering, or a two-state readonly/writable
    /// fallback on non-Unix backends.
    pub permissions: String,
}

/// A single directory entry returned by [`FileSystem::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub metadata: Metadata,
}

/// Capability set: open-read, open-write-create, stat, list, mkdir-all,
/// rename, remove, remove-tree, exists (spec.md §4.2).
#[async_trait]
pub trait FileSystem: Send + Sync {
    async fn stat(&self, path: &Path) -> Result<Metadata>;

    /// List the immediate children of a directory. Does not recurse.
    async fn list(&self, path: &Path) -> Result<Vec<DirEntry>>;

    async fn open_read(&self, path: &Path) -> Result<Box<dyn ReadSeek>>;

    /// Open for write, creating the file (and truncating if it exists).
    /// Callers are responsible for creating parent directories first via
    /// [`FileSystem::mkdir_all`].
    async fn open_write_create(&self, path: &Path) -> Result<Box<dyn Writable>>;

    async fn mkdir_all(&self, path: &Path) -> Result<()>;

    async fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    async fn remove_file(&self, path: &Path) -> Result<()>;

    /// Remove a directory tree. Honors `cancel` between every entry
    /// (spec.md §5); a cancellation mid-removal leaves previously-removed
    /// entries gone and stops further removals (spec.md invariant 11).
    async fn remove_tree(&self, path: &Path, cancel: &CancellationToken) -> Result<()>;

    async fn exists(&self, path: &Path) -> bool;
}
