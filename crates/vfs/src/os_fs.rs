// SPDX-License-Identifier: MIT

//! Real-filesystem backend for [`FileSystem`].

use crate::fs::{DirEntry, FileSystem, Metadata as FsMetadata, ReadSeek, Writable};
use async_trait::async_trait;
use hearth_core::{Error, Result};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tokio_util::sync::CancellationToken;

/// The real operating-system filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFs;

fn epoch_ms(t: std::time::SystemTime) -> u64 {
    t.duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(0)
}

#[cfg(unix)]
fn permissions_string(meta: &std::fs::Metadata) -> String {
    use std::os::unix::fs::PermissionsExt;
    let mode = meta.permissions().mode();
    let bits = [
        (0o400, 'r'), (0o200, 'w'), (0o100, 'x'),
        (0o040, 'r'), (0o020, 'w'), (0o010, 'x'),
        (0o004, 'r'), (0o002, 'w'), (0o001, 'x'),
    ];
    bits.iter().map(|(mask, ch)| if mode & mask != 0 { *ch } else { '-' }).collect()
}

#[cfg(not(unix))]
fn permissions_string(meta: &std::fs::Metadata) -> String {
    if meta.permissions().readonly() { "r--r--r--".to_string() } else { "rw-rw-rw-".to_string() }
}

fn to_fs_metadata(meta: std::fs::Metadata) -> FsMetadata {
    FsMetadata {
        size: if meta.is_dir() { 0 } else { meta.len() },
        is_dir: meta.is_dir(),
        mod_time_ms: meta.modified().map(epoch_ms).unwrap_or(0),
        permissions: permissions_string(&meta),
    }
}

#[async_trait]
impl FileSystem for OsFs {
    async fn stat(&self, path: &Path) -> Result<FsMetadata> {
        let meta = tokio::fs::metadata(path).await?;
        Ok(to_fs_metadata(meta))
    }

    async fn list(&self, path: &Path) -> Result<Vec<DirEntry>> {
        let meta = tokio::fs::metadata(path).await?;
        if !meta.is_dir() {
            return Err(Error::NotDirectory(path.display().to_string()));
        }
        let mut out = Vec::new();
        let mut reader = tokio::fs::read_dir(path).await?;
        while let Some(entry) = reader.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            let entry_meta = match entry.metadata().await {
                Ok(m) => m,
                // Skip entries that vanish or can't be stat'd (e.g. broken
                // symlinks) rather than aborting the whole listing.
                Err(_) => continue,
            };
            out.push(DirEntry { name, metadata: to_fs_metadata(entry_meta) });
        }
        Ok(out)
    }

    async fn open_read(&self, path: &Path) -> Result<Box<dyn ReadSeek>> {
        let file = tokio::fs::File::open(path).await?;
        Ok(Box::new(file))
    }

    async fn open_write_create(&self, path: &Path) -> Result<Box<dyn Writable>> {
        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .await?;
        Ok(Box::new(file))
    }

    async fn mkdir_all(&self, path: &Path) -> Result<()> {
        tokio::fs::create_dir_all(path).await?;
        Ok(())
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        tokio::fs::rename(from, to).await?;
        Ok(())
    }

    async fn remove_file(&self, path: &Path) -> Result<()> {
        tokio::fs::remove_file(path).await?;
        Ok(())
    }

    async fn remove_tree(&self, path: &Path, cancel: &CancellationToken) -> Result<()> {
        remove_tree_inner(path, cancel).await
    }

    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::metadata(path).await.is_ok()
    }
}

/// Recursively removes `path`, checking `cancel` between every entry so a
/// mid-walk cancellation leaves already-removed entries gone without
/// resurrecting or continuing further (spec.md invariant 11).
async fn remove_tree_inner(path: &Path, cancel: &CancellationToken) -> Result<()> {
    let meta = tokio::fs::metadata(path).await?;
    if !meta.is_dir() {
        tokio::fs::remove_file(path).await?;
        return Ok(());
    }

    let mut stack: Vec<PathBuf> = Vec::new();
    collect_children(path, &mut stack, cancel).await?;

    // Remove deepest-first children, then the directories bottom-up.
    let mut dirs_to_remove = vec![path.to_path_buf()];
    for child in &stack {
        if cancel.is_cancelled() {
            return Ok(());
        }
        let meta = match tokio::fs::symlink_metadata(child).await {
            Ok(m) => m,
            Err(_) => continue,
        };
        if meta.is_dir() {
            dirs_to_remove.push(child.clone());
        } else {
            tokio::fs::remove_file(child).await?;
        }
    }

    dirs_to_remove.sort_by_key(|p| std::cmp::Reverse(p.components().count()));
    for dir in dirs_to_remove {
        if cancel.is_cancelled() {
            return Ok(());
        }
        let _ = tokio::fs::remove_dir(&dir).await;
    }
    Ok(())
}

async fn collect_children(dir: &Path, out: &mut Vec<PathBuf>, cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        return Ok(());
    }
    let mut reader = match tokio::fs::read_dir(dir).await {
        Ok(r) => r,
        Err(_) => return Ok(()),
    };
    while let Some(entry) = reader.next_entry().await? {
        if cancel.is_cancelled() {
            return Ok(());
        }
        let path = entry.path();
        let meta = match entry.metadata().await {
            Ok(m) => m,
            Err(_) => continue,
        };
        if meta.is_dir() {
            Box::pin(collect_children(&path, out, cancel)).await?;
        }
        out.push(path);
    }
    Ok(())
}
