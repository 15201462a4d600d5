// SPDX-License-Identifier: MIT

//! The file service (spec.md §4.3, C3): list/get-info/create-dir/rename/
//! delete/open, each validated through the mount registry first.

use crate::mime;
use hearth_core::{Error, FileEntry, ListOptions, ListResult, Result, SortBy, SortDir};
use hearth_vfs::{FileSystem, Metadata, MountRegistry, ReadSeek};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Operations over the mounts, backed by a [`FileSystem`] and gated by a
/// [`MountRegistry`].
pub struct FileService {
    registry: Arc<MountRegistry>,
    fs: Arc<dyn FileSystem>,
}

impl FileService {
    pub fn new(registry: Arc<MountRegistry>, fs: Arc<dyn FileSystem>) -> Self {
        Self { registry, fs }
    }

    /// List a directory's children with filter/sort/pagination applied.
    pub async fn list(&self, virtual_path: &str, opts: ListOptions) -> Result<ListResult> {
        let resolved = self.registry.resolve(virtual_path, false)?;
        let meta = self.fs.stat(&resolved.host_path).await?;
        if !meta.is_dir {
            return Err(Error::NotDirectory(virtual_path.to_string()));
        }

        let base = trim_slashes(virtual_path);
        let entries = self.fs.list(&resolved.host_path).await?;
        let mut items: Vec<FileEntry> = entries
            .into_iter()
            .map(|e| to_file_entry(&child_virtual_path(&base, &e.name), &e.name, &e.metadata))
            .collect();

        if let Some(filter) = opts.filter.as_deref() {
            let needle = filter.to_lowercase();
            items.retain(|item| item.name.to_lowercase().contains(&needle));
        }

        sort_entries(&mut items, opts.sort_by, opts.sort_dir);

        let total_count = items.len();
        let start = ((opts.page - 1) as usize).saturating_mul(opts.page_size as usize);
        let end = start.saturating_add(opts.page_size as usize).min(total_count);
        let page_items = if start >= total_count { Vec::new() } else { items[start..end].to_vec() };

        Ok(ListResult { items: page_items, total_count, page: opts.page, page_size: opts.page_size })
    }

    /// Metadata for a single entry, file or directory.
    pub async fn get_info(&self, virtual_path: &str) -> Result<FileEntry> {
        let resolved = self.registry.resolve(virtual_path, false)?;
        let meta = self.fs.stat(&resolved.host_path).await?;
        let name = resolved
            .host_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| resolved.mount.name().to_string());
        Ok(to_file_entry(virtual_path, &name, &meta))
    }

    pub async fn create_dir(&self, virtual_path: &str) -> Result<()> {
        let resolved = self.registry.resolve(virtual_path, true)?;
        self.fs.mkdir_all(&resolved.host_path).await
    }

    pub async fn rename(&self, old_virtual: &str, new_virtual: &str) -> Result<()> {
        let old = self.registry.resolve(old_virtual, true)?;
        let new = self.registry.resolve(new_virtual, true)?;
        self.fs.rename(&old.host_path, &new.host_path).await
    }

    /// Delete a file, or a directory when `recursive` is set. The HTTP layer
    /// is responsible for requiring an explicit confirmation flag before
    /// setting `recursive` (spec.md §4.3) — this call trusts its caller.
    pub async fn delete(&self, virtual_path: &str, recursive: bool) -> Result<()> {
        let resolved = self.registry.resolve(virtual_path, true)?;
        let meta = self.fs.stat(&resolved.host_path).await?;
        if meta.is_dir {
            if !recursive {
                return Err(Error::NotFile(virtual_path.to_string()));
            }
            self.fs.remove_tree(&resolved.host_path, &CancellationToken::new()).await
        } else {
            self.fs.remove_file(&resolved.host_path).await
        }
    }

    /// Open a file for reading, returning the handle and its metadata. Used
    /// by the transfer engine for downloads.
    pub async fn open(&self, virtual_path: &str) -> Result<(Box<dyn ReadSeek>, FileEntry)> {
        let resolved = self.registry.resolve(virtual_path, false)?;
        let meta = self.fs.stat(&resolved.host_path).await?;
        if meta.is_dir {
            return Err(Error::NotFile(virtual_path.to_string()));
        }
        let handle = self.fs.open_read(&resolved.host_path).await?;
        let name = resolved
            .host_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok((handle, to_file_entry(virtual_path, &name, &meta)))
    }
}

fn trim_slashes(path: &str) -> String {
    path.trim_matches('/').to_string()
}

fn child_virtual_path(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{base}/{name}")
    }
}

fn to_file_entry(virtual_path: &str, name: &str, meta: &Metadata) -> FileEntry {
    FileEntry {
        name: name.to_string(),
        path: trim_slashes(virtual_path),
        size: meta.size,
        is_dir: meta.is_dir,
        mod_time: meta.mod_time_ms,
        permissions: meta.permissions.clone(),
        mime_type: if meta.is_dir { None } else { Some(mime::guess(name)) },
    }
}

fn sort_entries(items: &mut [FileEntry], sort_by: SortBy, sort_dir: SortDir) {
    items.sort_by(|a, b| {
        let ordering = match sort_by {
            SortBy::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            SortBy::Size => a.size.cmp(&b.size),
            SortBy::ModTime => a.mod_time.cmp(&b.mod_time),
            SortBy::Type => a.is_dir.cmp(&b.is_dir),
        };
        let ordering = match sort_dir {
            SortDir::Asc => ordering,
            SortDir::Desc => ordering.reverse(),
        };
        // Stable tie-break on name ascending regardless of requested sort.
        ordering.then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
}
