// SPDX-License-Identifier: MIT

//! The search service (spec.md §4.4, C4): a cancellable, depth-first,
//! case-insensitive substring scan rooted at a resolved directory.

use hearth_core::{Error, FileEntry, Result};
use hearth_vfs::{FileSystem, Metadata, MountRegistry};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct SearchService {
    registry: Arc<MountRegistry>,
    fs: Arc<dyn FileSystem>,
}

impl SearchService {
    pub fn new(registry: Arc<MountRegistry>, fs: Arc<dyn FileSystem>) -> Self {
        Self { registry, fs }
    }

    /// Search `virtual_path` recursively for entries whose name contains
    /// `query` (case-insensitive). Directories that can't be read are
    /// skipped silently. Results preserve traversal order; no limit here.
    pub async fn search(&self, virtual_path: &str, query: &str, cancel: &CancellationToken) -> Result<Vec<FileEntry>> {
        let trimmed_query = query.trim();
        if trimmed_query.is_empty() {
            return Err(Error::EmptyQuery);
        }
        let needle = trimmed_query.to_lowercase();

        let resolved = self.registry.resolve(virtual_path, false)?;
        let meta = self.fs.stat(&resolved.host_path).await?;
        if !meta.is_dir {
            return Err(Error::NotDirectory(virtual_path.to_string()));
        }

        let base = virtual_path.trim_matches('/').to_string();
        let mut results = Vec::new();
        self.walk(&resolved.host_path, &base, &needle, cancel, &mut results).await;
        Ok(results)
    }

    async fn walk(
        &self,
        host_dir: &Path,
        virtual_dir: &str,
        needle: &str,
        cancel: &CancellationToken,
        out: &mut Vec<FileEntry>,
    ) {
        if cancel.is_cancelled() {
            return;
        }
        let entries = match self.fs.list(host_dir).await {
            Ok(entries) => entries,
            // Unreadable directories are skipped silently rather than
            // aborting the whole scan.
            Err(_) => return,
        };

        for entry in entries {
            if cancel.is_cancelled() {
                return;
            }
            let child_virtual = if virtual_dir.is_empty() {
                entry.name.clone()
            } else {
                format!("{virtual_dir}/{}", entry.name)
            };
            let child_host: PathBuf = host_dir.join(&entry.name);

            if entry.name.to_lowercase().contains(needle) {
                out.push(to_file_entry(&child_virtual, &entry.name, &entry.metadata));
            }

            if entry.metadata.is_dir {
                Box::pin(self.walk(&child_host, &child_virtual, needle, cancel, out)).await;
            }
        }
    }
}

fn to_file_entry(virtual_path: &str, name: &str, meta: &Metadata) -> FileEntry {
    FileEntry {
        name: name.to_string(),
        path: virtual_path.to_string(),
        size: meta.size,
        is_dir: meta.is_dir,
        mod_time: meta.mod_time_ms,
        permissions: meta.permissions.clone(),
        mime_type: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_core::MountPoint;
    use hearth_vfs::MemFs;
    use std::path::PathBuf;

    fn service() -> SearchService {
        let fs = MemFs::new();
        fs.seed_dir("/data/media");
        fs.seed_file("/data/media/report.txt", b"x".to_vec());
        fs.seed_dir("/data/media/Reports");
        fs.seed_file("/data/media/Reports/q1.csv", b"y".to_vec());
        fs.seed_file("/data/media/photo.jpg", b"z".to_vec());

        let mount = MountPoint::new("media", PathBuf::from("/data/media"), false, false).unwrap();
        let registry = Arc::new(MountRegistry::new(vec![mount]).unwrap());
        SearchService::new(registry, Arc::new(fs))
    }

    #[tokio::test]
    async fn finds_case_insensitive_matches_recursively() {
        let service = service();
        let cancel = CancellationToken::new();
        let mut results = service.search("media", "report", &cancel).await.unwrap();
        results.sort_by(|a, b| a.path.cmp(&b.path));
        let paths: Vec<_> = results.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["media/Reports", "media/report.txt"]);
    }

    #[tokio::test]
    async fn empty_query_fails() {
        let service = service();
        let cancel = CancellationToken::new();
        let err = service.search("media", "   ", &cancel).await.unwrap_err();
        assert_eq!(err.code(), "empty_query");
    }

    #[tokio::test]
    async fn cancellation_stops_the_walk() {
        let service = service();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let results = service.search("media", "report", &cancel).await.unwrap();
        assert!(results.is_empty());
    }
}
