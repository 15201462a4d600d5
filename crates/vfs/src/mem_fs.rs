// SPDX-License-Identifier: MIT

//! In-memory backend for [`FileSystem`], used by component tests so they
//! don't have to touch a real disk (spec.md §4.2, §9 "dynamic dispatch on
//! filesystem").

use crate::fs::{DirEntry, FileSystem, Metadata as FsMetadata, ReadSeek, Writable};
use async_trait::async_trait;
use hearth_core::{Error, Result};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncSeek, AsyncWrite, ReadBuf};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
enum Node {
    File { data: Vec<u8>, mod_time_ms: u64 },
    Dir { mod_time_ms: u64 },
}

/// An in-memory filesystem rooted at nothing in particular — paths are just
/// map keys. Good enough to drive the file/search/transfer services in
/// tests without touching disk.
#[derive(Clone, Default)]
pub struct MemFs {
    inner: Arc<RwLock<BTreeMap<PathBuf, Node>>>,
    clock_ms: Arc<std::sync::atomic::AtomicU64>,
}

impl MemFs {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(BTreeMap::new())),
            clock_ms: Arc::new(std::sync::atomic::AtomicU64::new(1_700_000_000_000)),
        }
    }

    fn tick(&self) -> u64 {
        self.clock_ms.fetch_add(1, std::sync::atomic::Ordering::Relaxed)
    }

    /// Seed a file directly, for test setup.
    pub fn seed_file(&self, path: impl AsRef<Path>, data: impl Into<Vec<u8>>) {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            self.seed_dir(parent);
        }
        let mod_time_ms = self.tick();
        self.inner.write().insert(path, Node::File { data: data.into(), mod_time_ms });
    }

    /// Seed a directory directly, for test setup.
    pub fn seed_dir(&self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        let mut cur = PathBuf::new();
        for comp in path.components() {
            cur.push(comp);
            let mod_time_ms = self.tick();
            self.inner.write().entry(cur.clone()).or_insert(Node::Dir { mod_time_ms });
        }
    }
}

struct MemReader {
    data: Vec<u8>,
    pos: u64,
}

impl AsyncRead for MemReader {
    fn poll_read(self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<std::io::Result<()>> {
        let this = self.get_mut();
        let pos = this.pos as usize;
        if pos >= this.data.len() {
            return Poll::Ready(Ok(()));
        }
        let remaining = &this.data[pos..];
        let n = remaining.len().min(buf.remaining());
        buf.put_slice(&remaining[..n]);
        this.pos += n as u64;
        Poll::Ready(Ok(()))
    }
}

impl AsyncSeek for MemReader {
    fn start_seek(self: Pin<&mut Self>, position: std::io::SeekFrom) -> std::io::Result<()> {
        let this = self.get_mut();
        let new_pos = match position {
            std::io::SeekFrom::Start(p) => p as i64,
            std::io::SeekFrom::End(offset) => this.data.len() as i64 + offset,
            std::io::SeekFrom::Current(offset) => this.pos as i64 + offset,
        };
        if new_pos < 0 {
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, "seek before start"));
        }
        this.pos = new_pos as u64;
        Ok(())
    }

    fn poll_complete(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<u64>> {
        Poll::Ready(Ok(self.pos))
    }
}

struct MemWriter {
    fs: MemFs,
    path: PathBuf,
    buf: Vec<u8>,
}

impl AsyncWrite for MemWriter {
    fn poll_write(self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<std::io::Result<usize>> {
        let this = self.get_mut();
        this.buf.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        let this = self.get_mut();
        let mod_time_ms = this.fs.tick();
        this.fs.inner.write().insert(
            this.path.clone(),
            Node::File { data: this.buf.clone(), mod_time_ms },
        );
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        self.poll_flush(cx)
    }
}

fn to_fs_metadata(node: &Node) -> FsMetadata {
    match node {
        Node::File { data, mod_time_ms } => FsMetadata {
            size: data.len() as u64,
            is_dir: false,
            mod_time_ms: *mod_time_ms,
            permissions: "rw-r--r--".to_string(),
        },
        Node::Dir { mod_time_ms } => FsMetadata {
            size: 0,
            is_dir: true,
            mod_time_ms: *mod_time_ms,
            permissions: "rwxr-xr-x".to_string(),
        },
    }
}

#[async_trait]
impl FileSystem for MemFs {
    async fn stat(&self, path: &Path) -> Result<FsMetadata> {
        let guard = self.inner.read();
        let node = guard.get(path).ok_or_else(|| Error::NotFound(path.display().to_string()))?;
        Ok(to_fs_metadata(node))
    }

    async fn list(&self, path: &Path) -> Result<Vec<DirEntry>> {
        let guard = self.inner.read();
        match guard.get(path) {
            Some(Node::Dir { .. }) => {}
            Some(Node::File { .. }) => return Err(Error::NotDirectory(path.display().to_string())),
            None => return Err(Error::NotFound(path.display().to_string())),
        }
        let mut out = Vec::new();
        for (candidate, node) in guard.iter() {
            if candidate.parent() == Some(path) {
                let name = candidate.file_name().unwrap_or_default().to_string_lossy().into_owned();
                out.push(DirEntry { name, metadata: to_fs_metadata(node) });
            }
        }
        Ok(out)
    }

    async fn open_read(&self, path: &Path) -> Result<Box<dyn ReadSeek>> {
        let guard = self.inner.read();
        match guard.get(path) {
            Some(Node::File { data, .. }) => Ok(Box::new(MemReader { data: data.clone(), pos: 0 })),
            Some(Node::Dir { .. }) => Err(Error::NotFile(path.display().to_string())),
            None => Err(Error::NotFound(path.display().to_string())),
        }
    }

    async fn open_write_create(&self, path: &Path) -> Result<Box<dyn Writable>> {
        Ok(Box::new(MemWriter { fs: self.clone(), path: path.to_path_buf(), buf: Vec::new() }))
    }

    async fn mkdir_all(&self, path: &Path) -> Result<()> {
        self.seed_dir(path);
        Ok(())
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let mut guard = self.inner.write();
        let node = guard.remove(from).ok_or_else(|| Error::NotFound(from.display().to_string()))?;
        guard.insert(to.to_path_buf(), node);
        Ok(())
    }

    async fn remove_file(&self, path: &Path) -> Result<()> {
        let mut guard = self.inner.write();
        match guard.remove(path) {
            Some(_) => Ok(()),
            None => Err(Error::NotFound(path.display().to_string())),
        }
    }

    async fn remove_tree(&self, path: &Path, cancel: &CancellationToken) -> Result<()> {
        let victims: Vec<PathBuf> = {
            let guard = self.inner.read();
            guard.keys().filter(|p| *p == path || p.starts_with(path)).cloned().collect()
        };
        for victim in victims {
            if cancel.is_cancelled() {
                return Ok(());
            }
            self.inner.write().remove(&victim);
        }
        Ok(())
    }

    async fn exists(&self, path: &Path) -> bool {
        self.inner.read().contains_key(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

    #[tokio::test]
    async fn round_trips_a_written_file() {
        let fs = MemFs::new();
        fs.seed_dir("/media");
        let mut writer = fs.open_write_create(Path::new("/media/a.txt")).await.unwrap();
        writer.write_all(b"helloworld").await.unwrap();
        writer.shutdown().await.unwrap();

        let mut reader = fs.open_read(Path::new("/media/a.txt")).await.unwrap();
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await.unwrap();
        assert_eq!(buf, b"helloworld");
    }

    #[tokio::test]
    async fn seek_supports_partial_range_reads() {
        let fs = MemFs::new();
        fs.seed_file("/media/a.txt", b"helloworld".to_vec());
        let mut reader = fs.open_read(Path::new("/media/a.txt")).await.unwrap();
        reader.seek(std::io::SeekFrom::Start(5)).await.unwrap();
        let mut buf = [0u8; 5];
        reader.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"world");
    }

    #[tokio::test]
    async fn list_returns_only_direct_children() {
        let fs = MemFs::new();
        fs.seed_file("/media/a.txt", b"x".to_vec());
        fs.seed_dir("/media/sub");
        fs.seed_file("/media/sub/b.txt", b"y".to_vec());

        let entries = fs.list(Path::new("/media")).await.unwrap();
        assert_eq!(entries.len(), 2);
    }
}
