// SPDX-License-Identifier: MIT

//! Range-aware file downloads (spec.md §4.5.1).

use crate::range::{parse_range, ContentRange};
use hearth_core::{FileEntry, Result};
use hearth_files::FileService;
use hearth_vfs::ReadSeek;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

/// How the client wants the file served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Attachment,
    Inline,
}

/// The resolved response for a download or preview request.
pub struct DownloadResult {
    pub reader: Box<dyn ReadSeek>,
    pub entry: FileEntry,
    pub content_length: u64,
    pub range: Option<ContentRange>,
    pub disposition: Disposition,
}

/// Open `virtual_path` for a download, applying a client-supplied `Range`
/// header when present (spec.md §4.5.1).
pub async fn open_download(
    files: &FileService,
    virtual_path: &str,
    range_header: Option<&str>,
    disposition: Disposition,
) -> Result<DownloadResult> {
    let (mut reader, entry) = files.open(virtual_path).await?;

    let range = match range_header {
        Some(header) => {
            let parsed = parse_range(header, entry.size)?;
            reader.seek(std::io::SeekFrom::Start(parsed.start)).await?;
            Some(parsed)
        }
        None => None,
    };

    let content_length = range.map(|r| r.len()).unwrap_or(entry.size);
    Ok(DownloadResult { reader, entry, content_length, range, disposition })
}

/// Read exactly the requested window out of `reader`, honoring `range` when
/// present. Used by handlers that buffer the whole body rather than stream
/// it (small previews, tests).
pub async fn read_window(mut reader: Box<dyn ReadSeek>, range: Option<ContentRange>) -> std::io::Result<Vec<u8>> {
    match range {
        Some(r) => {
            let mut buf = vec![0u8; r.len() as usize];
            reader.read_exact(&mut buf).await?;
            Ok(buf)
        }
        None => {
            let mut buf = Vec::new();
            reader.read_to_end(&mut buf).await?;
            Ok(buf)
        }
    }
}
