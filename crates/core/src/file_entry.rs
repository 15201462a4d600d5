// SPDX-License-Identifier: MIT

//! Value types returned by the file service: directory entries, listing
//! options, and the paginated listing result.

use serde::{Deserialize, Serialize};

/// A value projection of a directory entry (spec.md §3 `FileEntry`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    /// Virtual path (`<mount>/<sub>`), not the host-absolute path.
    pub path: String,
    /// Byte size. Directories are conventionally reported as 0.
    pub size: u64,
    pub is_dir: bool,
    /// Milliseconds since the Unix epoch.
    pub mod_time: u64,
    /// String-form permissions, e.g. `rwxr-xr-x`.
    pub permissions: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// Sort key for a directory listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    Name,
    Size,
    ModTime,
    Type,
}

impl Default for SortBy {
    fn default() -> Self {
        SortBy::Name
    }
}

crate::simple_display! {
    SortBy {
        Name => "name",
        Size => "size",
        ModTime => "mod_time",
        Type => "type",
    }
}

impl std::str::FromStr for SortBy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(SortBy::Name),
            "size" => Ok(SortBy::Size),
            "mod_time" => Ok(SortBy::ModTime),
            "type" => Ok(SortBy::Type),
            _ => Err(()),
        }
    }
}

/// Sort direction for a directory listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDir {
    Asc,
    Desc,
}

impl Default for SortDir {
    fn default() -> Self {
        SortDir::Asc
    }
}

impl std::str::FromStr for SortDir {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortDir::Asc),
            "desc" => Ok(SortDir::Desc),
            _ => Err(()),
        }
    }
}

/// Maximum page size accepted by the file service (spec.md §3/§4.10).
pub const MAX_PAGE_SIZE: u32 = 1000;
const DEFAULT_PAGE_SIZE: u32 = 50;

/// Listing request options (spec.md §3 `ListOptions`).
///
/// The HTTP surface falls back to these defaults on malformed query
/// parameters rather than erroring (spec.md §4.10), so construction here is
/// infallible — out-of-range values are clamped by [`ListOptions::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOptions {
    pub page: u32,
    pub page_size: u32,
    pub sort_by: SortBy,
    pub sort_dir: SortDir,
    pub filter: Option<String>,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            sort_by: SortBy::Name,
            sort_dir: SortDir::Asc,
            filter: None,
        }
    }
}

impl ListOptions {
    /// Clamp `page`/`page_size` into their valid ranges; never fails.
    pub fn new(
        page: Option<u32>,
        page_size: Option<u32>,
        sort_by: Option<SortBy>,
        sort_dir: Option<SortDir>,
        filter: Option<String>,
    ) -> Self {
        let page = page.filter(|p| *p >= 1).unwrap_or(1);
        let page_size = page_size
            .filter(|p| *p >= 1 && *p <= MAX_PAGE_SIZE)
            .unwrap_or(DEFAULT_PAGE_SIZE);
        Self {
            page,
            page_size,
            sort_by: sort_by.unwrap_or(SortBy::Name),
            sort_dir: sort_dir.unwrap_or(SortDir::Asc),
            filter: filter.filter(|f| !f.is_empty()),
        }
    }
}

/// Paginated listing result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListResult {
    pub items: Vec<FileEntry>,
    /// Post-filter size, invariant across pages (spec.md invariant 3).
    pub total_count: usize,
    pub page: u32,
    pub page_size: u32,
}
