// SPDX-License-Identifier: MIT

//! [`MountPoint`] — an immutable, validated-at-construction mapping from a
//! virtual name to a host directory (spec.md §3).

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// A named, absolute host directory exposed as the first segment of virtual
/// paths. Immutable after startup; constructed once by the config loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountPoint {
    name: String,
    path: PathBuf,
    read_only: bool,
    auto_discover: bool,
}

impl MountPoint {
    /// Validate and construct a mount point.
    ///
    /// `path` must already be absolute and canonical — the config loader is
    /// responsible for canonicalizing the configured directory once at
    /// startup so this constructor only has to check the invariants that
    /// can't be delegated to the filesystem.
    pub fn new(name: impl Into<String>, path: PathBuf, read_only: bool, auto_discover: bool) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::Validation("mount name must not be empty".into()));
        }
        if name.contains('/') || name.contains('\\') {
            return Err(Error::Validation(format!(
                "mount name {name:?} must not contain '/' or '\\\\'"
            )));
        }
        if !path.is_absolute() {
            return Err(Error::Validation(format!(
                "mount path {path:?} must be absolute"
            )));
        }
        Ok(Self { name, path, read_only, auto_discover })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read_only(&self) -> bool {
        self.read_only
    }

    pub fn auto_discover(&self) -> bool {
        self.auto_discover
    }
}

/// Validate that no two mounts share a name (spec.md §3 invariant).
pub fn assert_unique_names<'a>(mounts: impl IntoIterator<Item = &'a MountPoint>) -> Result<()> {
    let mut seen = std::collections::HashSet::new();
    for m in mounts {
        if !seen.insert(m.name()) {
            return Err(Error::Validation(format!("duplicate mount name: {}", m.name())));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_name_with_separator() {
        let err = MountPoint::new("a/b", PathBuf::from("/tmp"), false, false).unwrap_err();
        assert_eq!(err.code(), "validation");
    }

    #[test]
    fn rejects_relative_path() {
        let err = MountPoint::new("media", PathBuf::from("data"), false, false).unwrap_err();
        assert_eq!(err.code(), "validation");
    }

    #[test]
    fn accepts_valid_mount() {
        let m = MountPoint::new("media", PathBuf::from("/data/media"), false, false).unwrap();
        assert_eq!(m.name(), "media");
        assert!(!m.read_only());
    }

    #[test]
    fn detects_duplicate_names() {
        let a = MountPoint::new("media", PathBuf::from("/data/a"), false, false).unwrap();
        let b = MountPoint::new("media", PathBuf::from("/data/b"), false, false).unwrap();
        assert!(assert_unique_names([&a, &b]).is_err());
    }
}
