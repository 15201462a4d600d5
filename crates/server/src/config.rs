// SPDX-License-Identifier: MIT

//! Server configuration: loaded once from a TOML file, then overridden by
//! `HEARTH_`-prefixed environment variables (spec.md §6 "Configuration").
//! Immutable once loaded — there is no hot-reload path.

use hearth_core::{Error, MountPoint, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_upload_chunk_size() -> u64 {
    4 * 1024 * 1024
}

fn default_max_upload_size() -> u64 {
    10 * 1024 * 1024 * 1024
}

fn default_rate_limit_per_sec() -> u32 {
    10
}

#[derive(Debug, Clone, Deserialize)]
struct MountConfig {
    name: String,
    path: PathBuf,
    #[serde(default)]
    read_only: bool,
    #[serde(default)]
    auto_discover: bool,
}

/// On-disk shape of the config file, before mount points and the credential
/// table are turned into their validated runtime types.
#[derive(Debug, Clone, Deserialize)]
struct RawConfig {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
    signing_secret: String,
    #[serde(default = "default_upload_chunk_size")]
    upload_chunk_size: u64,
    #[serde(default = "default_max_upload_size")]
    max_upload_size: u64,
    #[serde(default = "default_rate_limit_per_sec")]
    rate_limit_per_sec: u32,
    #[serde(default)]
    allowed_origins: Vec<String>,
    #[serde(default)]
    mounts: Vec<MountConfig>,
    #[serde(default)]
    users: HashMap<String, String>,
    #[serde(default)]
    scratch_dir: Option<PathBuf>,
    #[serde(default)]
    display_names_file: Option<PathBuf>,
}

/// Fully validated, immutable server configuration.
pub struct Config {
    pub host: String,
    pub port: u16,
    pub signing_secret: String,
    pub upload_chunk_size: u64,
    pub max_upload_size: u64,
    pub rate_limit_per_sec: u32,
    pub allowed_origins: Vec<String>,
    pub mounts: Vec<MountPoint>,
    pub users: HashMap<String, String>,
    pub scratch_dir: PathBuf,
    pub display_names: HashMap<String, String>,
}

impl Config {
    /// Load from a TOML file at `path`, then apply any `HEARTH_*` environment
    /// overrides on top.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|err| Error::internal(format!("reading config {}: {err}", path.display())))?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let mut raw: RawConfig =
            toml::from_str(contents).map_err(|err| Error::Validation(format!("invalid config: {err}")))?;
        apply_env_overrides(&mut raw);

        let mounts = raw
            .mounts
            .into_iter()
            .map(|m| MountPoint::new(m.name, m.path, m.read_only, m.auto_discover))
            .collect::<Result<Vec<_>>>()?;
        hearth_core::mount::assert_unique_names(&mounts)?;

        let display_names = match &raw.display_names_file {
            Some(path) => load_display_names(path)?,
            None => HashMap::new(),
        };

        Ok(Self {
            host: raw.host,
            port: raw.port,
            signing_secret: raw.signing_secret,
            upload_chunk_size: raw.upload_chunk_size,
            max_upload_size: raw.max_upload_size,
            rate_limit_per_sec: raw.rate_limit_per_sec,
            allowed_origins: raw.allowed_origins,
            mounts,
            users: raw.users,
            scratch_dir: raw.scratch_dir.unwrap_or_else(|| std::env::temp_dir().join("hearth-uploads")),
            display_names,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Optional JSON mapping of mount-point -> display-name (spec.md §6
/// "Persisted state... an optional JSON mapping... used by the UI layer").
/// Read-only: nothing in this crate ever writes it back.
fn load_display_names(path: &Path) -> Result<HashMap<String, String>> {
    let contents = std::fs::read_to_string(path)
        .map_err(|err| Error::internal(format!("reading display names {}: {err}", path.display())))?;
    serde_json::from_str(&contents)
        .map_err(|err| Error::Validation(format!("invalid display names file: {err}")))
}

fn apply_env_overrides(raw: &mut RawConfig) {
    if let Some(v) = env_string("HEARTH_HOST") {
        raw.host = v;
    }
    if let Some(v) = env_parsed::<u16>("HEARTH_PORT") {
        raw.port = v;
    }
    if let Some(v) = env_string("HEARTH_SIGNING_SECRET") {
        raw.signing_secret = v;
    }
    if let Some(v) = env_parsed::<u64>("HEARTH_UPLOAD_CHUNK_SIZE") {
        raw.upload_chunk_size = v;
    }
    if let Some(v) = env_parsed::<u64>("HEARTH_MAX_UPLOAD_SIZE") {
        raw.max_upload_size = v;
    }
    if let Some(v) = env_parsed::<u32>("HEARTH_RATE_LIMIT_PER_SEC") {
        raw.rate_limit_per_sec = v;
    }
    if let Some(v) = env_string("HEARTH_ALLOWED_ORIGINS") {
        raw.allowed_origins = v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
    }
    if let Some(v) = env_string("HEARTH_SCRATCH_DIR") {
        raw.scratch_dir = Some(PathBuf::from(v));
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}
