//! Asset sources
//!
//! The renderer only knows opaque references; an [`AssetSource`] turns a
//! reference into bytes.

use base64::Engine;
use log::debug;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Why an asset could not be fetched
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AssetFetchError {
    #[error("asset not found: {0}")]
    NotFound(String),

    #[error("asset fetch timed out: {0}")]
    Timeout(String),

    #[error("asset source unavailable: {0}")]
    Unavailable(String),

    #[error("invalid asset: {0}")]
    Invalid(String),
}

/// Resolves asset references to bytes
pub trait AssetSource: Send + Sync {
    /// Fetch the bytes behind `reference`, giving up after `timeout`
    fn fetch(&self, reference: &str, timeout: Duration) -> Result<Vec<u8>, AssetFetchError>;
}

/// In-memory assets keyed by reference
#[derive(Debug, Clone, Default)]
pub struct MemoryAssets {
    assets: HashMap<String, Vec<u8>>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an asset
    pub fn insert(&mut self, reference: impl Into<String>, bytes: Vec<u8>) {
        self.assets.insert(reference.into(), bytes);
    }

    /// Builder form of [`MemoryAssets::insert`]
    pub fn with(mut self, reference: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(reference, bytes);
        self
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl AssetSource for MemoryAssets {
    fn fetch(&self, reference: &str, _timeout: Duration) -> Result<Vec<u8>, AssetFetchError> {
        self.assets
            .get(reference)
            .cloned()
            .ok_or_else(|| AssetFetchError::NotFound(reference.to_string()))
    }
}

/// Files below a root directory
#[derive(Debug, Clone)]
pub struct DirectoryAssets {
    root: PathBuf,
}

impl DirectoryAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path for a reference, `None` when it would escape the root
    fn path_for(&self, reference: &str) -> Option<PathBuf> {
        let relative = Path::new(reference.trim_start_matches("storage/"));
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if reference.is_empty() || !safe {
            return None;
        }
        Some(self.root.join(relative))
    }
}

impl AssetSource for DirectoryAssets {
    fn fetch(&self, reference: &str, _timeout: Duration) -> Result<Vec<u8>, AssetFetchError> {
        let path = self
            .path_for(reference)
            .ok_or_else(|| AssetFetchError::NotFound(reference.to_string()))?;

        std::fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AssetFetchError::NotFound(reference.to_string()),
            _ => AssetFetchError::Unavailable(format!("{}: {e}", path.display())),
        })
    }
}

/// Remote assets over HTTP(S)
#[cfg(feature = "http")]
#[derive(Debug, Clone, Default)]
pub struct HttpAssets;

#[cfg(feature = "http")]
impl HttpAssets {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(feature = "http")]
impl AssetSource for HttpAssets {
    fn fetch(&self, reference: &str, timeout: Duration) -> Result<Vec<u8>, AssetFetchError> {
        let response = ureq::get(reference).timeout(timeout).call().map_err(|e| match e {
            ureq::Error::Status(404, _) | ureq::Error::Status(410, _) => {
                AssetFetchError::NotFound(reference.to_string())
            }
            ureq::Error::Status(code, _) => AssetFetchError::Unavailable(format!("{reference}: HTTP {code}")),
            ureq::Error::Transport(t) => {
                let message = t.to_string();
                if message.to_ascii_lowercase().contains("timed out") {
                    AssetFetchError::Timeout(reference.to_string())
                } else {
                    AssetFetchError::Unavailable(format!("{reference}: {message}"))
                }
            }
        })?;

        read_capped(response.into_reader(), MAX_REMOTE_BYTES, reference)
    }
}

/// Largest remote asset accepted
#[cfg(feature = "http")]
pub const MAX_REMOTE_BYTES: u64 = 20 * 1024 * 1024;

/// Read at most `limit` bytes, a longer body is `Invalid`
#[cfg(feature = "http")]
fn read_capped(reader: impl std::io::Read, limit: u64, reference: &str) -> Result<Vec<u8>, AssetFetchError> {
    use std::io::Read;

    let mut bytes = Vec::new();
    reader.take(limit + 1).read_to_end(&mut bytes).map_err(|e| {
        if e.kind() == std::io::ErrorKind::TimedOut {
            AssetFetchError::Timeout(reference.to_string())
        } else {
            AssetFetchError::Unavailable(format!("{reference}: {e}"))
        }
    })?;

    if bytes.len() as u64 > limit {
        return Err(AssetFetchError::Invalid(format!("{reference}: larger than {limit} bytes")));
    }
    Ok(bytes)
}

/// Decode `data:<mime>;base64,<payload>` (or a plain, unencoded payload)
pub fn decode_data_url(reference: &str) -> Result<Vec<u8>, AssetFetchError> {
    let rest = reference
        .strip_prefix("data:")
        .ok_or_else(|| AssetFetchError::Invalid("not a data URL".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| AssetFetchError::Invalid("data URL without payload".to_string()))?;

    if header.split(';').any(|part| part == "base64") {
        base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| AssetFetchError::Invalid(format!("base64 decode error: {e}")))
    } else {
        Ok(payload.as_bytes().to_vec())
    }
}

/// Dispatches by reference shape
///
/// - `data:` URLs are decoded inline
/// - `http://` and `https://` go to the HTTP source
/// - anything else is read from the directory source
pub struct RoutedAssets {
    directory: Option<DirectoryAssets>,
    http: Option<Box<dyn AssetSource>>,
}

impl RoutedAssets {
    /// Only data URLs resolve until a directory or HTTP source is added
    pub fn new() -> Self {
        Self {
            directory: None,
            http: None,
        }
    }

    pub fn with_directory(mut self, root: impl Into<PathBuf>) -> Self {
        self.directory = Some(DirectoryAssets::new(root));
        self
    }

    /// Use a custom source for remote references
    pub fn with_remote(mut self, source: Box<dyn AssetSource>) -> Self {
        self.http = Some(source);
        self
    }

    /// Use [`HttpAssets`] for remote references
    #[cfg(feature = "http")]
    pub fn with_http(self) -> Self {
        self.with_remote(Box::new(HttpAssets::new()))
    }
}

impl Default for RoutedAssets {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetSource for RoutedAssets {
    fn fetch(&self, reference: &str, timeout: Duration) -> Result<Vec<u8>, AssetFetchError> {
        if reference.starts_with("data:") {
            return decode_data_url(reference);
        }

        if reference.starts_with("http://") || reference.starts_with("https://") {
            debug!("fetching remote asset {reference}");
            return match &self.http {
                Some(http) => http.fetch(reference, timeout),
                None => Err(AssetFetchError::Unavailable(format!("no remote source for {reference}"))),
            };
        }

        match &self.directory {
            Some(directory) => directory.fetch(reference, timeout),
            None => Err(AssetFetchError::NotFound(reference.to_string())),
        }
    }
}
