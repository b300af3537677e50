//! Resource collaborator boundary
//!
//! Turns a locator into a [`PlayableHandle`]. The actual HTTP/disk caching
//! layer lives outside this crate; the default resolver only decides where a
//! cached copy of a remote item belongs.

use std::path::{Path, PathBuf};

use xxhash_rust::xxh3::xxh3_64;

use crate::engine::PlayableHandle;
use crate::error::ResolveError;
use crate::item::Locator;

/// Resolves locators into handles the engine can open
pub trait ResourceResolver: Send + Sync {
    fn resolve_playable_handle(
        &self,
        locator: &Locator,
        caching_enabled: bool,
    ) -> Result<PlayableHandle, ResolveError>;
}

/// Resolver with a deterministic on-disk cache layout
#[derive(Debug, Clone)]
pub struct DefaultResolver {
    cache_dir: PathBuf,
}

impl Default for DefaultResolver {
    fn default() -> Self {
        Self::new(default_cache_dir())
    }
}

impl DefaultResolver {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Path a cached copy of `url` would be stored at
    pub fn cache_path_for(&self, url: &str) -> PathBuf {
        let hash = xxh3_64(url.as_bytes());
        let ext = Path::new(url.split(['?', '#']).next().unwrap_or(url))
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| e.len() <= 5 && e.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or("bin");
        self.cache_dir.join(format!("item_{:016x}.{}", hash, ext))
    }
}

impl ResourceResolver for DefaultResolver {
    fn resolve_playable_handle(
        &self,
        locator: &Locator,
        caching_enabled: bool,
    ) -> Result<PlayableHandle, ResolveError> {
        match locator {
            Locator::File(path) => {
                if !path.is_file() {
                    return Err(ResolveError::NotFound(path.clone()));
                }
                Ok(PlayableHandle::direct(locator.clone()))
            }
            Locator::Remote(url) if caching_enabled => {
                let cache_path = self.cache_path_for(url.as_str());
                tracing::debug!("Caching {} at {:?}", url, cache_path);
                Ok(PlayableHandle {
                    locator: locator.clone(),
                    local_path: Some(cache_path),
                    cached: true,
                })
            }
            Locator::Remote(_) => Ok(PlayableHandle::direct(locator.clone())),
        }
    }
}

/// Get the default item cache directory
pub fn default_cache_dir() -> PathBuf {
    directories::ProjectDirs::from("dev", "cadenza", "Cadenza")
        .map(|dirs| dirs.cache_dir().join("items"))
        .unwrap_or_else(|| PathBuf::from(".cache/items"))
}
