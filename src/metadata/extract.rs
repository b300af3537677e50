//! Container metadata extraction

use std::path::Path;

use anyhow::{Context, Result, bail};
use lofty::file::TaggedFileExt;
use lofty::probe::Probe;
use lofty::tag::Accessor;

use crate::engine::PlayableHandle;

/// Common metadata read from a media container
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbeddedMetadata {
    pub title: Option<String>,
    pub album: Option<String>,
    pub artist: Option<String>,
    /// Raw bytes of the first embedded picture
    pub artwork: Option<Vec<u8>>,
}

/// Container introspection collaborator
///
/// Called on a blocking worker, never on the coordinator thread.
pub trait MetadataSource: Send + Sync {
    fn extract_common_metadata(&self, handle: &PlayableHandle) -> Result<EmbeddedMetadata>;
}

/// Reads tags with lofty from the handle's local file
#[derive(Debug, Clone, Copy, Default)]
pub struct LoftyMetadataSource;

impl MetadataSource for LoftyMetadataSource {
    fn extract_common_metadata(&self, handle: &PlayableHandle) -> Result<EmbeddedMetadata> {
        let Some(path) = handle.local_path.as_deref() else {
            bail!("no local file for {}", handle.locator);
        };
        if !path.is_file() {
            bail!("{} is not available locally yet", path.display());
        }
        read_tags(path)
    }
}

fn non_empty(value: Option<std::borrow::Cow<'_, str>>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn read_tags(path: &Path) -> Result<EmbeddedMetadata> {
    let tagged_file = Probe::open(path)
        .context("Failed to open audio file")?
        .read()
        .context("Failed to read audio file")?;

    let Some(tag) = tagged_file
        .primary_tag()
        .or_else(|| tagged_file.first_tag())
    else {
        return Ok(EmbeddedMetadata::default());
    };

    Ok(EmbeddedMetadata {
        title: non_empty(tag.title()),
        album: non_empty(tag.album()),
        artist: non_empty(tag.artist()),
        artwork: tag.pictures().first().map(|p| p.data().to_vec()),
    })
}
