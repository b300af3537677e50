//! Audio item descriptors
//!
//! An `AudioItem` is immutable once handed to the coordinator. Switching
//! tracks supersedes the current item with a new one; nothing mutates it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use reqwest::Url;

use crate::error::ResolveError;

/// Where an item or an artwork image lives
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    /// Local file
    File(PathBuf),
    /// Remote resource (http/https)
    Remote(Url),
}

impl Locator {
    /// Parse a path, `file://` URL or `http(s)://` URL
    pub fn parse(input: &str) -> Result<Self, ResolveError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ResolveError::InvalidLocator(input.to_string()));
        }

        if trimmed.contains("://") {
            let url =
                Url::parse(trimmed).map_err(|e| ResolveError::InvalidLocator(e.to_string()))?;
            return match url.scheme() {
                "file" => url
                    .to_file_path()
                    .map(Locator::File)
                    .map_err(|_| ResolveError::InvalidLocator(input.to_string())),
                "http" | "https" => Ok(Locator::Remote(url)),
                other => Err(ResolveError::InvalidLocator(format!(
                    "unsupported scheme: {}",
                    other
                ))),
            };
        }

        Ok(Locator::File(PathBuf::from(trimmed)))
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Locator::Remote(_))
    }

    /// Local path, if this is a file locator
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Locator::File(path) => Some(path),
            Locator::Remote(_) => None,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::File(path) => write!(f, "{}", path.display()),
            Locator::Remote(url) => write!(f, "{}", url),
        }
    }
}

impl From<PathBuf> for Locator {
    fn from(path: PathBuf) -> Self {
        Locator::File(path)
    }
}

impl From<Url> for Locator {
    fn from(url: Url) -> Self {
        Locator::Remote(url)
    }
}

/// Pre-supplied artwork for an item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtworkSource {
    /// Encoded image bytes (JPEG/PNG)
    Image(Arc<[u8]>),
    /// Image file or URL, loaded off the coordinator thread
    Locator(Locator),
}

/// Descriptor of one playable audio item
#[derive(Debug, Clone, PartialEq)]
pub struct AudioItem {
    pub locator: Locator,
    /// Extract title/album/artist/artwork from the media container
    /// instead of using the supplied fields
    pub use_embedded_metadata: bool,
    pub title: Option<String>,
    pub album: Option<String>,
    pub artist: Option<String>,
    pub artwork: Option<ArtworkSource>,
}

impl AudioItem {
    pub fn new(locator: impl Into<Locator>) -> Self {
        Self {
            locator: locator.into(),
            use_embedded_metadata: false,
            title: None,
            album: None,
            artist: None,
            artwork: None,
        }
    }

    pub fn with_embedded_metadata(mut self) -> Self {
        self.use_embedded_metadata = true;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    pub fn with_artwork(mut self, artwork: ArtworkSource) -> Self {
        self.artwork = Some(artwork);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_path() {
        assert_eq!(
            Locator::parse("/music/a.mp3").unwrap(),
            Locator::File(PathBuf::from("/music/a.mp3"))
        );
    }

    #[test]
    fn test_parse_file_url() {
        let loc = Locator::parse("file:///music/a.mp3").unwrap();
        assert_eq!(loc.as_path(), Some(Path::new("/music/a.mp3")));
        assert!(!loc.is_remote());
    }

    #[test]
    fn test_parse_remote_url() {
        let loc = Locator::parse("https://example.com/a.mp3").unwrap();
        assert!(loc.is_remote());
        assert_eq!(loc.to_string(), "https://example.com/a.mp3");
    }

    #[test]
    fn test_parse_rejects_empty_and_unknown_scheme() {
        assert!(Locator::parse("   ").is_err());
        assert!(Locator::parse("ftp://example.com/a.mp3").is_err());
    }

    #[test]
    fn test_builder_sets_fields() {
        let item = AudioItem::new(PathBuf::from("/a.mp3"))
            .with_title("Song")
            .with_artist("Artist")
            .with_album("Album");
        assert_eq!(item.title.as_deref(), Some("Song"));
        assert_eq!(item.artist.as_deref(), Some("Artist"));
        assert_eq!(item.album.as_deref(), Some("Album"));
        assert!(!item.use_embedded_metadata);
    }
}
