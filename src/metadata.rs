//! Display metadata resolution
//!
//! Resolves title/album/artist/artwork for the current item off the
//! coordinator thread:
//! - `extract`: container tag reading (`MetadataSource`, lofty by default)
//! - `artwork`: image decode, resize and remote fetch
//!
//! Each run is tagged with the generation of the item that spawned it and
//! posts its results back through the coordinator queue. Text arrives first,
//! artwork after. The coordinator drops results whose generation is no
//! longer current. Failures degrade to absent fields.

pub mod artwork;
pub mod extract;

use std::sync::Arc;

use anyhow::Context;

pub use artwork::ArtworkImage;
pub use extract::{EmbeddedMetadata, LoftyMetadataSource, MetadataSource};

use crate::engine::{Generation, PlayableHandle};
use crate::item::{ArtworkSource, AudioItem, Locator};
use crate::playback::events::{CoordinatorMessage, CoordinatorSender};

/// Display fields of the current item
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayMetadata {
    pub title: Option<String>,
    pub album: Option<String>,
    pub artist: Option<String>,
    pub artwork: Option<ArtworkImage>,
}

impl DisplayMetadata {
    /// Text fields supplied on the item itself
    pub fn supplied(item: &AudioItem) -> Self {
        Self {
            title: item.title.clone(),
            album: item.album.clone(),
            artist: item.artist.clone(),
            artwork: None,
        }
    }
}

/// Result of one resolution step, tagged with its item's generation
#[derive(Debug, Clone)]
pub struct MetadataUpdate {
    pub generation: Generation,
    pub payload: MetadataPayload,
}

#[derive(Debug, Clone)]
pub enum MetadataPayload {
    Text {
        title: Option<String>,
        album: Option<String>,
        artist: Option<String>,
    },
    Artwork(Option<ArtworkImage>),
}

/// Spawns resolution runs on a tokio runtime
pub struct MetadataPipeline {
    runtime: tokio::runtime::Handle,
    tx: CoordinatorSender,
    source: Arc<dyn MetadataSource>,
    client: reqwest::Client,
}

impl std::fmt::Debug for MetadataPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataPipeline").finish_non_exhaustive()
    }
}

impl MetadataPipeline {
    pub fn new(
        runtime: tokio::runtime::Handle,
        tx: CoordinatorSender,
        source: Arc<dyn MetadataSource>,
    ) -> Self {
        Self {
            runtime,
            tx,
            source,
            client: reqwest::Client::new(),
        }
    }

    /// Whether `spawn` has anything to do for `item`
    pub fn needs_run(item: &AudioItem) -> bool {
        item.use_embedded_metadata || item.artwork.is_some()
    }

    /// Start resolving `item` for `generation`
    ///
    /// Supplied text fields are not sent; the coordinator applies them
    /// directly when the item is set up.
    pub fn spawn(
        &self,
        generation: Generation,
        item: &AudioItem,
        handle: &PlayableHandle,
        target_size: u32,
    ) {
        if !Self::needs_run(item) {
            return;
        }

        let tx = self.tx.clone();
        let source = self.source.clone();
        let client = self.client.clone();
        let embedded = item.use_embedded_metadata;
        let artwork = item.artwork.clone();
        let handle = handle.clone();

        tracing::debug!("Resolving metadata for {} ({})", handle.locator, generation);

        self.runtime.spawn(async move {
            let send = |payload| {
                let _ = tx.send(CoordinatorMessage::Metadata(MetadataUpdate {
                    generation,
                    payload,
                }));
            };

            let artwork = if embedded {
                let extracted = extract_embedded(source, handle).await;
                let artwork = extracted
                    .artwork
                    .map(|bytes| ArtworkSource::Image(bytes.into()));
                send(MetadataPayload::Text {
                    title: extracted.title,
                    album: extracted.album,
                    artist: extracted.artist,
                });
                artwork
            } else {
                artwork
            };

            let image = match artwork {
                Some(source) => resolve_artwork(&client, source, target_size).await,
                None => None,
            };
            send(MetadataPayload::Artwork(image));
        });
    }
}

async fn extract_embedded(
    source: Arc<dyn MetadataSource>,
    handle: PlayableHandle,
) -> EmbeddedMetadata {
    let result = tokio::task::spawn_blocking(move || source.extract_common_metadata(&handle))
        .await
        .context("Metadata task panicked")
        .and_then(|r| r);

    match result {
        Ok(metadata) => metadata,
        Err(e) => {
            tracing::debug!("Embedded metadata unavailable: {:#}", e);
            EmbeddedMetadata::default()
        }
    }
}

async fn resolve_artwork(
    client: &reqwest::Client,
    source: ArtworkSource,
    target_size: u32,
) -> Option<ArtworkImage> {
    let result = match source {
        ArtworkSource::Image(bytes) => tokio::task::spawn_blocking(move || {
            artwork::resize_artwork(&bytes, target_size)
        })
        .await
        .context("Artwork task panicked")
        .and_then(|r| r),
        ArtworkSource::Locator(Locator::File(path)) => tokio::task::spawn_blocking(move || {
            artwork::load_local_artwork(&path, target_size)
        })
        .await
        .context("Artwork task panicked")
        .and_then(|r| r),
        ArtworkSource::Locator(Locator::Remote(url)) => {
            artwork::fetch_remote_artwork(client, &url, target_size).await
        }
    };

    match result {
        Ok(image) => Some(image),
        Err(e) => {
            tracing::debug!("Artwork unavailable: {:#}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::path::PathBuf;

    use super::*;
    use crate::playback::events::{CoordinatorReceiver, coordinator_channel};

    struct FixedSource(EmbeddedMetadata);

    impl MetadataSource for FixedSource {
        fn extract_common_metadata(&self, _handle: &PlayableHandle) -> anyhow::Result<EmbeddedMetadata> {
            Ok(self.0.clone())
        }
    }

    struct FailingSource;

    impl MetadataSource for FailingSource {
        fn extract_common_metadata(&self, _handle: &PlayableHandle) -> anyhow::Result<EmbeddedMetadata> {
            anyhow::bail!("no tags")
        }
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([10, 20, 30]));
        let mut out = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
            .unwrap();
        out
    }

    fn pipeline(source: Arc<dyn MetadataSource>) -> (MetadataPipeline, CoordinatorReceiver) {
        let (tx, rx) = coordinator_channel();
        let pipeline = MetadataPipeline::new(tokio::runtime::Handle::current(), tx, source);
        (pipeline, rx)
    }

    async fn next_update(rx: &mut CoordinatorReceiver) -> MetadataUpdate {
        match rx.recv().await {
            Some(CoordinatorMessage::Metadata(update)) => update,
            other => panic!("unexpected message: {:?}", other),
        }
    }

    fn item() -> AudioItem {
        AudioItem::new(PathBuf::from("/music/a.mp3"))
    }

    fn handle() -> PlayableHandle {
        PlayableHandle::direct(Locator::File(PathBuf::from("/music/a.mp3")))
    }

    #[test]
    fn test_supplied_fields() {
        let item = item().with_title("Song").with_album("Album");
        let display = DisplayMetadata::supplied(&item);
        assert_eq!(display.title.as_deref(), Some("Song"));
        assert_eq!(display.album.as_deref(), Some("Album"));
        assert_eq!(display.artist, None);
        assert!(!MetadataPipeline::needs_run(&item));
    }

    #[tokio::test]
    async fn test_embedded_text_then_artwork() {
        let source = FixedSource(EmbeddedMetadata {
            title: Some("Tagged".into()),
            artist: Some("Band".into()),
            album: None,
            artwork: Some(png_bytes(500, 500)),
        });
        let (pipeline, mut rx) = pipeline(Arc::new(source));
        let generation = Generation::default().next();

        pipeline.spawn(generation, &item().with_embedded_metadata(), &handle(), 300);

        let text = next_update(&mut rx).await;
        assert_eq!(text.generation, generation);
        match text.payload {
            MetadataPayload::Text { title, artist, album } => {
                assert_eq!(title.as_deref(), Some("Tagged"));
                assert_eq!(artist.as_deref(), Some("Band"));
                assert_eq!(album, None);
            }
            other => panic!("expected text, got {:?}", other),
        }

        let art = next_update(&mut rx).await;
        match art.payload {
            MetadataPayload::Artwork(Some(image)) => {
                assert_eq!((image.width(), image.height()), (300, 300));
            }
            other => panic!("expected artwork, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_extraction_failure_degrades_to_empty() {
        let (pipeline, mut rx) = pipeline(Arc::new(FailingSource));
        let generation = Generation::default().next();

        pipeline.spawn(generation, &item().with_embedded_metadata(), &handle(), 300);

        match next_update(&mut rx).await.payload {
            MetadataPayload::Text { title, album, artist } => {
                assert!(title.is_none() && album.is_none() && artist.is_none());
            }
            other => panic!("expected text, got {:?}", other),
        }
        assert!(matches!(
            next_update(&mut rx).await.payload,
            MetadataPayload::Artwork(None)
        ));
    }

    #[tokio::test]
    async fn test_supplied_artwork_bytes_are_resized() {
        let (pipeline, mut rx) = pipeline(Arc::new(FailingSource));
        let item = item().with_artwork(ArtworkSource::Image(png_bytes(800, 400).into()));

        pipeline.spawn(Generation::default(), &item, &handle(), 200);

        match next_update(&mut rx).await.payload {
            MetadataPayload::Artwork(Some(image)) => {
                assert_eq!((image.width(), image.height()), (200, 100));
            }
            other => panic!("expected artwork, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_artwork_file_degrades() {
        let (pipeline, mut rx) = pipeline(Arc::new(FailingSource));
        let item = item().with_artwork(ArtworkSource::Locator(Locator::File(PathBuf::from(
            "/nonexistent/cover.jpg",
        ))));

        pipeline.spawn(Generation::default(), &item, &handle(), 200);

        assert!(matches!(
            next_update(&mut rx).await.payload,
            MetadataPayload::Artwork(None)
        ));
    }
}
