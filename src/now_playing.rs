//! Now-playing read model
//!
//! The OS integration (lock screen, MPRIS, SMTC) sits outside this crate
//! and implements [`NowPlayingPublisher`]. The coordinator pushes a fresh
//! [`NowPlayingInfo`] on item change, status change, rate change, metadata
//! arrival and seek completion, or `None` when there is nothing to show.

use crate::metadata::{ArtworkImage, DisplayMetadata};
use crate::playback::PlaybackState;

/// Display information for system media controls
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NowPlayingInfo {
    pub title: Option<String>,
    pub album: Option<String>,
    pub artist: Option<String>,
    pub artwork: Option<ArtworkImage>,
    pub duration: f64,
    pub elapsed: f64,
    pub rate: f32,
}

impl NowPlayingInfo {
    pub fn from_parts(metadata: &DisplayMetadata, state: &PlaybackState) -> Self {
        Self {
            title: metadata.title.clone(),
            album: metadata.album.clone(),
            artist: metadata.artist.clone(),
            artwork: metadata.artwork.clone(),
            duration: state.duration,
            elapsed: state.play_time,
            rate: state.rate,
        }
    }
}

/// Receives now-playing updates on the coordinator thread
pub trait NowPlayingPublisher: Send {
    /// `None` clears the displayed information
    fn publish(&mut self, info: Option<NowPlayingInfo>);
}
