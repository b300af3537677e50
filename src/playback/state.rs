//! Playback state and its thread-safe mirror

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use super::time::progress;

/// Playback status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlaybackStatus {
    /// Item set up, waiting for the engine or an explicit `play()`
    #[default]
    Prepare,
    Playing,
    Paused,
    /// Engine detached from the item; `play()` re-supplies it
    Stopped,
    /// Played to end
    Completed,
    /// Engine or resolver failure; needs `setup_item` or `play()`
    Error,
}

impl PlaybackStatus {
    pub fn is_playing(self) -> bool {
        self == PlaybackStatus::Playing
    }
}

impl fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlaybackStatus::Prepare => "prepare",
            PlaybackStatus::Playing => "playing",
            PlaybackStatus::Paused => "paused",
            PlaybackStatus::Stopped => "stopped",
            PlaybackStatus::Completed => "completed",
            PlaybackStatus::Error => "error",
        };
        f.write_str(name)
    }
}

/// Authoritative playback snapshot, times in seconds
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    pub status: PlaybackStatus,
    pub play_time: f64,
    pub duration: f64,
    /// Upper bound of the contiguous buffered range from zero
    pub loaded_time: f64,
    pub rate: f32,
    pub volume: f32,
    pub muted: bool,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            status: PlaybackStatus::Prepare,
            play_time: 0.0,
            duration: 0.0,
            loaded_time: 0.0,
            rate: 0.0,
            volume: 1.0,
            muted: false,
        }
    }
}

impl PlaybackState {
    /// `play_time / duration`, or 0 while the duration is unknown
    pub fn progress(&self) -> f64 {
        progress(self.play_time, self.duration)
    }
}

/// Thread-safe shared playback state
///
/// Readers never block the coordinator for long; only the coordinator
/// thread writes.
#[derive(Clone, Default)]
pub struct SharedPlaybackState {
    inner: Arc<RwLock<SharedInner>>,
}

#[derive(Debug, Clone, Default)]
struct SharedInner {
    state: PlaybackState,
    has_item: bool,
}

impl fmt::Debug for SharedPlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("SharedPlaybackState")
            .field("status", &inner.state.status)
            .field("play_time", &inner.state.play_time)
            .field("duration", &inner.state.duration)
            .field("has_item", &inner.has_item)
            .finish()
    }
}

impl SharedPlaybackState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the latest published state
    pub fn snapshot(&self) -> PlaybackState {
        self.inner.read().state.clone()
    }

    pub fn status(&self) -> PlaybackStatus {
        self.inner.read().state.status
    }

    pub fn is_playing(&self) -> bool {
        self.status().is_playing()
    }

    pub fn progress(&self) -> f64 {
        self.inner.read().state.progress()
    }

    pub fn has_item(&self) -> bool {
        self.inner.read().has_item
    }

    // ---- Update methods (called by coordinator thread) ----

    pub(crate) fn publish(&self, state: &PlaybackState, has_item: bool) {
        let mut inner = self.inner.write();
        inner.state.clone_from(state);
        inner.has_item = has_item;
    }
}
