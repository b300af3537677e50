//! Notification fan-out
//!
//! Two delivery paths carry the same `PlaybackEvent` stream:
//! - `ObserverRegistry`: weak, synchronous callbacks invoked on the
//!   coordinator thread
//! - `EventBus`: tokio broadcast channel for async consumers
//!
//! Registry entries never keep an observer alive. Dead entries are pruned
//! on the next dispatch or listing.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::metadata::DisplayMetadata;
use crate::playback::{PlaybackEvent, PlaybackStatus};

/// Callback capability set; implement only what you need
///
/// Callbacks run on the coordinator thread and should return quickly.
pub trait PlaybackObserver: Send + Sync {
    /// Item positioned at its begin time and ready to play
    fn ready_to_play(&self) {}

    fn status_changed(&self, _status: PlaybackStatus) {}

    fn play_time_changed(&self, _seconds: f64) {}

    fn duration_known(&self, _seconds: f64) {}

    fn loaded_time_changed(&self, _seconds: f64) {}

    fn rate_changed(&self, _rate: f32) {}

    fn previous_track_requested(&self) {}

    fn next_track_requested(&self) {}

    fn metadata_resolved(&self, _metadata: &DisplayMetadata) {}
}

fn dispatch(observer: &dyn PlaybackObserver, event: &PlaybackEvent) {
    match event {
        PlaybackEvent::ReadyToPlay => observer.ready_to_play(),
        PlaybackEvent::StatusChanged(status) => observer.status_changed(*status),
        PlaybackEvent::TimeChanged(seconds) => observer.play_time_changed(*seconds),
        PlaybackEvent::DurationKnown(seconds) => observer.duration_known(*seconds),
        PlaybackEvent::LoadedTimeChanged(seconds) => observer.loaded_time_changed(*seconds),
        PlaybackEvent::RateChanged(rate) => observer.rate_changed(*rate),
        PlaybackEvent::PreviousTrackRequested => observer.previous_track_requested(),
        PlaybackEvent::NextTrackRequested => observer.next_track_requested(),
        PlaybackEvent::MetadataResolved(metadata) => observer.metadata_resolved(metadata),
    }
}

fn same_observer(entry: &Weak<dyn PlaybackObserver>, observer: &Arc<dyn PlaybackObserver>) -> bool {
    std::ptr::eq(
        entry.as_ptr() as *const (),
        Arc::as_ptr(observer) as *const (),
    )
}

/// Weak multi-subscriber registry
///
/// Cloning shares the same list.
#[derive(Clone, Default)]
pub struct ObserverRegistry {
    entries: Arc<Mutex<Vec<Weak<dyn PlaybackObserver>>>>,
}

impl std::fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("entries", &self.entries.lock().len())
            .finish()
    }
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `observer`; adding it twice has no effect
    pub fn add(&self, observer: &Arc<dyn PlaybackObserver>) {
        let mut entries = self.entries.lock();
        entries.retain(|e| e.strong_count() > 0);
        if !entries.iter().any(|e| same_observer(e, observer)) {
            entries.push(Arc::downgrade(observer));
        }
    }

    /// Unregister `observer`; removing an absent entry is a no-op
    pub fn remove(&self, observer: &Arc<dyn PlaybackObserver>) {
        self.entries
            .lock()
            .retain(|e| e.strong_count() > 0 && !same_observer(e, observer));
    }

    pub fn remove_all(&self) {
        self.entries.lock().clear();
    }

    /// Live observers, in registration order
    pub fn observers(&self) -> Vec<Arc<dyn PlaybackObserver>> {
        let mut entries = self.entries.lock();
        entries.retain(|e| e.strong_count() > 0);
        entries.iter().filter_map(Weak::upgrade).collect()
    }

    pub fn len(&self) -> usize {
        self.observers().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `event` to every live observer
    ///
    /// The list is snapshotted first, so callbacks may add or remove
    /// observers without deadlocking.
    pub fn notify_all(&self, event: &PlaybackEvent) {
        for observer in self.observers() {
            dispatch(observer.as_ref(), event);
        }
    }
}

/// Broadcast mirror of every `PlaybackEvent`
///
/// `publish()` is a sync call and never blocks; with no subscribers the
/// event is dropped.
#[derive(Clone, Debug)]
pub struct EventBus {
    tx: broadcast::Sender<PlaybackEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn publish(&self, event: PlaybackEvent) {
        let _ = self.tx.send(event);
    }

    /// Subscribe to all future events
    ///
    /// Slow subscribers receive `RecvError::Lagged(n)` instead of blocking
    /// the coordinator.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.tx.subscribe()
    }
}
