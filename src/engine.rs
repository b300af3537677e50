//! Player engine boundary
//!
//! The decoder/renderer is external. The coordinator drives it through
//! [`PlayerEngine`] and hears back through [`EngineEventSender`], which
//! funnels every engine callback into the coordinator's serialized queue.
//!
//! ## Tagging
//! ```text
//! load_item(handle, generation) --> Ready/Failed/LoadedRange/Ended { generation }
//! seek(ticket)                  --> SeekCompleted { ticket }
//! add_periodic_time_observer()  --> TimeTick { token }
//! ```
//! Every tag is compared on arrival; mismatches are dropped silently.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::item::Locator;
use crate::playback::events::{CoordinatorMessage, CoordinatorSender};

/// Monotonic item-switch counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    pub fn value(self) -> u64 {
        self.0
    }

    pub(crate) fn next(self) -> Self {
        Generation(self.0.wrapping_add(1))
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen#{}", self.0)
    }
}

/// Identity of one seek request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeekTicket {
    pub generation: Generation,
    pub id: u64,
    /// Target time in seconds, already validated
    pub target: f64,
}

impl SeekTicket {
    /// Same request, regardless of float equality on the target
    pub fn same_request(&self, other: &SeekTicket) -> bool {
        self.generation == other.generation && self.id == other.id
    }
}

/// Token returned by `add_periodic_time_observer`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeObserverToken(pub u64);

/// Something the engine can open, produced by the resource collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayableHandle {
    /// Original locator of the item
    pub locator: Locator,
    /// Local file backing the handle: the file itself, or a cache path
    /// for remote items when caching is enabled
    pub local_path: Option<PathBuf>,
    /// Whether the resource collaborator is caching this item
    pub cached: bool,
}

impl PlayableHandle {
    pub fn direct(locator: Locator) -> Self {
        let local_path = locator.as_path().map(|p| p.to_path_buf());
        Self {
            locator,
            local_path,
            cached: false,
        }
    }
}

/// Asynchronous signals from the engine
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// The loaded item can play; `duration` in seconds
    Ready { generation: Generation, duration: f64 },
    /// The loaded item failed to load or decode
    Failed {
        generation: Generation,
        message: String,
    },
    /// Upper bound of the contiguous buffered range from zero
    LoadedRangeChanged {
        generation: Generation,
        range_end: f64,
    },
    /// The item played to its end
    PlaybackEnded { generation: Generation },
    /// The engine's effective rate changed
    RateChanged { rate: f32 },
    /// Completion of `seek(ticket)`
    SeekCompleted { ticket: SeekTicket, finished: bool },
    /// Periodic position sample in seconds
    TimeTick {
        token: TimeObserverToken,
        position: f64,
    },
}

/// Callback channel handed to the engine
///
/// Sending never blocks; events sent after the coordinator has shut down
/// are dropped.
#[derive(Debug, Clone)]
pub struct EngineEventSender {
    tx: CoordinatorSender,
}

impl EngineEventSender {
    pub(crate) fn new(tx: CoordinatorSender) -> Self {
        Self { tx }
    }

    pub fn send(&self, event: EngineEvent) {
        if self.tx.send(CoordinatorMessage::Engine(event)).is_err() {
            tracing::trace!("Engine event dropped, coordinator is gone");
        }
    }
}

/// Primitives the coordinator needs from a decoder/renderer
pub trait PlayerEngine: Send {
    /// Receive the callback channel; called once before any other method
    fn bind(&mut self, events: EngineEventSender);

    /// Replace the current item. Item-scoped events must carry `generation`.
    fn load_item(&mut self, handle: PlayableHandle, generation: Generation);

    /// Detach the current item
    fn stop(&mut self);

    fn play(&mut self);

    fn pause(&mut self);

    fn set_rate(&mut self, rate: f32);

    /// Start an exact seek; must answer with `SeekCompleted { ticket }`
    fn seek(&mut self, ticket: SeekTicket);

    fn add_periodic_time_observer(&mut self, interval: Duration) -> TimeObserverToken;

    fn remove_time_observer(&mut self, token: TimeObserverToken);

    /// Current position in seconds
    fn current_position(&self) -> f64;

    /// Duration of the current item in seconds, 0 if unknown
    fn current_duration(&self) -> f64;

    fn set_volume(&mut self, _volume: f32) {}

    fn set_muted(&mut self, _muted: bool) {}
}
