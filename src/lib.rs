//! Cadenza - race-free playback coordination for sequenced audio items
//!
//! Sits on top of an external player engine and turns its independent
//! callbacks (readiness, time samples, buffering, completion, seeks) into
//! one consistent `PlaybackState`, plus:
//! - metadata and artwork resolution that cannot leak across item switches
//! - weak observer fan-out and a broadcast event bus
//! - remote-command routing with per-command enable flags
//! - interruption and route-change reactions
//!
//! Start with [`spawn_coordinator`] and drive playback through the returned
//! [`CoordinatorHandle`].

pub mod engine;
pub mod error;
pub mod interruption;
pub mod item;
pub mod logging;
pub mod metadata;
pub mod now_playing;
pub mod observer;
pub mod playback;
pub mod remote;
pub mod resource;
pub mod settings;

pub use engine::{
    EngineEvent, EngineEventSender, Generation, PlayableHandle, PlayerEngine, SeekTicket,
    TimeObserverToken,
};
pub use error::{CommandStatus, PlaybackError, ResolveError};
pub use interruption::{InterruptionEvent, InterruptionPolicy, RouteChangeReason};
pub use item::{ArtworkSource, AudioItem, Locator};
pub use metadata::{ArtworkImage, DisplayMetadata, MetadataSource};
pub use now_playing::{NowPlayingInfo, NowPlayingPublisher};
pub use observer::{EventBus, ObserverRegistry, PlaybackObserver};
pub use playback::{
    Coordinator, CoordinatorHandle, CoordinatorParts, CoordinatorThread, PlaybackEvent,
    PlaybackState, PlaybackStatus, spawn_coordinator,
};
pub use remote::{RemoteCommand, RemoteCommandRouter, ScrubPhase};
pub use resource::{DefaultResolver, ResourceResolver};
pub use settings::Settings;
