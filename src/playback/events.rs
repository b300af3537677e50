//! Coordinator communication types
//!
//! - `Command` - control calls from `CoordinatorHandle`
//! - `CoordinatorMessage` - everything the coordinator thread consumes
//! - `PlaybackEvent` - notifications emitted by the coordinator
//!
//! All producers share one unbounded queue, which is what serializes
//! control calls, engine callbacks and background results.

use tokio::sync::{mpsc, oneshot};

use super::PlaybackStatus;
use crate::engine::EngineEvent;
use crate::error::CommandStatus;
use crate::interruption::{InterruptionEvent, RouteChangeReason};
use crate::item::AudioItem;
use crate::metadata::{DisplayMetadata, MetadataUpdate};
use crate::remote::{RemoteCommand, RemoteConfig};
use crate::settings::Settings;

// ============ Commands (Handle -> Coordinator) ============

/// Control calls, processed in order on the coordinator thread
#[derive(Debug, Clone)]
pub enum Command {
    /// Make `item` current and position it at `begin_time` once ready
    SetupItem { item: AudioItem, begin_time: f64 },
    Play,
    Pause,
    TogglePlayPause,
    Stop,
    NextTrack,
    PreviousTrack,
    SkipForward { interval: f64 },
    SkipBackward { interval: f64 },
    SeekToPosition { seconds: f64 },
    /// Fraction of the duration in `[0, 1]`
    SeekToProgress { progress: f64 },
    BeginRewind { rate: f32 },
    BeginFastForward { rate: f32 },
    EndRewindFastForward,
    SetVolume { volume: f32 },
    SetMuted { muted: bool },
    /// Replace the active settings
    UpdateSettings(Box<Settings>),
}

/// Messages drained by the coordinator thread
#[derive(Debug)]
pub enum CoordinatorMessage {
    Control(Command),
    Engine(EngineEvent),
    Metadata(MetadataUpdate),
    Interruption(InterruptionEvent),
    RouteChange(RouteChangeReason),
    Remote {
        command: RemoteCommand,
        reply: Option<oneshot::Sender<CommandStatus>>,
    },
    RemoteConfig(RemoteConfig),
    Shutdown,
}

// ============ Events (Coordinator -> Observers) ============

/// Notifications emitted by the coordinator, in emission order
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    /// Positioned at the begin time after the engine reported ready
    ReadyToPlay,
    StatusChanged(PlaybackStatus),
    /// New play time in seconds
    TimeChanged(f64),
    /// Item duration in seconds
    DurationKnown(f64),
    /// Buffered range end in seconds
    LoadedTimeChanged(f64),
    RateChanged(f32),
    PreviousTrackRequested,
    NextTrackRequested,
    /// Display metadata for the current item changed
    MetadataResolved(DisplayMetadata),
}

// ============ Channel Types ============

/// Sender for coordinator messages
pub type CoordinatorSender = mpsc::UnboundedSender<CoordinatorMessage>;

/// Receiver for coordinator messages (held by the coordinator thread)
pub type CoordinatorReceiver = mpsc::UnboundedReceiver<CoordinatorMessage>;

/// Create a new coordinator channel
pub fn coordinator_channel() -> (CoordinatorSender, CoordinatorReceiver) {
    mpsc::unbounded_channel()
}
