//! Non-blocking control surface
//!
//! `CoordinatorHandle` can be cloned onto any thread. Control calls are
//! queued for the coordinator thread and return immediately; results show
//! up as `PlaybackEvent`s. State reads go through `SharedPlaybackState`
//! and never wait on the coordinator.

use std::sync::Arc;

use tokio::sync::{broadcast, oneshot};

use super::events::{Command, CoordinatorMessage, CoordinatorSender, PlaybackEvent};
use super::state::{PlaybackState, PlaybackStatus, SharedPlaybackState};
use crate::error::{CommandStatus, PlaybackError};
use crate::interruption::{InterruptionEvent, RouteChangeReason};
use crate::item::AudioItem;
use crate::observer::{EventBus, ObserverRegistry, PlaybackObserver};
use crate::remote::{RemoteCommand, RemoteConfig};
use crate::settings::Settings;

/// Handle for controlling the coordinator from any thread
#[derive(Clone)]
pub struct CoordinatorHandle {
    tx: CoordinatorSender,
    state: SharedPlaybackState,
    observers: ObserverRegistry,
    bus: EventBus,
}

impl std::fmt::Debug for CoordinatorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoordinatorHandle")
            .field("state", &self.state)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl CoordinatorHandle {
    pub fn new(
        tx: CoordinatorSender,
        state: SharedPlaybackState,
        observers: ObserverRegistry,
        bus: EventBus,
    ) -> Self {
        Self {
            tx,
            state,
            observers,
            bus,
        }
    }

    fn send(&self, message: CoordinatorMessage) {
        if self.tx.send(message).is_err() {
            tracing::debug!("Coordinator is gone, dropping message");
        }
    }

    fn command(&self, command: Command) {
        self.send(CoordinatorMessage::Control(command));
    }

    /// Whether the coordinator thread is still receiving
    pub fn is_running(&self) -> bool {
        !self.tx.is_closed()
    }

    /// Ask the coordinator thread to detach everything and exit
    pub(crate) fn request_shutdown(&self) {
        self.send(CoordinatorMessage::Shutdown);
    }

    // ============ Playback Control ============

    /// Make `item` current, positioned at `begin_time` seconds once ready
    pub fn setup_item(&self, item: AudioItem, begin_time: f64) {
        self.command(Command::SetupItem { item, begin_time });
    }

    pub fn play(&self) {
        self.command(Command::Play);
    }

    pub fn pause(&self) {
        self.command(Command::Pause);
    }

    pub fn toggle_play_pause(&self) {
        self.command(Command::TogglePlayPause);
    }

    /// Stop and detach the engine's item; `play()` re-supplies it
    pub fn stop(&self) {
        self.command(Command::Stop);
    }

    /// Ask observers for the next item
    ///
    /// Listen for `PlaybackEvent::NextTrackRequested`.
    pub fn next_track(&self) {
        self.command(Command::NextTrack);
    }

    pub fn previous_track(&self) {
        self.command(Command::PreviousTrack);
    }

    pub fn skip_forward(&self, interval: f64) {
        self.command(Command::SkipForward { interval });
    }

    pub fn skip_backward(&self, interval: f64) {
        self.command(Command::SkipBackward { interval });
    }

    /// Seek to an absolute time in seconds
    ///
    /// Only the latest seek is honoured; earlier ones still in flight are
    /// superseded.
    pub fn seek_to_position(&self, seconds: f64) {
        self.command(Command::SeekToPosition { seconds });
    }

    /// Seek to a fraction of the duration in `[0, 1]`
    pub fn seek_to_progress(&self, progress: f64) {
        self.command(Command::SeekToProgress { progress });
    }

    pub fn begin_rewind(&self, rate: f32) {
        self.command(Command::BeginRewind { rate });
    }

    pub fn begin_fast_forward(&self, rate: f32) {
        self.command(Command::BeginFastForward { rate });
    }

    pub fn end_rewind_fast_forward(&self) {
        self.command(Command::EndRewindFastForward);
    }

    pub fn set_volume(&self, volume: f32) {
        self.command(Command::SetVolume { volume });
    }

    pub fn set_muted(&self, muted: bool) {
        self.command(Command::SetMuted { muted });
    }

    pub fn update_settings(&self, settings: Settings) {
        self.command(Command::UpdateSettings(Box::new(settings)));
    }

    // ============ Remote Commands ============

    /// Route a remote command, resolving with its status once processed
    pub fn remote(
        &self,
        command: RemoteCommand,
    ) -> Result<oneshot::Receiver<CommandStatus>, PlaybackError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(CoordinatorMessage::Remote {
                command,
                reply: Some(reply),
            })
            .map_err(|_| PlaybackError::CoordinatorGone)?;
        Ok(rx)
    }

    /// Route a remote command and wait for its status
    pub async fn remote_command(&self, command: RemoteCommand) -> CommandStatus {
        match self.remote(command) {
            Ok(rx) => rx.await.unwrap_or(CommandStatus::CommandFailed),
            Err(_) => CommandStatus::CommandFailed,
        }
    }

    /// Route a remote command without waiting for its status
    pub fn remote_detached(&self, command: RemoteCommand) {
        self.send(CoordinatorMessage::Remote {
            command,
            reply: None,
        });
    }

    fn remote_config(&self, config: RemoteConfig) {
        self.send(CoordinatorMessage::RemoteConfig(config));
    }

    /// Play, pause, stop and toggle
    pub fn set_playback_commands_enabled(&self, enabled: bool) {
        self.remote_config(RemoteConfig::PlaybackCommands(enabled));
    }

    pub fn set_next_track_enabled(&self, enabled: bool) {
        self.remote_config(RemoteConfig::NextTrack(enabled));
    }

    pub fn set_previous_track_enabled(&self, enabled: bool) {
        self.remote_config(RemoteConfig::PreviousTrack(enabled));
    }

    pub fn set_skip_forward_enabled(&self, enabled: bool, preferred_interval: f64) {
        self.remote_config(RemoteConfig::SkipForward {
            enabled,
            preferred_interval,
        });
    }

    pub fn set_skip_backward_enabled(&self, enabled: bool, preferred_interval: f64) {
        self.remote_config(RemoteConfig::SkipBackward {
            enabled,
            preferred_interval,
        });
    }

    pub fn set_seek_forward_enabled(&self, enabled: bool) {
        self.remote_config(RemoteConfig::SeekForward(enabled));
    }

    pub fn set_seek_backward_enabled(&self, enabled: bool) {
        self.remote_config(RemoteConfig::SeekBackward(enabled));
    }

    pub fn set_change_position_enabled(&self, enabled: bool) {
        self.remote_config(RemoteConfig::ChangePlaybackPosition(enabled));
    }

    pub fn disable_all_remote_commands(&self) {
        self.remote_config(RemoteConfig::DisableAll);
    }

    // ============ Audio Session ============

    pub fn interruption(&self, event: InterruptionEvent) {
        self.send(CoordinatorMessage::Interruption(event));
    }

    pub fn route_changed(&self, reason: RouteChangeReason) {
        self.send(CoordinatorMessage::RouteChange(reason));
    }

    // ============ Observers ============

    /// Register `observer`; the registry keeps only a weak reference
    pub fn add_observer(&self, observer: &Arc<dyn PlaybackObserver>) {
        self.observers.add(observer);
    }

    pub fn remove_observer(&self, observer: &Arc<dyn PlaybackObserver>) {
        self.observers.remove(observer);
    }

    pub fn remove_all_observers(&self) {
        self.observers.remove_all();
    }

    /// Live observers, in registration order
    pub fn observers(&self) -> Vec<Arc<dyn PlaybackObserver>> {
        self.observers.observers()
    }

    /// Receive every `PlaybackEvent` over a broadcast channel
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.bus.subscribe()
    }

    // ============ State Queries (non-blocking reads) ============

    pub fn snapshot(&self) -> PlaybackState {
        self.state.snapshot()
    }

    pub fn status(&self) -> PlaybackStatus {
        self.state.status()
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    /// `play_time / duration`, 0 while the duration is unknown
    pub fn progress(&self) -> f64 {
        self.state.progress()
    }

    pub fn has_item(&self) -> bool {
        self.state.has_item()
    }
}
