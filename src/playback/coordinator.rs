//! Playback state machine
//!
//! `Coordinator` is the single writer of `PlaybackState`. It is driven
//! synchronously: the coordinator thread feeds it control commands, engine
//! events and metadata results one at a time, in arrival order.
//!
//! ## Status transitions
//! ```text
//! setup_item        any       -> Prepare   (Error if the locator cannot be resolved)
//! play              Prepare/Paused/Stopped/Completed/Error -> Playing
//! pause             Playing/Prepare -> Paused
//! stop              any       -> Stopped
//! engine failure    any       -> Error
//! played to end     any       -> Completed
//! ```
//!
//! Item-scoped engine events carry the generation they were loaded with;
//! seek completions carry their ticket. Anything that does not match the
//! current generation or the active seek is dropped.

use std::sync::Arc;

use super::events::{Command, CoordinatorSender, PlaybackEvent};
use super::state::{PlaybackState, PlaybackStatus, SharedPlaybackState};
use super::time::SeekController;
use crate::engine::{
    EngineEvent, EngineEventSender, Generation, PlayableHandle, PlayerEngine, SeekTicket,
    TimeObserverToken,
};
use crate::error::{CommandStatus, PlaybackError};
use crate::item::AudioItem;
use crate::metadata::{DisplayMetadata, MetadataPayload, MetadataPipeline, MetadataUpdate};
use crate::now_playing::{NowPlayingInfo, NowPlayingPublisher};
use crate::observer::{EventBus, ObserverRegistry};
use crate::resource::{DefaultResolver, ResourceResolver};
use crate::settings::Settings;

/// Control surface shared by the remote router and the interruption policy
pub trait PlaybackControl {
    /// Whether an item has been set up
    fn has_item(&self) -> bool;

    fn status(&self) -> PlaybackStatus;

    fn play(&mut self);

    fn pause(&mut self);

    fn stop(&mut self);

    fn toggle_play_pause(&mut self);

    /// `NoSuchContent` without an attached item, otherwise requests the next track
    fn next_track(&mut self) -> CommandStatus;

    fn previous_track(&mut self) -> CommandStatus;

    fn skip_forward(&mut self, interval: f64);

    fn skip_backward(&mut self, interval: f64);

    fn seek_to_position(&mut self, seconds: f64);

    fn begin_rewind(&mut self, rate: f32);

    fn begin_fast_forward(&mut self, rate: f32);

    fn end_rewind_fast_forward(&mut self);
}

/// Begin-time positioning progress of the current item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadyPhase {
    /// Engine has not reported ready yet
    Waiting,
    /// Seeking to the begin time
    Seeking,
    /// Ready notification sent
    Done,
}

#[derive(Debug)]
struct CurrentItem {
    item: AudioItem,
    begin_time: f64,
    handle: Option<PlayableHandle>,
    /// Engine item removed by `stop()`
    detached: bool,
    ready: ReadyPhase,
}

impl CurrentItem {
    fn is_attached(&self) -> bool {
        self.handle.is_some() && !self.detached
    }
}

/// The playback state machine
pub struct Coordinator<E: PlayerEngine> {
    engine: E,
    settings: Settings,
    resolver: Arc<dyn ResourceResolver>,
    metadata: Option<MetadataPipeline>,
    now_playing: Option<Box<dyn NowPlayingPublisher>>,
    observers: ObserverRegistry,
    bus: EventBus,
    shared: SharedPlaybackState,
    state: PlaybackState,
    generation: Generation,
    seeks: SeekController,
    current: Option<CurrentItem>,
    display: DisplayMetadata,
    time_observer: Option<TimeObserverToken>,
}

impl<E: PlayerEngine> std::fmt::Debug for Coordinator<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("state", &self.state)
            .field("generation", &self.generation)
            .field("seek", &self.seeks.active())
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

impl<E: PlayerEngine> Coordinator<E> {
    /// Bind `engine` to the coordinator queue behind `tx`
    ///
    /// Installs the periodic time observer right away.
    pub fn new(mut engine: E, settings: Settings, tx: CoordinatorSender) -> Self {
        engine.bind(EngineEventSender::new(tx));
        let token = engine.add_periodic_time_observer(settings.playback.observe_time_interval());

        Self {
            engine,
            settings,
            resolver: Arc::new(DefaultResolver::default()),
            metadata: None,
            now_playing: None,
            observers: ObserverRegistry::new(),
            bus: EventBus::default(),
            shared: SharedPlaybackState::new(),
            state: PlaybackState::default(),
            generation: Generation::default(),
            seeks: SeekController::new(),
            current: None,
            display: DisplayMetadata::default(),
            time_observer: Some(token),
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn ResourceResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_metadata_pipeline(mut self, pipeline: MetadataPipeline) -> Self {
        self.metadata = Some(pipeline);
        self
    }

    pub fn with_now_playing(mut self, publisher: Box<dyn NowPlayingPublisher>) -> Self {
        self.now_playing = Some(publisher);
        self
    }

    pub fn with_observers(mut self, observers: ObserverRegistry) -> Self {
        self.observers = observers;
        self
    }

    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.bus = bus;
        self
    }

    pub fn with_shared_state(mut self, shared: SharedPlaybackState) -> Self {
        self.shared = shared;
        self.sync_shared();
        self
    }

    // ============ Accessors ============

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn display_metadata(&self) -> &DisplayMetadata {
        &self.display
    }

    pub fn current_item(&self) -> Option<&AudioItem> {
        self.current.as_ref().map(|c| &c.item)
    }

    pub fn is_seeking(&self) -> bool {
        self.seeks.is_seeking()
    }

    pub fn observers(&self) -> &ObserverRegistry {
        &self.observers
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    // ============ Message Entry Points ============

    /// Apply one control command
    pub fn handle_command(&mut self, command: Command) {
        match command {
            Command::SetupItem { item, begin_time } => self.setup_item(item, begin_time),
            Command::Play => self.play(),
            Command::Pause => self.pause(),
            Command::TogglePlayPause => self.toggle_play_pause(),
            Command::Stop => self.stop(),
            Command::NextTrack => {
                self.next_track();
            }
            Command::PreviousTrack => {
                self.previous_track();
            }
            Command::SkipForward { interval } => self.skip_forward(interval),
            Command::SkipBackward { interval } => self.skip_backward(interval),
            Command::SeekToPosition { seconds } => self.seek_to_position(seconds),
            Command::SeekToProgress { progress } => self.seek_to_progress(progress),
            Command::BeginRewind { rate } => self.begin_rewind(rate),
            Command::BeginFastForward { rate } => self.begin_fast_forward(rate),
            Command::EndRewindFastForward => self.end_rewind_fast_forward(),
            Command::SetVolume { volume } => self.set_volume(volume),
            Command::SetMuted { muted } => self.set_muted(muted),
            Command::UpdateSettings(settings) => self.update_settings(*settings),
        }
    }

    /// Apply one engine callback
    pub fn handle_engine_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Ready {
                generation,
                duration,
            } => {
                if self.is_current(generation, "ready") {
                    self.on_ready(duration);
                }
            }
            EngineEvent::Failed {
                generation,
                message,
            } => {
                if self.is_current(generation, "failure") {
                    tracing::error!("{}", PlaybackError::EngineLoadFailure(message));
                    self.seeks.cancel();
                    self.set_status(PlaybackStatus::Error);
                }
            }
            EngineEvent::LoadedRangeChanged {
                generation,
                range_end,
            } => {
                if self.is_current(generation, "loaded range") && range_end.is_finite() {
                    self.set_loaded_time(range_end.max(0.0));
                }
            }
            EngineEvent::PlaybackEnded { generation } => {
                if self.is_current(generation, "end of item") {
                    self.on_ended();
                }
            }
            EngineEvent::RateChanged { rate } => {
                if rate.is_finite() && rate != self.state.rate {
                    self.state.rate = rate;
                    self.emit(PlaybackEvent::RateChanged(rate));
                    self.publish_now_playing();
                }
            }
            EngineEvent::SeekCompleted { ticket, finished } => {
                self.on_seek_completed(ticket, finished);
            }
            EngineEvent::TimeTick { token, position } => {
                self.on_time_tick(token, position);
            }
        }
        self.sync_shared();
    }

    /// Apply one metadata resolution result
    pub fn handle_metadata(&mut self, update: MetadataUpdate) {
        if update.generation != self.generation || self.current.is_none() {
            tracing::trace!(
                "Dropping metadata for {} (current {})",
                update.generation,
                self.generation
            );
            return;
        }

        let mut display = self.display.clone();
        match update.payload {
            MetadataPayload::Text {
                title,
                album,
                artist,
            } => {
                display.title = title;
                display.album = album;
                display.artist = artist;
            }
            MetadataPayload::Artwork(artwork) => display.artwork = artwork,
        }

        if display != self.display {
            self.display = display;
            self.emit(PlaybackEvent::MetadataResolved(self.display.clone()));
            self.publish_now_playing();
        }
    }

    // ============ Control Surface ============

    /// Make `item` current and position it at `begin_time` once ready
    ///
    /// Invalidates every in-flight seek and metadata run of the previous item.
    pub fn setup_item(&mut self, item: AudioItem, begin_time: f64) {
        let begin_time = if begin_time.is_finite() {
            begin_time.max(0.0)
        } else {
            tracing::warn!("Invalid begin time {}, using 0", begin_time);
            0.0
        };

        self.generation = self.generation.next();
        self.seeks.cancel();
        tracing::info!(
            "Setting up {} at {:.3}s ({})",
            item.locator,
            begin_time,
            self.generation
        );

        self.set_play_time(0.0);
        self.set_duration(0.0);
        self.set_loaded_time(0.0);
        if self.state.rate != 0.0 {
            self.state.rate = 0.0;
            self.emit(PlaybackEvent::RateChanged(0.0));
        }

        let display = if item.use_embedded_metadata {
            DisplayMetadata::default()
        } else {
            DisplayMetadata::supplied(&item)
        };
        if display != self.display {
            self.display = display;
            self.emit(PlaybackEvent::MetadataResolved(self.display.clone()));
        }

        let resolved = self
            .resolver
            .resolve_playable_handle(&item.locator, self.settings.playback.caching_enabled);

        let mut current = CurrentItem {
            item,
            begin_time,
            handle: None,
            detached: false,
            ready: ReadyPhase::Waiting,
        };

        match resolved {
            Ok(handle) => {
                self.engine.load_item(handle.clone(), self.generation);
                if let Some(pipeline) = &self.metadata {
                    pipeline.spawn(
                        self.generation,
                        &current.item,
                        &handle,
                        self.settings.artwork.target_size,
                    );
                }
                current.handle = Some(handle);
                self.current = Some(current);
                self.set_status(PlaybackStatus::Prepare);
            }
            Err(e) => {
                let err = PlaybackError::from(e);
                tracing::warn!("Failed to resolve {}: {}", current.item.locator, err);
                self.engine.stop();
                self.current = Some(current);
                self.set_status(PlaybackStatus::Error);
            }
        }

        self.publish_now_playing();
        self.sync_shared();
    }

    pub fn play(&mut self) {
        let Some(current) = &mut self.current else {
            tracing::debug!("play() ignored, no current item");
            return;
        };

        match self.state.status {
            PlaybackStatus::Playing => self.engine.play(),
            PlaybackStatus::Prepare | PlaybackStatus::Paused => {
                self.engine.play();
                self.set_status(PlaybackStatus::Playing);
            }
            PlaybackStatus::Stopped => {
                let Some(handle) = current.handle.clone() else {
                    return self.retry_setup();
                };
                tracing::debug!("Re-supplying {} after stop", handle.locator);
                current.detached = false;
                current.ready = ReadyPhase::Done;
                self.engine.load_item(handle, self.generation);
                self.set_play_time(0.0);
                self.engine.play();
                self.set_status(PlaybackStatus::Playing);
            }
            PlaybackStatus::Completed => {
                self.seek_to(0.0);
                self.engine.play();
                self.set_status(PlaybackStatus::Playing);
            }
            PlaybackStatus::Error => self.retry_setup(),
        }
        self.sync_shared();
    }

    pub fn pause(&mut self) {
        if self.current.is_none() {
            return;
        }
        match self.state.status {
            PlaybackStatus::Playing | PlaybackStatus::Prepare => {
                self.engine.pause();
                self.set_status(PlaybackStatus::Paused);
                self.sync_shared();
            }
            other => tracing::debug!("pause() ignored while {}", other),
        }
    }

    pub fn toggle_play_pause(&mut self) {
        if self.state.status == PlaybackStatus::Playing {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Detach the engine's item; `play()` re-supplies it
    pub fn stop(&mut self) {
        let Some(current) = &mut self.current else {
            return;
        };
        current.detached = true;
        self.seeks.cancel();
        self.engine.pause();
        self.engine.stop();
        self.set_status(PlaybackStatus::Stopped);
        self.publish_now_playing();
        self.sync_shared();
    }

    /// Ask observers for the next item; needs an attached item
    pub fn next_track(&mut self) -> CommandStatus {
        if let Err(e) = self.require_attached() {
            tracing::debug!("next_track() ignored: {}", e);
            return e.into();
        }
        self.emit(PlaybackEvent::NextTrackRequested);
        CommandStatus::Success
    }

    pub fn previous_track(&mut self) -> CommandStatus {
        if let Err(e) = self.require_attached() {
            tracing::debug!("previous_track() ignored: {}", e);
            return e.into();
        }
        self.emit(PlaybackEvent::PreviousTrackRequested);
        CommandStatus::Success
    }

    pub fn skip_forward(&mut self, interval: f64) {
        if self.can_seek() {
            let position = self.engine.current_position();
            self.seek_to(position + interval);
        }
    }

    pub fn skip_backward(&mut self, interval: f64) {
        if self.can_seek() {
            let position = self.engine.current_position();
            self.seek_to(position - interval);
        }
    }

    pub fn seek_to_position(&mut self, seconds: f64) {
        self.seek_to(seconds);
    }

    /// Seek to `progress` of the duration; values outside `[0, 1]` are ignored
    pub fn seek_to_progress(&mut self, progress: f64) {
        if !(0.0..=1.0).contains(&progress) {
            tracing::debug!("Dropping seek to progress {}", progress);
            return;
        }
        let duration = if self.state.duration > 0.0 {
            self.state.duration
        } else {
            self.engine.current_duration()
        };
        self.seek_to(duration * progress);
    }

    pub fn begin_rewind(&mut self, rate: f32) {
        self.apply_rate(rate);
    }

    pub fn begin_fast_forward(&mut self, rate: f32) {
        self.apply_rate(rate);
    }

    pub fn end_rewind_fast_forward(&mut self) {
        self.apply_rate(1.0);
    }

    /// Set output volume, clamped to `[0, 1]`
    pub fn set_volume(&mut self, volume: f32) {
        if volume.is_nan() {
            return;
        }
        let volume = volume.clamp(0.0, 1.0);
        self.engine.set_volume(volume);
        self.state.volume = volume;
        self.sync_shared();
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.engine.set_muted(muted);
        self.state.muted = muted;
        self.sync_shared();
    }

    /// Replace settings, reinstalling the time observer if its interval changed
    pub fn update_settings(&mut self, settings: Settings) {
        if let Err(e) = settings.validate() {
            tracing::warn!("Ignoring settings update: {}", e);
            return;
        }

        let interval_changed =
            settings.playback.observe_time_interval_ms != self.settings.playback.observe_time_interval_ms;
        let now_playing_changed = settings.now_playing.enabled != self.settings.now_playing.enabled;
        self.settings = settings;

        if interval_changed {
            if let Some(token) = self.time_observer.take() {
                self.engine.remove_time_observer(token);
            }
            let interval = self.settings.playback.observe_time_interval();
            tracing::debug!("Time observer interval set to {:?}", interval);
            self.time_observer = Some(self.engine.add_periodic_time_observer(interval));
        }
        if now_playing_changed {
            self.publish_now_playing();
        }
    }

    /// Detach everything before the coordinator goes away
    pub fn shutdown(&mut self) {
        tracing::info!("Coordinator shutting down");
        self.seeks.cancel();
        if self.current.take().is_some() {
            self.engine.pause();
            self.engine.stop();
        }
        if let Some(token) = self.time_observer.take() {
            self.engine.remove_time_observer(token);
        }
        self.publish_now_playing();
        self.sync_shared();
    }

    // ============ Internals ============

    fn is_current(&self, generation: Generation, what: &str) -> bool {
        let current = generation == self.generation && self.current.is_some();
        if !current {
            tracing::trace!(
                "Dropping stale {} for {} (current {})",
                what,
                generation,
                self.generation
            );
        }
        current
    }

    fn can_seek(&self) -> bool {
        self.current.as_ref().is_some_and(CurrentItem::is_attached)
    }

    fn require_attached(&self) -> Result<(), PlaybackError> {
        if self.can_seek() {
            Ok(())
        } else {
            Err(PlaybackError::NoCurrentItem)
        }
    }

    fn retry_setup(&mut self) {
        let Some(current) = &self.current else {
            return;
        };
        let item = current.item.clone();
        let begin_time = current.begin_time;
        tracing::info!("Retrying {} from scratch", item.locator);

        self.setup_item(item, begin_time);
        if self.state.status == PlaybackStatus::Prepare {
            self.engine.play();
            self.set_status(PlaybackStatus::Playing);
        }
    }

    fn apply_rate(&mut self, rate: f32) {
        if !self.can_seek() || !rate.is_finite() {
            return;
        }
        self.engine.set_rate(rate);
    }

    /// Single seek primitive every seek-like operation funnels through
    fn seek_to(&mut self, target: f64) {
        if !self.can_seek() {
            tracing::debug!("Seek ignored, no attached item");
            return;
        }
        match SeekController::validate_target(target, self.state.duration) {
            Ok(time) => {
                self.issue_seek(time);
            }
            Err(e) => tracing::debug!("Dropping seek: {}", e),
        }
    }

    fn issue_seek(&mut self, target: f64) -> SeekTicket {
        let ticket = self.seeks.begin(self.generation, target);
        tracing::debug!("Seek #{} to {:.3}s ({})", ticket.id, target, self.generation);
        self.engine.seek(ticket);
        ticket
    }

    fn on_ready(&mut self, duration: f64) {
        let duration = if duration.is_finite() && duration > 0.0 {
            duration
        } else {
            0.0
        };
        self.set_duration(duration);

        let status = self.state.status;
        let Some(current) = &mut self.current else {
            return;
        };
        let positionable = matches!(
            status,
            PlaybackStatus::Prepare | PlaybackStatus::Playing | PlaybackStatus::Paused
        );
        if current.ready != ReadyPhase::Waiting || !positionable || current.detached {
            tracing::debug!("Ready for {} while {}, duration only", self.generation, status);
            return;
        }

        current.ready = ReadyPhase::Seeking;
        let target =
            SeekController::validate_target(current.begin_time, duration).unwrap_or_default();
        tracing::info!("Item ready, duration {:.3}s, seeking to {:.3}s", duration, target);
        self.issue_seek(target);
    }

    fn on_seek_completed(&mut self, ticket: SeekTicket, finished: bool) {
        let honoured = match self.seeks.complete(&ticket, self.generation) {
            Ok(honoured) => honoured,
            Err(_) => {
                tracing::trace!("Dropping stale seek completion #{} ({})", ticket.id, ticket.generation);
                return;
            }
        };

        if finished {
            self.set_play_time(honoured.target);
        }
        self.publish_now_playing();

        let announce = match &mut self.current {
            Some(current) if current.ready == ReadyPhase::Seeking => {
                current.ready = ReadyPhase::Done;
                true
            }
            _ => false,
        };
        if announce {
            self.emit(PlaybackEvent::ReadyToPlay);
            if self.settings.playback.auto_play_when_item_ready
                && self.state.status == PlaybackStatus::Prepare
            {
                self.play();
            }
        }
    }

    fn on_time_tick(&mut self, token: TimeObserverToken, position: f64) {
        if self.time_observer != Some(token) {
            tracing::trace!("Dropping tick from removed observer {:?}", token);
            return;
        }
        if !self.seeks.accepts_tick() || !self.can_seek() || !position.is_finite() {
            return;
        }
        self.set_play_time(position.max(0.0));
    }

    fn on_ended(&mut self) {
        self.seeks.cancel();
        let duration = if self.state.duration > 0.0 {
            self.state.duration
        } else {
            let engine_duration = self.engine.current_duration();
            if engine_duration.is_finite() {
                engine_duration.max(0.0)
            } else {
                self.state.play_time
            }
        };

        // Always announced, so time-then-status observers see the final frame
        self.state.play_time = duration;
        self.emit(PlaybackEvent::TimeChanged(duration));
        self.set_status(PlaybackStatus::Completed);
    }

    fn set_status(&mut self, status: PlaybackStatus) {
        if self.state.status == status {
            return;
        }
        tracing::info!("Playback status: {} -> {}", self.state.status, status);
        self.state.status = status;
        self.emit(PlaybackEvent::StatusChanged(status));
        self.publish_now_playing();
    }

    fn set_play_time(&mut self, seconds: f64) {
        if self.state.play_time != seconds {
            self.state.play_time = seconds;
            self.emit(PlaybackEvent::TimeChanged(seconds));
        }
    }

    fn set_duration(&mut self, seconds: f64) {
        if self.state.duration != seconds {
            self.state.duration = seconds;
            self.emit(PlaybackEvent::DurationKnown(seconds));
        }
    }

    fn set_loaded_time(&mut self, seconds: f64) {
        if self.state.loaded_time != seconds {
            self.state.loaded_time = seconds;
            self.emit(PlaybackEvent::LoadedTimeChanged(seconds));
        }
    }

    fn emit(&self, event: PlaybackEvent) {
        self.observers.notify_all(&event);
        self.bus.publish(event);
    }

    fn publish_now_playing(&mut self) {
        let Some(publisher) = &mut self.now_playing else {
            return;
        };
        let showing = self.settings.now_playing.enabled
            && self.current.as_ref().is_some_and(CurrentItem::is_attached);
        let info = showing.then(|| NowPlayingInfo::from_parts(&self.display, &self.state));
        publisher.publish(info);
    }

    fn sync_shared(&self) {
        self.shared.publish(&self.state, self.current.is_some());
    }
}

impl<E: PlayerEngine> PlaybackControl for Coordinator<E> {
    fn has_item(&self) -> bool {
        self.current.is_some()
    }

    fn status(&self) -> PlaybackStatus {
        self.state.status
    }

    fn play(&mut self) {
        Coordinator::play(self)
    }

    fn pause(&mut self) {
        Coordinator::pause(self)
    }

    fn stop(&mut self) {
        Coordinator::stop(self)
    }

    fn toggle_play_pause(&mut self) {
        Coordinator::toggle_play_pause(self)
    }

    fn next_track(&mut self) -> CommandStatus {
        Coordinator::next_track(self)
    }

    fn previous_track(&mut self) -> CommandStatus {
        Coordinator::previous_track(self)
    }

    fn skip_forward(&mut self, interval: f64) {
        Coordinator::skip_forward(self, interval)
    }

    fn skip_backward(&mut self, interval: f64) {
        Coordinator::skip_backward(self, interval)
    }

    fn seek_to_position(&mut self, seconds: f64) {
        Coordinator::seek_to_position(self, seconds)
    }

    fn begin_rewind(&mut self, rate: f32) {
        Coordinator::begin_rewind(self, rate)
    }

    fn begin_fast_forward(&mut self, rate: f32) {
        Coordinator::begin_fast_forward(self, rate)
    }

    fn end_rewind_fast_forward(&mut self) {
        Coordinator::end_rewind_fast_forward(self)
    }
}
