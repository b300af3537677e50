//! Test doubles for the playback core

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::events::PlaybackEvent;
use super::{PlaybackControl, PlaybackStatus};
use crate::engine::{
    EngineEvent, EngineEventSender, Generation, PlayableHandle, PlayerEngine, SeekTicket,
    TimeObserverToken,
};
use crate::error::{CommandStatus, ResolveError};
use crate::item::Locator;
use crate::metadata::DisplayMetadata;
use crate::now_playing::{NowPlayingInfo, NowPlayingPublisher};
use crate::observer::PlaybackObserver;
use crate::resource::ResourceResolver;

// ============ Engine ============

#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Load(Generation),
    Stop,
    Play,
    Pause,
    SetRate(f32),
    Seek(SeekTicket),
    AddObserver(Duration),
    RemoveObserver(TimeObserverToken),
    SetVolume(f32),
    SetMuted(bool),
}

#[derive(Debug, Default)]
pub struct MockEngineState {
    pub calls: Vec<EngineCall>,
    pub position: f64,
    pub duration: f64,
    /// Answer `load_item` with `Ready { duration }` through the bound sender
    pub ready_duration: Option<f64>,
    /// Answer `seek` with a finished completion through the bound sender
    pub auto_complete_seeks: bool,
    events: Option<EngineEventSender>,
    next_token: u64,
}

/// Scripted engine recording every call
///
/// Clones share state, so a test can keep one while the coordinator owns
/// the other.
#[derive(Debug, Clone, Default)]
pub struct MockEngine {
    pub state: Arc<Mutex<MockEngineState>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine that reports ready and completes seeks on its own
    pub fn responsive(duration: f64) -> Self {
        let engine = Self::new();
        {
            let mut state = engine.state.lock();
            state.ready_duration = Some(duration);
            state.auto_complete_seeks = true;
            state.duration = duration;
        }
        engine
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.state.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    pub fn seeks(&self) -> Vec<SeekTicket> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                EngineCall::Seek(ticket) => Some(ticket),
                _ => None,
            })
            .collect()
    }

    pub fn last_seek(&self) -> Option<SeekTicket> {
        self.seeks().pop()
    }

    pub fn set_position(&self, position: f64) {
        self.state.lock().position = position;
    }

    pub fn last_token(&self) -> Option<TimeObserverToken> {
        let state = self.state.lock();
        (state.next_token > 0).then(|| TimeObserverToken(state.next_token))
    }

    fn record(&self, call: EngineCall) {
        self.state.lock().calls.push(call);
    }

    fn send(&self, event: EngineEvent) {
        let sender = self.state.lock().events.clone();
        if let Some(sender) = sender {
            sender.send(event);
        }
    }
}

impl PlayerEngine for MockEngine {
    fn bind(&mut self, events: EngineEventSender) {
        self.state.lock().events = Some(events);
    }

    fn load_item(&mut self, _handle: PlayableHandle, generation: Generation) {
        self.record(EngineCall::Load(generation));
        let ready = {
            let mut state = self.state.lock();
            state.position = 0.0;
            state.ready_duration
        };
        if let Some(duration) = ready {
            self.send(EngineEvent::Ready {
                generation,
                duration,
            });
        }
    }

    fn stop(&mut self) {
        self.record(EngineCall::Stop);
    }

    fn play(&mut self) {
        self.record(EngineCall::Play);
    }

    fn pause(&mut self) {
        self.record(EngineCall::Pause);
    }

    fn set_rate(&mut self, rate: f32) {
        self.record(EngineCall::SetRate(rate));
    }

    fn seek(&mut self, ticket: SeekTicket) {
        self.record(EngineCall::Seek(ticket));
        let auto = {
            let mut state = self.state.lock();
            if state.auto_complete_seeks {
                state.position = ticket.target;
            }
            state.auto_complete_seeks
        };
        if auto {
            self.send(EngineEvent::SeekCompleted {
                ticket,
                finished: true,
            });
        }
    }

    fn add_periodic_time_observer(&mut self, interval: Duration) -> TimeObserverToken {
        self.record(EngineCall::AddObserver(interval));
        let mut state = self.state.lock();
        state.next_token += 1;
        TimeObserverToken(state.next_token)
    }

    fn remove_time_observer(&mut self, token: TimeObserverToken) {
        self.record(EngineCall::RemoveObserver(token));
    }

    fn current_position(&self) -> f64 {
        self.state.lock().position
    }

    fn current_duration(&self) -> f64 {
        self.state.lock().duration
    }

    fn set_volume(&mut self, volume: f32) {
        self.record(EngineCall::SetVolume(volume));
    }

    fn set_muted(&mut self, muted: bool) {
        self.record(EngineCall::SetMuted(muted));
    }
}

// ============ Collaborators ============

/// Resolves every locator directly, no filesystem checks
#[derive(Debug, Default)]
pub struct PassthroughResolver;

impl ResourceResolver for PassthroughResolver {
    fn resolve_playable_handle(
        &self,
        locator: &Locator,
        _caching_enabled: bool,
    ) -> Result<PlayableHandle, ResolveError> {
        Ok(PlayableHandle::direct(locator.clone()))
    }
}

/// Rejects every locator
#[derive(Debug, Default)]
pub struct FailingResolver;

impl ResourceResolver for FailingResolver {
    fn resolve_playable_handle(
        &self,
        locator: &Locator,
        _caching_enabled: bool,
    ) -> Result<PlayableHandle, ResolveError> {
        Err(ResolveError::InvalidLocator(locator.to_string()))
    }
}

/// Records every now-playing update
#[derive(Debug, Clone, Default)]
pub struct RecordingPublisher {
    pub updates: Arc<Mutex<Vec<Option<NowPlayingInfo>>>>,
}

impl RecordingPublisher {
    pub fn last(&self) -> Option<Option<NowPlayingInfo>> {
        self.updates.lock().last().cloned()
    }
}

impl NowPlayingPublisher for RecordingPublisher {
    fn publish(&mut self, info: Option<NowPlayingInfo>) {
        self.updates.lock().push(info);
    }
}

// ============ Observers ============

/// Observer that records every callback as the event that caused it
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<PlaybackEvent>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<PlaybackEvent> {
        self.events.lock().clone()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    pub fn count(&self, pred: impl Fn(&PlaybackEvent) -> bool) -> usize {
        self.events.lock().iter().filter(|e| pred(e)).count()
    }

    fn push(&self, event: PlaybackEvent) {
        self.events.lock().push(event);
    }
}

impl PlaybackObserver for RecordingObserver {
    fn ready_to_play(&self) {
        self.push(PlaybackEvent::ReadyToPlay);
    }

    fn status_changed(&self, status: PlaybackStatus) {
        self.push(PlaybackEvent::StatusChanged(status));
    }

    fn play_time_changed(&self, seconds: f64) {
        self.push(PlaybackEvent::TimeChanged(seconds));
    }

    fn duration_known(&self, seconds: f64) {
        self.push(PlaybackEvent::DurationKnown(seconds));
    }

    fn loaded_time_changed(&self, seconds: f64) {
        self.push(PlaybackEvent::LoadedTimeChanged(seconds));
    }

    fn rate_changed(&self, rate: f32) {
        self.push(PlaybackEvent::RateChanged(rate));
    }

    fn previous_track_requested(&self) {
        self.push(PlaybackEvent::PreviousTrackRequested);
    }

    fn next_track_requested(&self) {
        self.push(PlaybackEvent::NextTrackRequested);
    }

    fn metadata_resolved(&self, metadata: &DisplayMetadata) {
        self.push(PlaybackEvent::MetadataResolved(metadata.clone()));
    }
}

// ============ Control ============

/// Minimal `PlaybackControl` for router and policy tests
#[derive(Debug)]
pub struct FakeControl {
    pub has_item: bool,
    pub status: PlaybackStatus,
    pub rate: f32,
    pub calls: Vec<String>,
}

impl FakeControl {
    pub fn playing() -> Self {
        Self {
            has_item: true,
            status: PlaybackStatus::Playing,
            rate: 1.0,
            calls: Vec::new(),
        }
    }

    pub fn empty() -> Self {
        Self {
            has_item: false,
            status: PlaybackStatus::Prepare,
            rate: 0.0,
            calls: Vec::new(),
        }
    }
}

impl PlaybackControl for FakeControl {
    fn has_item(&self) -> bool {
        self.has_item
    }

    fn status(&self) -> PlaybackStatus {
        self.status
    }

    fn play(&mut self) {
        if self.has_item {
            self.calls.push("play".into());
            self.status = PlaybackStatus::Playing;
        }
    }

    fn pause(&mut self) {
        if self.has_item {
            self.calls.push("pause".into());
            self.status = PlaybackStatus::Paused;
        }
    }

    fn stop(&mut self) {
        if self.has_item {
            self.calls.push("stop".into());
            self.status = PlaybackStatus::Stopped;
        }
    }

    fn toggle_play_pause(&mut self) {
        if self.status == PlaybackStatus::Playing {
            self.pause();
        } else {
            self.play();
        }
    }

    fn next_track(&mut self) -> CommandStatus {
        if !self.has_item {
            return CommandStatus::NoSuchContent;
        }
        self.calls.push("next".into());
        CommandStatus::Success
    }

    fn previous_track(&mut self) -> CommandStatus {
        if !self.has_item {
            return CommandStatus::NoSuchContent;
        }
        self.calls.push("previous".into());
        CommandStatus::Success
    }

    fn skip_forward(&mut self, interval: f64) {
        self.calls.push(format!("skip_forward {}", interval));
    }

    fn skip_backward(&mut self, interval: f64) {
        self.calls.push(format!("skip_backward {}", interval));
    }

    fn seek_to_position(&mut self, seconds: f64) {
        self.calls.push(format!("seek {}", seconds));
    }

    fn begin_rewind(&mut self, rate: f32) {
        self.rate = rate;
    }

    fn begin_fast_forward(&mut self, rate: f32) {
        self.rate = rate;
    }

    fn end_rewind_fast_forward(&mut self) {
        self.rate = 1.0;
    }
}
