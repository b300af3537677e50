//! Remote-control command routing
//!
//! Maps commands from headsets, lock screens and desktop media keys onto
//! the coordinator's control surface. Each command kind is gated by its own
//! enable flag; everything starts disabled.

use std::collections::HashSet;

use crate::error::CommandStatus;
use crate::playback::PlaybackControl;
use crate::settings::RemoteSettings;

// ============ Common Types ============

/// Phase of a press-and-hold scrub
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrubPhase {
    Begin,
    End,
}

/// Commands that can arrive from a remote-command source
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RemoteCommand {
    Play,
    Pause,
    Stop,
    TogglePlayPause,
    NextTrack,
    PreviousTrack,
    /// Skip by `interval` seconds, or by the preferred interval
    SkipForward { interval: Option<f64> },
    SkipBackward { interval: Option<f64> },
    SeekForward(ScrubPhase),
    SeekBackward(ScrubPhase),
    /// Absolute position in seconds
    ChangePlaybackPosition { seconds: f64 },
}

/// Enable-flag key of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Play,
    Pause,
    Stop,
    TogglePlayPause,
    NextTrack,
    PreviousTrack,
    SkipForward,
    SkipBackward,
    SeekForward,
    SeekBackward,
    ChangePlaybackPosition,
}

const PLAYBACK_KINDS: [CommandKind; 4] = [
    CommandKind::Play,
    CommandKind::Pause,
    CommandKind::Stop,
    CommandKind::TogglePlayPause,
];

impl RemoteCommand {
    pub fn kind(&self) -> CommandKind {
        match self {
            RemoteCommand::Play => CommandKind::Play,
            RemoteCommand::Pause => CommandKind::Pause,
            RemoteCommand::Stop => CommandKind::Stop,
            RemoteCommand::TogglePlayPause => CommandKind::TogglePlayPause,
            RemoteCommand::NextTrack => CommandKind::NextTrack,
            RemoteCommand::PreviousTrack => CommandKind::PreviousTrack,
            RemoteCommand::SkipForward { .. } => CommandKind::SkipForward,
            RemoteCommand::SkipBackward { .. } => CommandKind::SkipBackward,
            RemoteCommand::SeekForward(_) => CommandKind::SeekForward,
            RemoteCommand::SeekBackward(_) => CommandKind::SeekBackward,
            RemoteCommand::ChangePlaybackPosition { .. } => CommandKind::ChangePlaybackPosition,
        }
    }
}

/// Enable/disable changes, applied on the coordinator thread
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RemoteConfig {
    /// Play, pause, stop and toggle together
    PlaybackCommands(bool),
    NextTrack(bool),
    PreviousTrack(bool),
    SkipForward { enabled: bool, preferred_interval: f64 },
    SkipBackward { enabled: bool, preferred_interval: f64 },
    SeekForward(bool),
    SeekBackward(bool),
    ChangePlaybackPosition(bool),
    DisableAll,
}

// ============ Router ============

/// Enable table plus scrub rates and preferred skip intervals
#[derive(Debug, Clone)]
pub struct RemoteCommandRouter {
    enabled: HashSet<CommandKind>,
    skip_forward_interval: f64,
    skip_backward_interval: f64,
    rewind_rate: f32,
    fast_forward_rate: f32,
}

impl RemoteCommandRouter {
    pub fn new(settings: &RemoteSettings) -> Self {
        Self {
            enabled: HashSet::new(),
            skip_forward_interval: settings.skip_forward_interval_secs,
            skip_backward_interval: settings.skip_backward_interval_secs,
            rewind_rate: settings.rewind_rate,
            fast_forward_rate: settings.fast_forward_rate,
        }
    }

    /// Pick up new scrub rates; enable flags are left alone
    pub fn update_settings(&mut self, settings: &RemoteSettings) {
        self.rewind_rate = settings.rewind_rate;
        self.fast_forward_rate = settings.fast_forward_rate;
        self.skip_forward_interval = settings.skip_forward_interval_secs;
        self.skip_backward_interval = settings.skip_backward_interval_secs;
    }

    pub fn is_enabled(&self, kind: CommandKind) -> bool {
        self.enabled.contains(&kind)
    }

    /// Preferred (forward, backward) skip intervals in seconds
    pub fn preferred_skip_intervals(&self) -> (f64, f64) {
        (self.skip_forward_interval, self.skip_backward_interval)
    }

    fn set(&mut self, kind: CommandKind, enabled: bool) {
        if enabled {
            self.enabled.insert(kind);
        } else {
            self.enabled.remove(&kind);
        }
    }

    pub fn apply(&mut self, config: RemoteConfig) {
        tracing::debug!("Remote command config: {:?}", config);
        match config {
            RemoteConfig::PlaybackCommands(enabled) => {
                for kind in PLAYBACK_KINDS {
                    self.set(kind, enabled);
                }
            }
            RemoteConfig::NextTrack(enabled) => self.set(CommandKind::NextTrack, enabled),
            RemoteConfig::PreviousTrack(enabled) => self.set(CommandKind::PreviousTrack, enabled),
            RemoteConfig::SkipForward {
                enabled,
                preferred_interval,
            } => {
                if enabled && preferred_interval.is_finite() {
                    self.skip_forward_interval = preferred_interval;
                }
                self.set(CommandKind::SkipForward, enabled);
            }
            RemoteConfig::SkipBackward {
                enabled,
                preferred_interval,
            } => {
                if enabled && preferred_interval.is_finite() {
                    self.skip_backward_interval = preferred_interval;
                }
                self.set(CommandKind::SkipBackward, enabled);
            }
            RemoteConfig::SeekForward(enabled) => self.set(CommandKind::SeekForward, enabled),
            RemoteConfig::SeekBackward(enabled) => self.set(CommandKind::SeekBackward, enabled),
            RemoteConfig::ChangePlaybackPosition(enabled) => {
                self.set(CommandKind::ChangePlaybackPosition, enabled)
            }
            RemoteConfig::DisableAll => self.enabled.clear(),
        }
    }

    /// Route `command` to `target`
    pub fn handle(&self, command: RemoteCommand, target: &mut impl PlaybackControl) -> CommandStatus {
        if !self.is_enabled(command.kind()) {
            tracing::debug!("Remote command {:?} is disabled", command.kind());
            return CommandStatus::CommandDisabled;
        }

        tracing::debug!("Remote command: {:?}", command);
        match command {
            RemoteCommand::Play => target.play(),
            RemoteCommand::Pause => target.pause(),
            RemoteCommand::Stop => target.stop(),
            RemoteCommand::TogglePlayPause => target.toggle_play_pause(),
            RemoteCommand::NextTrack => return target.next_track(),
            RemoteCommand::PreviousTrack => return target.previous_track(),
            RemoteCommand::SkipForward { interval } => {
                target.skip_forward(interval.unwrap_or(self.skip_forward_interval))
            }
            RemoteCommand::SkipBackward { interval } => {
                target.skip_backward(interval.unwrap_or(self.skip_backward_interval))
            }
            RemoteCommand::SeekForward(ScrubPhase::Begin) => {
                target.begin_fast_forward(self.fast_forward_rate)
            }
            RemoteCommand::SeekBackward(ScrubPhase::Begin) => {
                target.begin_rewind(self.rewind_rate)
            }
            RemoteCommand::SeekForward(ScrubPhase::End)
            | RemoteCommand::SeekBackward(ScrubPhase::End) => target.end_rewind_fast_forward(),
            RemoteCommand::ChangePlaybackPosition { seconds } => target.seek_to_position(seconds),
        }
        CommandStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::PlaybackStatus;
    use crate::playback::testing::FakeControl;

    fn router() -> RemoteCommandRouter {
        RemoteCommandRouter::new(&RemoteSettings::default())
    }

    #[test]
    fn test_everything_starts_disabled() {
        let router = router();
        let mut control = FakeControl::playing();
        assert_eq!(
            router.handle(RemoteCommand::Pause, &mut control),
            CommandStatus::CommandDisabled
        );
        assert!(control.calls.is_empty());
    }

    #[test]
    fn test_playback_group_toggles_together() {
        let mut router = router();
        router.apply(RemoteConfig::PlaybackCommands(true));
        for kind in PLAYBACK_KINDS {
            assert!(router.is_enabled(kind));
        }
        assert!(!router.is_enabled(CommandKind::NextTrack));

        let mut control = FakeControl::playing();
        assert_eq!(
            router.handle(RemoteCommand::TogglePlayPause, &mut control),
            CommandStatus::Success
        );
        assert_eq!(control.status, PlaybackStatus::Paused);

        router.apply(RemoteConfig::PlaybackCommands(false));
        assert_eq!(
            router.handle(RemoteCommand::Play, &mut control),
            CommandStatus::CommandDisabled
        );
    }

    #[test]
    fn test_next_without_item_is_no_such_content() {
        let mut router = router();
        router.apply(RemoteConfig::NextTrack(true));
        router.apply(RemoteConfig::PreviousTrack(true));

        let mut control = FakeControl::empty();
        assert_eq!(
            router.handle(RemoteCommand::NextTrack, &mut control),
            CommandStatus::NoSuchContent
        );
        assert_eq!(
            router.handle(RemoteCommand::PreviousTrack, &mut control),
            CommandStatus::NoSuchContent
        );

        let mut control = FakeControl::playing();
        assert_eq!(
            router.handle(RemoteCommand::NextTrack, &mut control),
            CommandStatus::Success
        );
        assert_eq!(control.calls, vec!["next"]);
    }

    #[test]
    fn test_skip_uses_preferred_interval() {
        let mut router = router();
        router.apply(RemoteConfig::SkipForward {
            enabled: true,
            preferred_interval: 30.0,
        });
        router.apply(RemoteConfig::SkipBackward {
            enabled: true,
            preferred_interval: 10.0,
        });
        assert_eq!(router.preferred_skip_intervals(), (30.0, 10.0));

        let mut control = FakeControl::playing();
        router.handle(RemoteCommand::SkipForward { interval: None }, &mut control);
        router.handle(RemoteCommand::SkipBackward { interval: Some(5.0) }, &mut control);
        assert_eq!(control.calls, vec!["skip_forward 30", "skip_backward 5"]);
    }

    #[test]
    fn test_scrub_applies_and_restores_rate() {
        let mut router = router();
        router.apply(RemoteConfig::SeekForward(true));
        router.apply(RemoteConfig::SeekBackward(true));

        let mut control = FakeControl::playing();
        router.handle(RemoteCommand::SeekForward(ScrubPhase::Begin), &mut control);
        assert_eq!(control.rate, 2.0);
        router.handle(RemoteCommand::SeekForward(ScrubPhase::End), &mut control);
        assert_eq!(control.rate, 1.0);
        router.handle(RemoteCommand::SeekBackward(ScrubPhase::Begin), &mut control);
        assert_eq!(control.rate, -2.0);
        router.handle(RemoteCommand::SeekBackward(ScrubPhase::End), &mut control);
        assert_eq!(control.rate, 1.0);
    }

    #[test]
    fn test_change_position_seeks() {
        let mut router = router();
        router.apply(RemoteConfig::ChangePlaybackPosition(true));
        let mut control = FakeControl::playing();
        assert_eq!(
            router.handle(
                RemoteCommand::ChangePlaybackPosition { seconds: 42.0 },
                &mut control
            ),
            CommandStatus::Success
        );
        assert_eq!(control.calls, vec!["seek 42"]);
    }

    #[test]
    fn test_disable_all() {
        let mut router = router();
        router.apply(RemoteConfig::PlaybackCommands(true));
        router.apply(RemoteConfig::NextTrack(true));
        router.apply(RemoteConfig::DisableAll);
        assert!(!router.is_enabled(CommandKind::Play));
        assert!(!router.is_enabled(CommandKind::NextTrack));
    }

    #[test]
    fn test_update_settings_keeps_enable_table() {
        let mut router = router();
        router.apply(RemoteConfig::SeekForward(true));
        router.apply(RemoteConfig::SkipForward {
            enabled: true,
            preferred_interval: 30.0,
        });
        router.update_settings(&RemoteSettings {
            fast_forward_rate: 4.0,
            skip_forward_interval_secs: 20.0,
            skip_backward_interval_secs: 5.0,
            ..Default::default()
        });
        assert!(router.is_enabled(CommandKind::SeekForward));
        assert!(router.is_enabled(CommandKind::SkipForward));
        assert_eq!(router.preferred_skip_intervals(), (20.0, 5.0));

        let mut control = FakeControl::playing();
        router.handle(RemoteCommand::SeekForward(ScrubPhase::Begin), &mut control);
        router.handle(RemoteCommand::SkipForward { interval: None }, &mut control);
        assert_eq!(control.rate, 4.0);
        assert_eq!(control.calls.last().map(String::as_str), Some("skip_forward 20"));
    }
}
