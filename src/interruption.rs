//! Audio session interruption and route-change reactions
//!
//! One-shot rules, no retries and no state of their own:
//! - interruption began: pause
//! - interruption ended: play, if allowed by settings and hinted by the session
//! - new output device: play
//! - old output device gone: pause

use crate::playback::PlaybackControl;

/// External audio session interruption
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptionEvent {
    Began,
    Ended {
        /// Session hint that playback may resume
        should_resume: bool,
    },
}

/// Why the audio output route changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteChangeReason {
    NewDeviceAvailable,
    OldDeviceUnavailable,
    CategoryChange,
    Override,
    Unknown,
}

/// Applies interruption and route-change rules to the coordinator
#[derive(Debug, Clone, Copy)]
pub struct InterruptionPolicy {
    should_resume_when_interrupt_ended: bool,
}

impl InterruptionPolicy {
    pub fn new(should_resume_when_interrupt_ended: bool) -> Self {
        Self {
            should_resume_when_interrupt_ended,
        }
    }

    pub fn set_should_resume(&mut self, enabled: bool) {
        self.should_resume_when_interrupt_ended = enabled;
    }

    pub fn handle_interruption(&self, event: InterruptionEvent, target: &mut impl PlaybackControl) {
        match event {
            InterruptionEvent::Began => {
                tracing::info!("Audio interruption began, pausing");
                target.pause();
            }
            InterruptionEvent::Ended { should_resume } => {
                if self.should_resume_when_interrupt_ended && should_resume {
                    tracing::info!("Audio interruption ended, resuming");
                    target.play();
                } else {
                    tracing::debug!(
                        "Audio interruption ended, staying paused (allowed={}, hint={})",
                        self.should_resume_when_interrupt_ended,
                        should_resume
                    );
                }
            }
        }
    }

    pub fn handle_route_change(&self, reason: RouteChangeReason, target: &mut impl PlaybackControl) {
        match reason {
            RouteChangeReason::NewDeviceAvailable => {
                tracing::info!("New output device available, resuming");
                target.play();
            }
            RouteChangeReason::OldDeviceUnavailable => {
                tracing::info!("Output device unavailable, pausing");
                target.pause();
            }
            other => tracing::debug!("Route change ignored: {:?}", other),
        }
    }
}
