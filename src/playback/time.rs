//! Seek serialization and progress computation
//!
//! Only one seek is active at a time. Issuing a new seek replaces the
//! active ticket, so the completion of the older request no longer matches
//! and is ignored. While a ticket is active, periodic time samples are
//! suppressed so they cannot drag the position back to a pre-seek value.

use crate::engine::{Generation, SeekTicket};
use crate::error::PlaybackError;

/// `play_time / duration`, 0 when the duration is zero or unusable
pub fn progress(play_time: f64, duration: f64) -> f64 {
    if !duration.is_finite() || duration <= 0.0 || !play_time.is_finite() {
        return 0.0;
    }
    play_time / duration
}

/// Tracks the single active seek for the current generation
#[derive(Debug, Default)]
pub struct SeekController {
    active: Option<SeekTicket>,
    next_id: u64,
}

impl SeekController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_seeking(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<SeekTicket> {
        self.active
    }

    /// Normalize a requested target against the known duration
    ///
    /// Non-finite targets are rejected. Negative targets clamp to 0 and,
    /// once the duration is known, targets past the end clamp to it.
    pub fn validate_target(target: f64, duration: f64) -> Result<f64, PlaybackError> {
        if !target.is_finite() {
            return Err(PlaybackError::InvalidSeekTarget(target));
        }
        let mut time = target.max(0.0);
        if duration.is_finite() && duration > 0.0 {
            time = time.min(duration);
        }
        Ok(time)
    }

    /// Issue a ticket for `target`, superseding any active seek
    pub fn begin(&mut self, generation: Generation, target: f64) -> SeekTicket {
        self.next_id = self.next_id.wrapping_add(1);
        let ticket = SeekTicket {
            generation,
            id: self.next_id,
            target,
        };
        if let Some(prev) = self.active.replace(ticket) {
            tracing::debug!(
                "Seek #{} to {:.3}s supersedes #{} to {:.3}s",
                ticket.id,
                target,
                prev.id,
                prev.target
            );
        }
        ticket
    }

    /// Accept a completion only if it is the active seek of `current`
    ///
    /// Returns the honoured ticket and leaves seeking mode. Anything else is
    /// a stale callback and changes nothing.
    pub fn complete(
        &mut self,
        ticket: &SeekTicket,
        current: Generation,
    ) -> Result<SeekTicket, PlaybackError> {
        match self.active {
            Some(active) if ticket.generation == current && active.same_request(ticket) => {
                self.active = None;
                Ok(active)
            }
            _ => Err(PlaybackError::StaleCallback),
        }
    }

    /// Periodic samples only apply outside of seeking mode
    pub fn accepts_tick(&self) -> bool {
        self.active.is_none()
    }

    /// Forget the active seek without honouring it
    pub fn cancel(&mut self) {
        self.active = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_is_zero_without_duration() {
        assert_eq!(progress(0.0, 0.0), 0.0);
        assert_eq!(progress(42.0, 0.0), 0.0);
        assert_eq!(progress(42.0, f64::NAN), 0.0);
    }

    #[test]
    fn test_progress_is_ratio() {
        assert!((progress(39.0, 156.0) - 0.25).abs() < 1e-9);
        assert_eq!(progress(156.0, 156.0), 1.0);
    }

    #[test]
    fn test_validate_target_drops_non_finite() {
        assert!(SeekController::validate_target(f64::NAN, 100.0).is_err());
        assert!(SeekController::validate_target(f64::INFINITY, 100.0).is_err());
    }

    #[test]
    fn test_validate_target_clamps() {
        assert_eq!(SeekController::validate_target(-5.0, 100.0).unwrap(), 0.0);
        assert_eq!(SeekController::validate_target(150.0, 100.0).unwrap(), 100.0);
        // Unknown duration, no upper clamp
        assert_eq!(SeekController::validate_target(150.0, 0.0).unwrap(), 150.0);
    }

    #[test]
    fn test_newer_seek_supersedes_older() {
        let generation = Generation::default().next();
        let mut seeks = SeekController::new();

        let first = seeks.begin(generation, 40.0);
        let second = seeks.begin(generation, 0.0);
        assert!(!seeks.accepts_tick());

        assert!(seeks.complete(&first, generation).is_err());
        assert!(seeks.is_seeking());

        let honoured = seeks.complete(&second, generation).unwrap();
        assert_eq!(honoured.target, 0.0);
        assert!(seeks.accepts_tick());
    }

    #[test]
    fn test_completion_from_old_generation_is_stale() {
        let old = Generation::default().next();
        let new = old.next();
        let mut seeks = SeekController::new();

        let ticket = seeks.begin(old, 10.0);
        assert!(matches!(
            seeks.complete(&ticket, new),
            Err(PlaybackError::StaleCallback)
        ));
        assert!(seeks.is_seeking());
    }

    #[test]
    fn test_cancel_clears_seeking() {
        let mut seeks = SeekController::new();
        let ticket = seeks.begin(Generation::default(), 3.0);
        seeks.cancel();
        assert!(seeks.accepts_tick());
        assert!(seeks.complete(&ticket, Generation::default()).is_err());
    }
}
