//! Playback coordination
//!
//! This module provides the single-writer playback core:
//! - `Coordinator`: state machine owning the current item and the engine
//! - `SeekController`: generation-gated seek serialization and progress math
//! - `CoordinatorHandle`: cloneable, non-blocking control surface
//! - `spawn_coordinator`: runs the coordinator on its own thread
//!
//! ## Architecture
//! ```text
//! CoordinatorHandle --[Command]---------> Coordinator thread (Coordinator)
//! Engine callbacks  --[EngineEvent]-----> Coordinator thread
//! Metadata workers  --[MetadataUpdate]--> Coordinator thread
//! CoordinatorHandle <--[SharedState]----- Coordinator thread (non-blocking reads)
//! Observers / bus   <--[PlaybackEvent]--- Coordinator thread
//! ```

mod coordinator;
pub mod events;
mod handle;
mod state;
mod thread;
mod time;

#[cfg(test)]
pub(crate) mod testing;

pub use coordinator::{Coordinator, PlaybackControl};
pub use events::{Command, PlaybackEvent};
pub use handle::CoordinatorHandle;
pub use state::{PlaybackState, PlaybackStatus, SharedPlaybackState};
pub use thread::{CoordinatorParts, CoordinatorThread, spawn_coordinator};
pub use time::{SeekController, progress};
