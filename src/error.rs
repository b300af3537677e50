//! Error taxonomy for the playback core
//!
//! Most of these never reach a caller: invalid seek targets and stale
//! callbacks are dropped where they are detected. They exist so the
//! dropping sites can log a typed reason.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the playback core
#[derive(Debug, Clone, Error)]
pub enum PlaybackError {
    /// Seek target was non-finite or resolved to an unusable time
    #[error("invalid seek target: {0}")]
    InvalidSeekTarget(f64),
    /// A control call arrived while no playable item is attached
    #[error("no current item")]
    NoCurrentItem,
    /// The engine or the resource collaborator could not load the item
    #[error("engine failed to load item: {0}")]
    EngineLoadFailure(String),
    /// A callback tagged with a superseded generation or seek
    #[error("stale callback")]
    StaleCallback,
    /// The resource collaborator rejected a locator
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    /// The coordinator thread has exited
    #[error("coordinator is not running")]
    CoordinatorGone,
}

/// Errors from resolving a locator into a playable handle
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("file not found: {0:?}")]
    NotFound(PathBuf),
    #[error("invalid locator: {0}")]
    InvalidLocator(String),
    #[error("resource IO error: {0}")]
    Io(String),
}

/// Result reported back to the remote-command source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Success,
    /// No item is attached, nothing to act on
    NoSuchContent,
    /// The command kind is currently disabled
    CommandDisabled,
    /// The coordinator could not process the command
    CommandFailed,
}

impl CommandStatus {
    pub fn is_success(self) -> bool {
        self == CommandStatus::Success
    }
}

impl From<PlaybackError> for CommandStatus {
    fn from(err: PlaybackError) -> Self {
        match err {
            PlaybackError::NoCurrentItem => CommandStatus::NoSuchContent,
            _ => CommandStatus::CommandFailed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_item_maps_to_no_such_content() {
        assert_eq!(
            CommandStatus::from(PlaybackError::NoCurrentItem),
            CommandStatus::NoSuchContent
        );
        assert_eq!(
            CommandStatus::from(PlaybackError::EngineLoadFailure("boom".into())),
            CommandStatus::CommandFailed
        );
    }

    #[test]
    fn test_resolve_error_is_transparent() {
        let err = PlaybackError::from(ResolveError::InvalidLocator("ftp://x".into()));
        assert_eq!(err.to_string(), "invalid locator: ftp://x");
    }
}
