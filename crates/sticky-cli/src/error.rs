use std::io;

use sticky_core::NoteId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] sticky_core::Error),
    #[error(transparent)]
    Validation(#[from] sticky_core::ValidationError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("No note content provided")]
    EmptyContent,
    #[error("Edited note content cannot be empty")]
    EmptyEditedContent,
    #[error("Note not found: {0}")]
    NoteNotFound(NoteId),
    #[error("Editor command failed: {0}")]
    EditorFailed(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("No private PIN is set yet. Pass --pin with 4 digits to create one.")]
    PinSetupRequired,
    #[error("Private notes are locked. Pass --pin to unlock them.")]
    PinRequired,
    #[error("Incorrect PIN")]
    IncorrectPin,
    #[error("The notes service is unreachable. Check the API URL and try again.")]
    ServiceUnavailable,
}
