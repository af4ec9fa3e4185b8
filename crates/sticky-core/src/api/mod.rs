//! Notes service API.
//!
//! [`NotesApi`] is the seam between application state and the network. The
//! HTTP implementation lives in [`http`]; tests drive the application through
//! in-memory implementations.

mod http;
mod wire;

use thiserror::Error;

use crate::error::Error;
use crate::models::{HistoryEntry, Note, NoteDraft, NoteId, User};
use crate::unlock::Pin;

pub use http::{normalize_base_url, HttpNotesClient};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Invalid API configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Session token was rejected")]
    Unauthorized,
    #[error("API error: {message}")]
    Status { status: u16, message: String },
    #[error("HTTP request failed: {0}")]
    Network(String),
    #[error("Invalid response payload: {0}")]
    InvalidPayload(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(error.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(error: serde_json::Error) -> Self {
        Self::InvalidPayload(error.to_string())
    }
}

impl From<ApiError> for Error {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::InvalidConfiguration(message) => Self::Config(message),
            ApiError::Unauthorized => {
                Self::Auth("session expired or was revoked; log in again".to_string())
            }
            ApiError::Status { status, message } => Self::Server { status, message },
            ApiError::Network(message) => Self::Network(message),
            ApiError::InvalidPayload(message) => Self::Parse(message),
        }
    }
}

/// Operations offered by the notes service. Every call carries the bearer token.
#[allow(async_fn_in_trait)]
pub trait NotesApi {
    /// All notes the user owns or that were shared with them
    async fn list_notes(&self, token: &str) -> ApiResult<Vec<Note>>;

    /// The signed-in user, including whether a PIN is set
    async fn current_user(&self, token: &str) -> ApiResult<User>;

    async fn create_note(&self, token: &str, draft: &NoteDraft) -> ApiResult<Note>;

    async fn update_note(&self, token: &str, id: NoteId, draft: &NoteDraft) -> ApiResult<Note>;

    async fn delete_note(&self, token: &str, id: NoteId) -> ApiResult<()>;

    /// Change history, newest first
    async fn note_history(&self, token: &str, id: NoteId) -> ApiResult<Vec<HistoryEntry>>;

    /// Every other user a note could be shared with
    async fn share_candidates(&self, token: &str) -> ApiResult<Vec<User>>;

    async fn share_note(&self, token: &str, id: NoteId, username: &str) -> ApiResult<()>;

    async fn set_pin(&self, token: &str, pin: &Pin) -> ApiResult<()>;

    async fn verify_pin(&self, token: &str, pin: &Pin) -> ApiResult<bool>;
}
