//! Error types for sticky-core

use thiserror::Error;

/// Result type alias using sticky-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in sticky-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// The session is missing or the server rejected the token.
    ///
    /// The local session has already been cleared when this is returned.
    #[error("Authentication required: {0}")]
    Auth(String),

    /// Input was rejected before any request was sent
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Non-2xx response other than 401
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Transport failure
    #[error("Network error: {0}")]
    Network(String),

    /// Response body did not match the expected schema
    #[error("Unexpected response: {0}")]
    Parse(String),

    /// Client configuration is unusable
    #[error("Configuration error: {0}")]
    Config(String),

    /// Local storage could not be read or written
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error came from the transport rather than the server.
    pub const fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

/// Client-side validation failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please fill in both title and content")]
    MissingTitleOrContent,
    #[error("PIN must be 4 digits")]
    InvalidPin,
    #[error("PIN status is not known yet; reload once the service is reachable")]
    PinStatusUnknown,
    #[error("No PIN prompt is open")]
    NoPinPrompt,
    #[error("Username cannot be empty")]
    EmptyUsername,
}
