//! User model

use serde::{Deserialize, Serialize};

/// Another account on the service, or the current one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub email: Option<String>,
    /// Whether the user has ever set a private PIN
    pub has_private_pin: bool,
}
