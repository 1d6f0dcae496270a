//! Caller context passed into engine operations.

use serde::{Deserialize, Serialize};

/// Identifies the user an operation runs on behalf of.
///
/// Only the username travels with the request; resolution to a stored
/// user record (and the not-found handling for unknown names) happens
/// inside the coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Caller {
    /// The authenticated username.
    pub username: String,
}

impl Caller {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}
