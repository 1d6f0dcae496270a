//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use stratus_core::types::UserId;

/// A registered user in the Stratus system.
///
/// Registration and login live outside this engine; the user record is
/// the anchor for file ownership and quota accounting.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: UserId,
    /// Unique login name. Also the first segment of every object key the
    /// user owns.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Code the user must return to confirm the email address.
    #[serde(skip_serializing)]
    pub confirmation_code: String,
    /// Whether the email address has been confirmed.
    pub email_confirmed: bool,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}

/// Data required to create a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Desired username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Generated email confirmation code.
    pub confirmation_code: String,
}
