//! Object key value object.
//!
//! Every stored blob is addressed by a key of the form
//! `{username}@{file_name}@{revision_number}`. Usernames are globally
//! unique and file names are unique per user, so the key is collision-free
//! as long as neither component contains the delimiter. Construction
//! enforces that.

use std::fmt;

use serde::{Deserialize, Serialize};

use stratus_core::error::{AppError, ErrorKind};
use stratus_core::result::AppResult;

/// Separator between the username, file name, and revision number.
pub const KEY_DELIMITER: char = '@';

/// A validated object store key for one file revision.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Build a key from its components, validating each one.
    pub fn new(username: &str, file_name: &str, revision_number: u32) -> AppResult<Self> {
        Self::validate_component(username)?;
        Self::validate_component(file_name)?;
        Ok(Self(format!(
            "{username}{KEY_DELIMITER}{file_name}{KEY_DELIMITER}{revision_number}"
        )))
    }

    /// Check that a username or file name may appear inside a key.
    pub fn validate_component(component: &str) -> AppResult<()> {
        if component.trim().is_empty() {
            return Err(AppError::validation("Name must not be empty"));
        }
        if component.contains(KEY_DELIMITER) {
            return Err(AppError::validation(format!(
                "Name '{component}' contains the reserved character '{KEY_DELIMITER}'"
            )));
        }
        Ok(())
    }

    /// Parse the revision number from the trailing segment of a stored key.
    ///
    /// A key without a numeric tail means the stores hold state this code
    /// did not write, so the failure is reported as an inconsistency
    /// rather than bad input.
    pub fn revision_number(key: &str) -> AppResult<u32> {
        let tail = key.rsplit(KEY_DELIMITER).next().unwrap_or("");
        tail.parse::<u32>().map_err(|e| {
            AppError::with_source(
                ErrorKind::Inconsistent,
                format!("Object key '{key}' has no numeric revision suffix"),
                e,
            )
        })
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the key, returning the inner string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
