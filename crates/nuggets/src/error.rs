use thiserror::Error;

use crate::model::MAX_KEY_LENGTH;

/// Raised when a raw key cannot be turned into a valid [`NuggetKey`].
///
/// [`NuggetKey`]: crate::model::NuggetKey
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("nugget key is empty after normalization")]
    Empty,
    #[error("nugget key is {len} characters after normalization, limit is {max}", max = MAX_KEY_LENGTH)]
    TooLong { len: usize },
}

/// Failures from a nugget source backend.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// No record is stored under the requested key.
    #[error("no nugget stored under key {key}")]
    NotFound { key: String },
    /// The backend itself failed; the message is backend-specific.
    #[error("nugget source backend failed: {0}")]
    Backend(String),
}

impl StoreError {
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    #[must_use]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }
}

// Lets closure-backed sources build records with `?`.
impl From<KeyError> for StoreError {
    fn from(error: KeyError) -> Self {
        Self::Backend(error.to_string())
    }
}
