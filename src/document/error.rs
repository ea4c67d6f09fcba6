//! Document decode errors
//!
//! Every message is meant to be shown to the user as-is, so nested
//! failures are qualified with the path of the field they came from.

use thiserror::Error;

pub type DocumentResult<T> = Result<T, DocumentError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DocumentError {
    message: String,
}

impl DocumentError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Prefixes the message with the field it was raised under.
    pub fn in_field(self, field: &str) -> Self {
        Self {
            message: format!("In `{}`: {}", field, self.message),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
