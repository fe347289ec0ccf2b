//! Registry error types.

use crate::types::RecordId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which uniqueness index rejected a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateField {
    Locator,
    Hash,
    ProductId,
}

impl std::fmt::Display for DuplicateField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DuplicateField::Locator => write!(f, "locator"),
            DuplicateField::Hash => write!(f, "hash"),
            DuplicateField::ProductId => write!(f, "product id"),
        }
    }
}

/// Registry error types.
///
/// Domain failures (everything except `Storage` and `Corrupt`) abort the
/// operation with zero side effects: no index writes, no notification, no
/// id consumption.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Duplicate {field}: {value}")]
    Duplicate {
        field: DuplicateField,
        value: String,
    },

    #[error("Caller not authorized: {0}")]
    Unauthorized(String),

    #[error("Passport not found: {0}")]
    NotFound(String),

    #[error("Passport deactivated: {0}")]
    Inactive(RecordId),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Snapshot integrity check failed: {0}")]
    Corrupt(String),
}

impl From<std::io::Error> for RegistryError {
    fn from(e: std::io::Error) -> Self {
        RegistryError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for RegistryError {
    fn from(e: serde_json::Error) -> Self {
        RegistryError::Storage(format!("JSON serialization error: {}", e))
    }
}
