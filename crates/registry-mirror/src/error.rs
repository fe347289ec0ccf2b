//! Mirror errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MirrorError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Sink '{sink}' rejected event: {reason}")]
    Sink { sink: String, reason: String },
}
