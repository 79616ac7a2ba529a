use thiserror::Error;

use scholarship_world::DecodeError;

/// Failures that abort processing of a single event.
///
/// Missing referenced entities and unavailable contract reads are not errors:
/// handlers recover from those locally.
#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("undecodable event: {0}")]
    Decode(#[from] DecodeError),

    #[error("entity store error: {0:#}")]
    Store(#[from] anyhow::Error),

    #[error("configuration error: {0}")]
    Config(String),
}
