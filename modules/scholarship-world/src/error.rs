use thiserror::Error;

use crate::types::{Address, SourceKind};

/// A raw log that cannot be turned into a typed event.
///
/// Always fatal for the single log it concerns: derived state must never be
/// built on fabricated parameters.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid {kind}: {value:?}")]
    InvalidHex { kind: &'static str, value: String },

    #[error("unknown event `{name}` emitted by {source_kind} source {address}")]
    UnknownEvent {
        name: String,
        source_kind: SourceKind,
        address: Address,
    },

    #[error("malformed `{name}` parameters: {source}")]
    Payload {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}
