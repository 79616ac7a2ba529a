//! Chain facts: the vocabulary of the scholarship contract network.
//!
//! Everything here describes what the contracts emitted: addresses, hashes,
//! amounts, block metadata and the typed events decoded from raw logs.
//! No entity state, no aggregation, no I/O.

pub mod error;
pub mod eventlike;
pub mod events;
pub mod types;
pub mod values;

pub use error::DecodeError;
pub use eventlike::Eventlike;
pub use events::{decode, ChainEvent, FactoryEvent, RawLog, ScholarshipEvent};
pub use types::{Address, EventMeta, SourceKind, TxHash};
pub use values::{Amount, ParseAmountError};
