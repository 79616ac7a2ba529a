//! Typed contract events and decoding from raw logs.
//!
//! Parameter names follow the contract ABI (`camelCase`). A raw log is only
//! decoded against the event set of the template its emitter belongs to, so a
//! scholarship event arriving from the factory address is an error, not a
//! silent no-op.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::DecodeError;
use crate::eventlike::Eventlike;
use crate::types::{Address, EventMeta, SourceKind, TxHash};
use crate::values::Amount;

// ---------------------------------------------------------------------------
// Raw logs
// ---------------------------------------------------------------------------

/// A log as delivered by the event source: block metadata, the ABI event name
/// and its parameters as an untyped JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLog {
    pub address: Address,
    pub block_number: u64,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub block_timestamp: DateTime<Utc>,
    pub transaction_hash: TxHash,
    pub log_index: u32,
    pub event: String,
    #[serde(default)]
    pub params: Value,
}

impl RawLog {
    pub fn meta(&self) -> EventMeta {
        EventMeta {
            address: self.address,
            block_number: self.block_number,
            block_timestamp: self.block_timestamp,
            transaction_hash: self.transaction_hash,
            log_index: self.log_index,
        }
    }

    /// Encode a typed event back into its raw form.
    pub fn from_event<E>(meta: EventMeta, event: &E) -> Result<Self, serde_json::Error>
    where
        E: Serialize + Eventlike,
    {
        let params = match serde_json::to_value(event)? {
            Value::Object(mut map) => map.remove("params").unwrap_or(Value::Null),
            _ => Value::Null,
        };

        Ok(Self {
            address: meta.address,
            block_number: meta.block_number,
            block_timestamp: meta.block_timestamp,
            transaction_hash: meta.transaction_hash,
            log_index: meta.log_index,
            event: event.event_type().to_string(),
            params,
        })
    }
}

// ---------------------------------------------------------------------------
// Factory events
// ---------------------------------------------------------------------------

/// Events emitted by the scholarship factory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "params", rename_all_fields = "camelCase")]
pub enum FactoryEvent {
    OwnershipTransferred {
        previous_owner: Address,
        new_owner: Address,
    },

    /// A new scholarship contract was deployed.
    ScholarshipCreated {
        scholarship_address: Address,
        company: Address,
        scholarship_title: String,
        total_amount: Amount,
        scholarship_id: u64,
    },
}

impl FactoryEvent {
    pub const NAMES: &'static [&'static str] = &["OwnershipTransferred", "ScholarshipCreated"];
}

impl Eventlike for FactoryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            FactoryEvent::OwnershipTransferred { .. } => "OwnershipTransferred",
            FactoryEvent::ScholarshipCreated { .. } => "ScholarshipCreated",
        }
    }
}

// ---------------------------------------------------------------------------
// Scholarship events
// ---------------------------------------------------------------------------

/// Lifecycle events emitted by an individual scholarship contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "params", rename_all_fields = "camelCase")]
pub enum ScholarshipEvent {
    StudentApplied {
        student: Address,
    },

    StudentApproved {
        student: Address,
    },

    MilestoneCompleted {
        student: Address,
        milestone_id: u64,
    },

    FundsReleased {
        student: Address,
        amount: Amount,
        milestone_id: u64,
    },

    /// `0` is open; every other value is a closed or expired state.
    ScholarshipStatusUpdated {
        status: u8,
    },

    ScholarshipDetailsUpdated {
        new_title: String,
        new_description: String,
        new_gpa: u64,
        new_additional_requirements: String,
        new_deadline: u64,
    },
}

impl ScholarshipEvent {
    pub const NAMES: &'static [&'static str] = &[
        "StudentApplied",
        "StudentApproved",
        "MilestoneCompleted",
        "FundsReleased",
        "ScholarshipStatusUpdated",
        "ScholarshipDetailsUpdated",
    ];
}

impl Eventlike for ScholarshipEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ScholarshipEvent::StudentApplied { .. } => "StudentApplied",
            ScholarshipEvent::StudentApproved { .. } => "StudentApproved",
            ScholarshipEvent::MilestoneCompleted { .. } => "MilestoneCompleted",
            ScholarshipEvent::FundsReleased { .. } => "FundsReleased",
            ScholarshipEvent::ScholarshipStatusUpdated { .. } => "ScholarshipStatusUpdated",
            ScholarshipEvent::ScholarshipDetailsUpdated { .. } => "ScholarshipDetailsUpdated",
        }
    }
}

// ---------------------------------------------------------------------------
// ChainEvent
// ---------------------------------------------------------------------------

/// A decoded event from any tracked source.
#[derive(Debug, Clone, PartialEq)]
pub enum ChainEvent {
    Factory(FactoryEvent),
    Scholarship(ScholarshipEvent),
}

impl Eventlike for ChainEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ChainEvent::Factory(e) => e.event_type(),
            ChainEvent::Scholarship(e) => e.event_type(),
        }
    }
}

/// Decode a raw log against the event set of its source template.
pub fn decode(log: &RawLog, kind: SourceKind) -> Result<ChainEvent, DecodeError> {
    let known = match kind {
        SourceKind::Factory => FactoryEvent::NAMES,
        SourceKind::Scholarship => ScholarshipEvent::NAMES,
    };
    if !known.contains(&log.event.as_str()) {
        return Err(DecodeError::UnknownEvent {
            name: log.event.clone(),
            source_kind: kind,
            address: log.address,
        });
    }

    let tagged = json!({ "event": log.event, "params": log.params });
    let decoded = match kind {
        SourceKind::Factory => serde_json::from_value(tagged).map(ChainEvent::Factory),
        SourceKind::Scholarship => serde_json::from_value(tagged).map(ChainEvent::Scholarship),
    };

    decoded.map_err(|source| DecodeError::Payload {
        name: log.event.clone(),
        source,
    })
}
