//! Drive the engine over an ordered log stream.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use tracing::{info, warn};

use scholarship_common::EntityKind;
use scholarship_engine::{DispatchOutcome, Engine, SourceRegistry};
use scholarship_probe::ContractReader;
use scholarship_store::EntityStore;
use scholarship_world::RawLog;

/// Counts for one replay run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub applied: u64,
    pub skipped: u64,
    pub unrouted: u64,
    /// Scholarship sources added during this run.
    pub registered: u64,
}

impl ReplaySummary {
    pub fn total(&self) -> u64 {
        self.applied + self.skipped + self.unrouted
    }
}

/// Dispatch every log in order. Stops at the first fatal error, leaving
/// everything before it applied.
pub async fn replay<S, R>(
    engine: &Engine<S, R>,
    registry: &mut SourceRegistry,
    logs: &[RawLog],
) -> Result<ReplaySummary>
where
    S: EntityStore,
    R: ContractReader,
{
    let mut summary = ReplaySummary::default();

    for log in logs {
        let outcome = engine.dispatch(log, registry).await.with_context(|| {
            format!(
                "Failed to process {} at block {}, log index {} ({})",
                log.event, log.block_number, log.log_index, log.transaction_hash
            )
        })?;

        match outcome {
            DispatchOutcome::Applied { registered, .. } => {
                summary.applied += 1;
                summary.registered += registered.len() as u64;
            }
            DispatchOutcome::Skipped { .. } => summary.skipped += 1,
            DispatchOutcome::Unrouted { .. } => summary.unrouted += 1,
        }
    }

    if summary.skipped > 0 {
        warn!(
            skipped = summary.skipped,
            "Some events referenced entities that were never created"
        );
    }
    info!(
        applied = summary.applied,
        skipped = summary.skipped,
        unrouted = summary.unrouted,
        registered = summary.registered,
        sources = registry.len(),
        "Replay complete"
    );

    Ok(summary)
}

/// Every stored entity, grouped by kind then id.
pub async fn dump_entities<S>(store: &S) -> Result<serde_json::Value>
where
    S: EntityStore + ?Sized,
{
    let mut dump = serde_json::Map::new();
    for kind in EntityKind::ALL {
        let records: BTreeMap<String, serde_json::Value> =
            store.list_raw(kind).await?.into_iter().collect();
        dump.insert(kind.as_str().to_string(), serde_json::to_value(records)?);
    }
    Ok(serde_json::Value::Object(dump))
}
