//! The dispatch loop.

use std::collections::VecDeque;
use std::fmt;

use tracing::{debug, info};

use scholarship_common::{DiscoveryConfig, IndexerError, Scholarship};
use scholarship_probe::ContractReader;
use scholarship_store::{EntityStore, EntityStoreExt};
use scholarship_world::{decode, Address, ChainEvent, EventMeta, Eventlike, RawLog};

use crate::handlers::{self, Context, Handled};
use crate::registry::SourceRegistry;

/// A side effect a handler requests once its writes are done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Begin processing events emitted by this scholarship contract.
    RegisterSource(Address),
}

/// Why a handler did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingScholar,
    MissingScholarship,
    MissingMilestone,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingScholar => f.write_str("scholar not found"),
            SkipReason::MissingScholarship => f.write_str("scholarship not found"),
            SkipReason::MissingMilestone => f.write_str("milestone not found"),
        }
    }
}

/// Result of dispatching one raw log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The handler ran. `registered` lists sources added by this event.
    Applied {
        event_type: &'static str,
        registered: Vec<Address>,
    },
    /// The handler found a required entity missing and wrote nothing.
    Skipped {
        event_type: &'static str,
        reason: SkipReason,
    },
    /// The emitter is not a tracked source.
    Unrouted { address: Address },
}

/// Event dispatch engine.
///
/// Route → decode → handle → apply effects. Strictly sequential: each log is
/// processed to completion, probes and writes included, before the next.
pub struct Engine<S, R>
where
    S: EntityStore,
    R: ContractReader,
{
    store: S,
    reader: R,
    discovery: DiscoveryConfig,
}

impl<S, R> Engine<S, R>
where
    S: EntityStore,
    R: ContractReader,
{
    pub fn new(store: S, reader: R, discovery: DiscoveryConfig) -> Self {
        Self {
            store,
            reader,
            discovery,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// Rebuild the registry from scholarships already in the store, so a
    /// restarted indexer keeps following every contract it discovered.
    pub async fn restore_registry(&self, factory: Address) -> Result<SourceRegistry, IndexerError> {
        let mut registry = SourceRegistry::new(factory);
        for scholarship in self.store.list::<Scholarship>().await? {
            registry.register_source(scholarship.id);
        }
        info!(sources = registry.len(), "Source registry restored");
        Ok(registry)
    }

    /// Dispatch one raw log.
    ///
    /// An undecodable log from a tracked source is fatal for that log and is
    /// returned before any write happens.
    pub async fn dispatch(
        &self,
        log: &RawLog,
        registry: &mut SourceRegistry,
    ) -> Result<DispatchOutcome, IndexerError> {
        let Some(kind) = registry.kind_of(&log.address) else {
            debug!(address = %log.address, event = %log.event, "Unrouted log");
            return Ok(DispatchOutcome::Unrouted {
                address: log.address,
            });
        };

        let event = decode(log, kind)?;
        let meta = log.meta();
        let event_type = event.event_type();

        debug!(
            event_type,
            address = %meta.address,
            block = meta.block_number,
            log_index = meta.log_index,
            "Dispatching"
        );

        let handled = self.handle(&event, meta).await?;

        let effects = match handled {
            Handled::Applied(effects) => effects,
            Handled::Skipped(reason) => {
                debug!(event_type, address = %meta.address, %reason, "Skipped");
                return Ok(DispatchOutcome::Skipped { event_type, reason });
            }
        };

        // Effects run only after every write of the handler has landed.
        let mut queue: VecDeque<Effect> = effects.into();
        let mut registered = Vec::new();
        while let Some(effect) = queue.pop_front() {
            match effect {
                Effect::RegisterSource(address) => {
                    if registry.register_source(address) {
                        info!(%address, block = meta.block_number, "Registered scholarship source");
                        registered.push(address);
                    } else {
                        debug!(%address, "Source already registered");
                    }
                }
            }
        }

        Ok(DispatchOutcome::Applied {
            event_type,
            registered,
        })
    }

    async fn handle(&self, event: &ChainEvent, meta: EventMeta) -> Result<Handled, IndexerError> {
        let ctx = Context {
            store: &self.store,
            reader: &self.reader,
            discovery: self.discovery,
            meta,
        };

        match event {
            ChainEvent::Factory(e) => handlers::factory::handle(&ctx, e).await,
            ChainEvent::Scholarship(e) => handlers::scholarship::handle(&ctx, e).await,
        }
    }
}
