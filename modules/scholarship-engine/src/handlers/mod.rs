//! Per-event handlers.
//!
//! Every handler is self-contained: it loads what it needs from the store,
//! mutates in memory and upserts. Nothing is cached between events.

pub mod factory;
pub mod scholarship;

use scholarship_common::DiscoveryConfig;
use scholarship_world::EventMeta;

use crate::engine::{Effect, SkipReason};

/// What a handler gets to work with for one event.
pub struct Context<'a, S: ?Sized, R: ?Sized> {
    pub store: &'a S,
    pub reader: &'a R,
    pub discovery: DiscoveryConfig,
    pub meta: EventMeta,
}

/// Handler result.
#[derive(Debug)]
pub enum Handled {
    Applied(Vec<Effect>),
    Skipped(SkipReason),
}

impl Handled {
    pub(crate) fn done() -> Self {
        Handled::Applied(Vec::new())
    }
}
