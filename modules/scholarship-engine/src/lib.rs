//! Event dispatch and aggregation.
//!
//! Routes each raw log by the kind of source that emitted it, decodes it,
//! and runs the matching handler: load → mutate → recompute derived fields →
//! upsert. Handlers emit [`Effect`]s (today: new event sources) that the
//! engine applies only after the handler's writes are done.

pub mod engine;
pub mod handlers;
pub mod registry;

pub use engine::{DispatchOutcome, Effect, Engine, SkipReason};
pub use registry::SourceRegistry;
