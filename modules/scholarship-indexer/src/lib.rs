pub mod replay;
pub mod source;

pub use replay::{dump_entities, replay, ReplaySummary};
pub use source::{parse_logs, read_logs};
