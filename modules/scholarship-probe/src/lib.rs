//! Best-effort reads of a contract's current on-chain state.
//!
//! The RPC transport is a black box behind [`ContractReader`]: a call either
//! returns a typed value or signals that it is unavailable. [`Probe`] turns
//! that into [`Probed`] so every caller has to pick an explicit default, and
//! [`discovery`] recovers unbounded on-chain lists by reading index by index.

pub mod discovery;
pub mod fixture;
pub mod probe;
pub mod reader;

pub use discovery::{discover_approved_students, scan_until_unavailable, Discovery};
pub use fixture::{ContractState, StaticContractReader};
pub use probe::{Probe, Probed};
pub use reader::{CallOutput, ContractCall, ContractReader, Eligibility, MilestoneInfo};
