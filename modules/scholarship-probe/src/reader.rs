use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use scholarship_world::{Address, Amount};

// ---------------------------------------------------------------------------
// Calls and outputs
// ---------------------------------------------------------------------------

/// The read methods of a scholarship contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractCall {
    Description,
    Eligibility,
    Deadline,
    Status,
    TotalMilestones,
    Milestone(u64),
    ApprovedStudent(u64),
}

impl ContractCall {
    /// The ABI method name.
    pub fn method(&self) -> &'static str {
        match self {
            ContractCall::Description => "description",
            ContractCall::Eligibility => "eligibility",
            ContractCall::Deadline => "deadline",
            ContractCall::Status => "status",
            ContractCall::TotalMilestones => "getTotalMilestones",
            ContractCall::Milestone(_) => "getMilestone",
            ContractCall::ApprovedStudent(_) => "approvedStudents",
        }
    }
}

impl fmt::Display for ContractCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractCall::Milestone(i) | ContractCall::ApprovedStudent(i) => {
                write!(f, "{}({i})", self.method())
            }
            _ => write!(f, "{}()", self.method()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Eligibility {
    pub gpa: u64,
    pub additional_requirements: String,
}

/// Output of `getMilestone(index)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneInfo {
    pub title: String,
    pub amount: Amount,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub funds_released: bool,
}

/// A decoded return value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutput {
    Text(String),
    Uint(u64),
    Eligibility(Eligibility),
    Milestone(MilestoneInfo),
    Address(Address),
}

// ---------------------------------------------------------------------------
// ContractReader
// ---------------------------------------------------------------------------

/// Read-only calls against a deployed contract.
///
/// `Err` means the call is unavailable: it reverted, the node errored, or the
/// output could not be decoded. Callers never propagate it.
#[async_trait]
pub trait ContractReader: Send + Sync {
    async fn call(&self, contract: Address, call: ContractCall) -> Result<CallOutput>;
}

#[async_trait]
impl<R: ContractReader + ?Sized> ContractReader for Arc<R> {
    async fn call(&self, contract: Address, call: ContractCall) -> Result<CallOutput> {
        (**self).call(contract, call).await
    }
}
