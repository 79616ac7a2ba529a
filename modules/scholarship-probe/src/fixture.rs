//! StaticContractReader: contract state held in memory.
//!
//! Stands in for the RPC collaborator in tests and file replays. Anything not
//! registered reverts, exactly like a call to a method the contract lacks.
//! Builder pattern: `.on_description()`, `.on_milestone()`, …

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use scholarship_world::Address;

use crate::reader::{CallOutput, ContractCall, ContractReader, Eligibility, MilestoneInfo};

/// Snapshot of one contract's readable state. Absent fields revert.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContractState {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub eligibility: Option<Eligibility>,
    #[serde(default)]
    pub deadline: Option<u64>,
    #[serde(default)]
    pub status: Option<u64>,
    #[serde(default)]
    pub total_milestones: Option<u64>,
    #[serde(default)]
    pub milestones: BTreeMap<u64, MilestoneInfo>,
    #[serde(default)]
    pub approved_students: Vec<Address>,
}

#[derive(Default)]
pub struct StaticContractReader {
    contracts: HashMap<Address, ContractState>,
    calls: Mutex<Vec<(Address, ContractCall)>>,
}

impl StaticContractReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON object mapping contract address to [`ContractState`].
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read contract snapshot: {}", path.display()))?;
        Self::from_json_str(&content)
            .with_context(|| format!("Failed to parse contract snapshot: {}", path.display()))
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let contracts: HashMap<Address, ContractState> = serde_json::from_str(content)?;
        Ok(Self {
            contracts,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn on_contract(mut self, contract: Address, state: ContractState) -> Self {
        self.contracts.insert(contract, state);
        self
    }

    pub fn on_description(mut self, contract: Address, description: &str) -> Self {
        self.state(contract).description = Some(description.to_string());
        self
    }

    pub fn on_eligibility(mut self, contract: Address, gpa: u64, additional: &str) -> Self {
        self.state(contract).eligibility = Some(Eligibility {
            gpa,
            additional_requirements: additional.to_string(),
        });
        self
    }

    pub fn on_deadline(mut self, contract: Address, deadline: u64) -> Self {
        self.state(contract).deadline = Some(deadline);
        self
    }

    pub fn on_status(mut self, contract: Address, status: u64) -> Self {
        self.state(contract).status = Some(status);
        self
    }

    pub fn on_total_milestones(mut self, contract: Address, total: u64) -> Self {
        self.state(contract).total_milestones = Some(total);
        self
    }

    pub fn on_milestone(mut self, contract: Address, index: u64, milestone: MilestoneInfo) -> Self {
        self.state(contract).milestones.insert(index, milestone);
        self
    }

    pub fn on_approved_students(mut self, contract: Address, students: Vec<Address>) -> Self {
        self.state(contract).approved_students = students;
        self
    }

    /// Every call received so far, in order (for test assertions).
    pub fn calls(&self) -> Vec<(Address, ContractCall)> {
        self.calls.lock().unwrap().clone()
    }

    fn state(&mut self, contract: Address) -> &mut ContractState {
        self.contracts.entry(contract).or_default()
    }
}

#[async_trait]
impl ContractReader for StaticContractReader {
    async fn call(&self, contract: Address, call: ContractCall) -> Result<CallOutput> {
        self.calls.lock().unwrap().push((contract, call));

        let state = self
            .contracts
            .get(&contract)
            .ok_or_else(|| anyhow!("no contract deployed at {contract}"))?;
        let reverted = || anyhow!("{call} reverted on {contract}");

        match call {
            ContractCall::Description => state.description.clone().map(CallOutput::Text),
            ContractCall::Eligibility => state.eligibility.clone().map(CallOutput::Eligibility),
            ContractCall::Deadline => state.deadline.map(CallOutput::Uint),
            ContractCall::Status => state.status.map(CallOutput::Uint),
            ContractCall::TotalMilestones => state.total_milestones.map(CallOutput::Uint),
            ContractCall::Milestone(index) => {
                state.milestones.get(&index).cloned().map(CallOutput::Milestone)
            }
            ContractCall::ApprovedStudent(index) => usize::try_from(index)
                .ok()
                .and_then(|i| state.approved_students.get(i))
                .copied()
                .map(CallOutput::Address),
        }
        .ok_or_else(reverted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn snapshot_json_drives_calls() {
        let reader = StaticContractReader::from_json_str(
            r#"{
                "0x0000000000000000000000000000000000000020": {
                    "description": "Need-based award",
                    "total_milestones": 1,
                    "milestones": {
                        "0": { "title": "Enroll", "amount": "250" }
                    },
                    "approved_students": ["0x0000000000000000000000000000000000000041"]
                }
            }"#,
        )
        .unwrap();
        let contract = Address::from_low_u8(0x20);

        let out = reader.call(contract, ContractCall::Milestone(0)).await.unwrap();
        match out {
            CallOutput::Milestone(m) => {
                assert_eq!(m.title, "Enroll");
                assert!(!m.is_completed);
            }
            other => panic!("unexpected output: {other:?}"),
        }
        assert!(reader.call(contract, ContractCall::Deadline).await.is_err());
        assert!(reader
            .call(contract, ContractCall::ApprovedStudent(1))
            .await
            .is_err());
    }

    #[test]
    fn unknown_snapshot_fields_are_rejected() {
        let result = StaticContractReader::from_json_str(
            r#"{ "0x0000000000000000000000000000000000000020": { "owner": "x" } }"#,
        );
        assert!(result.is_err());
    }
}
