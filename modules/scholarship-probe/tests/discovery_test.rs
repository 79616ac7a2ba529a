//! Probe and bounded list discovery against in-memory contract state.

use anyhow::Result;
use async_trait::async_trait;
use scholarship_probe::{
    discover_approved_students, CallOutput, ContractCall, ContractReader, MilestoneInfo, Probe,
    Probed, StaticContractReader,
};
use scholarship_world::{Address, Amount};

const SCHOLARSHIP: Address = Address::from_low_u8(0x20);

fn student(n: u8) -> Address {
    Address::from_low_u8(0x40 + n)
}

// ---------------------------------------------------------------------------
// Probe
// ---------------------------------------------------------------------------

#[tokio::test]
async fn registered_values_are_returned_typed() {
    let reader = StaticContractReader::new()
        .on_description(SCHOLARSHIP, "For first-generation students")
        .on_eligibility(SCHOLARSHIP, 35, "Essay")
        .on_status(SCHOLARSHIP, 0);
    let probe = Probe::new(&reader, SCHOLARSHIP);

    assert_eq!(
        probe.description().await,
        Probed::Value("For first-generation students".to_string())
    );
    let eligibility = probe.eligibility().await.or_default();
    assert_eq!(eligibility.gpa, 35);
    assert_eq!(eligibility.additional_requirements, "Essay");
    assert_eq!(probe.status().await, Probed::Value(0));
}

#[tokio::test]
async fn one_revert_does_not_affect_other_calls() {
    let reader = StaticContractReader::new()
        .on_deadline(SCHOLARSHIP, 1_800_000_000)
        .on_total_milestones(SCHOLARSHIP, 2);
    let probe = Probe::new(&reader, SCHOLARSHIP);

    assert_eq!(probe.description().await, Probed::Unavailable);
    assert_eq!(probe.deadline().await.or(0), 1_800_000_000);
    assert_eq!(probe.total_milestones().await.or(0), 2);
}

#[tokio::test]
async fn unknown_contract_is_unavailable() {
    let reader = StaticContractReader::new();
    let probe = Probe::new(&reader, Address::from_low_u8(0x99));
    assert!(!probe.status().await.is_available());
}

#[tokio::test]
async fn out_of_range_status_is_unavailable() {
    let reader = StaticContractReader::new().on_status(SCHOLARSHIP, 300);
    let probe = Probe::new(&reader, SCHOLARSHIP);
    assert_eq!(probe.status().await, Probed::Unavailable);
}

#[tokio::test]
async fn milestone_reads_by_index() {
    let reader = StaticContractReader::new().on_milestone(
        SCHOLARSHIP,
        1,
        MilestoneInfo {
            title: "Semester 1".into(),
            amount: Amount::new(500),
            is_completed: false,
            funds_released: false,
        },
    );
    let probe = Probe::new(&reader, SCHOLARSHIP);

    assert!(!probe.milestone(0).await.is_available());
    let m = probe.milestone(1).await.into_option().unwrap();
    assert_eq!(m.title, "Semester 1");
    assert_eq!(m.amount, Amount::new(500));
}

// ---------------------------------------------------------------------------
// Bounded list discovery
// ---------------------------------------------------------------------------

#[tokio::test]
async fn scan_stops_at_first_failed_index() {
    let reader = StaticContractReader::new()
        .on_approved_students(SCHOLARSHIP, vec![student(1), student(2), student(3)]);
    let probe = Probe::new(&reader, SCHOLARSHIP);

    let found = discover_approved_students(&probe, 100).await;

    assert_eq!(found.items, vec![student(1), student(2), student(3)]);
    assert_eq!(found.scanned, 3);
    assert!(!found.cap_reached);
    // Indices 0..=3 were read; index 3 reverted and ended the scan.
    assert_eq!(reader.calls().len(), 4);
}

#[tokio::test]
async fn zero_addresses_and_duplicates_are_excluded() {
    let reader = StaticContractReader::new().on_approved_students(
        SCHOLARSHIP,
        vec![student(1), Address::ZERO, student(2), student(1)],
    );
    let probe = Probe::new(&reader, SCHOLARSHIP);

    let found = discover_approved_students(&probe, 100).await;

    assert_eq!(found.items, vec![student(1), student(2)]);
    assert_eq!(found.scanned, 4);
}

#[tokio::test]
async fn empty_list_finds_nothing() {
    let reader = StaticContractReader::new().on_status(SCHOLARSHIP, 1);
    let probe = Probe::new(&reader, SCHOLARSHIP);

    let found = discover_approved_students(&probe, 100).await;
    assert!(found.is_empty());
    assert!(!found.cap_reached);
}

/// A contract whose getter never reverts: the failure signal is unreliable.
struct EndlessReader;

#[async_trait]
impl ContractReader for EndlessReader {
    async fn call(&self, _contract: Address, call: ContractCall) -> Result<CallOutput> {
        match call {
            ContractCall::ApprovedStudent(i) => Ok(CallOutput::Address(Address::from_low_u8(
                (i % 250) as u8 + 1,
            ))),
            _ => anyhow::bail!("not supported"),
        }
    }
}

#[tokio::test]
async fn cap_terminates_scan_as_known_approximation() {
    let reader = EndlessReader;
    let probe = Probe::new(&reader, SCHOLARSHIP);

    let found = discover_approved_students(&probe, 10).await;

    // Terminated by the safety valve, not by the list ending: the result is
    // a lower bound on the real list, not the real list.
    assert!(found.cap_reached);
    assert_eq!(found.scanned, 10);
    assert_eq!(found.len(), 10);
}

#[tokio::test]
async fn zero_cap_reads_nothing() {
    let reader = StaticContractReader::new()
        .on_approved_students(SCHOLARSHIP, vec![student(1)]);
    let probe = Probe::new(&reader, SCHOLARSHIP);

    let found = discover_approved_students(&probe, 0).await;
    assert!(found.is_empty());
    assert!(found.cap_reached);
    assert!(reader.calls().is_empty());
}
