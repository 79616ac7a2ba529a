//! The materialized view: long-lived aggregates and append-only records.
//!
//! Companies, scholarships, milestones and scholars are mutated in place for
//! the whole indexed history. Transactions and raw event logs are written once
//! and never touched again. References between entities are plain keys; a
//! missing target is a valid state every reader must tolerate.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use scholarship_world::{Address, Amount, EventMeta, TxHash};

use crate::aggregate::completion_percentage;

// ---------------------------------------------------------------------------
// Entity trait
// ---------------------------------------------------------------------------

/// Every persisted record kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Company,
    Scholarship,
    Milestone,
    Scholar,
    Transaction,
    OwnershipTransferred,
    ScholarshipCreated,
}

impl EntityKind {
    pub const ALL: [EntityKind; 7] = [
        EntityKind::Company,
        EntityKind::Scholarship,
        EntityKind::Milestone,
        EntityKind::Scholar,
        EntityKind::Transaction,
        EntityKind::OwnershipTransferred,
        EntityKind::ScholarshipCreated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Company => "company",
            EntityKind::Scholarship => "scholarship",
            EntityKind::Milestone => "milestone",
            EntityKind::Scholar => "scholar",
            EntityKind::Transaction => "transaction",
            EntityKind::OwnershipTransferred => "ownership_transferred",
            EntityKind::ScholarshipCreated => "scholarship_created",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record the entity store can load and upsert by key.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    const KIND: EntityKind;

    fn key(&self) -> String;
}

/// Key of a milestone row: `<scholarshipAddress>-<index>`.
pub fn milestone_key(scholarship: Address, index: u64) -> String {
    format!("{scholarship}-{index}")
}

/// The scholarship status value meaning "open for applications".
pub const STATUS_OPEN: u8 = 0;

// ---------------------------------------------------------------------------
// Company
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: Address,
    pub total_scholarships: u64,
    pub total_funding: Amount,
    pub total_funding_released: Amount,
    /// Always `total_funding - total_funding_released`, floored at zero.
    pub total_funding_remaining: Amount,
    pub total_approved_scholars: u64,
    pub total_active_scholars: u64,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub updated_at: DateTime<Utc>,
}

impl Company {
    pub fn new(id: Address, at: DateTime<Utc>) -> Self {
        Self {
            id,
            total_scholarships: 0,
            total_funding: Amount::ZERO,
            total_funding_released: Amount::ZERO,
            total_funding_remaining: Amount::ZERO,
            total_approved_scholars: 0,
            total_active_scholars: 0,
            created_at: at,
            updated_at: at,
        }
    }

    pub fn add_scholarship(&mut self, total_amount: Amount) {
        self.total_scholarships += 1;
        self.total_funding = self.total_funding.saturating_add(total_amount);
        self.recompute_remaining();
    }

    pub fn release_funds(&mut self, amount: Amount) {
        self.total_funding_released = self.total_funding_released.saturating_add(amount);
        self.recompute_remaining();
    }

    pub fn approve_scholar(&mut self) {
        self.total_approved_scholars += 1;
        self.total_active_scholars += 1;
    }

    /// Drop `count` active scholars, floored at zero. Returns how many were
    /// actually removed.
    pub fn deactivate_scholars(&mut self, count: u64) -> u64 {
        let removed = count.min(self.total_active_scholars);
        self.total_active_scholars -= removed;
        removed
    }

    fn recompute_remaining(&mut self) {
        self.total_funding_remaining = self.total_funding.saturating_sub(self.total_funding_released);
    }
}

impl Entity for Company {
    const KIND: EntityKind = EntityKind::Company;

    fn key(&self) -> String {
        self.id.to_string()
    }
}

// ---------------------------------------------------------------------------
// Scholarship
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scholarship {
    pub id: Address,
    pub scholarship_id: u64,
    pub title: String,
    pub description: String,
    pub gpa: u64,
    pub additional_requirements: String,
    pub deadline: u64,
    pub status: u8,
    pub total_amount: Amount,
    pub remaining_amount: Amount,
    pub company: Address,
    pub total_milestones: u64,
    pub completed_milestones: u64,
    pub completion_percentage: Decimal,
    /// Key of the `ScholarshipCreated` log that introduced this scholarship.
    pub creation_log: Option<String>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub updated_at: DateTime<Utc>,
}

impl Scholarship {
    pub fn is_open(&self) -> bool {
        self.status == STATUS_OPEN
    }

    /// Count one more completed milestone. Refuses to exceed the total.
    /// The percentage is left for [`Self::recompute_completion`].
    pub fn complete_milestone(&mut self) -> bool {
        if self.completed_milestones >= self.total_milestones {
            return false;
        }
        self.completed_milestones += 1;
        true
    }

    pub fn release_funds(&mut self, amount: Amount) {
        self.remaining_amount = self.remaining_amount.saturating_sub(amount);
    }

    pub fn recompute_completion(&mut self) {
        self.completion_percentage =
            completion_percentage(self.completed_milestones, self.total_milestones);
    }
}

impl Entity for Scholarship {
    const KIND: EntityKind = EntityKind::Scholarship;

    fn key(&self) -> String {
        self.id.to_string()
    }
}

// ---------------------------------------------------------------------------
// Milestone
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: String,
    pub scholarship: Address,
    pub milestone_id: u64,
    pub title: String,
    pub amount: Amount,
    pub is_completed: bool,
    pub funds_released: bool,
    pub student: Option<Address>,
    #[serde(with = "chrono::serde::ts_seconds_option")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(with = "chrono::serde::ts_seconds_option")]
    pub funds_released_at: Option<DateTime<Utc>>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub updated_at: DateTime<Utc>,
}

impl Milestone {
    /// Mark completed by `student`. Returns `true` only on the first
    /// completion; a completed milestone never reverts.
    pub fn complete(&mut self, student: Address, at: DateTime<Utc>) -> bool {
        self.student = Some(student);
        self.updated_at = at;
        if self.is_completed {
            return false;
        }
        self.is_completed = true;
        self.completed_at = Some(at);
        true
    }

    /// Flag the funds as released. Released funds imply completion, so this
    /// also completes the milestone if no completion was seen yet; the return
    /// value says whether that happened.
    pub fn release_funds(&mut self, student: Address, at: DateTime<Utc>) -> bool {
        self.funds_released = true;
        self.funds_released_at = Some(at);
        if self.is_completed {
            self.updated_at = at;
            return false;
        }
        self.complete(student, at)
    }
}

impl Entity for Milestone {
    const KIND: EntityKind = EntityKind::Milestone;

    fn key(&self) -> String {
        self.id.clone()
    }
}

// ---------------------------------------------------------------------------
// Scholar
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scholar {
    pub id: Address,
    /// Set semantics: each scholarship appears at most once, in first-seen order.
    pub applied_scholarships: Vec<Address>,
    pub approved_scholarships: Vec<Address>,
    pub total_funding_received: Amount,
    pub is_active: bool,
    pub completed_milestones: u64,
    pub total_milestones: u64,
    pub completion_percentage: Decimal,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub updated_at: DateTime<Utc>,
}

impl Scholar {
    pub fn new(id: Address, at: DateTime<Utc>) -> Self {
        Self {
            id,
            applied_scholarships: Vec::new(),
            approved_scholarships: Vec::new(),
            total_funding_received: Amount::ZERO,
            is_active: false,
            completed_milestones: 0,
            total_milestones: 0,
            completion_percentage: Decimal::ZERO,
            created_at: at,
            updated_at: at,
        }
    }

    /// Returns `false` if the scholarship was already in the applied set.
    pub fn apply(&mut self, scholarship: Address) -> bool {
        if self.applied_scholarships.contains(&scholarship) {
            return false;
        }
        self.applied_scholarships.push(scholarship);
        true
    }

    /// First approval for a scholarship activates the scholar and adds its
    /// milestones to the running total. Repeats are no-ops.
    pub fn approve(&mut self, scholarship: Address, milestones: u64) -> bool {
        if self.approved_scholarships.contains(&scholarship) {
            return false;
        }
        self.approved_scholarships.push(scholarship);
        self.is_active = true;
        self.total_milestones += milestones;
        true
    }

    /// Count one more completed milestone. Refuses to exceed the total.
    /// The percentage is left for [`Self::recompute_completion`].
    pub fn complete_milestone(&mut self) -> bool {
        if self.completed_milestones >= self.total_milestones {
            return false;
        }
        self.completed_milestones += 1;
        true
    }

    pub fn receive_funds(&mut self, amount: Amount) {
        self.total_funding_received = self.total_funding_received.saturating_add(amount);
    }

    pub fn recompute_completion(&mut self) {
        self.completion_percentage =
            completion_percentage(self.completed_milestones, self.total_milestones);
    }
}

impl Entity for Scholar {
    const KIND: EntityKind = EntityKind::Scholar;

    fn key(&self) -> String {
        self.id.to_string()
    }
}

// ---------------------------------------------------------------------------
// Append-only records
// ---------------------------------------------------------------------------

/// One funds release. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub scholarship: Address,
    pub student: Address,
    pub milestone: String,
    pub amount: Amount,
    pub milestone_id: u64,
    pub block_number: u64,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub block_timestamp: DateTime<Utc>,
    pub transaction_hash: TxHash,
}

impl Entity for Transaction {
    const KIND: EntityKind = EntityKind::Transaction;

    fn key(&self) -> String {
        self.id.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnershipTransferredLog {
    pub id: String,
    pub previous_owner: Address,
    pub new_owner: Address,
    pub block_number: u64,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub block_timestamp: DateTime<Utc>,
    pub transaction_hash: TxHash,
}

impl OwnershipTransferredLog {
    pub fn new(meta: &EventMeta, previous_owner: Address, new_owner: Address) -> Self {
        Self {
            id: meta.log_id(),
            previous_owner,
            new_owner,
            block_number: meta.block_number,
            block_timestamp: meta.block_timestamp,
            transaction_hash: meta.transaction_hash,
        }
    }
}

impl Entity for OwnershipTransferredLog {
    const KIND: EntityKind = EntityKind::OwnershipTransferred;

    fn key(&self) -> String {
        self.id.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScholarshipCreatedLog {
    pub id: String,
    pub scholarship_address: Address,
    pub company: Address,
    pub scholarship_title: String,
    pub total_amount: Amount,
    pub scholarship_id: u64,
    pub block_number: u64,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub block_timestamp: DateTime<Utc>,
    pub transaction_hash: TxHash,
}

impl Entity for ScholarshipCreatedLog {
    const KIND: EntityKind = EntityKind::ScholarshipCreated;

    fn key(&self) -> String {
        self.id.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn company_remaining_tracks_funding_minus_released() {
        let mut company = Company::new(Address::from_low_u8(1), at(0));
        company.add_scholarship(Amount::new(1000));
        company.add_scholarship(Amount::new(500));
        company.release_funds(Amount::new(200));

        assert_eq!(company.total_scholarships, 2);
        assert_eq!(company.total_funding, Amount::new(1500));
        assert_eq!(company.total_funding_released, Amount::new(200));
        assert_eq!(company.total_funding_remaining, Amount::new(1300));
    }

    #[test]
    fn company_deactivation_floors_at_zero() {
        let mut company = Company::new(Address::from_low_u8(1), at(0));
        company.approve_scholar();
        company.approve_scholar();

        assert_eq!(company.deactivate_scholars(5), 2);
        assert_eq!(company.total_active_scholars, 0);
        assert_eq!(company.total_approved_scholars, 2);
    }

    #[test]
    fn scholar_apply_has_set_semantics() {
        let mut scholar = Scholar::new(Address::from_low_u8(9), at(0));
        assert!(scholar.apply(Address::from_low_u8(2)));
        assert!(!scholar.apply(Address::from_low_u8(2)));
        assert_eq!(scholar.applied_scholarships, vec![Address::from_low_u8(2)]);
    }

    #[test]
    fn scholar_first_approval_adds_milestones_once() {
        let mut scholar = Scholar::new(Address::from_low_u8(9), at(0));
        assert!(scholar.approve(Address::from_low_u8(2), 3));
        assert!(!scholar.approve(Address::from_low_u8(2), 3));

        assert!(scholar.is_active);
        assert_eq!(scholar.total_milestones, 3);
    }

    #[test]
    fn scholar_completion_cannot_exceed_total() {
        let mut scholar = Scholar::new(Address::from_low_u8(9), at(0));
        assert!(!scholar.complete_milestone());
        scholar.approve(Address::from_low_u8(2), 2);
        assert!(scholar.complete_milestone());
        assert_eq!(scholar.completion_percentage, Decimal::ZERO);
        scholar.recompute_completion();
        assert_eq!(scholar.completion_percentage, Decimal::from(50));
    }

    #[test]
    fn milestone_completion_never_reverts() {
        let mut milestone = Milestone {
            id: milestone_key(Address::from_low_u8(2), 0),
            scholarship: Address::from_low_u8(2),
            milestone_id: 0,
            title: "Enroll".into(),
            amount: Amount::new(100),
            is_completed: false,
            funds_released: false,
            student: None,
            completed_at: None,
            funds_released_at: None,
            created_at: at(0),
            updated_at: at(0),
        };

        assert!(milestone.complete(Address::from_low_u8(9), at(10)));
        assert!(!milestone.complete(Address::from_low_u8(9), at(20)));
        assert!(milestone.is_completed);
        assert_eq!(milestone.completed_at, Some(at(10)));
    }

    #[test]
    fn releasing_funds_implies_completion() {
        let mut milestone = Milestone {
            id: milestone_key(Address::from_low_u8(2), 1),
            scholarship: Address::from_low_u8(2),
            milestone_id: 1,
            title: "Midterm".into(),
            amount: Amount::new(100),
            is_completed: false,
            funds_released: false,
            student: None,
            completed_at: None,
            funds_released_at: None,
            created_at: at(0),
            updated_at: at(0),
        };

        assert!(milestone.release_funds(Address::from_low_u8(9), at(30)));
        assert!(milestone.funds_released && milestone.is_completed);
        assert_eq!(milestone.student, Some(Address::from_low_u8(9)));
    }

    #[test]
    fn milestone_key_uses_hex_address() {
        assert_eq!(
            milestone_key(Address::from_low_u8(2), 4),
            "0x0000000000000000000000000000000000000002-4"
        );
    }

    #[test]
    fn entities_serialize_timestamps_as_seconds() {
        let company = Company::new(Address::from_low_u8(1), at(1_700_000_000));
        let json = serde_json::to_value(&company).unwrap();
        assert_eq!(json["created_at"], 1_700_000_000);
        assert_eq!(json["total_funding"], "0");
    }
}
