//! Bounded list discovery.
//!
//! On-chain arrays like `approvedStudents` expose an indexed getter but no
//! length. The list is recovered by reading index 0, 1, 2, … until a read is
//! unavailable. The iteration cap only guarantees termination when the
//! failure signal itself is unreliable; it is not a completeness guarantee,
//! and a capped scan may silently undercount.

use std::future::Future;

use tracing::warn;

use scholarship_world::Address;

use crate::probe::{Probe, Probed};
use crate::reader::ContractReader;

/// Result of a bounded scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovery<T> {
    /// Accepted items in index order, duplicates removed.
    pub items: Vec<T>,
    /// Number of indices read successfully.
    pub scanned: u64,
    /// `true` if the scan stopped at the cap instead of at a failed read.
    pub cap_reached: bool,
}

impl<T> Discovery<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Read `read(0)`, `read(1)`, … until one is unavailable or `max_iterations`
/// reads succeeded. Values rejected by `accept` and repeats are skipped but
/// still advance the index.
pub async fn scan_until_unavailable<T, F, Fut>(
    max_iterations: u32,
    mut read: F,
    accept: impl Fn(&T) -> bool,
) -> Discovery<T>
where
    T: PartialEq,
    F: FnMut(u64) -> Fut,
    Fut: Future<Output = Probed<T>>,
{
    let mut items = Vec::new();
    let mut scanned = 0u64;

    while scanned < u64::from(max_iterations) {
        match read(scanned).await {
            Probed::Value(item) => {
                if accept(&item) && !items.contains(&item) {
                    items.push(item);
                }
                scanned += 1;
            }
            Probed::Unavailable => {
                return Discovery {
                    items,
                    scanned,
                    cap_reached: false,
                };
            }
        }
    }

    Discovery {
        items,
        scanned,
        cap_reached: true,
    }
}

/// Recover the current `approvedStudents` list of a scholarship contract.
/// Zero addresses are dropped.
pub async fn discover_approved_students<R>(
    probe: &Probe<'_, R>,
    max_iterations: u32,
) -> Discovery<Address>
where
    R: ContractReader + ?Sized,
{
    let discovery = scan_until_unavailable(
        max_iterations,
        move |index| probe.approved_student(index),
        |student: &Address| !student.is_zero(),
    )
    .await;

    if discovery.cap_reached {
        warn!(
            contract = %probe.contract(),
            max_iterations,
            found = discovery.len(),
            "approvedStudents scan hit its iteration cap; list may be incomplete"
        );
    }

    discovery
}
