//! Derived values recomputed from authoritative counters.

use rust_decimal::Decimal;

/// `completed / total × 100`, or `0` when there is nothing to complete.
///
/// The integer counts are the source of truth; the percentage is a cache and
/// can always be recomputed from them.
pub fn completion_percentage(completed: u64, total: u64) -> Decimal {
    if total == 0 {
        return Decimal::ZERO;
    }
    // Multiply first so whole percentages stay exact.
    (Decimal::from(completed) * Decimal::ONE_HUNDRED / Decimal::from(total)).normalize()
}
