//! Typed, failure-isolated reads against one contract.

use tracing::{debug, warn};

use scholarship_world::Address;

use crate::reader::{CallOutput, ContractCall, ContractReader, Eligibility, MilestoneInfo};

/// Outcome of a single probe: a value, or an explicit "unavailable" marker.
///
/// There is no implicit default. Callers pick one with [`Probed::or`] or
/// [`Probed::or_default`], so every dependent field is always populated.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probed<T> {
    Value(T),
    Unavailable,
}

impl<T> Probed<T> {
    pub fn or(self, default: T) -> T {
        match self {
            Probed::Value(v) => v,
            Probed::Unavailable => default,
        }
    }

    pub fn or_default(self) -> T
    where
        T: Default,
    {
        self.or(T::default())
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Probed::Value(_))
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Probed::Value(v) => Some(v),
            Probed::Unavailable => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Probed<U> {
        match self {
            Probed::Value(v) => Probed::Value(f(v)),
            Probed::Unavailable => Probed::Unavailable,
        }
    }
}

/// Reads against a single contract address.
///
/// Each call is isolated: a revert only makes that one value unavailable.
pub struct Probe<'a, R: ContractReader + ?Sized> {
    reader: &'a R,
    contract: Address,
}

impl<'a, R: ContractReader + ?Sized> Probe<'a, R> {
    pub fn new(reader: &'a R, contract: Address) -> Self {
        Self { reader, contract }
    }

    pub fn contract(&self) -> Address {
        self.contract
    }

    pub async fn description(&self) -> Probed<String> {
        self.read(ContractCall::Description, |out| match out {
            CallOutput::Text(s) => Some(s),
            _ => None,
        })
        .await
    }

    pub async fn eligibility(&self) -> Probed<Eligibility> {
        self.read(ContractCall::Eligibility, |out| match out {
            CallOutput::Eligibility(e) => Some(e),
            _ => None,
        })
        .await
    }

    pub async fn deadline(&self) -> Probed<u64> {
        self.read(ContractCall::Deadline, |out| match out {
            CallOutput::Uint(v) => Some(v),
            _ => None,
        })
        .await
    }

    pub async fn status(&self) -> Probed<u8> {
        self.read(ContractCall::Status, |out| match out {
            CallOutput::Uint(v) => u8::try_from(v).ok(),
            _ => None,
        })
        .await
    }

    pub async fn total_milestones(&self) -> Probed<u64> {
        self.read(ContractCall::TotalMilestones, |out| match out {
            CallOutput::Uint(v) => Some(v),
            _ => None,
        })
        .await
    }

    pub async fn milestone(&self, index: u64) -> Probed<MilestoneInfo> {
        self.read(ContractCall::Milestone(index), |out| match out {
            CallOutput::Milestone(m) => Some(m),
            _ => None,
        })
        .await
    }

    pub async fn approved_student(&self, index: u64) -> Probed<Address> {
        self.read(ContractCall::ApprovedStudent(index), |out| match out {
            CallOutput::Address(a) => Some(a),
            _ => None,
        })
        .await
    }

    async fn read<T>(
        &self,
        call: ContractCall,
        extract: impl FnOnce(CallOutput) -> Option<T>,
    ) -> Probed<T> {
        match self.reader.call(self.contract, call).await {
            Ok(output) => match extract(output) {
                Some(value) => Probed::Value(value),
                None => {
                    warn!(contract = %self.contract, call = %call, "Unexpected output shape, treating as unavailable");
                    Probed::Unavailable
                }
            },
            Err(e) => {
                debug!(contract = %self.contract, call = %call, error = %e, "Probe unavailable");
                Probed::Unavailable
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_falls_back_to_given_default() {
        assert_eq!(Probed::<u64>::Unavailable.or(7), 7);
        assert_eq!(Probed::Value(3u64).or(7), 3);
    }

    #[test]
    fn unavailable_string_defaults_to_empty() {
        assert_eq!(Probed::<String>::Unavailable.or_default(), "");
    }

    #[test]
    fn map_preserves_unavailability() {
        let p: Probed<u64> = Probed::Unavailable;
        assert_eq!(p.map(|v| v + 1), Probed::Unavailable);
        assert_eq!(Probed::Value(1u64).map(|v| v + 1).into_option(), Some(2));
    }
}
