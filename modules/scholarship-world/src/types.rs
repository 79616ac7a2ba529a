use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DecodeError;

// ---------------------------------------------------------------------------
// Fixed-width hex identifiers
// ---------------------------------------------------------------------------

/// A 20-byte contract or account address. Rendered as lowercase `0x` hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; 20]);

/// A 32-byte transaction hash. Rendered as lowercase `0x` hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TxHash([u8; 32]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Address whose last byte is `n`. Handy for fixtures.
    pub const fn from_low_u8(n: u8) -> Self {
        let mut bytes = [0u8; 20];
        bytes[19] = n;
        Self(bytes)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl TxHash {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn from_low_u8(n: u8) -> Self {
        let mut bytes = [0u8; 32];
        bytes[31] = n;
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

fn parse_fixed_hex<const N: usize>(s: &str, kind: &'static str) -> Result<[u8; N], DecodeError> {
    let invalid = || DecodeError::InvalidHex {
        kind,
        value: s.to_string(),
    };
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    let bytes = hex::decode(digits).map_err(|_| invalid())?;
    bytes.try_into().map_err(|_| invalid())
}

macro_rules! hex_identifier {
    ($ty:ident, $kind:literal) => {
        impl FromStr for $ty {
            type Err = DecodeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_fixed_hex(s, $kind).map(Self)
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($ty), self)
            }
        }

        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(de::Error::custom)
            }
        }
    };
}

hex_identifier!(Address, "address");
hex_identifier!(TxHash, "transaction hash");

// ---------------------------------------------------------------------------
// Sources and block metadata
// ---------------------------------------------------------------------------

/// Which contract template an event source belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// The single factory that deploys scholarship contracts.
    Factory,
    /// A scholarship contract deployed by the factory.
    Scholarship,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Factory => f.write_str("factory"),
            SourceKind::Scholarship => f.write_str("scholarship"),
        }
    }
}

/// Where and when an event was emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMeta {
    /// The contract that emitted the log.
    pub address: Address,
    pub block_number: u64,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub block_timestamp: DateTime<Utc>,
    pub transaction_hash: TxHash,
    pub log_index: u32,
}

impl EventMeta {
    /// `txHash-logIndex`, the key of every append-only record.
    pub fn log_id(&self) -> String {
        format!("{}-{}", self.transaction_hash, self.log_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_parses_with_and_without_prefix() {
        let a: Address = "0x00000000000000000000000000000000000000ff".parse().unwrap();
        let b: Address = "00000000000000000000000000000000000000FF".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a, Address::from_low_u8(0xff));
    }

    #[test]
    fn address_displays_lowercase_prefixed() {
        let a = Address::from_low_u8(0xab);
        assert_eq!(a.to_string(), "0x00000000000000000000000000000000000000ab");
    }

    #[test]
    fn address_rejects_wrong_length() {
        let err = "0x1234".parse::<Address>().unwrap_err();
        assert!(matches!(err, DecodeError::InvalidHex { kind: "address", .. }));
    }

    #[test]
    fn address_rejects_non_hex() {
        assert!("0xzz00000000000000000000000000000000000000"
            .parse::<Address>()
            .is_err());
    }

    #[test]
    fn zero_address_is_zero() {
        assert!(Address::ZERO.is_zero());
        assert!(!Address::from_low_u8(1).is_zero());
    }

    #[test]
    fn log_id_joins_hash_and_index() {
        let meta = EventMeta {
            address: Address::from_low_u8(1),
            block_number: 10,
            block_timestamp: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            transaction_hash: TxHash::from_low_u8(2),
            log_index: 7,
        };
        assert_eq!(
            meta.log_id(),
            "0x0000000000000000000000000000000000000000000000000000000000000002-7"
        );
    }
}
