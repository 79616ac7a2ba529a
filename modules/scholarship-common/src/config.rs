use std::env;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use scholarship_world::Address;

use crate::error::IndexerError;

/// Iteration cap used when a discovery section omits a value.
pub const DEFAULT_DISCOVERY_CAP: u32 = 100;

/// TOML-backed indexer configuration.
/// Secrets (database URL) stay as env vars, see [`Secrets`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexerConfig {
    pub factory: FactoryConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FactoryConfig {
    /// The single factory whose events seed the source registry.
    pub address: Address,
}

/// Safety caps for probing loops. These guarantee termination; they are not
/// a correctness mechanism, and hitting one is logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiscoveryConfig {
    #[serde(default = "default_cap")]
    pub max_approved_students: u32,
    #[serde(default = "default_cap")]
    pub max_milestones: u32,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_approved_students: DEFAULT_DISCOVERY_CAP,
            max_milestones: DEFAULT_DISCOVERY_CAP,
        }
    }
}

fn default_cap() -> u32 {
    DEFAULT_DISCOVERY_CAP
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    Memory,
    Postgres,
}

impl IndexerConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse indexer config")
    }
}

/// Load and parse a TOML config file.
pub fn load_config(path: &Path) -> Result<IndexerConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: IndexerConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    Ok(config)
}

/// Secrets loaded from environment variables.
#[derive(Debug, Clone, Default)]
pub struct Secrets {
    pub database_url: Option<String>,
}

impl Secrets {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").ok().filter(|v| !v.is_empty()),
        }
    }

    pub fn require_database_url(&self) -> Result<&str, IndexerError> {
        self.database_url.as_deref().ok_or_else(|| {
            IndexerError::Config("DATABASE_URL is required for the postgres backend".into())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let config = IndexerConfig::from_toml_str(
            r#"
            [factory]
            address = "0x00000000000000000000000000000000000000f0"
            "#,
        )
        .unwrap();

        assert_eq!(config.factory.address, Address::from_low_u8(0xf0));
        assert_eq!(config.discovery, DiscoveryConfig::default());
        assert_eq!(config.store.backend, StoreBackend::Memory);
    }

    #[test]
    fn discovery_caps_are_configurable() {
        let config = IndexerConfig::from_toml_str(
            r#"
            [factory]
            address = "0x00000000000000000000000000000000000000f0"

            [discovery]
            max_approved_students = 500

            [store]
            backend = "postgres"
            "#,
        )
        .unwrap();

        assert_eq!(config.discovery.max_approved_students, 500);
        assert_eq!(config.discovery.max_milestones, DEFAULT_DISCOVERY_CAP);
        assert_eq!(config.store.backend, StoreBackend::Postgres);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = IndexerConfig::from_toml_str(
            r#"
            [factory]
            address = "0x00000000000000000000000000000000000000f0"
            start_block = 12
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn invalid_factory_address_is_rejected() {
        let result = IndexerConfig::from_toml_str(
            r#"
            [factory]
            address = "0x12"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn missing_database_url_is_config_error() {
        let secrets = Secrets::default();
        assert!(matches!(
            secrets.require_database_url(),
            Err(IndexerError::Config(_))
        ));
    }
}
