pub mod aggregate;
pub mod config;
pub mod entities;
pub mod error;

pub use aggregate::completion_percentage;
pub use config::{load_config, DiscoveryConfig, IndexerConfig, Secrets, StoreBackend};
pub use entities::*;
pub use error::IndexerError;

pub use scholarship_world::{Address, Amount, TxHash};
