// Library crate for the competition sync engine
// This file exposes the public API for the binary and integration tests

pub mod competition;
pub mod config;
pub mod shared;
pub mod store;
pub mod sync;

// Re-export commonly used types for easier access in tests
pub use competition::{
    CompetitionApi, CompetitionData, CompetitionFinder, EventKind, SyncOutcome, SyncReport,
    WomClient,
};
pub use config::SyncConfig;
pub use shared::SyncError;
pub use store::{ConfigStore, ConfigUpdater, InMemoryConfigStore, PostgresConfigStore};
pub use sync::{SchedulerConfig, SyncScheduler, SyncService};
