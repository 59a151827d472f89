pub mod repository;
pub mod updater;

pub use repository::{ConfigStore, InMemoryConfigStore, PostgresConfigStore};
pub use updater::{keys, ConfigUpdater};
