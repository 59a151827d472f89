pub mod scheduler;
pub mod service;

pub use scheduler::{SchedulerConfig, SyncScheduler};
pub use service::SyncService;
