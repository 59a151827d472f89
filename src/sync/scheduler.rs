use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, instrument, warn};

use super::service::SyncService;
use crate::config::SyncConfig;

/// Configuration for the sync scheduler
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// How often a sync cycle starts
    pub poll_interval: Duration,
    /// How long `stop` waits for an in-flight cycle before aborting it
    pub shutdown_grace: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(7 * 60), // 7 minutes
            shutdown_grace: Duration::from_secs(10),
        }
    }
}

impl From<&SyncConfig> for SchedulerConfig {
    fn from(config: &SyncConfig) -> Self {
        Self {
            poll_interval: config.poll_interval,
            shutdown_grace: config.shutdown_grace,
        }
    }
}

enum SchedulerState {
    Stopped,
    Running {
        shutdown: watch::Sender<bool>,
        handle: JoinHandle<()>,
    },
}

/// Owns the repeating sync timer
pub struct SyncScheduler {
    service: Arc<SyncService>,
    config: SchedulerConfig,
    state: SchedulerState,
}

impl SyncScheduler {
    pub fn new(service: Arc<SyncService>, config: SchedulerConfig) -> Self {
        Self {
            service,
            config,
            state: SchedulerState::Stopped,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, SchedulerState::Running { .. })
    }

    /// Spawns the background task; the first cycle runs immediately. No-op when already running.
    #[instrument(skip(self))]
    pub fn start(&mut self) {
        if self.is_running() {
            warn!("Sync scheduler already running");
            return;
        }

        info!(
            poll_interval_secs = self.config.poll_interval.as_secs(),
            "Starting competition sync scheduler"
        );

        let (shutdown, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(run_schedule(
            self.service.clone(),
            self.config.poll_interval,
            shutdown_rx,
        ));

        self.state = SchedulerState::Running { shutdown, handle };
    }

    /// Signals the task to stop and lets an in-flight cycle finish, aborting it after the grace period
    #[instrument(skip(self))]
    pub async fn stop(&mut self) {
        let SchedulerState::Running { shutdown, mut handle } =
            std::mem::replace(&mut self.state, SchedulerState::Stopped)
        else {
            return;
        };

        info!("Stopping competition sync scheduler");
        let _ = shutdown.send(true);

        match tokio::time::timeout(self.config.shutdown_grace, &mut handle).await {
            Ok(Ok(())) => info!("Sync scheduler stopped"),
            Ok(Err(e)) => warn!(error = %e, "Sync scheduler task ended abnormally"),
            Err(_) => {
                warn!(
                    grace_secs = self.config.shutdown_grace.as_secs(),
                    "Sync cycle did not finish in time, aborting"
                );
                handle.abort();
            }
        }
    }
}

async fn run_schedule(
    service: Arc<SyncService>,
    poll_interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = interval(poll_interval);
    // An overrunning cycle delays the next tick instead of bunching them up
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let report = service.run_cycle(Utc::now()).await;
                if report.has_failures() {
                    warn!(outcomes = ?report.outcomes, "Sync cycle completed with failures");
                }
            }
            _ = shutdown.changed() => {
                break;
            }
        }

        if *shutdown.borrow() {
            break;
        }
    }

    info!("Sync schedule loop exited");
}
