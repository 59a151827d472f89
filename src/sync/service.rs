use chrono::{DateTime, Utc};
use std::sync::Arc;
use strum::IntoEnumIterator;
use tracing::{error, info, instrument, warn};

use crate::competition::{
    CompetitionApi, CompetitionData, CompetitionFinder, CompetitionSummary, EventKind, SyncOutcome,
    SyncReport,
};
use crate::shared::SyncError;
use crate::store::{ConfigStore, ConfigUpdater};

/// Kinds discovered from the group's competition list, in declaration order
fn listed_kinds() -> impl Iterator<Item = EventKind> {
    EventKind::iter().filter(|kind| kind.is_title_matched())
}

/// Runs one synchronization pass: finder, then diffed writes, for every tracked kind
pub struct SyncService {
    finder: CompetitionFinder,
    updater: ConfigUpdater,
    hunt_competition_id: Option<u64>,
}

impl SyncService {
    pub fn new(
        api: Arc<dyn CompetitionApi>,
        store: Arc<dyn ConfigStore>,
        site_base_url: impl Into<String>,
        hunt_competition_id: Option<u64>,
    ) -> Self {
        Self {
            finder: CompetitionFinder::new(api),
            updater: ConfigUpdater::new(store, site_base_url),
            hunt_competition_id,
        }
    }

    /// Runs a full cycle. Failures are contained per kind and reported, never returned.
    #[instrument(skip(self))]
    pub async fn run_cycle(&self, now: DateTime<Utc>) -> SyncReport {
        info!("Starting competition sync cycle");
        let mut report = SyncReport::default();

        match self.finder.fetch_competition_list().await {
            Ok(competitions) => {
                for kind in listed_kinds() {
                    let outcome = self.sync_listed_kind(kind, &competitions, now).await;
                    report.outcomes.push((kind, outcome));
                }
            }
            Err(e) => {
                error!(error = %e, "Failed to fetch competition list, skipping listed kinds");
                for kind in listed_kinds() {
                    report.outcomes.push((kind, SyncOutcome::Aborted(e.to_string())));
                }
            }
        }

        let hunt_outcome = self.sync_hunt(now).await;
        report.outcomes.push((EventKind::Hunt, hunt_outcome));

        info!(
            keys_changed = report.keys_changed(),
            failures = report.has_failures(),
            "Competition sync cycle finished"
        );
        report
    }

    async fn sync_listed_kind(
        &self,
        kind: EventKind,
        competitions: &[CompetitionSummary],
        now: DateTime<Utc>,
    ) -> SyncOutcome {
        let result = match self.finder.find(kind, competitions, now).await {
            Ok(Some(data)) => self.persist(&data).await,
            Ok(None) => self
                .updater
                .set_inactive(kind)
                .await
                .map(|changed| SyncOutcome::Inactive {
                    keys_changed: usize::from(changed),
                }),
            Err(e) => Err(e),
        };

        result.unwrap_or_else(|e| abort_outcome(kind, e))
    }

    async fn sync_hunt(&self, now: DateTime<Utc>) -> SyncOutcome {
        let Some(competition_id) = self.hunt_competition_id else {
            return SyncOutcome::Skipped;
        };

        let result = match self.finder.find_hunt(competition_id, now).await {
            Ok(data) => self.persist(&data).await,
            Err(e) => Err(e),
        };

        result.unwrap_or_else(|e| abort_outcome(EventKind::Hunt, e))
    }

    async fn persist(&self, data: &CompetitionData) -> Result<SyncOutcome, SyncError> {
        let keys_changed = self
            .updater
            .write_competition(data)
            .await
            .map_err(|e| SyncError::aborted(data.kind, Some(data.id), e))?;

        Ok(if data.active {
            SyncOutcome::Active {
                competition_id: data.id,
                keys_changed,
            }
        } else {
            SyncOutcome::Completed {
                competition_id: data.id,
                keys_changed,
            }
        })
    }
}

fn abort_outcome(kind: EventKind, e: SyncError) -> SyncOutcome {
    match &e {
        SyncError::SelectionAborted { competition_id, .. } => {
            error!(kind = %kind, competition_id = ?competition_id, error = %e, "Competition selection aborted");
        }
        _ => {
            warn!(kind = %kind, error = %e, "Competition sync failed");
        }
    }
    SyncOutcome::Aborted(e.to_string())
}
