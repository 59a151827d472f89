use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::client::CompetitionApi;
use super::models::{CompetitionData, CompetitionPayload, CompetitionSummary, EventKind};
use super::parser::{rank_leaderboard, split_into_teams};
use crate::shared::SyncError;

/// Picks the competition to mirror for each kind and loads its standings
pub struct CompetitionFinder {
    api: Arc<dyn CompetitionApi>,
}

impl CompetitionFinder {
    pub fn new(api: Arc<dyn CompetitionApi>) -> Self {
        Self { api }
    }

    pub async fn fetch_competition_list(&self) -> Result<Vec<CompetitionSummary>, SyncError> {
        self.api.fetch_competition_list().await
    }

    /// First competition in list order that is running at `now` and matches the kind's title rule.
    /// Hunt is never selected this way.
    pub fn select_active(
        kind: EventKind,
        competitions: &[CompetitionSummary],
        now: DateTime<Utc>,
    ) -> Option<&CompetitionSummary> {
        competitions
            .iter()
            .find(|c| c.is_active_at(now) && kind.matches_title(&c.title))
    }

    /// Title-matching competition that ended most recently, at or before `now`
    pub fn select_most_recent_completed(
        kind: EventKind,
        competitions: &[CompetitionSummary],
        now: DateTime<Utc>,
    ) -> Option<&CompetitionSummary> {
        if !kind.is_title_matched() {
            return None;
        }

        competitions
            .iter()
            .filter(|c| c.has_ended_by(now) && kind.matches_title(&c.title))
            .max_by_key(|c| c.ends_at)
    }

    /// Active competition for `kind`, else the latest completed one; `None` when neither exists.
    ///
    /// Any failure while loading the chosen competition aborts the whole kind.
    #[instrument(skip(self, competitions), fields(kind = %kind))]
    pub async fn find(
        &self,
        kind: EventKind,
        competitions: &[CompetitionSummary],
        now: DateTime<Utc>,
    ) -> Result<Option<CompetitionData>, SyncError> {
        if let Some(active) = Self::select_active(kind, competitions, now) {
            info!(competition_id = active.id, title = %active.title, "Found active competition");
            return self.load(kind, active.id, now).await.map(Some);
        }

        match Self::select_most_recent_completed(kind, competitions, now) {
            Some(completed) => {
                info!(
                    competition_id = completed.id,
                    title = %completed.title,
                    "No active competition, using most recently completed"
                );
                self.load(kind, completed.id, now).await.map(Some)
            }
            None => {
                debug!("No active or completed competition");
                Ok(None)
            }
        }
    }

    /// Loads the hunt competition by id, whether or not it is currently running
    #[instrument(skip(self))]
    pub async fn find_hunt(
        &self,
        competition_id: u64,
        now: DateTime<Utc>,
    ) -> Result<CompetitionData, SyncError> {
        self.load(EventKind::Hunt, competition_id, now).await
    }

    async fn load(
        &self,
        kind: EventKind,
        competition_id: u64,
        now: DateTime<Utc>,
    ) -> Result<CompetitionData, SyncError> {
        let detail = self
            .api
            .fetch_competition_detail(competition_id)
            .await
            .map_err(|e| SyncError::aborted(kind, Some(competition_id), e))?;

        let payload = match kind {
            EventKind::Hunt => CompetitionPayload::Teams(split_into_teams(&detail)),
            EventKind::Sotw | EventKind::Botm => {
                CompetitionPayload::Leaderboard(rank_leaderboard(&detail))
            }
        };

        let summary = detail.summary;
        Ok(CompetitionData {
            kind,
            id: summary.id,
            active: summary.is_active_at(now),
            title: summary.title,
            starts_at: summary.starts_at,
            ends_at: summary.ends_at,
            payload,
        })
    }
}
