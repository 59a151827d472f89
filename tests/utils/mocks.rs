use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use wom_sync::competition::{CompetitionDetail, CompetitionSummary};
use wom_sync::{CompetitionApi, SyncError};

// ============================================================================
// Mock Infrastructure
// ============================================================================

/// Serves canned competition payloads and records which details were requested
#[derive(Clone, Default)]
pub struct MockCompetitionApi {
    competitions: Arc<Mutex<Vec<CompetitionSummary>>>,
    details: Arc<Mutex<HashMap<u64, CompetitionDetail>>>,
    requested_details: Arc<Mutex<Vec<u64>>>,
}

impl MockCompetitionApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_competition(self, detail: CompetitionDetail) -> Self {
        self.competitions
            .lock()
            .unwrap()
            .push(detail.summary.clone());
        self.details
            .lock()
            .unwrap()
            .insert(detail.summary.id, detail);
        self
    }

    /// Registers a detail that is reachable by id but absent from the group list
    pub fn with_unlisted(self, detail: CompetitionDetail) -> Self {
        self.details
            .lock()
            .unwrap()
            .insert(detail.summary.id, detail);
        self
    }

    pub fn requested_details(&self) -> Vec<u64> {
        self.requested_details.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompetitionApi for MockCompetitionApi {
    async fn fetch_competition_list(&self) -> Result<Vec<CompetitionSummary>, SyncError> {
        Ok(self.competitions.lock().unwrap().clone())
    }

    async fn fetch_competition_detail(&self, id: u64) -> Result<CompetitionDetail, SyncError> {
        self.requested_details.lock().unwrap().push(id);
        self.details
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| SyncError::HttpStatus {
                url: format!("mock://competitions/{}", id),
                status: reqwest::StatusCode::NOT_FOUND,
            })
    }
}
