use chrono::{DateTime, SecondsFormat, Utc};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::repository::ConfigStore;
use crate::competition::parser::{
    boss_leaderboard_json, skill_leaderboard_json, team_leaderboard_json,
};
use crate::competition::{CompetitionData, CompetitionPayload, EventKind, Team};
use crate::shared::SyncError;

/// Config keys written for one event kind
pub mod keys {
    use crate::competition::EventKind;

    pub fn title(kind: EventKind) -> String {
        format!("{}Title", kind.config_prefix())
    }

    pub fn active(kind: EventKind) -> String {
        format!("{}Active", kind.config_prefix())
    }

    pub fn start_time(kind: EventKind) -> String {
        format!("{}_start_time", kind.config_prefix())
    }

    pub fn end_time(kind: EventKind) -> String {
        format!("{}_end_time", kind.config_prefix())
    }

    pub fn wom_link(kind: EventKind) -> String {
        format!("{}_wom_link", kind.config_prefix())
    }

    pub fn leaderboard(kind: EventKind) -> String {
        format!("{}Leaderboard", kind.config_prefix())
    }

    /// `team` is 1 or 2; `field` is one of name, color, score, leaderboard
    pub fn hunt_team(team: u8, field: &str) -> String {
        format!("{}_team_{}_{}", EventKind::Hunt.config_prefix(), team, field)
    }
}

/// Persists selected competitions, skipping writes whose value is unchanged
pub struct ConfigUpdater {
    store: Arc<dyn ConfigStore>,
    site_base_url: String,
}

impl ConfigUpdater {
    pub fn new(store: Arc<dyn ConfigStore>, site_base_url: impl Into<String>) -> Self {
        Self {
            store,
            site_base_url: site_base_url.into(),
        }
    }

    /// Writes `value` only when it differs from the stored one; returns whether a write happened.
    /// The read and the write are not atomic with respect to other writers.
    pub async fn write_if_changed(&self, key: &str, value: &str) -> Result<bool, SyncError> {
        let current = self.store.get(key).await?;
        if current.as_deref() == Some(value) {
            return Ok(false);
        }

        debug!(key = %key, previous = ?current, "Config value changed");
        self.store.set(key, value).await?;
        Ok(true)
    }

    /// Flips only the `<prefix>Active` flag off, leaving the last competition visible
    #[instrument(skip(self))]
    pub async fn set_inactive(&self, kind: EventKind) -> Result<bool, SyncError> {
        self.write_if_changed(&keys::active(kind), "false").await
    }

    /// Writes every field of the competition; returns the number of keys that changed.
    ///
    /// Changed keys are collected with reads only and then written in a single
    /// `set_many`, so a store failure leaves the previous record intact.
    #[instrument(skip(self, data), fields(kind = %data.kind, competition_id = data.id))]
    pub async fn write_competition(&self, data: &CompetitionData) -> Result<usize, SyncError> {
        let kind = data.kind;
        let mut entries: Vec<(String, String)> = vec![
            (keys::title(kind), data.title.clone()),
            (keys::active(kind), data.active.to_string()),
            (keys::start_time(kind), format_instant(data.starts_at)),
            (keys::end_time(kind), format_instant(data.ends_at)),
            (keys::wom_link(kind), self.competition_link(data.id)),
        ];

        match &data.payload {
            CompetitionPayload::Leaderboard(leaderboard) => {
                let json = match kind {
                    EventKind::Botm => boss_leaderboard_json(leaderboard),
                    _ => skill_leaderboard_json(leaderboard),
                }
                .map_err(|source| SyncError::Encoding {
                    what: "leaderboard",
                    source,
                })?;
                entries.push((keys::leaderboard(kind), json));
            }
            CompetitionPayload::Teams(split) => {
                entries.extend(team_entries(1, &split.team_a)?);
                entries.extend(team_entries(2, &split.team_b)?);
            }
        }

        let total = entries.len();
        let mut changed = Vec::with_capacity(total);
        for (key, value) in entries {
            if self.store.get(&key).await?.as_deref() != Some(value.as_str()) {
                changed.push((key, value));
            }
        }

        if !changed.is_empty() {
            debug!(count = changed.len(), "Writing changed config values");
            self.store.set_many(&changed).await?;
        }

        info!(
            keys_changed = changed.len(),
            keys_total = total,
            active = data.active,
            "Competition written to config"
        );
        Ok(changed.len())
    }

    fn competition_link(&self, competition_id: u64) -> String {
        format!(
            "{}/competitions/{}",
            self.site_base_url.trim_end_matches('/'),
            competition_id
        )
    }
}

fn team_entries(team_number: u8, team: &Team) -> Result<Vec<(String, String)>, SyncError> {
    let leaderboard =
        team_leaderboard_json(&team.leaderboard).map_err(|source| SyncError::Encoding {
            what: "team leaderboard",
            source,
        })?;

    Ok(vec![
        (keys::hunt_team(team_number, "name"), team.name.clone()),
        (keys::hunt_team(team_number, "color"), team.color.to_string()),
        (keys::hunt_team(team_number, "score"), team.total_score.to_string()),
        (keys::hunt_team(team_number, "leaderboard"), leaderboard),
    ])
}

fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::competition::{RankedEntry, TeamSplit};
    use crate::shared::test_utils::{t0, FailingConfigStore};
    use crate::store::InMemoryConfigStore;
    use chrono::Duration;

    fn updater_with(store: Arc<InMemoryConfigStore>) -> ConfigUpdater {
        ConfigUpdater::new(store, "https://wiseoldman.net")
    }

    fn sotw_data(active: bool) -> CompetitionData {
        CompetitionData {
            kind: EventKind::Sotw,
            id: 42,
            title: "SOTW Woodcutting".to_string(),
            starts_at: t0() - Duration::days(3),
            ends_at: t0() + Duration::days(4),
            active,
            payload: CompetitionPayload::Leaderboard(vec![RankedEntry {
                name: "Zezima".to_string(),
                score: 150_000,
            }]),
        }
    }

    #[tokio::test]
    async fn test_write_if_changed_writes_once_for_same_value() {
        let store = Arc::new(InMemoryConfigStore::new());
        let updater = updater_with(store.clone());

        assert!(updater.write_if_changed("sotwTitle", "SOTW 1").await.unwrap());
        assert!(!updater.write_if_changed("sotwTitle", "SOTW 1").await.unwrap());
        assert_eq!(store.mutation_count(), 1);

        assert!(updater.write_if_changed("sotwTitle", "SOTW 2").await.unwrap());
        assert_eq!(store.mutation_count(), 2);
    }

    #[tokio::test]
    async fn test_absent_key_counts_as_changed() {
        let store = Arc::new(InMemoryConfigStore::new());
        let updater = updater_with(store.clone());

        assert!(updater.write_if_changed("botmActive", "").await.unwrap());
        assert_eq!(store.value("botmActive").as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_write_competition_sets_all_fields() {
        let store = Arc::new(InMemoryConfigStore::new());
        let updater = updater_with(store.clone());

        let changed = updater.write_competition(&sotw_data(true)).await.unwrap();

        assert_eq!(changed, 6);
        assert_eq!(store.value("sotwTitle").as_deref(), Some("SOTW Woodcutting"));
        assert_eq!(store.value("sotwActive").as_deref(), Some("true"));
        assert_eq!(
            store.value("sotw_start_time").as_deref(),
            Some("2024-06-12T12:00:00Z")
        );
        assert_eq!(
            store.value("sotw_end_time").as_deref(),
            Some("2024-06-19T12:00:00Z")
        );
        assert_eq!(
            store.value("sotw_wom_link").as_deref(),
            Some("https://wiseoldman.net/competitions/42")
        );
        assert_eq!(
            store.value("sotwLeaderboard").as_deref(),
            Some(r#"[{"username":"Zezima","xp":150000}]"#)
        );
    }

    #[tokio::test]
    async fn test_rewriting_same_competition_is_a_no_op() {
        let store = Arc::new(InMemoryConfigStore::new());
        let updater = updater_with(store.clone());

        updater.write_competition(&sotw_data(true)).await.unwrap();
        let changed = updater.write_competition(&sotw_data(true)).await.unwrap();

        assert_eq!(changed, 0);
        assert_eq!(store.mutation_count(), 6);
    }

    #[tokio::test]
    async fn test_set_inactive_touches_only_active_flag() {
        let store = Arc::new(InMemoryConfigStore::new());
        let updater = updater_with(store.clone());
        updater.write_competition(&sotw_data(true)).await.unwrap();
        let before = store.snapshot();

        assert!(updater.set_inactive(EventKind::Sotw).await.unwrap());

        let after = store.snapshot();
        assert_eq!(after.get("sotwActive").map(String::as_str), Some("false"));
        for (key, value) in &before {
            if key != "sotwActive" {
                assert_eq!(after.get(key), Some(value), "{} should be unchanged", key);
            }
        }
        assert_eq!(store.mutated_keys().last().map(String::as_str), Some("sotwActive"));

        // Second call has nothing to change
        assert!(!updater.set_inactive(EventKind::Sotw).await.unwrap());
    }

    #[tokio::test]
    async fn test_botm_leaderboard_uses_score_field() {
        let store = Arc::new(InMemoryConfigStore::new());
        let updater = updater_with(store.clone());
        let mut data = sotw_data(false);
        data.kind = EventKind::Botm;

        updater.write_competition(&data).await.unwrap();

        assert_eq!(store.value("botmActive").as_deref(), Some("false"));
        assert_eq!(
            store.value("botmLeaderboard").as_deref(),
            Some(r#"[{"username":"Zezima","score":150000}]"#)
        );
        assert!(store.value("sotwTitle").is_none());
    }

    #[tokio::test]
    async fn test_hunt_writes_both_teams() {
        let store = Arc::new(InMemoryConfigStore::new());
        let updater = updater_with(store.clone());
        let team = |name: &str, color: &'static str, score: i64| Team {
            name: name.to_string(),
            color,
            leaderboard: vec![RankedEntry {
                name: format!("{} captain", name),
                score: 12.347,
            }],
            total_score: score,
        };
        let data = CompetitionData {
            kind: EventKind::Hunt,
            id: 7,
            title: "Clan Hunt".to_string(),
            starts_at: t0() - Duration::days(1),
            ends_at: t0() + Duration::days(1),
            active: true,
            payload: CompetitionPayload::Teams(TeamSplit {
                team_a: team("Red", "#FF0000", 105),
                team_b: team("Blue", "#0000FF", 3),
            }),
        };

        let changed = updater.write_competition(&data).await.unwrap();

        assert_eq!(changed, 13);
        assert_eq!(store.value("hunt_team_1_name").as_deref(), Some("Red"));
        assert_eq!(store.value("hunt_team_1_color").as_deref(), Some("#FF0000"));
        assert_eq!(store.value("hunt_team_1_score").as_deref(), Some("105"));
        assert_eq!(
            store.value("hunt_team_2_leaderboard").as_deref(),
            Some(r#"[{"username":"Blue captain","ehb":12.35}]"#)
        );
        assert!(store.value("huntLeaderboard").is_none());
    }

    #[tokio::test]
    async fn test_store_failure_leaves_previous_record_intact() {
        let seeded = InMemoryConfigStore::with_values(vec![
            ("sotwTitle", "SOTW Old"),
            ("sotwActive", "false"),
            ("sotwLeaderboard", "[]"),
        ]);
        let store = Arc::new(FailingConfigStore::new(seeded, 2));
        let updater = ConfigUpdater::new(store.clone(), "https://wiseoldman.net");

        let result = updater.write_competition(&sotw_data(true)).await;

        assert!(matches!(result, Err(SyncError::Store(_))));
        assert_eq!(store.inner.value("sotwTitle").as_deref(), Some("SOTW Old"));
        assert_eq!(store.inner.value("sotwActive").as_deref(), Some("false"));
        assert_eq!(store.inner.value("sotwLeaderboard").as_deref(), Some("[]"));
        assert!(store.inner.value("sotw_start_time").is_none());
        assert_eq!(store.inner.mutation_count(), 0);
    }

    #[tokio::test]
    async fn test_only_changed_keys_are_batched() {
        let store = Arc::new(InMemoryConfigStore::new());
        let updater = updater_with(store.clone());
        updater.write_competition(&sotw_data(true)).await.unwrap();

        let mut renamed = sotw_data(true);
        renamed.title = "SOTW Woodcutting II".to_string();
        let changed = updater.write_competition(&renamed).await.unwrap();

        assert_eq!(changed, 1);
        assert_eq!(store.mutated_keys().last().map(String::as_str), Some("sotwTitle"));
        assert_eq!(store.mutation_count(), 7);
    }
}
