use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

/// Number of entries kept on every leaderboard
pub const LEADERBOARD_SIZE: usize = 10;

static SOTW_TITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bsotw\b").unwrap());
static BOTM_TITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bbotm\b").unwrap());

/// The competition categories mirrored into the config store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "UPPERCASE")]
pub enum EventKind {
    /// Skill of the week
    Sotw,
    /// Boss of the month
    Botm,
    /// Team hunt, tracked by competition id
    Hunt,
}

impl EventKind {
    /// Prefix used for every config key written for this kind
    pub fn config_prefix(&self) -> &'static str {
        match self {
            EventKind::Sotw => "sotw",
            EventKind::Botm => "botm",
            EventKind::Hunt => "hunt",
        }
    }

    /// Word-boundary, case-insensitive keyword match. Hunt is never found by title.
    pub fn matches_title(&self, title: &str) -> bool {
        match self {
            EventKind::Sotw => SOTW_TITLE.is_match(title),
            EventKind::Botm => BOTM_TITLE.is_match(title),
            EventKind::Hunt => false,
        }
    }

    /// Kinds discovered by scanning the group's competition list
    pub fn is_title_matched(&self) -> bool {
        !matches!(self, EventKind::Hunt)
    }
}

/// One entry of the group competition list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitionSummary {
    pub id: u64,
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl CompetitionSummary {
    /// `starts_at <= now < ends_at`
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.starts_at && now < self.ends_at
    }

    pub fn has_ended_by(&self, now: DateTime<Utc>) -> bool {
        self.ends_at <= now
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitionDetail {
    #[serde(flatten)]
    pub summary: CompetitionSummary,
    #[serde(default)]
    pub participations: Vec<Participation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participation {
    pub player: PlayerRef,
    #[serde(default)]
    pub team_name: Option<String>,
    #[serde(default)]
    pub progress: Progress,
}

impl Participation {
    pub fn gained(&self) -> f64 {
        self.progress.gained.unwrap_or(0.0)
    }

    /// Non-empty team name, if any
    pub fn team(&self) -> Option<&str> {
        self.team_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRef {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl PlayerRef {
    pub fn name(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.username)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    #[serde(default)]
    pub gained: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedEntry<S> {
    pub name: String,
    pub score: S,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Team {
    pub name: String,
    pub color: &'static str,
    pub leaderboard: Vec<RankedEntry<f64>>,
    /// Rounded sum over every member, not only the displayed top entries
    pub total_score: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeamSplit {
    pub team_a: Team,
    pub team_b: Team,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CompetitionPayload {
    Leaderboard(Vec<RankedEntry<i64>>),
    Teams(TeamSplit),
}

/// A selected competition, ready to be persisted
#[derive(Debug, Clone, PartialEq)]
pub struct CompetitionData {
    pub kind: EventKind,
    pub id: u64,
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub active: bool,
    pub payload: CompetitionPayload,
}

/// What a sync cycle did for one kind
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    Active { competition_id: u64, keys_changed: usize },
    Completed { competition_id: u64, keys_changed: usize },
    Inactive { keys_changed: usize },
    Skipped,
    Aborted(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    pub outcomes: Vec<(EventKind, SyncOutcome)>,
}

impl SyncReport {
    pub fn outcome(&self, kind: EventKind) -> Option<&SyncOutcome> {
        self.outcomes
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, outcome)| outcome)
    }

    pub fn keys_changed(&self) -> usize {
        self.outcomes
            .iter()
            .map(|(_, outcome)| match outcome {
                SyncOutcome::Active { keys_changed, .. }
                | SyncOutcome::Completed { keys_changed, .. }
                | SyncOutcome::Inactive { keys_changed } => *keys_changed,
                SyncOutcome::Skipped | SyncOutcome::Aborted(_) => 0,
            })
            .sum()
    }

    pub fn has_failures(&self) -> bool {
        self.outcomes
            .iter()
            .any(|(_, outcome)| matches!(outcome, SyncOutcome::Aborted(_)))
    }
}
