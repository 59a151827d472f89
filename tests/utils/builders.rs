use chrono::{DateTime, Duration, Utc};

use wom_sync::competition::{
    CompetitionDetail, CompetitionSummary, Participation, PlayerRef, Progress,
};

/// Reference "now" shared by the integration tests
pub fn now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-03-20T18:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

/// Builder for competition detail payloads, positioned relative to `now()`
pub struct CompetitionBuilder {
    id: u64,
    title: String,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    participations: Vec<Participation>,
}

impl CompetitionBuilder {
    pub fn new(id: u64, title: &str) -> Self {
        Self {
            id,
            title: title.to_string(),
            starts_at: now() - Duration::days(1),
            ends_at: now() + Duration::days(6),
            participations: Vec::new(),
        }
    }

    /// Window that opened two days ago and is still running
    pub fn running(mut self) -> Self {
        self.starts_at = now() - Duration::days(2);
        self.ends_at = now() + Duration::days(5);
        self
    }

    /// Window that closed `days_ago` days ago
    pub fn ended_days_ago(mut self, days_ago: i64) -> Self {
        self.ends_at = now() - Duration::days(days_ago);
        self.starts_at = self.ends_at - Duration::days(7);
        self
    }

    pub fn upcoming(mut self) -> Self {
        self.starts_at = now() + Duration::days(3);
        self.ends_at = now() + Duration::days(10);
        self
    }

    pub fn player(mut self, name: &str, gained: f64) -> Self {
        self.participations.push(participation(name, None, gained));
        self
    }

    pub fn team_player(mut self, name: &str, team: &str, gained: f64) -> Self {
        self.participations
            .push(participation(name, Some(team), gained));
        self
    }

    pub fn build(self) -> CompetitionDetail {
        CompetitionDetail {
            summary: CompetitionSummary {
                id: self.id,
                title: self.title,
                starts_at: self.starts_at,
                ends_at: self.ends_at,
            },
            participations: self.participations,
        }
    }
}

fn participation(name: &str, team: Option<&str>, gained: f64) -> Participation {
    Participation {
        player: PlayerRef {
            username: name.to_lowercase(),
            display_name: Some(name.to_string()),
        },
        team_name: team.map(str::to_string),
        progress: Progress {
            gained: Some(gained),
        },
    }
}
