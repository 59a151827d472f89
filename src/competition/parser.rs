use serde::Serialize;
use std::cmp::Ordering;
use tracing::warn;

use super::colors::{color_for, DEFAULT_TEAM_COLOR};
use super::models::{CompetitionDetail, Participation, RankedEntry, Team, TeamSplit, LEADERBOARD_SIZE};

const PLACEHOLDER_TEAM_A: &str = "Team 1";
const PLACEHOLDER_TEAM_B: &str = "Team 2";

/// Stable descending sort, truncated to the leaderboard size
fn top_entries<S, F>(mut entries: Vec<RankedEntry<S>>, compare: F) -> Vec<RankedEntry<S>>
where
    F: Fn(&S, &S) -> Ordering,
{
    entries.sort_by(|a, b| compare(&b.score, &a.score));
    entries.truncate(LEADERBOARD_SIZE);
    entries
}

/// Top participants by integer progress, in descending order
pub fn rank_leaderboard(detail: &CompetitionDetail) -> Vec<RankedEntry<i64>> {
    let entries = detail
        .participations
        .iter()
        .map(|p| RankedEntry {
            name: p.player.name().to_string(),
            score: p.gained() as i64,
        })
        .collect();

    top_entries(entries, |a: &i64, b: &i64| a.cmp(b))
}

fn build_team(name: &str, members: &[&Participation]) -> Team {
    let entries = members
        .iter()
        .map(|p| RankedEntry {
            name: p.player.name().to_string(),
            score: p.gained(),
        })
        .collect();
    let total: f64 = members.iter().map(|p| p.gained()).sum();

    Team {
        name: name.to_string(),
        color: color_for(name),
        leaderboard: top_entries(entries, |a: &f64, b: &f64| a.total_cmp(b)),
        total_score: total.round() as i64,
    }
}

fn placeholder_team(name: &str) -> Team {
    Team {
        name: name.to_string(),
        color: DEFAULT_TEAM_COLOR,
        leaderboard: Vec::new(),
        total_score: 0,
    }
}

/// Partitions participants into the two teams named in the payload.
///
/// Team names are taken in first-seen order. With fewer than two distinct
/// names the split falls back to placeholder teams with empty leaderboards;
/// with more than two, only the first two are kept.
pub fn split_into_teams(detail: &CompetitionDetail) -> TeamSplit {
    let mut team_names: Vec<&str> = Vec::new();
    for team in detail.participations.iter().filter_map(Participation::team) {
        if !team_names.contains(&team) {
            team_names.push(team);
        }
    }

    if team_names.len() < 2 {
        warn!(
            competition_id = detail.summary.id,
            teams = team_names.len(),
            "Fewer than two teams found, using placeholder teams"
        );
        return TeamSplit {
            team_a: placeholder_team(PLACEHOLDER_TEAM_A),
            team_b: placeholder_team(PLACEHOLDER_TEAM_B),
        };
    }

    if team_names.len() > 2 {
        warn!(
            competition_id = detail.summary.id,
            teams = ?team_names,
            "More than two teams found, only the first two are tracked"
        );
    }

    TeamSplit {
        team_a: build_team(team_names[0], &members_of(detail, team_names[0])),
        team_b: build_team(team_names[1], &members_of(detail, team_names[1])),
    }
}

fn members_of<'a>(detail: &'a CompetitionDetail, team: &str) -> Vec<&'a Participation> {
    detail
        .participations
        .iter()
        .filter(|p| p.team() == Some(team))
        .collect()
}

#[derive(Serialize)]
struct XpRow<'a> {
    username: &'a str,
    xp: i64,
}

#[derive(Serialize)]
struct ScoreRow<'a> {
    username: &'a str,
    score: i64,
}

#[derive(Serialize)]
struct EhbRow<'a> {
    username: &'a str,
    ehb: f64,
}

/// `[{username, xp}]`
pub fn skill_leaderboard_json(entries: &[RankedEntry<i64>]) -> Result<String, serde_json::Error> {
    let rows: Vec<XpRow> = entries
        .iter()
        .map(|e| XpRow {
            username: &e.name,
            xp: e.score,
        })
        .collect();
    serde_json::to_string(&rows)
}

/// `[{username, score}]`
pub fn boss_leaderboard_json(entries: &[RankedEntry<i64>]) -> Result<String, serde_json::Error> {
    let rows: Vec<ScoreRow> = entries
        .iter()
        .map(|e| ScoreRow {
            username: &e.name,
            score: e.score,
        })
        .collect();
    serde_json::to_string(&rows)
}

/// `[{username, ehb}]` with ehb rounded to two decimals
pub fn team_leaderboard_json(entries: &[RankedEntry<f64>]) -> Result<String, serde_json::Error> {
    let rows: Vec<EhbRow> = entries
        .iter()
        .map(|e| EhbRow {
            username: &e.name,
            ehb: (e.score * 100.0).round() / 100.0,
        })
        .collect();
    serde_json::to_string(&rows)
}
