/// Color used when a team name contains no known color keyword
pub const DEFAULT_TEAM_COLOR: &str = "#FFFF00";

/// Ordered keyword table; the first keyword found in the team name wins.
const TEAM_COLORS: &[(&str, &str)] = &[
    ("red", "#FF0000"),
    ("blue", "#0000FF"),
    ("green", "#00FF00"),
    ("gold", "#FFD700"),
    ("yellow", "#FFFF00"),
    ("orange", "#FFA500"),
    ("purple", "#800080"),
    ("pink", "#FFC0CB"),
    ("black", "#000000"),
    ("white", "#FFFFFF"),
    ("grey", "#808080"),
    ("gray", "#808080"),
    ("silver", "#C0C0C0"),
    ("brown", "#A52A2A"),
    ("cyan", "#00FFFF"),
    ("magenta", "#FF00FF"),
    ("teal", "#008080"),
    ("lime", "#32CD32"),
    ("navy", "#000080"),
    ("maroon", "#800000"),
    ("violet", "#EE82EE"),
];

/// Infers a display color from a team name
pub fn color_for(team_name: &str) -> &'static str {
    let lowered = team_name.to_lowercase();
    TEAM_COLORS
        .iter()
        .find(|(keyword, _)| lowered.contains(keyword))
        .map(|(_, color)| *color)
        .unwrap_or(DEFAULT_TEAM_COLOR)
}
