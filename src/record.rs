use serde::{Deserialize, Serialize};

/// One event the team took part in, enriched with the event's team count.
///
/// Field names on the wire match the spreadsheet columns. Unknown values are
/// `None` and serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipationRecord {
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Event Name")]
    pub event_name: Option<String>,
    #[serde(rename = "Event ID")]
    pub event_id: Option<String>,
    /// Place as shown on the profile page; may be non-numeric.
    #[serde(rename = "Rank")]
    pub rank: Option<String>,
    #[serde(rename = "Total Teams")]
    pub total_teams: Option<u32>,
    #[serde(rename = "CTF Points")]
    pub ctf_points: f64,
    #[serde(rename = "Rating Points")]
    pub rating_points: f64,
    #[serde(rename = "Rank Percentile")]
    pub rank_percentile: Option<f64>,
    #[serde(rename = "Event URL")]
    pub event_url: Option<String>,
}

/// Column names in payload order.
pub const RECORD_COLUMNS: [&str; 9] = [
    "Year",
    "Event Name",
    "Event ID",
    "Rank",
    "Total Teams",
    "CTF Points",
    "Rating Points",
    "Rank Percentile",
    "Event URL",
];

impl ParticipationRecord {
    pub fn event_name_or_na(&self) -> &str {
        self.event_name.as_deref().unwrap_or("N/A")
    }

    pub fn rank_or_na(&self) -> &str {
        self.rank.as_deref().unwrap_or("N/A")
    }
}
