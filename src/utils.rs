use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;

use crate::error::{ParseError, TrackerError};

const USER_AGENT: &str = concat!("ctf_progress_tracker/", env!("CARGO_PKG_VERSION"));

static RE_EVENT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/event/(\d+)").expect("invalid regex: event id"));

// ============================================================================
// TRANSPORT
// ============================================================================

/// Fetches a page body. Any failure (timeout, connection, non-2xx) is an error.
#[async_trait]
pub trait HtmlFetcher: Send + Sync {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<String, TrackerError>;
}

/// `HtmlFetcher` backed by a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, TrackerError> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client })
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

#[async_trait]
impl HtmlFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<String, TrackerError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| TrackerError::from_request(e, url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TrackerError::HttpStatus { status: status.as_u16(), url: url.to_string() });
        }

        response.text().await.map_err(|e| TrackerError::from_request(e, url))
    }
}

// ============================================================================
// FIELD HELPERS
// ============================================================================

/// Extracts the numeric id from an event URL such as `https://ctftime.org/event/12345`.
pub fn event_id_from_url(url: Option<&str>) -> Option<String> {
    let url = url?;
    RE_EVENT_ID.captures(url).map(|caps| caps[1].to_string())
}

/// Parses a points cell. An empty cell counts as zero.
pub fn parse_points(text: &str, field: &'static str) -> Result<f64, ParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(0.0);
    }
    text.parse::<f64>().map_err(|_| ParseError::InvalidNumber { field, value: text.to_string() })
}

/// Rank as a percentage of the field, rounded to two decimals.
/// Only defined for an all-digit rank and a positive team count.
pub fn rank_percentile(rank: Option<&str>, total_teams: Option<u32>) -> Option<f64> {
    let rank = rank?;
    let total = total_teams.filter(|&t| t > 0)?;

    if rank.is_empty() || !rank.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let place: u64 = rank.parse().ok()?;

    Some(round2(place as f64 / f64::from(total) * 100.0))
}

// Rounds the exact binary value, so 1/32 (3.125) gives 3.12 rather than 3.13
fn round2(value: f64) -> f64 {
    format!("{value:.2}").parse().unwrap_or(value)
}

/// Collapses runs of whitespace into single spaces.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_id_from_url() {
        assert_eq!(event_id_from_url(Some("https://ctftime.org/event/12345")), Some("12345".to_string()));
        assert_eq!(event_id_from_url(Some("/event/2255/tasks/")), Some("2255".to_string()));
        assert_eq!(event_id_from_url(Some("https://ctftime.org/team/372250")), None);
        assert_eq!(event_id_from_url(Some("https://ctftime.org/event/abc")), None);
        assert_eq!(event_id_from_url(None), None);
    }

    #[test]
    fn test_event_id_is_stable() {
        let url = Some("https://ctftime.org/event/999");
        assert_eq!(event_id_from_url(url), event_id_from_url(url));
    }

    #[test]
    fn test_parse_points() {
        assert_eq!(parse_points("12.345", "CTF points"), Ok(12.345));
        assert_eq!(parse_points("  ", "CTF points"), Ok(0.0));
        assert_eq!(
            parse_points("abc", "rating points"),
            Err(ParseError::InvalidNumber { field: "rating points", value: "abc".to_string() })
        );
    }

    #[test]
    fn test_rank_percentile_formula() {
        assert_eq!(rank_percentile(Some("5"), Some(200)), Some(2.5));
        assert_eq!(rank_percentile(Some("1"), Some(3)), Some(33.33));
        assert_eq!(rank_percentile(Some("2"), Some(3)), Some(66.67));
        assert_eq!(rank_percentile(Some("300"), Some(300)), Some(100.0));
        assert_eq!(rank_percentile(Some("0"), Some(10)), Some(0.0));
    }

    #[test]
    fn test_rank_percentile_ties_round_to_even() {
        assert_eq!(rank_percentile(Some("1"), Some(32)), Some(3.12));
        assert_eq!(rank_percentile(Some("5"), Some(32)), Some(15.62));
        assert_eq!(rank_percentile(Some("3"), Some(32)), Some(9.38));
        assert_eq!(rank_percentile(Some("7"), Some(8)), Some(87.5));
    }

    #[test]
    fn test_rank_percentile_within_bounds() {
        for total in 1..=60u32 {
            for rank in 0..=total {
                let p = rank_percentile(Some(&rank.to_string()), Some(total)).unwrap();
                assert!((0.0..=100.0).contains(&p), "{rank}/{total} gave {p}");
            }
        }
    }

    #[test]
    fn test_rank_percentile_undefined() {
        assert_eq!(rank_percentile(Some("12"), None), None);
        assert_eq!(rank_percentile(Some("12"), Some(0)), None);
        assert_eq!(rank_percentile(Some("-"), Some(10)), None);
        assert_eq!(rank_percentile(Some("-3"), Some(10)), None);
        assert_eq!(rank_percentile(Some(""), Some(10)), None);
        assert_eq!(rank_percentile(None, Some(10)), None);
    }
}
