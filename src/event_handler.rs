use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use scraper::Html;
use tracing::{debug, info, warn};

use crate::dom::{element_text, find_first, has_attr, has_text, next_sibling};
use crate::utils::HtmlFetcher;

static RE_TEAMS_TOTAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s+teams\s+total").expect("invalid regex: teams total"));

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Where on the event page the team count was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopulationMatch {
    /// Paragraph right after the "Scoreboard" heading
    Scoreboard(u32),
    /// Any text node in the document
    TextScan(u32),
}

impl PopulationMatch {
    pub fn count(self) -> u32 {
        match self {
            PopulationMatch::Scoreboard(n) | PopulationMatch::TextScan(n) => n,
        }
    }
}

// ============================================================================
// EVENT PAGE PARSING
// ============================================================================

/// Finds "<N> teams total" on an event page.
/// Tries the scoreboard paragraph first, then scans every text node.
pub fn parse_total_teams(html: &str) -> Option<PopulationMatch> {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let structural = find_first(root, "h3", |el| has_text(el, "Scoreboard"))
        .and_then(|h3| next_sibling(h3, "p", |el| has_attr(el, "align", "right")))
        .and_then(|p| capture_count(&element_text(&p)));

    if let Some(count) = structural {
        return Some(PopulationMatch::Scoreboard(count));
    }

    root.text()
        .find_map(capture_count)
        .map(PopulationMatch::TextScan)
}

fn capture_count(text: &str) -> Option<u32> {
    RE_TEAMS_TOTAL.captures(text)?.get(1)?.as_str().parse().ok()
}

// ============================================================================
// EVENT PAGE FETCHING
// ============================================================================

/// Fetches an event page and returns its team count.
/// Transport and parse failures are logged and turn into `None`.
pub async fn fetch_total_teams<F>(fetcher: &F, event_url: Option<&str>, timeout: Duration) -> Option<u32>
where
    F: HtmlFetcher + ?Sized,
{
    let Some(url) = event_url else {
        info!("Skipping team count lookup: event URL is missing");
        return None;
    };

    debug!("Fetching total teams from {}", url);
    let html = match fetcher.fetch(url, timeout).await {
        Ok(html) => html,
        Err(e) => {
            warn!("Error fetching event page {}: {}", url, e);
            return None;
        }
    };

    match parse_total_teams(&html) {
        Some(found) => {
            if let PopulationMatch::TextScan(_) = found {
                debug!("Scoreboard paragraph missing on {}, used text scan", url);
            }
            debug!("Found {} total teams on {}", found.count(), url);
            Some(found.count())
        }
        None => {
            warn!("Could not find total teams text on {}", url);
            None
        }
    }
}
