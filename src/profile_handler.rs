use std::sync::LazyLock;

use futures::stream::{self, StreamExt};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{info, warn};

use crate::config::TrackerConfig;
use crate::dom::{element_text, find_first, has_class, has_text, next_sibling};
use crate::error::ParseError;
use crate::event_handler::fetch_total_teams;
use crate::record::ParticipationRecord;
use crate::utils::{event_id_from_url, normalize_whitespace, parse_points, rank_percentile, HtmlFetcher};

const PARTICIPATION_HEADING: &str = "Participated in CTF events";
const EXPECTED_CELLS: usize = 5;

static RE_OVERALL_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)Overall rating place:.*?in\s+(\d{4})").expect("invalid regex: overall rating year")
});

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// A year tab on the profile page and the id of the block it shows
#[derive(Debug, Clone, PartialEq)]
pub struct YearTab {
    pub label: String,
    pub year: i32,
    pub tab_id: String,
}

impl YearTab {
    /// Non-numeric labels become year 0.
    pub fn new(label: impl Into<String>, tab_id: impl Into<String>) -> Self {
        let label = label.into();
        let year = label.parse().unwrap_or(0);
        YearTab { label, year, tab_id: tab_id.into() }
    }
}

/// Fields read from one table row, before the event page is consulted
#[derive(Debug, Clone, PartialEq)]
pub struct RawEntry {
    pub year: i32,
    pub rank: Option<String>,
    pub event_name: Option<String>,
    pub event_url: Option<String>,
    pub event_id: Option<String>,
    pub ctf_points: f64,
    pub rating_points: f64,
    /// Fields that fell back to a default value
    pub warnings: Vec<ParseError>,
}

impl RawEntry {
    /// Only rows with both a name and an event id are worth a network call.
    pub fn wants_population(&self) -> bool {
        self.event_name.is_some() && self.event_id.is_some()
    }

    pub fn into_record(self, total_teams: Option<u32>) -> ParticipationRecord {
        let rank_percentile = rank_percentile(self.rank.as_deref(), total_teams);
        ParticipationRecord {
            year: self.year,
            event_name: self.event_name,
            event_id: self.event_id,
            rank: self.rank,
            total_teams,
            ctf_points: self.ctf_points,
            rating_points: self.rating_points,
            rank_percentile,
            event_url: self.event_url,
        }
    }
}

/// Result of reading one table row
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Parsed(RawEntry),
    Skipped(ParseError),
}

/// Result of reading one year tab
#[derive(Debug, Clone, PartialEq)]
pub struct YearScan {
    pub tab: YearTab,
    pub rows: Result<Vec<RowOutcome>, ParseError>,
}

/// Everything read from the profile page, in page order
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileScan {
    pub years: Vec<YearScan>,
}

// ============================================================================
// PROFILE PAGE SCANNING
// ============================================================================

/// Reads the participation tables of a team profile page.
///
/// Only a missing "Participated in CTF events" heading is an error; a broken year
/// or row is recorded in the returned scan and the rest is still read.
pub fn scan_profile_page(html: &str, config: &TrackerConfig) -> Result<ProfileScan, ParseError> {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let heading = find_first(root, "h3", |el| has_text(el, PARTICIPATION_HEADING))
        .ok_or(ParseError::MissingSection(PARTICIPATION_HEADING))?;

    let mut tabs = year_tabs(heading);
    if tabs.is_empty() {
        tabs.extend(overall_year_tab(heading));
    }

    let years = tabs
        .into_iter()
        .map(|tab| {
            let rows = scan_year(root, &tab, config);
            YearScan { tab, rows }
        })
        .collect();

    Ok(ProfileScan { years })
}

/// Numeric tab labels under the heading, in page order.
fn year_tabs(heading: ElementRef) -> Vec<YearTab> {
    let Some(nav) = next_sibling(heading, "ul", |el| has_class(el, "nav-tabs")) else {
        return Vec::new();
    };

    let link_selector = Selector::parse("a").unwrap();
    nav.select(&link_selector)
        .filter_map(|link| {
            let label = element_text(&link);
            let tab_id = link.value().attr("href")?.trim_start_matches('#');
            if label.is_empty() || !label.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            Some(YearTab::new(label, tab_id))
        })
        .collect()
}

/// Single-tab pages have no year tabs; the year comes from the
/// "Overall rating place ... in YYYY" sentence instead.
fn overall_year_tab(heading: ElementRef) -> Option<YearTab> {
    let content = next_sibling(heading, "div", |el| has_class(el, "tab-content"))?;
    let pane = find_first(content, "div", |el| has_class(el, "tab-pane"))?;
    let tab_id = pane.value().id()?;

    let sentence = find_first(pane, "p", |el| RE_OVERALL_YEAR.is_match(&element_text(el)))?;
    let text = element_text(&sentence);
    let year = RE_OVERALL_YEAR.captures(&text)?.get(1)?.as_str().to_string();

    Some(YearTab::new(year, tab_id))
}

fn scan_year(root: ElementRef, tab: &YearTab, config: &TrackerConfig) -> Result<Vec<RowOutcome>, ParseError> {
    let content = find_first(root, "div", |el| el.value().id() == Some(tab.tab_id.as_str()))
        .ok_or_else(|| ParseError::MissingTabContent { tab_id: tab.tab_id.clone() })?;

    let table = find_first(content, "table", |el| has_class(el, "table-striped"))
        .ok_or(ParseError::MissingTable { year: tab.year })?;

    let row_selector = Selector::parse("tr").unwrap();
    let rows = table
        .select(&row_selector)
        .skip(1) // Skip header row
        .map(|row| parse_row(row, tab.year, config))
        .collect();

    Ok(rows)
}

// ============================================================================
// ROW PARSING
// ============================================================================

/// Columns: place icon, place, event (link), CTF points, rating points.
fn parse_row(row: ElementRef, year: i32, config: &TrackerConfig) -> RowOutcome {
    let cell_selector = Selector::parse("td").unwrap();
    let cells: Vec<ElementRef> = row.select(&cell_selector).collect();

    if cells.len() != EXPECTED_CELLS {
        return RowOutcome::Skipped(ParseError::UnexpectedCellCount {
            count: cells.len(),
            text: normalize_whitespace(&row.text().collect::<String>()),
        });
    }

    let rank = Some(element_text(&cells[1])).filter(|r| !r.is_empty());

    let link_selector = Selector::parse("a").unwrap();
    let link = cells[2].select(&link_selector).next();
    let event_name = link.map(|a| element_text(&a)).filter(|n| !n.is_empty());
    let event_url = link
        .and_then(|a| a.value().attr("href"))
        .filter(|href| !href.is_empty())
        .map(|href| config.absolute_url(href));
    let event_id = event_id_from_url(event_url.as_deref());

    let mut warnings = Vec::new();
    let ctf_points = parse_points(&element_text(&cells[3]), "CTF points").unwrap_or_else(|e| {
        warnings.push(e);
        0.0
    });
    // A trailing '*' marks weighted rating points
    let rating_text = element_text(&cells[4]).replace('*', "");
    let rating_points = parse_points(&rating_text, "rating points").unwrap_or_else(|e| {
        warnings.push(e);
        0.0
    });

    RowOutcome::Parsed(RawEntry {
        year,
        rank,
        event_name,
        event_url,
        event_id,
        ctf_points,
        rating_points,
        warnings,
    })
}

// ============================================================================
// RECORD ASSEMBLY
// ============================================================================

/// Logs skipped years and rows and returns the usable entries in page order.
pub fn collect_entries(scan: ProfileScan) -> Vec<RawEntry> {
    let mut entries = Vec::new();

    for year_scan in scan.years {
        let YearScan { tab, rows } = year_scan;
        info!("Processing year {} (tab: {})", tab.label, tab.tab_id);

        let rows = match rows {
            Ok(rows) => rows,
            Err(e) => {
                warn!("Skipping year {}: {}", tab.label, e);
                continue;
            }
        };

        for (idx, outcome) in rows.into_iter().enumerate() {
            match outcome {
                RowOutcome::Parsed(entry) => {
                    for warning in &entry.warnings {
                        warn!(
                            "{} for {} (year {}, row {}); using 0.0",
                            warning,
                            entry.event_name.as_deref().unwrap_or("N/A"),
                            tab.label,
                            idx + 1
                        );
                    }
                    entries.push(entry);
                }
                RowOutcome::Skipped(e) => {
                    warn!("Skipping row {} for year {}: {}", idx + 1, tab.label, e);
                }
            }
        }
    }

    entries
}

/// Turns a scan into records, looking up each event's team count.
///
/// Lookups run `config.fetch_concurrency` at a time; results keep page order.
pub async fn build_records<F>(fetcher: &F, scan: ProfileScan, config: &TrackerConfig) -> Vec<ParticipationRecord>
where
    F: HtmlFetcher + ?Sized,
{
    let entries = collect_entries(scan);

    stream::iter(entries)
        .map(|entry| async move {
            let total_teams = if entry.wants_population() {
                fetch_total_teams(fetcher, entry.event_url.as_deref(), config.event_timeout).await
            } else {
                None
            };

            let record = entry.into_record(total_teams);
            info!(
                "Added: {} (year {}, rank {}, rating pts {})",
                record.event_name_or_na(),
                record.year,
                record.rank_or_na(),
                record.rating_points
            );
            record
        })
        .buffered(config.fetch_concurrency.max(1))
        .collect()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(place: &str, event_cell: &str, ctf: &str, rating: &str) -> String {
        format!(
            r#"<tr><td class="place_ico"></td><td class="place">{place}</td><td>{event_cell}</td><td>{ctf}</td><td>{rating}</td></tr>"#
        )
    }

    fn page(tabs: &[(&str, &str)], panes: &[(&str, String)]) -> String {
        let links: String = tabs
            .iter()
            .map(|(label, id)| format!(r##"<li><a href="#{id}" data-toggle="tab">{label}</a></li>"##))
            .collect();
        let bodies: String = panes
            .iter()
            .map(|(id, rows)| {
                format!(
                    r#"<div class="tab-pane" id="{id}"><table class="table table-striped"><tr><th></th><th>Place</th><th>Event</th><th>CTF points</th><th>Rating points</th></tr>{rows}</table></div>"#
                )
            })
            .collect();
        format!(
            r#"<html><body><h3>Participated in CTF events</h3><ul class="nav nav-tabs">{links}</ul><div class="tab-content">{bodies}</div></body></html>"#
        )
    }

    fn parsed(outcome: &RowOutcome) -> &RawEntry {
        match outcome {
            RowOutcome::Parsed(entry) => entry,
            RowOutcome::Skipped(e) => panic!("row was skipped: {e}"),
        }
    }

    #[test]
    fn test_missing_section() {
        let config = TrackerConfig::default();
        let err = scan_profile_page("<html><body><h3>Members</h3></body></html>", &config).unwrap_err();
        assert_eq!(err, ParseError::MissingSection(PARTICIPATION_HEADING));
    }

    #[test]
    fn test_reads_row_fields() {
        let config = TrackerConfig::default();
        let html = page(
            &[("2024", "rating_2024")],
            &[("rating_2024", row("12", r#"<a href="/event/2255">Example CTF</a>"#, "1337.0000", "4.210*"))],
        );

        let scan = scan_profile_page(&html, &config).unwrap();
        assert_eq!(scan.years.len(), 1);
        assert_eq!(scan.years[0].tab, YearTab::new("2024", "rating_2024"));

        let rows = scan.years[0].rows.as_ref().unwrap();
        let entry = parsed(&rows[0]);
        assert_eq!(entry.year, 2024);
        assert_eq!(entry.rank.as_deref(), Some("12"));
        assert_eq!(entry.event_name.as_deref(), Some("Example CTF"));
        assert_eq!(entry.event_url.as_deref(), Some("https://ctftime.org/event/2255"));
        assert_eq!(entry.event_id.as_deref(), Some("2255"));
        assert_eq!(entry.ctf_points, 1337.0);
        assert_eq!(entry.rating_points, 4.21);
        assert!(entry.warnings.is_empty());
        assert!(entry.wants_population());
    }

    #[test]
    fn test_non_numeric_tabs_ignored() {
        let config = TrackerConfig::default();
        let html = page(
            &[("Overall", "rating_all"), ("2023", "rating_2023")],
            &[
                ("rating_all", row("1", "", "", "")),
                ("rating_2023", row("3", r#"<a href="/event/1">A</a>"#, "1", "1")),
            ],
        );

        let scan = scan_profile_page(&html, &config).unwrap();
        let labels: Vec<&str> = scan.years.iter().map(|y| y.tab.label.as_str()).collect();
        assert_eq!(labels, vec!["2023"]);
    }

    #[test]
    fn test_bad_points_default_to_zero() {
        let config = TrackerConfig::default();
        let html = page(
            &[("2024", "rating_2024")],
            &[("rating_2024", row("7", r#"<a href="/event/9">B</a>"#, "abc", "n/a*"))],
        );

        let scan = scan_profile_page(&html, &config).unwrap();
        let rows = scan.years[0].rows.as_ref().unwrap();
        let entry = parsed(&rows[0]);
        assert_eq!(entry.ctf_points, 0.0);
        assert_eq!(entry.rating_points, 0.0);
        assert_eq!(
            entry.warnings,
            vec![
                ParseError::InvalidNumber { field: "CTF points", value: "abc".to_string() },
                ParseError::InvalidNumber { field: "rating points", value: "n/a".to_string() },
            ]
        );
    }

    #[test]
    fn test_short_row_skipped_rest_kept() {
        let config = TrackerConfig::default();
        let rows = format!(
            "{}<tr><td>1</td><td>2</td><td>3</td><td>4</td></tr>{}",
            row("1", r#"<a href="/event/1">First</a>"#, "1", "1"),
            row("2", r#"<a href="/event/2">Second</a>"#, "2", "2"),
        );
        let html = page(&[("2024", "rating_2024")], &[("rating_2024", rows)]);

        let scan = scan_profile_page(&html, &config).unwrap();
        let outcomes = scan.years[0].rows.as_ref().unwrap();
        assert_eq!(outcomes.len(), 3);
        assert!(matches!(outcomes[1], RowOutcome::Skipped(ParseError::UnexpectedCellCount { count: 4, .. })));

        let entries = collect_entries(scan);
        let names: Vec<&str> = entries.iter().map(|e| e.event_name.as_deref().unwrap()).collect();
        assert_eq!(names, vec!["First", "Second"]);
    }

    #[test]
    fn test_row_without_link() {
        let config = TrackerConfig::default();
        let html = page(&[("2022", "rating_2022")], &[("rating_2022", row("", "Private event", "5", "0"))]);

        let scan = scan_profile_page(&html, &config).unwrap();
        let rows = scan.years[0].rows.as_ref().unwrap();
        let entry = parsed(&rows[0]);
        assert_eq!(entry.rank, None);
        assert_eq!(entry.event_name, None);
        assert_eq!(entry.event_url, None);
        assert_eq!(entry.event_id, None);
        assert!(!entry.wants_population());

        let record = entry.clone().into_record(None);
        assert_eq!(record.rank_percentile, None);
    }

    #[test]
    fn test_blank_link_text_is_unnamed() {
        let config = TrackerConfig::default();
        let html = page(&[("2024", "rating_2024")], &[("rating_2024", row("4", r#"<a href="/event/77">  </a>"#, "3", "1"))]);

        let scan = scan_profile_page(&html, &config).unwrap();
        let rows = scan.years[0].rows.as_ref().unwrap();
        let entry = parsed(&rows[0]);
        assert_eq!(entry.event_name, None);
        assert_eq!(entry.event_id.as_deref(), Some("77"));
        assert_eq!(entry.event_url.as_deref(), Some("https://ctftime.org/event/77"));
        assert!(!entry.wants_population());
    }

    #[test]
    fn test_missing_tab_content_and_table() {
        let config = TrackerConfig::default();
        let html = r##"
            <h3>Participated in CTF events</h3>
            <ul class="nav-tabs"><li><a href="#rating_2024">2024</a></li><li><a href="#rating_2023">2023</a></li></ul>
            <div class="tab-content"><div class="tab-pane" id="rating_2023"><p>nothing here</p></div></div>"##;

        let scan = scan_profile_page(html, &config).unwrap();
        assert_eq!(
            scan.years[0].rows,
            Err(ParseError::MissingTabContent { tab_id: "rating_2024".to_string() })
        );
        assert_eq!(scan.years[1].rows, Err(ParseError::MissingTable { year: 2023 }));
        assert!(collect_entries(scan).is_empty());
    }

    #[test]
    fn test_overall_sentence_fallback() {
        let config = TrackerConfig::default();
        let html = format!(
            r#"<h3>Participated in CTF events</h3>
            <div class="tab-content"><div class="tab-pane active" id="rating_2025">
              <p>Overall rating place: <b>812</b> with 14.560 pts in 2025</p>
              <table class="table table-striped"><tr><th>h</th></tr>{}</table>
            </div></div>"#,
            row("40", r#"<a href="/event/3">Only</a>"#, "100", "1.5")
        );

        let scan = scan_profile_page(&html, &config).unwrap();
        assert_eq!(scan.years.len(), 1);
        assert_eq!(scan.years[0].tab, YearTab::new("2025", "rating_2025"));
        assert_eq!(collect_entries(scan).len(), 1);
    }

    #[test]
    fn test_year_tab_label_overflow_is_zero() {
        assert_eq!(YearTab::new("99999999999", "x").year, 0);
        assert_eq!(YearTab::new("2021", "x").year, 2021);
    }
}
