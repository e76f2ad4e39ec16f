use tracing::{error, info, instrument, warn};

use crate::config::TrackerConfig;
use crate::error::TrackerError;
use crate::normalizer::normalize_chronologically;
use crate::profile_handler::{build_records, scan_profile_page};
use crate::record::ParticipationRecord;
use crate::utils::{HtmlFetcher, HttpFetcher};

/// Runs the scrape for one team: profile page, event pages, ordering.
pub struct Tracker<F = HttpFetcher> {
    config: TrackerConfig,
    fetcher: F,
}

impl Tracker<HttpFetcher> {
    /// Tracker that fetches over HTTP.
    pub fn new(config: TrackerConfig) -> Result<Self, TrackerError> {
        Ok(Self::with_fetcher(config, HttpFetcher::new()?))
    }
}

impl<F: HtmlFetcher> Tracker<F> {
    pub fn with_fetcher(config: TrackerConfig, fetcher: F) -> Self {
        Tracker { config, fetcher }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Scrapes the team's full history in chronological order.
    ///
    /// Never fails: if the profile page can't be fetched or has no participation
    /// section, the result is empty. Per-event problems only blank that event's
    /// team count.
    #[instrument(skip_all, fields(team = %self.config.team_id))]
    pub async fn run(&self) -> Vec<ParticipationRecord> {
        let url = self.config.team_url();
        info!("Scraping data for team {} from {}", self.config.team_name, url);

        let html = match self.fetcher.fetch(&url, self.config.profile_timeout).await {
            Ok(html) => html,
            Err(e) => {
                error!("Failed to fetch team page: {}", e);
                return Vec::new();
            }
        };

        let scan = match scan_profile_page(&html, &self.config) {
            Ok(scan) => scan,
            Err(e) => {
                warn!("Could not read team page: {}", e);
                return Vec::new();
            }
        };

        let records = build_records(&self.fetcher, scan, &self.config).await;
        if records.is_empty() {
            info!("No CTFs found after scraping");
            return records;
        }

        let records = normalize_chronologically(records);
        info!("Total CTFs scraped and processed: {}", records.len());
        records
    }
}
