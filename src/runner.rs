use std::path::PathBuf;

use tracing::{error, info, warn};

use crate::chart::{write_chart, ChartOutcome};
use crate::error::TrackerError;
use crate::output::write_csv;
use crate::publisher::RecordSink;
use crate::record::ParticipationRecord;
use crate::tracker::Tracker;
use crate::utils::HtmlFetcher;

/// What a run should produce besides the records.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub chart_path: PathBuf,
    pub csv_path: Option<PathBuf>,
    pub publish: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            chart_path: PathBuf::from("progress_chart.png"),
            csv_path: None,
            publish: true,
        }
    }
}

#[derive(Debug)]
pub enum PublishOutcome {
    /// Turned off for this run
    Disabled,
    /// Nothing was scraped
    NothingToSend,
    /// The sink could not be set up (e.g. missing credentials); no request was made
    Skipped(TrackerError),
    Published(String),
    Failed(TrackerError),
}

/// What happened in each step of a run.
#[derive(Debug)]
pub struct RunSummary {
    pub records: Vec<ParticipationRecord>,
    pub publish: PublishOutcome,
    /// `None` when an existing chart was kept
    pub chart: Option<Result<ChartOutcome, TrackerError>>,
    pub csv: Option<Result<PathBuf, TrackerError>>,
}

/// Scrape, publish, chart, export. Only the scrape feeds the other steps;
/// a failing step is logged and the rest still run.
pub async fn run<F, S>(tracker: &Tracker<F>, sink: Result<S, TrackerError>, options: &RunOptions) -> RunSummary
where
    F: HtmlFetcher,
    S: RecordSink,
{
    let records = tracker.run().await;

    if records.is_empty() {
        info!("No CTF data scraped");
        // An empty scrape must not overwrite the last good chart
        let chart = if options.chart_path.exists() {
            None
        } else {
            Some(log_chart(write_chart(&records, &tracker.config().team_name, &options.chart_path)))
        };
        return RunSummary { records, publish: PublishOutcome::NothingToSend, chart, csv: None };
    }

    let publish = if !options.publish {
        info!("Spreadsheet update disabled");
        PublishOutcome::Disabled
    } else {
        match sink {
            Err(e) => {
                warn!("{}; skipping spreadsheet update", e);
                PublishOutcome::Skipped(e)
            }
            Ok(sink) => match sink.send(&records).await {
                Ok(message) => {
                    info!("Spreadsheet updated: {}", message);
                    PublishOutcome::Published(message)
                }
                Err(e) => {
                    error!("Spreadsheet update failed: {}", e);
                    PublishOutcome::Failed(e)
                }
            },
        }
    };

    let chart = Some(log_chart(write_chart(&records, &tracker.config().team_name, &options.chart_path)));

    let csv = options.csv_path.as_ref().map(|path| {
        write_csv(&records, path).map(|_| path.clone()).inspect_err(|e| {
            error!("Could not write CSV: {}", e);
        })
    });

    RunSummary { records, publish, chart, csv }
}

fn log_chart(result: Result<ChartOutcome, TrackerError>) -> Result<ChartOutcome, TrackerError> {
    if let Err(e) = &result {
        error!("Could not write chart: {}", e);
    }
    result
}
