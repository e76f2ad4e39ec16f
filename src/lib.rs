pub mod chart;
pub mod config;
pub mod dom;
pub mod error;
pub mod event_handler;
pub mod normalizer;
pub mod output;
pub mod profile_handler;
pub mod publisher;
pub mod record;
pub mod runner;
pub mod tracker;
pub mod utils;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================
pub use chart::{render_chart, write_chart, ChartOutcome};
pub use config::{PublishConfig, TrackerConfig};
pub use error::{ParseError, TrackerError};
pub use event_handler::{fetch_total_teams, parse_total_teams, PopulationMatch};
pub use normalizer::normalize_chronologically;
pub use output::{print_records, write_csv};
pub use profile_handler::{build_records, scan_profile_page, ProfileScan, RawEntry, RowOutcome, YearScan, YearTab};
pub use publisher::{interpret_response, Publisher, RecordSink, SinkResponse};
pub use record::ParticipationRecord;
pub use runner::{run, PublishOutcome, RunOptions, RunSummary};
pub use tracker::Tracker;
pub use utils::{event_id_from_url, rank_percentile, HtmlFetcher, HttpFetcher};
