use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ctf_progress_tracker::config::{DEFAULT_BASE_URL, DEFAULT_TEAM_ID, DEFAULT_TEAM_NAME};
use ctf_progress_tracker::{
    print_records, run, PublishConfig, Publisher, RunOptions, Tracker, TrackerConfig,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Track a team's CTFtime rank percentile over time", long_about = None)]
struct Args {
    /// CTFtime team id
    #[arg(long, default_value = DEFAULT_TEAM_ID)]
    team_id: String,

    /// Team name shown in the output
    #[arg(long, default_value = DEFAULT_TEAM_NAME)]
    team_name: String,

    /// Site root the team and event links are resolved against
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Where to write the progress chart (PNG)
    #[arg(long, default_value = "progress_chart.png")]
    chart: PathBuf,

    /// Also export the records as CSV
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Skip the spreadsheet update
    #[arg(long, default_value_t = false)]
    no_publish: bool,

    /// Event pages fetched at once
    #[arg(long, default_value_t = 1)]
    concurrency: usize,

    /// Debug logging
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_logging(args.verbose);

    info!("CTF progress tracker started");

    let config = TrackerConfig::new(args.team_id, args.team_name)
        .with_base_url(args.base_url)
        .with_fetch_concurrency(args.concurrency);
    let tracker = Tracker::new(config)?;

    // Publishing reuses the scraper's connection pool
    let client = tracker.fetcher().client().clone();
    let sink = PublishConfig::from_env().map(|config| Publisher::new(client, config));
    let options = RunOptions {
        chart_path: args.chart,
        csv_path: args.csv,
        publish: !args.no_publish,
    };

    let summary = run(&tracker, sink, &options).await;
    if !summary.records.is_empty() {
        print_records(&tracker.config().team_name, &summary.records);
    }

    info!("CTF progress tracker finished");
    Ok(())
}
