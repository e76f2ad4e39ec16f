use std::fs::File;
use std::path::Path;

use tracing::info;

use crate::error::TrackerError;
use crate::record::{ParticipationRecord, RECORD_COLUMNS};

fn or_na<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "N/A".to_string())
}

// ============================================================================
// CSV OUTPUT
// ============================================================================

/// Writes the records to a CSV file with the same columns as the sink payload.
/// Unknown values are left empty.
pub fn write_csv(records: &[ParticipationRecord], path: &Path) -> Result<(), TrackerError> {
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);

    writer.write_record(RECORD_COLUMNS)?;

    for record in records {
        let row: Vec<String> = vec![
            record.year.to_string(),
            record.event_name.clone().unwrap_or_default(),
            record.event_id.clone().unwrap_or_default(),
            record.rank.clone().unwrap_or_default(),
            record.total_teams.map(|t| t.to_string()).unwrap_or_default(),
            record.ctf_points.to_string(),
            record.rating_points.to_string(),
            record.rank_percentile.map(|p| format!("{:.2}", p)).unwrap_or_default(),
            record.event_url.clone().unwrap_or_default(),
        ];
        writer.write_record(&row)?;
    }

    writer.flush()?;
    info!("Records written to {}", path.display());
    Ok(())
}

// ============================================================================
// OUTPUT FORMATTING
// ============================================================================

/// Prints the records to stdout, one line per event
pub fn print_records(team_name: &str, records: &[ParticipationRecord]) {
    println!("\n{} - {} events", team_name, records.len());
    println!("{:-<96}", "");
    println!(
        "{:4}  {:40} {:>6} {:>7} {:>11} {:>10}",
        "Year", "Event", "Rank", "Teams", "Percentile", "Rating"
    );
    println!("{:-<96}", "");

    for record in records {
        let name: String = record.event_name_or_na().chars().take(40).collect();
        let percentile = record
            .rank_percentile
            .map(|p| format!("{:.2}%", p))
            .unwrap_or_else(|| "N/A".to_string());

        println!(
            "{:4}  {:40} {:>6} {:>7} {:>11} {:>10.3}",
            record.year,
            name,
            record.rank_or_na(),
            or_na(record.total_teams),
            percentile,
            record.rating_points
        );
    }
}
