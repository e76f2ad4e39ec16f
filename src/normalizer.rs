use crate::record::ParticipationRecord;

/// Puts records in chronological order: oldest year first, oldest event first
/// within a year.
///
/// The profile page lists years newest first and events newest first inside each
/// year, so one full reversal followed by a stable sort on year is enough. Records
/// sharing a year keep their reversed page order.
pub fn normalize_chronologically(mut records: Vec<ParticipationRecord>) -> Vec<ParticipationRecord> {
    records.reverse();
    records.sort_by_key(|r| r.year);
    records
}
