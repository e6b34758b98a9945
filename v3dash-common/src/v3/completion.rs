//! Completion rate of a V3 record

use super::catalog::FIELD_COUNT;
use super::record::V3Record;

/// Percentage of filled catalog fields, rounded half-up, in `0..=100`
pub fn calculate_completion_rate(record: &V3Record) -> u8 {
    rate_for(record.filled_count(), FIELD_COUNT)
}

fn rate_for(filled: usize, total: usize) -> u8 {
    debug_assert!(total > 0 && filled <= total);
    ((100 * filled + total / 2) / total) as u8
}
