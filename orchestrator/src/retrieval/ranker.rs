// Ranker: best-first ordering and truncation

use crate::models::{RankedResult, ScoreMap};

/// Sorts by descending score and keeps the first `limit` entries.
///
/// The sort is stable, so equal scores stay in map order.
pub fn rank(scores: ScoreMap, limit: usize) -> RankedResult {
    let mut entries = scores.into_entries();
    entries.sort_by(|a, b| b.score.total_cmp(&a.score));
    entries.truncate(limit);
    RankedResult(entries)
}
