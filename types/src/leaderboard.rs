use chrono::{DateTime, Utc};
use uuid::Uuid;

/// The fields of a leaderboard row that decide its position in a bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct RankEntry {
    pub player_id: Uuid,
    pub total_score: i64,
    pub updated_at: DateTime<Utc>,
    pub rank: u32,
}

/// Orders a bucket by total score, highest first, and numbers it 1..=N.
///
/// Equal totals are ordered by who reached the total first, then by player id,
/// so the same rows always produce the same ranks.
pub fn assign_ranks(entries: &mut [RankEntry]) {
    entries.sort_by(|a, b| {
        b.total_score
            .cmp(&a.total_score)
            .then(a.updated_at.cmp(&b.updated_at))
            .then(a.player_id.cmp(&b.player_id))
    });
    for (idx, entry) in entries.iter_mut().enumerate() {
        entry.rank = idx as u32 + 1;
    }
}
