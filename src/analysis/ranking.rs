use serde::Serialize;
use std::cmp::Ordering;

use crate::models::ScoreRecord;

/// One leaderboard row; `rank` is set only for scored rows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub rank: Option<usize>,
    pub record: ScoreRecord,
}

/// Whether the board has anything worth ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardStatus {
    Ranked,
    NoData,
}

/// Score records sorted by final score, best first
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Leaderboard {
    entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn scored_count(&self) -> usize {
        self.entries.iter().filter(|e| e.record.is_scored()).count()
    }

    /// `NoData` when no row carries a final score, including the empty board
    pub fn status(&self) -> LeaderboardStatus {
        if self.scored_count() == 0 {
            LeaderboardStatus::NoData
        } else {
            LeaderboardStatus::Ranked
        }
    }

    pub fn leader(&self) -> Option<&ScoreRecord> {
        self.entries.first().map(|e| &e.record).filter(|r| r.is_scored())
    }

    pub fn symbols(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.record.symbol.as_str()).collect()
    }
}

/// Descending by final score, missing scores last
fn compare_final_scores(a: &ScoreRecord, b: &ScoreRecord) -> Ordering {
    match (a.final_score, b.final_score) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Sort records into a leaderboard. Equal scores keep their input order.
pub fn build_leaderboard(mut records: Vec<ScoreRecord>) -> Leaderboard {
    // sort_by is stable
    records.sort_by(compare_final_scores);

    let mut next_rank = 0;
    let entries = records
        .into_iter()
        .map(|record| {
            let rank = record.is_scored().then(|| {
                next_rank += 1;
                next_rank
            });
            LeaderboardEntry { rank, record }
        })
        .collect();

    Leaderboard { entries }
}
