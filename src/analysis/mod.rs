pub mod indicators;
pub mod ranking;
pub mod scoring;

pub use indicators::{compute_indicators, IndicatorParams, IndicatorReport};
pub use ranking::{build_leaderboard, Leaderboard, LeaderboardEntry, LeaderboardStatus};
pub use scoring::{compute_score, ScoringConfig, WeightPreset};
