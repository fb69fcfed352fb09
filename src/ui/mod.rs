pub mod app;
pub mod components;

pub use app::{run_app, AppState, LeaderboardApp, DEFAULT_INPUT};
