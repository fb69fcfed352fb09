pub mod analysis;
pub mod api;
pub mod models;
pub mod ranking_engine;
pub mod report;
pub mod ui;
