//! Plain-text, JSON and CSV renderings of a ranking report.

use anyhow::Result;
use serde::Serialize;
use std::fmt::Write as _;
use std::io::Write;
use std::str::FromStr;

use crate::analysis::ranking::LeaderboardStatus;
use crate::ranking_engine::RankingReport;

pub const NO_DATA_MESSAGE: &str = "No data available for the given stocks.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(format!("unknown output format '{}' (expected table, json or csv)", other)),
        }
    }
}

/// `-` for a missing value, two decimals otherwise
pub fn format_optional(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v))
}

/// Fixed-width leaderboard table
pub fn render_table(report: &RankingReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "📊 Elo rankings ({}), generated {}",
        report.frame,
        report.generated_at.format("%Y-%m-%d %H:%M UTC")
    );

    if report.leaderboard.status() == LeaderboardStatus::NoData {
        let _ = writeln!(out, "{}", NO_DATA_MESSAGE);
    }

    if !report.leaderboard.is_empty() {
        let price_header = format!("Price ({})", report.currency);
        let _ = writeln!(
            out,
            "{:<5} {:<8} {:>9} {:>12} {:>10} {:>9} {:>14}  {}",
            "Rank", "Symbol", "Elo", "Fundamental", "Technical", "Time", price_header, "Issues"
        );
        let _ = writeln!(out, "{}", "-".repeat(80));

        for entry in report.leaderboard.entries() {
            let record = &entry.record;
            let rank = entry.rank.map_or_else(|| "-".to_string(), |r| r.to_string());
            let issues = record
                .issues
                .iter()
                .map(|issue| issue.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            let _ = writeln!(
                out,
                "{:<5} {:<8} {:>9} {:>12} {:>10} {:>9} {:>14}  {}",
                rank,
                record.symbol,
                format_optional(record.final_score),
                format_optional(record.fundamental_score),
                format_optional(record.technical_score),
                format_optional(record.time_score),
                format_optional(report.display_price(record)),
                issues
            );
        }
    }

    for issue in &report.unresolved {
        let _ = writeln!(out, "⚠️  {}", issue);
    }

    out
}

pub fn render_json(report: &RankingReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// One flat CSV line per leaderboard entry
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    rank: Option<usize>,
    symbol: &'a str,
    final_score: Option<f64>,
    fundamental_score: Option<f64>,
    technical_score: Option<f64>,
    time_score: Option<f64>,
    /// Raw close, as in the JSON output
    last_close: Option<f64>,
    /// Close converted into `currency`
    display_price: Option<f64>,
    currency: &'a str,
    issues: String,
}

pub fn write_csv<W: Write>(report: &RankingReport, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    for entry in report.leaderboard.entries() {
        let record = &entry.record;
        csv_writer.serialize(CsvRow {
            rank: entry.rank,
            symbol: &record.symbol,
            final_score: record.final_score,
            fundamental_score: record.fundamental_score,
            technical_score: record.technical_score,
            time_score: record.time_score,
            last_close: record.last_close,
            display_price: report.display_price(record),
            currency: &report.currency,
            issues: record
                .issues
                .iter()
                .map(|issue| issue.to_string())
                .collect::<Vec<_>>()
                .join("; "),
        })?;
    }

    csv_writer.flush()?;
    Ok(())
}

pub fn render(report: &RankingReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(render_table(report)),
        OutputFormat::Json => render_json(report),
        OutputFormat::Csv => {
            let mut buffer = Vec::new();
            write_csv(report, &mut buffer)?;
            Ok(String::from_utf8(buffer)?)
        }
    }
}
