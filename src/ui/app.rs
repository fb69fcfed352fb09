use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame, Terminal,
};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use super::components::{key_hint, render_error, render_loading_indicator, styled_score_span};
use crate::analysis::ranking::LeaderboardStatus;
use crate::api::MarketDataProvider;
use crate::models::TimeFrame;
use crate::ranking_engine::{parse_symbol_list, RankingEngine, RankingReport, RankingRequest};
use crate::report::{format_optional, NO_DATA_MESSAGE};

pub const DEFAULT_INPUT: &str = "AAPL, MSFT, TSLA, GOOG";

#[derive(Debug, Clone)]
pub enum AppState {
    Idle,
    Loading,
    Ready(RankingReport),
    Error(String),
}

/// Input line, time frame selector and the last generated leaderboard
pub struct LeaderboardApp {
    pub input: String,
    pub frame: TimeFrame,
    pub currency: String,
    pub resolve_names: bool,
    pub state: AppState,
    pub should_quit: bool,
}

impl LeaderboardApp {
    pub fn new(input: &str, frame: TimeFrame, currency: &str) -> Self {
        Self {
            input: input.to_string(),
            frame,
            currency: currency.to_string(),
            resolve_names: false,
            state: AppState::Idle,
            should_quit: false,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, AppState::Loading)
    }

    /// Apply a key press; returns a request when rankings should be generated
    pub fn handle_key_event(&mut self, key: KeyEvent) -> Option<RankingRequest> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return None;
        }

        match key.code {
            KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Tab => {
                self.frame = self.frame.next();
            }
            KeyCode::Enter => return self.generate_request(),
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(c) => {
                self.input.push(c);
            }
            _ => {}
        }
        None
    }

    fn generate_request(&mut self) -> Option<RankingRequest> {
        if self.is_loading() {
            return None;
        }

        let inputs = parse_symbol_list(&self.input);
        if inputs.is_empty() {
            self.state = AppState::Error("Enter at least one stock symbol".to_string());
            return None;
        }

        self.state = AppState::Loading;
        let mut request = RankingRequest::new(inputs, self.frame);
        request.resolve_names = self.resolve_names;
        request.currency = self.currency.clone();
        Some(request)
    }

    pub fn on_report(&mut self, report: RankingReport) {
        self.state = AppState::Ready(report);
    }

    pub fn draw(&self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Input
                Constraint::Min(0),    // Leaderboard
                Constraint::Length(3), // Status bar
            ])
            .split(f.area());

        self.render_input(f, chunks[0]);

        match &self.state {
            AppState::Idle => {
                let hint = Paragraph::new("Press Enter to generate rankings")
                    .block(Block::default().borders(Borders::ALL).title("🏆 Leaderboard"))
                    .style(Style::default().fg(Color::Gray));
                f.render_widget(hint, chunks[1]);
            }
            AppState::Loading => render_loading_indicator(f, chunks[1], "Fetching market data..."),
            AppState::Ready(report) => self.render_leaderboard(f, chunks[1], report),
            AppState::Error(message) => render_error(f, chunks[1], message),
        }

        self.render_status_bar(f, chunks[2]);
    }

    fn render_input(&self, f: &mut Frame, area: Rect) {
        let title = format!("Stocks (comma separated) · {}", self.frame);
        let input = Paragraph::new(self.input.as_str())
            .block(Block::default().borders(Borders::ALL).title(title))
            .style(Style::default().fg(Color::White));
        f.render_widget(input, area);
    }

    fn render_leaderboard(&self, f: &mut Frame, area: Rect, report: &RankingReport) {
        let title = match report.leaderboard.status() {
            LeaderboardStatus::Ranked => format!("🏆 Leaderboard ({})", report.frame),
            LeaderboardStatus::NoData => format!("🏆 Leaderboard ({}) · {}", report.frame, NO_DATA_MESSAGE),
        };
        let block = Block::default().borders(Borders::ALL).title(title);

        if report.leaderboard.is_empty() {
            let notes: Vec<Line> = report
                .unresolved
                .iter()
                .map(|issue| Line::from(format!("⚠️  {}", issue)))
                .collect();
            let empty = Paragraph::new(notes)
                .block(block)
                .style(Style::default().fg(Color::Yellow));
            f.render_widget(empty, area);
            return;
        }

        let header = Row::new(vec![
            "Rank".to_string(),
            "Symbol".to_string(),
            "Elo".to_string(),
            "Fund.".to_string(),
            "Tech.".to_string(),
            "Time".to_string(),
            format!("Price ({})", report.currency),
        ])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

        let rows = report.leaderboard.entries().iter().map(|entry| {
            let record = &entry.record;
            Row::new(vec![
                Cell::from(entry.rank.map_or_else(|| "-".to_string(), |r| r.to_string())),
                Cell::from(record.symbol.clone()),
                Cell::from(styled_score_span(record.final_score)),
                Cell::from(format_optional(record.fundamental_score)),
                Cell::from(format_optional(record.technical_score)),
                Cell::from(format_optional(record.time_score)),
                Cell::from(format_optional(report.display_price(record))),
            ])
        });

        let widths = [
            Constraint::Length(5),
            Constraint::Length(8),
            Constraint::Length(9),
            Constraint::Length(9),
            Constraint::Length(9),
            Constraint::Length(9),
            Constraint::Length(14),
        ];

        let table = Table::new(rows, widths).header(header).block(block);
        f.render_widget(table, area);
    }

    fn render_status_bar(&self, f: &mut Frame, area: Rect) {
        let gray = Style::default().fg(Color::Gray);
        let status_text = vec![Line::from(vec![
            Span::styled("Press ", gray),
            key_hint("Enter", Color::Green),
            Span::styled(" to generate rankings • ", gray),
            key_hint("Tab", Color::Yellow),
            Span::styled(" to change time frame • ", gray),
            key_hint("Esc", Color::Red),
            Span::styled(" to quit", gray),
        ])];

        let paragraph = Paragraph::new(status_text)
            .block(Block::default().borders(Borders::ALL))
            .style(Style::default().fg(Color::White));

        f.render_widget(paragraph, area);
    }
}

/// Run the leaderboard TUI until the user quits
pub async fn run_app<P>(engine: Arc<RankingEngine<P>>, mut app: LeaderboardApp) -> Result<()>
where
    P: MarketDataProvider + 'static,
{
    // Setup terminal
    enable_raw_mode()?;
    io::stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    let (report_tx, mut report_rx) = mpsc::unbounded_channel::<RankingReport>();

    let result = loop {
        if let Err(e) = terminal.draw(|f| app.draw(f)) {
            break Err(e.into());
        }

        while let Ok(report) = report_rx.try_recv() {
            app.on_report(report);
        }

        match event::poll(Duration::from_millis(100)) {
            Ok(false) => continue,
            Ok(true) => {}
            Err(e) => break Err(e.into()),
        }

        match event::read() {
            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                if let Some(request) = app.handle_key_event(key) {
                    let engine = Arc::clone(&engine);
                    let tx = report_tx.clone();
                    tokio::spawn(async move {
                        let report = engine.rank(&request).await;
                        let _ = tx.send(report);
                    });
                }

                if app.should_quit {
                    break Ok(());
                }
            }
            Ok(_) => {}
            Err(e) => break Err(e.into()),
        }
    };

    // Cleanup terminal
    disable_raw_mode()?;
    io::stdout().execute(LeaveAlternateScreen)?;
    result
}
