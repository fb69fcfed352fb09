/// Small widgets shared by the leaderboard screen
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::analysis::scoring::BASE_RATING;
use crate::report::format_optional;

/// Render a loading indicator
pub fn render_loading_indicator(f: &mut Frame, area: Rect, message: &str) {
    let loading = Paragraph::new(message)
        .block(Block::default().borders(Borders::ALL).title("Loading"))
        .style(Style::default().fg(Color::Yellow));

    f.render_widget(loading, area);
}

/// Render error message
pub fn render_error(f: &mut Frame, area: Rect, error: &str) {
    let error_paragraph = Paragraph::new(error)
        .block(Block::default().borders(Borders::ALL).title("Error"))
        .style(Style::default().fg(Color::Red));

    f.render_widget(error_paragraph, area);
}

/// Rating span, green above the base rating and red below it
pub fn styled_score_span(score: Option<f64>) -> Span<'static> {
    let text = format_optional(score);
    match score {
        Some(value) if value > BASE_RATING => Span::styled(text, Style::default().fg(Color::Green)),
        Some(value) if value < BASE_RATING => Span::styled(text, Style::default().fg(Color::Red)),
        Some(_) => Span::styled(text, Style::default().fg(Color::White)),
        None => Span::styled(text, Style::default().fg(Color::DarkGray)),
    }
}

/// Key hint such as `Enter` in the status bar
pub fn key_hint(key: &str, color: Color) -> Span<'_> {
    Span::styled(key, Style::default().fg(color).add_modifier(Modifier::BOLD))
}
