use super::App;
use crate::types::{ColorMarker, ColorSpan};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

/// Draw the main UI layout
pub fn draw(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(3), // Search box
            Constraint::Length(8), // Suggestions
            Constraint::Min(3),    // Ticker
            Constraint::Length(3), // Footer
        ])
        .split(frame.area());

    draw_header(frame, app, chunks[0]);
    draw_search(frame, app, chunks[1]);
    draw_suggestions(frame, app, chunks[2]);
    draw_ticker(frame, app, chunks[3]);
    draw_footer(frame, app, chunks[4]);
}

fn draw_header(frame: &mut Frame, app: &App, area: Rect) {
    let metrics = app.ticker().metrics();
    let last_ok = metrics
        .last_success_at
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "never".to_string());
    let status_color = if metrics.failed_cycles > 0 && metrics.success_rate < 0.5 {
        Color::Yellow
    } else {
        Color::Green
    };

    let header_text = format!(
        " Pinned: {} | Polls: {} ({} failed) | p50: {:.0}ms | Last update: {}",
        app.ticker().watchlist().len(),
        metrics.total_cycles,
        metrics.failed_cycles,
        metrics.latency_p50_ms,
        last_ok
    );

    let header = Paragraph::new(header_text)
        .style(Style::default().fg(status_color))
        .block(Block::default().borders(Borders::ALL).title(" Price Ticker "));
    frame.render_widget(header, area);
}

fn draw_search(frame: &mut Frame, app: &App, area: Rect) {
    let search = Paragraph::new(format!(" {}_", app.query))
        .block(Block::default().borders(Borders::ALL).title(" Search "));
    frame.render_widget(search, area);
}

fn draw_suggestions(frame: &mut Frame, app: &mut App, area: Rect) {
    let items: Vec<ListItem> = app
        .suggestions
        .iter()
        .map(|id| ListItem::new(id.as_str()))
        .collect();

    let title = if items.is_empty() {
        " Suggestions (none, Enter pins typed text) "
    } else {
        " Suggestions "
    };

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    frame.render_stateful_widget(list, area, &mut app.list_state);
}

fn draw_ticker(frame: &mut Frame, app: &App, area: Rect) {
    let ticker_frame = app.frame();
    let lines = if ticker_frame.publication_id.is_none() {
        vec![Line::styled(
            " Waiting for first prices...",
            Style::default().fg(Color::DarkGray),
        )]
    } else {
        styled_lines(&ticker_frame.visible, &ticker_frame.spans)
    };

    let ticker = Paragraph::new(lines)
        .style(Style::default().bg(Color::Black))
        .block(Block::default().borders(Borders::ALL).title(" Watchlist "));
    frame.render_widget(ticker, area);
}

fn draw_footer(frame: &mut Frame, app: &App, area: Rect) {
    let keys = "type=search ↑/↓=select Enter=pin Esc=quit";
    let footer_text = match app.status_message.as_deref() {
        Some(status) => format!(" {} | {}", status, keys),
        None => format!(" {}", keys),
    };

    let footer = Paragraph::new(footer_text).block(Block::default().borders(Borders::ALL));
    frame.render_widget(footer, area);
}

fn marker_color(marker: ColorMarker) -> Color {
    match marker {
        ColorMarker::Up => Color::Green,
        ColorMarker::Down => Color::Red,
        ColorMarker::Neutral => Color::White,
    }
}

/// Splits the visible prefix of the ticker text into colored lines
///
/// `spans` index chars of the full text; lines not yet revealed are left out
/// and the line being revealed is cut at the visible length.
pub fn styled_lines(visible: &str, spans: &[ColorSpan]) -> Vec<Line<'static>> {
    let chars: Vec<char> = visible.chars().collect();
    if spans.is_empty() {
        return vec![Line::raw(visible.to_string())];
    }

    spans
        .iter()
        .filter(|span| span.start < chars.len())
        .map(|span| {
            let end = span.end.min(chars.len());
            let text: String = chars[span.start..end].iter().collect();
            Line::from(Span::styled(
                text,
                Style::default().fg(marker_color(span.color)),
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans() -> Vec<ColorSpan> {
        // "btc: up\neth: dn"
        vec![
            ColorSpan {
                start: 0,
                end: 7,
                color: ColorMarker::Up,
            },
            ColorSpan {
                start: 8,
                end: 15,
                color: ColorMarker::Down,
            },
        ]
    }

    #[test]
    fn test_partial_reveal_cuts_current_line() {
        let lines = styled_lines("btc: up\net", &spans());
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].to_string(), "btc: up");
        assert_eq!(lines[0].spans[0].style.fg, Some(Color::Green));
        assert_eq!(lines[1].to_string(), "et");
        assert_eq!(lines[1].spans[0].style.fg, Some(Color::Red));
    }

    #[test]
    fn test_unrevealed_lines_are_skipped() {
        assert!(styled_lines("", &spans()).is_empty());
        assert_eq!(styled_lines("btc: up\n", &spans()).len(), 1);
    }

    #[test]
    fn test_full_text() {
        let lines = styled_lines("btc: up\neth: dn", &spans());
        assert_eq!(lines[1].to_string(), "eth: dn");
    }
}
