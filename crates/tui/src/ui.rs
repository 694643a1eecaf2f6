use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use autobr_core::types::{RunnerState, Tone};

use crate::{format_elapsed, App};

const ORANGE: Color = Color::Rgb(255, 165, 0);

pub fn tone_color(tone: Tone) -> Color {
    match tone {
        Tone::Info => Color::LightBlue,
        Tone::Waiting => ORANGE,
        Tone::Active => Color::Green,
        Tone::Finished => Color::Magenta,
        Tone::Error => Color::Red,
    }
}

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = if app.log_visible {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(f.area())
    } else {
        Layout::default().constraints([Constraint::Percentage(100)]).split(f.area())
    };

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(chunks[0]);

    draw_banner(f, app, left[0]);
    draw_status(f, app, left[1]);

    if app.log_visible && chunks.len() > 1 {
        draw_logs(f, app, chunks[1]);
    }

    if let Some(dialog) = &app.confirm {
        dialog.render(f);
    }
}

fn draw_banner(f: &mut Frame, app: &App, area: Rect) {
    let (label, bg) = match app.runner {
        RunnerState::Running => ("RUNNING (S / F1 to stop)", Color::Green),
        RunnerState::Stopping => ("STOPPING...", Color::Yellow),
        RunnerState::Stopped => ("STOPPED (S / F1 to start)", Color::Red),
    };
    let width = area.width as usize;
    let pad = width.saturating_sub(label.len());
    let text = format!("{}{}{}", " ".repeat(pad / 2), label, " ".repeat(pad - pad / 2));
    let banner = Paragraph::new(Span::styled(
        text,
        Style::default().fg(Color::Black).bg(bg).add_modifier(Modifier::BOLD),
    ));
    f.render_widget(banner, area);
}

fn draw_status(f: &mut Frame, app: &App, area: Rect) {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Yellow));
    let dim = Style::default().fg(Color::DarkGray);
    let bold = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);

    let (status, color) = match app.phase {
        Some(p) => (p.label(), tone_color(p.tone())),
        None => ("IDLE", Color::DarkGray),
    };

    let lines = vec![
        Line::from(vec![
            key(" s"),
            Span::raw(" start/stop  "),
            key("m"),
            Span::raw(" mode  "),
            key("+/-"),
            Span::raw(" confidence  "),
            key("l"),
            Span::raw(" logs  "),
            key("q"),
            Span::raw(" quit"),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled(" Status    ", dim),
            Span::styled(status, Style::default().fg(color).add_modifier(Modifier::BOLD)),
        ]),
        Line::from(vec![Span::styled(" Matches   ", dim), Span::styled(app.matches.to_string(), bold)]),
        Line::from(vec![
            Span::styled(" Run time  ", dim),
            Span::styled(format_elapsed(app.elapsed()), bold),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled(" Mode      ", dim),
            Span::styled(app.mode.to_string(), Style::default().fg(Color::Cyan)),
        ]),
        Line::from(vec![
            Span::styled(" Confidence ", dim),
            Span::styled(format!("{:.2}", app.confidence), Style::default().fg(Color::Cyan)),
        ]),
        Line::from(vec![
            Span::styled(" Webhook   ", dim),
            if app.webhook_set {
                Span::styled("set", Style::default().fg(Color::Green))
            } else {
                Span::styled("not set", Style::default().fg(Color::DarkGray))
            },
        ]),
    ];

    let panel = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::LEFT | Borders::RIGHT | Borders::BOTTOM)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(panel, area);
}

fn draw_logs(f: &mut Frame, app: &App, area: Rect) {
    let visible_height = area.height.saturating_sub(2) as usize;
    let total = app.log_messages.len();
    let scroll = app.log_scroll.min(total.saturating_sub(visible_height));
    let start = total.saturating_sub(visible_height + scroll);
    let end = total.saturating_sub(scroll);
    let lines: Vec<Line> = app.log_messages[start..end].iter().map(|m| parse_log_line(m)).collect();

    let panel = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Logs ")
                .border_style(Style::default().fg(Color::Yellow)),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(panel, area);
}

/// Parse a structured log line (level\x1fprefix\x1fcolor\x1ftimestamp\x1fmessage)
/// into a colored Line for TUI rendering.
pub fn parse_log_line(raw: &str) -> Line<'_> {
    let parts: Vec<&str> = raw.splitn(5, '\x1f').collect();
    let &[level, prefix, color, timestamp, message] = parts.as_slice() else {
        return Line::from(raw);
    };

    let line_color = match color.parse::<u8>().unwrap_or(0) {
        1 => Color::DarkGray,  // COLOR_GRAY
        2 => Color::LightBlue, // COLOR_BLUE
        _ => Color::White,
    };

    let mut spans = vec![Span::styled(timestamp, Style::default().fg(Color::DarkGray)), Span::raw(" ")];

    match level {
        "ERROR" => spans.push(Span::styled("error ", Style::default().fg(Color::Red))),
        "WARN" => spans.push(Span::styled("warn ", Style::default().fg(Color::Yellow))),
        "DEBUG" | "TRACE" => spans.push(Span::styled("debug ", Style::default().fg(Color::DarkGray))),
        _ => {}
    }

    if !prefix.is_empty() {
        spans.push(Span::styled(prefix, Style::default().fg(line_color).add_modifier(Modifier::BOLD)));
        spans.push(Span::raw(" "));
    }
    spans.push(Span::styled(message, Style::default().fg(line_color)));

    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_line_gets_tag_and_prefix() {
        let line = parse_log_line("WARN\x1fbot\x1f2\x1f12:00:01\x1fno match after 480s");
        let text: Vec<&str> = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, vec!["12:00:01", " ", "warn ", "bot", " ", "no match after 480s"]);
        assert_eq!(line.spans[5].style.fg, Some(Color::LightBlue));
    }

    #[test]
    fn unstructured_line_passes_through() {
        let line = parse_log_line("plain text");
        assert_eq!(line.spans.len(), 1);
        assert_eq!(line.spans[0].content, "plain text");
    }

    #[test]
    fn waiting_is_orange() {
        assert_eq!(tone_color(Tone::Waiting), ORANGE);
    }
}
