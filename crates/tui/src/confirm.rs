use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

/// Yes/No popup. Defaults to No so a stray Enter never quits a running bot.
pub struct ConfirmDialog {
    pub message: String,
    pub selected: bool, // true = Yes
}

impl ConfirmDialog {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), selected: false }
    }

    pub fn toggle(&mut self) {
        self.selected = !self.selected;
    }

    pub fn render(&self, f: &mut Frame) {
        let width = (self.message.len() as u16 + 6).max(36);
        let area = centered_rect(width, 8, f.area());
        f.render_widget(Clear, area);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Quit ");
        let inner = block.inner(area);
        f.render_widget(block, area);

        let rows = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

        let msg = Paragraph::new(Span::styled(&self.message, Style::default().fg(Color::White)))
            .alignment(Alignment::Center);
        f.render_widget(msg, rows[1]);

        let on = |bg| Style::default().fg(Color::Black).bg(bg).add_modifier(Modifier::BOLD);
        let off = Style::default().fg(Color::DarkGray);
        let (yes, no) = if self.selected { (on(Color::Green), off) } else { (off, on(Color::Red)) };
        let buttons = Line::from(vec![
            Span::styled("  [Yes]  ", yes),
            Span::raw("   "),
            Span::styled("  [No]  ", no),
        ]);
        f.render_widget(Paragraph::new(buttons).alignment(Alignment::Center), rows[3]);

        let hint = Paragraph::new(Span::styled("y/n, arrows + enter", Style::default().fg(Color::DarkGray)))
            .alignment(Alignment::Center);
        f.render_widget(hint, rows[4]);
    }
}

/// Centered `Rect` of `width` x `height` inside `area`, clipped to it.
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}
