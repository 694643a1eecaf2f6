use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, MouseEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::App;
use crate::ui;

pub fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> anyhow::Result<()> {
    loop {
        if app.should_quit {
            return Ok(());
        }

        app.drain();

        terminal.draw(|f| ui::draw(f, app))?;

        // 100ms poll keeps the timer and hotkey responsive
        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        match event::read()? {
            Event::Key(key) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                if let Some(dialog) = app.confirm.as_mut() {
                    match key.code {
                        KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::Char('h') | KeyCode::Char('l') => {
                            dialog.toggle();
                        }
                        KeyCode::Char('y') | KeyCode::Char('Y') => app.quit(),
                        KeyCode::Enter => {
                            if dialog.selected {
                                app.quit();
                            } else {
                                app.confirm = None;
                            }
                        }
                        KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => app.confirm = None,
                        _ => {}
                    }
                    continue;
                }

                match key.code {
                    KeyCode::Char('q') | KeyCode::Char('Q') => app.request_quit(),
                    KeyCode::Char('s') | KeyCode::Char('S') => app.start_stop(),
                    KeyCode::Char('m') | KeyCode::Char('M') => app.toggle_mode(),
                    KeyCode::Char('+') | KeyCode::Char('=') => app.raise_confidence(),
                    KeyCode::Char('-') | KeyCode::Char('_') => app.lower_confidence(),
                    KeyCode::Char('l') | KeyCode::Char('L') => app.toggle_log(),
                    KeyCode::Up | KeyCode::Char('k') => app.scroll_log_up(1),
                    KeyCode::Down | KeyCode::Char('j') => app.scroll_log_down(1),
                    KeyCode::PageUp => app.scroll_log_up(10),
                    KeyCode::PageDown => app.scroll_log_down(10),
                    _ => {}
                }
            }
            Event::Mouse(mouse) => match mouse.kind {
                MouseEventKind::ScrollUp => app.scroll_log_up(3),
                MouseEventKind::ScrollDown => app.scroll_log_down(3),
                _ => {}
            },
            _ => {}
        }
    }
}
