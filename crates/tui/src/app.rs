use std::sync::atomic::AtomicBool;
use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

use autobr_core::engine::Phase;
use autobr_core::platform::hotkey;
use autobr_core::types::{Command, Event, MatchMode, RunnerState};

use crate::confirm::ConfirmDialog;

const CONFIDENCE_STEP: f32 = 0.05;

pub struct App {
    pub runner: RunnerState,
    pub phase: Option<Phase>,
    pub matches: u32,
    pub started_at: Option<Instant>,
    pub mode: MatchMode,
    pub confidence: f32,
    pub webhook_set: bool,
    pub log_visible: bool,
    pub log_messages: Vec<String>,
    pub log_scroll: usize, // scroll offset from bottom (0 = latest)
    pub confirm: Option<ConfirmDialog>,
    pub should_quit: bool,
    log_rx: mpsc::Receiver<String>,
    event_rx: mpsc::Receiver<Event>,
    cmd_tx: mpsc::Sender<Command>,
    hotkey: Arc<AtomicBool>,
}

impl App {
    pub fn new(
        log_rx: mpsc::Receiver<String>,
        event_rx: mpsc::Receiver<Event>,
        cmd_tx: mpsc::Sender<Command>,
        hotkey: Arc<AtomicBool>,
    ) -> Self {
        Self {
            runner: RunnerState::Stopped,
            phase: None,
            matches: 0,
            started_at: None,
            mode: MatchMode::Full,
            confidence: 0.8,
            webhook_set: false,
            log_visible: true,
            log_messages: Vec::new(),
            log_scroll: 0,
            confirm: None,
            should_quit: false,
            log_rx,
            event_rx,
            cmd_tx,
            hotkey,
        }
    }

    /// Pull logs, runner events and hotkey presses.
    pub fn drain(&mut self) {
        while let Ok(msg) = self.log_rx.try_recv() {
            self.log_messages.push(msg);
        }
        while let Ok(ev) = self.event_rx.try_recv() {
            self.apply(ev);
        }
        if hotkey::take_press(&self.hotkey) {
            self.start_stop();
        }
    }

    fn apply(&mut self, ev: Event) {
        match ev {
            Event::Phase(p) => self.phase = Some(p),
            Event::MatchStarted { count } => self.matches = count,
            Event::Runner(state) => {
                match state {
                    RunnerState::Running => {
                        self.started_at = Some(Instant::now());
                        self.matches = 0;
                    }
                    RunnerState::Stopped => {
                        self.started_at = None;
                        self.phase = None;
                    }
                    RunnerState::Stopping => {}
                }
                self.runner = state;
            }
            Event::Config { mode, confidence, webhook_set } => {
                self.mode = mode;
                self.confidence = confidence;
                self.webhook_set = webhook_set;
            }
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.map(|t| t.elapsed()).unwrap_or_default()
    }

    pub fn scroll_log_up(&mut self, n: usize) {
        self.log_scroll = self.log_scroll.saturating_add(n);
    }

    pub fn scroll_log_down(&mut self, n: usize) {
        self.log_scroll = self.log_scroll.saturating_sub(n);
    }

    pub fn start_stop(&mut self) {
        self.cmd_tx.send(Command::StartStop).ok();
    }

    pub fn toggle_mode(&mut self) {
        self.cmd_tx.send(Command::ToggleMode).ok();
    }

    pub fn raise_confidence(&mut self) {
        self.cmd_tx.send(Command::AdjustConfidence(CONFIDENCE_STEP)).ok();
    }

    pub fn lower_confidence(&mut self) {
        self.cmd_tx.send(Command::AdjustConfidence(-CONFIDENCE_STEP)).ok();
    }

    pub fn toggle_log(&mut self) {
        self.log_visible = !self.log_visible;
    }

    /// Quit right away when idle, ask first while a run is active.
    pub fn request_quit(&mut self) {
        if self.runner == RunnerState::Stopped {
            self.quit();
        } else {
            self.confirm = Some(ConfirmDialog::new("Bot is running. Stop and quit?"));
        }
    }

    pub fn quit(&mut self) {
        self.cmd_tx.send(Command::Quit).ok();
        self.should_quit = true;
    }
}

/// `HH:MM:SS`
pub fn format_elapsed(d: Duration) -> String {
    let s = d.as_secs();
    format!("{:02}:{:02}:{:02}", s / 3600, (s / 60) % 60, s % 60)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;

    fn app() -> (App, mpsc::Sender<Event>, mpsc::Receiver<Command>, Arc<AtomicBool>) {
        let (_log_tx, log_rx) = mpsc::channel();
        let (ev_tx, ev_rx) = mpsc::channel();
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let hotkey = Arc::new(AtomicBool::new(false));
        (App::new(log_rx, ev_rx, cmd_tx, hotkey.clone()), ev_tx, cmd_rx, hotkey)
    }

    #[test]
    fn elapsed_format() {
        assert_eq!(format_elapsed(Duration::from_secs(0)), "00:00:00");
        assert_eq!(format_elapsed(Duration::from_secs(3725)), "01:02:05");
    }

    #[test]
    fn events_update_dashboard_state() {
        let (mut app, ev, _cmd, _hk) = app();
        ev.send(Event::Runner(RunnerState::Running)).unwrap();
        ev.send(Event::Phase(Phase::AutoCombat)).unwrap();
        ev.send(Event::MatchStarted { count: 3 }).unwrap();
        app.drain();
        assert_eq!(app.runner, RunnerState::Running);
        assert_eq!(app.phase, Some(Phase::AutoCombat));
        assert_eq!(app.matches, 3);
        assert!(app.started_at.is_some());

        ev.send(Event::Runner(RunnerState::Stopped)).unwrap();
        app.drain();
        assert_eq!(app.phase, None);
        assert_eq!(app.elapsed(), Duration::ZERO);
    }

    #[test]
    fn hotkey_press_toggles_once() {
        let (mut app, _ev, cmd, hk) = app();
        hk.store(true, Ordering::Release);
        app.drain();
        app.drain();
        assert_eq!(cmd.try_iter().collect::<Vec<_>>(), vec![Command::StartStop]);
    }

    #[test]
    fn quit_asks_while_running() {
        let (mut app, ev, cmd, _hk) = app();
        ev.send(Event::Runner(RunnerState::Running)).unwrap();
        app.drain();
        app.request_quit();
        assert!(app.confirm.is_some());
        assert!(!app.should_quit);
        assert!(cmd.try_recv().is_err());
    }
}
