//! Start/stop supervision. Runs on a background thread and owns the worker.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::clock::SystemClock;
use crate::engine::Bot;
use crate::notify::WebhookNotifier;
use crate::platform::Platform;
use crate::settings::RunConfig;
use crate::types::{Command, Event, RunnerState};

const IDLE_POLL: Duration = Duration::from_millis(100);

pub struct Runner {
    config_path: PathBuf,
    platform: Arc<dyn Platform>,
    events: Sender<Event>,
    state: RunnerState,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl Runner {
    pub fn new(config_path: impl Into<PathBuf>, platform: Arc<dyn Platform>, events: Sender<Event>) -> Self {
        Self {
            config_path: config_path.into(),
            platform,
            events,
            state: RunnerState::Stopped,
            running: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    pub fn state(&self) -> RunnerState {
        self.state
    }

    /// Apply one command. Returns false on Quit.
    pub fn handle(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::Quit => {
                info!("shutting down");
                self.shutdown();
                return false;
            }
            Command::StartStop => match self.state {
                RunnerState::Stopped => {
                    if let Err(e) = self.start() {
                        error!("start failed: {:#}", e);
                    }
                }
                RunnerState::Running => self.stop(),
                RunnerState::Stopping => info!("already stopping"),
            },
            Command::ToggleMode => self.edit_config(|cfg| cfg.match_mode = cfg.match_mode.toggled()),
            Command::AdjustConfidence(delta) => self.edit_config(|cfg| cfg.adjust_confidence(delta)),
        }
        true
    }

    /// Notice a worker that has exited on its own or after a stop.
    pub fn reap(&mut self) {
        if self.worker.as_ref().is_some_and(|w| w.is_finished()) {
            self.join_worker();
        }
    }

    /// Current config summary for the dashboard.
    pub fn publish_config(&self) {
        let cfg = RunConfig::load(&self.config_path);
        self.emit(Event::Config {
            mode: cfg.match_mode,
            confidence: cfg.confidence,
            webhook_set: !cfg.discord_webhook.trim().is_empty(),
        });
    }

    fn start(&mut self) -> Result<()> {
        let cfg = RunConfig::load(&self.config_path);
        cfg.validate()?;
        let notifier = WebhookNotifier::new(cfg.discord_webhook.clone()).context("failed to create webhook client")?;
        if !notifier.is_configured() {
            warn!("no webhook configured, outcomes will only be logged");
        }

        self.running.store(true, Ordering::Release);
        let running = self.running.clone();
        let platform = self.platform.clone();
        let events = self.events.clone();

        let worker = thread::Builder::new()
            .name("bot".into())
            .spawn(move || {
                let devices = match platform.devices() {
                    Ok(d) => d,
                    Err(e) => {
                        error!("{} devices unavailable: {:#}", platform.name(), e);
                        running.store(false, Ordering::Release);
                        return;
                    }
                };
                let clock = Arc::new(SystemClock::new());
                Bot::new(cfg, devices, clock, Arc::new(notifier), running, events).run();
            })
            .context("failed to spawn bot thread")?;

        self.worker = Some(worker);
        self.set_state(RunnerState::Running);
        info!(platform = self.platform.name(), "runner started");
        Ok(())
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        self.set_state(RunnerState::Stopping);
    }

    fn shutdown(&mut self) {
        if self.worker.is_some() {
            self.stop();
            self.join_worker();
        }
    }

    fn join_worker(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("bot thread panicked");
            }
        }
        self.set_state(RunnerState::Stopped);
        info!("runner stopped");
    }

    fn edit_config(&self, edit: impl FnOnce(&mut RunConfig)) {
        if self.state != RunnerState::Stopped {
            warn!("stop the bot before changing settings");
            return;
        }
        let mut cfg = RunConfig::load(&self.config_path);
        edit(&mut cfg);
        match cfg.save(&self.config_path) {
            Ok(()) => info!(mode = %cfg.match_mode, confidence = cfg.confidence, "settings saved"),
            Err(e) => error!("failed to save {}: {}", self.config_path.display(), e),
        }
        self.publish_config();
    }

    fn set_state(&mut self, state: RunnerState) {
        self.state = state;
        self.emit(Event::Runner(state));
    }

    fn emit(&self, event: Event) {
        self.events.send(event).ok();
    }
}

/// Supervisor loop: apply commands, reap the worker. Returns on Quit or when
/// the command channel closes.
pub fn supervise(config_path: &Path, platform: Arc<dyn Platform>, cmd_rx: Receiver<Command>, events: Sender<Event>) {
    let mut runner = Runner::new(config_path, platform, events);
    runner.publish_config();

    loop {
        match cmd_rx.recv_timeout(IDLE_POLL) {
            Ok(cmd) => {
                if !runner.handle(cmd) {
                    return;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                runner.shutdown();
                return;
            }
        }
        runner.reap();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::time::Instant;

    use super::*;
    use crate::platform::stub::StubPlatform;
    use crate::types::MatchMode;

    fn runner(dir: &Path) -> (Runner, Receiver<Event>) {
        let (tx, rx) = mpsc::channel();
        (Runner::new(dir.join("config.json"), Arc::new(StubPlatform), tx), rx)
    }

    fn wait_stopped(r: &mut Runner) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while r.state() != RunnerState::Stopped && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(20));
            r.reap();
        }
    }

    #[test]
    fn start_then_stop_on_stub() {
        let dir = tempfile::tempdir().unwrap();
        let (mut r, rx) = runner(dir.path());

        assert!(r.handle(Command::StartStop));
        assert_eq!(r.state(), RunnerState::Running);
        assert!(r.handle(Command::StartStop));
        assert_eq!(r.state(), RunnerState::Stopping);
        wait_stopped(&mut r);
        assert_eq!(r.state(), RunnerState::Stopped);

        let states: Vec<RunnerState> = rx
            .try_iter()
            .filter_map(|e| match e {
                Event::Runner(s) => Some(s),
                _ => None,
            })
            .collect();
        assert_eq!(states, vec![RunnerState::Running, RunnerState::Stopping, RunnerState::Stopped]);
    }

    #[test]
    fn settings_locked_while_running() {
        let dir = tempfile::tempdir().unwrap();
        let (mut r, _rx) = runner(dir.path());
        let path = dir.path().join("config.json");

        r.handle(Command::ToggleMode);
        assert_eq!(RunConfig::load(&path).match_mode, MatchMode::Quick);

        r.handle(Command::StartStop);
        r.handle(Command::ToggleMode);
        assert_eq!(RunConfig::load(&path).match_mode, MatchMode::Quick);

        assert!(!r.handle(Command::Quit));
        assert_eq!(r.state(), RunnerState::Stopped);
    }

    #[test]
    fn invalid_config_refuses_to_start() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = RunConfig { discord_webhook: "http://example.com".into(), ..RunConfig::default() };
        cfg.save(&dir.path().join("config.json")).unwrap();

        let (mut r, _rx) = runner(dir.path());
        r.handle(Command::StartStop);
        assert_eq!(r.state(), RunnerState::Stopped);
    }

    #[test]
    fn confidence_nudges_are_saved() {
        let dir = tempfile::tempdir().unwrap();
        let (mut r, rx) = runner(dir.path());
        r.handle(Command::AdjustConfidence(-0.05));
        let cfg = RunConfig::load(&dir.path().join("config.json"));
        assert!((cfg.confidence - 0.75).abs() < 1e-6);
        assert!(rx.try_iter().any(|e| matches!(e, Event::Config { confidence, .. } if (confidence - 0.75).abs() < 1e-6)));
    }
}
