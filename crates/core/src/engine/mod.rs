//! The match loop.
//!
//! `Bot::run` owns every timer and counter of a run. Each phase handler does
//! one unit of work and reports a [`Signal`]; the loop resolves it through
//! [`machine::next`]. Handler errors never end the run: they are logged,
//! followed by a short backoff, and the bot starts over from Scanning.

mod combat;
mod hands;
mod ledger;
pub mod machine;
mod results;
mod roam;
mod scanning;
mod vision;
mod waiting;

#[cfg(test)]
pub(crate) mod fakes;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::clock::Clock;
use crate::notify::Notifier;
use crate::platform::{Devices, InputError};
use crate::settings::RunConfig;
use crate::types::{Event, Landmark, MatchMode};

pub use hands::Hands;
pub use ledger::{format_duration, outcome_message, sane_duration, MatchLedger};
pub use machine::{Phase, Signal};
pub use vision::Eyes;

use machine::LeaveGate;

/// Longest uninterrupted sleep; bounds how long a stop request can go unnoticed.
pub const SLICE: Duration = Duration::from_millis(500);
pub const ERROR_BACKOFF: Duration = Duration::from_secs(5);
pub const LEAVE_DEBOUNCE: Duration = Duration::from_secs(60);
/// Where the outcome screenshot is written before it is posted.
pub const OUTCOME_SHOT: &str = "match_finish.png";

/// Sleep `total` in slices, returning early with `false` once `running` clears.
pub fn pause(clock: &dyn Clock, running: &AtomicBool, total: Duration) -> bool {
    let end = clock.now().checked_add(total).unwrap_or(Duration::MAX);
    loop {
        if !running.load(Ordering::Acquire) {
            return false;
        }
        let now = clock.now();
        if now >= end {
            return true;
        }
        clock.sleep((end - now).min(SLICE));
    }
}

pub struct Bot {
    cfg: RunConfig,
    eyes: Eyes,
    hands: Hands,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
    running: Arc<AtomicBool>,
    events: Sender<Event>,
    phase: Phase,
    ledger: MatchLedger,
    leave_gate: LeaveGate,
    last_leave_note: Option<Duration>,
    outcome_shot: PathBuf,
}

impl Bot {
    pub fn new(
        cfg: RunConfig,
        devices: Devices,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
        running: Arc<AtomicBool>,
        events: Sender<Event>,
    ) -> Self {
        let eyes = Eyes::new(devices.screen, cfg.images.clone(), cfg.confidence);
        let hands = Hands::new(devices.input, clock.clone(), running.clone());
        Self {
            cfg,
            eyes,
            hands,
            clock,
            notifier,
            running,
            events,
            phase: Phase::Scanning,
            ledger: MatchLedger::default(),
            leave_gate: LeaveGate::new(LEAVE_DEBOUNCE),
            last_leave_note: None,
            outcome_shot: PathBuf::from(OUTCOME_SHOT),
        }
    }

    /// Fixed randomness, for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.hands.reseed(seed);
        self
    }

    pub fn with_outcome_shot(mut self, path: impl Into<PathBuf>) -> Self {
        self.outcome_shot = path.into();
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn matches(&self) -> u32 {
        self.ledger.count()
    }

    /// Run until the running flag clears.
    pub fn run(&mut self) {
        info!(mode = %self.cfg.match_mode, confidence = self.cfg.confidence, "bot started");
        self.enter(Phase::Scanning);

        while self.is_running() {
            let signal = match self.step() {
                Ok(signal) => signal,
                Err(e) => {
                    error!("{} failed: {:#}", self.phase, e);
                    self.pause(ERROR_BACKOFF);
                    Signal::Failed
                }
            };
            if signal == Signal::Halted || !self.is_running() {
                break;
            }
            match machine::next(self.phase, signal) {
                Some(to) if to != self.phase => self.enter(to),
                Some(_) => {}
                None => {
                    warn!("no transition for {:?} in {}, rescanning", signal, self.phase);
                    self.enter(Phase::Scanning);
                }
            }
        }

        info!(matches = self.ledger.count(), "bot stopped");
    }

    fn step(&mut self) -> anyhow::Result<Signal> {
        match self.phase {
            Phase::Scanning => self.scan(),
            Phase::AwaitingMatch => self.await_match(),
            Phase::FreeRoam => self.roam(),
            Phase::AutoCombat => Ok(self.combat()),
            Phase::PostMatch => self.results(),
        }
    }

    fn enter(&mut self, phase: Phase) {
        info!("{} -> {}", self.phase, phase);
        self.phase = phase;
        self.emit(Event::Phase(phase));
    }

    fn emit(&self, event: Event) {
        // dashboard may be gone
        let _ = self.events.send(event);
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn now(&self) -> Duration {
        self.clock.now()
    }

    fn pause(&self, d: Duration) -> bool {
        pause(self.clock.as_ref(), &self.running, d)
    }

    fn since(&self, t: Duration) -> Duration {
        self.now().saturating_sub(t)
    }

    /// Locate and human-click a landmark. `false` when absent or the click was skipped.
    fn click_landmark(&mut self, landmark: Landmark, times: u32) -> Result<bool, InputError> {
        match self.eyes.find(landmark) {
            Some(region) => self.hands.click_region(region, times),
            None => Ok(false),
        }
    }

    /// Debounced reaction to the leave button outside combat.
    fn leave_duty(&mut self) -> Result<(), InputError> {
        if !self.leave_gate.ready(self.now()) {
            return Ok(());
        }
        match self.cfg.match_mode {
            MatchMode::Quick => {
                self.click_leave()?;
            }
            MatchMode::Full => {
                self.hands.double_click()?;
                info!("keepalive");
                self.leave_gate.mark(self.now());
            }
        }
        Ok(())
    }

    /// Quick-mode leave: two presses on the leave button, stamping the gate only when it landed.
    fn click_leave(&mut self) -> Result<bool, InputError> {
        let clicked = self.click_landmark(Landmark::Leave, 2)?;
        if clicked {
            info!("leave clicked");
            self.leave_gate.mark(self.now());
        }
        Ok(clicked)
    }

    /// Post the outcome of the current match, once.
    fn report_outcome(&mut self) {
        let Some(match_no) = self.ledger.claim_report() else {
            return;
        };
        let message = outcome_message(match_no, self.ledger.elapsed_secs(self.now()));
        info!("{}", message);

        let shot = self.outcome_shot.clone();
        let attached = self.eyes.screenshot(self.cfg.outcome_area, &shot);
        self.notifier.notify(&message, attached.then_some(shot.as_path()));
    }
}
