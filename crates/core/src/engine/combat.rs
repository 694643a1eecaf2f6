use std::time::Duration;

use anyhow::Result;
use tracing::{debug, error, info};

use super::{Bot, Signal};
use crate::clock::secs;
use crate::types::{Landmark, MatchMode};

const LEAD_IN: Duration = Duration::from_secs(5);
const PUNCH_EVERY: Duration = Duration::from_millis(500);
/// Beat spacing while the leave button is up; each beat is a double click.
const KEEPALIVE_EVERY: Duration = Duration::from_secs(60);
const DRIFT_AFTER: Duration = Duration::from_secs(120);
const DRIFT_CHANCE: f64 = 0.2;
const DRIFT_HOLD: Duration = Duration::from_millis(200);
const TICK: Duration = Duration::from_millis(50);
const SETUP_CLICKS: u32 = 11;

impl Bot {
    /// Auto-punch until results show up. Errors end the match instead of the run.
    pub(super) fn combat(&mut self) -> Signal {
        match self.fight() {
            Ok(signal) => signal,
            Err(e) => {
                error!("combat aborted: {:#}", e);
                Signal::CombatAborted
            }
        }
    }

    fn fight(&mut self) -> Result<Signal> {
        info!("ultimate ready, punching in {}s", LEAD_IN.as_secs());
        if !self.pause(LEAD_IN) || !self.setup_loadout()? {
            return Ok(Signal::Halted);
        }

        let started = self.now();
        let mut last_beat: Option<Duration> = None;
        let movement: Vec<String> = self.cfg.keys.movement().iter().map(|k| k.to_string()).collect();

        loop {
            if !self.is_running() {
                return Ok(Signal::Halted);
            }
            if self.eyes.sees_results() {
                info!("results screen visible");
                return Ok(Signal::ResultsSeen);
            }

            let leave = self.eyes.sees(Landmark::Leave);
            let cadence = if leave { KEEPALIVE_EVERY } else { PUNCH_EVERY };
            let now = self.now();
            if last_beat.map_or(true, |t| now.saturating_sub(t) >= cadence) {
                last_beat = Some(now);
                if leave {
                    self.hands.double_click()?;
                    debug!("keepalive");
                } else {
                    self.hands.click()?;
                }
            }

            if leave && self.leave_gate.ready(self.now()) {
                match self.cfg.match_mode {
                    MatchMode::Quick => {
                        self.click_leave()?;
                    }
                    MatchMode::Full => self.leave_gate.mark(self.now()),
                }
            }

            if self.since(started) > DRIFT_AFTER && self.hands.chance(DRIFT_CHANCE) {
                let key = self.hands.pick(&movement).to_string();
                self.hands.hold(&key, DRIFT_HOLD)?;
            }

            if !self.pause(TICK) {
                return Ok(Signal::Halted);
            }
        }
    }

    /// Open the menu, pick the loadout, equip slot 1. `false` if stopped midway.
    fn setup_loadout(&mut self) -> Result<bool> {
        let menu = self.cfg.keys.menu.clone();
        let slot = self.cfg.keys.slot_1.clone();
        let (first, second) = (self.cfg.pos_1, self.cfg.pos_2);

        self.hands.press(&menu)?;
        if !self.pause(secs(1.0)) {
            return Ok(false);
        }
        self.hands.travel(first, secs(0.3))?;
        self.hands.click()?;
        if !self.pause(secs(1.5)) {
            return Ok(false);
        }
        for i in 0..SETUP_CLICKS {
            if i == 0 {
                self.hands.travel(second, secs(0.3))?;
            }
            self.hands.click()?;
            if !self.pause(secs(0.2)) {
                return Ok(false);
            }
        }
        self.hands.press(&menu)?;
        if !self.pause(secs(1.0)) {
            return Ok(false);
        }
        self.hands.press(&slot)?;
        Ok(self.pause(secs(1.0)))
    }
}
