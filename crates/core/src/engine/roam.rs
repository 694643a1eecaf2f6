use std::time::Duration;

use anyhow::Result;
use tracing::info;

use super::{Bot, Signal};
use crate::clock::secs;
use crate::types::Landmark;

pub const ROAM_CAP: Duration = Duration::from_secs(1080);
const LOOK_CHANCE: f64 = 0.2;
const LOOK_SPAN: i32 = 120;

impl Bot {
    /// Wander with random movement until the match ends.
    pub(super) fn roam(&mut self) -> Result<Signal> {
        let entered = self.now();
        let keys: Vec<String> = self.cfg.keys.movement().iter().map(|k| k.to_string()).collect();

        loop {
            if !self.is_running() {
                return Ok(Signal::Halted);
            }

            let held = secs(self.hands.uniform(0.2, 0.6));
            let key = self.hands.pick(&keys).to_string();
            self.hands.hold(&key, held)?;

            if self.eyes.sees_results() {
                info!("results screen visible");
                return Ok(Signal::ResultsSeen);
            }
            if self.eyes.sees(Landmark::Leave) {
                self.leave_duty()?;
            }
            if self.hands.chance(LOOK_CHANCE) {
                let dx = self.hands.look_span(LOOK_SPAN);
                self.hands.look(dx)?;
            }
            if self.since(entered) >= ROAM_CAP {
                info!("roamed for {}s, assuming the match is over", ROAM_CAP.as_secs());
                return Ok(Signal::RoamCapped);
            }

            let rest = secs(self.hands.uniform(0.5, 1.2));
            if !self.pause(rest) {
                return Ok(Signal::Halted);
            }
        }
    }
}
