use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

use super::{Bot, Signal};
use crate::types::Landmark;

pub const RESULTS_TIMEOUT: Duration = Duration::from_secs(300);
pub const RESULTS_STALL: Duration = Duration::from_secs(120);
const RESULTS_POLL: Duration = Duration::from_secs(4);
const OPEN_SETTLE: Duration = Duration::from_secs(3);
const EXIT_SETTLE: Duration = Duration::from_secs(5);

impl Bot {
    /// Click through the results screens back to the lobby, reporting the outcome on the way.
    pub(super) fn results(&mut self) -> Result<Signal> {
        let entered = self.now();
        let mut last_seen = entered;

        loop {
            if !self.is_running() {
                return Ok(Signal::Halted);
            }
            if self.since(entered) >= RESULTS_TIMEOUT {
                warn!("results screen open for {}s, rescanning", RESULTS_TIMEOUT.as_secs());
                return Ok(Signal::ResultsTimedOut);
            }
            if self.since(last_seen) >= RESULTS_STALL {
                warn!("no results landmark for {}s, rescanning", RESULTS_STALL.as_secs());
                return Ok(Signal::ResultsStalled);
            }

            if let Some(open) = self.eyes.find(Landmark::Open) {
                last_seen = self.now();
                self.report_outcome();
                self.hands.click_region(open, 1)?;
                if !self.pause(OPEN_SETTLE) {
                    return Ok(Signal::Halted);
                }
                continue;
            }

            let exit = self
                .eyes
                .find(Landmark::Continue)
                .or_else(|| self.eyes.find(Landmark::Leave));
            if let Some(exit) = exit {
                self.report_outcome();
                self.hands.click_region(exit, 2)?;
                info!("results closed");
                if !self.pause(EXIT_SETTLE) {
                    return Ok(Signal::Halted);
                }
                return Ok(Signal::ResultsClosed);
            }

            if !self.pause(RESULTS_POLL) {
                return Ok(Signal::Halted);
            }
        }
    }
}
