use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

use super::machine::{decide_wait, WaitVerdict};
use super::{Bot, Signal};
use crate::types::{Event, Landmark};

pub const WAIT_TIMEOUT: Duration = Duration::from_secs(480);
const WAIT_POLL: Duration = Duration::from_millis(500);
const WAIT_NOTE_EVERY: Duration = Duration::from_secs(30);

impl Bot {
    /// Poll the queue until the match starts, the queue is cancelled, or time runs out.
    pub(super) fn await_match(&mut self) -> Result<Signal> {
        let entered = self.now();
        let mut noted = entered;

        loop {
            if !self.is_running() {
                return Ok(Signal::Halted);
            }
            if self.since(entered) >= WAIT_TIMEOUT {
                warn!("no match after {}s, back to scanning", WAIT_TIMEOUT.as_secs());
                return Ok(Signal::WaitTimedOut);
            }

            let verdict = decide_wait(
                self.eyes.sees(Landmark::Ultimate),
                self.eyes.sees(Landmark::Leave),
                self.eyes.sees(Landmark::Change),
            );
            match verdict {
                Some(WaitVerdict::Cancelled) => {
                    info!("queue cancelled");
                    return Ok(Signal::WaitCancelled);
                }
                Some(v) => {
                    let count = self.ledger.begin(self.now());
                    info!(count, ?v, "match started");
                    self.emit(Event::MatchStarted { count });
                    return Ok(v.signal());
                }
                None => {}
            }

            if self.since(noted) >= WAIT_NOTE_EVERY {
                info!("still waiting for a match ({}s)", self.since(entered).as_secs());
                noted = self.now();
            }
            if !self.pause(WAIT_POLL) {
                return Ok(Signal::Halted);
            }
        }
    }
}
