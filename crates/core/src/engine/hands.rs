use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::warn;

use super::pause;
use crate::clock::{secs, Clock};
use crate::platform::{Input, InputError};
use crate::types::{Point, Region};

/// Human-paced input on top of a raw `Input`.
///
/// Every press is skipped once the run flag clears. Releases always go
/// through so nothing stays held after a stop. Backend errors are logged and
/// the action dropped; an unknown key name is a config problem and propagates.
pub struct Hands {
    input: Box<dyn Input>,
    clock: Arc<dyn Clock>,
    running: Arc<AtomicBool>,
    rng: StdRng,
}

impl Hands {
    pub fn new(input: Box<dyn Input>, clock: Arc<dyn Clock>, running: Arc<AtomicBool>) -> Self {
        Self { input, clock, running, rng: StdRng::from_entropy() }
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    fn live(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn wait(&self, d: Duration) -> bool {
        pause(self.clock.as_ref(), &self.running, d)
    }

    pub fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        self.rng.gen_range(lo..=hi)
    }

    pub fn chance(&mut self, p: f64) -> bool {
        self.rng.gen_bool(p)
    }

    pub fn pick<'a>(&mut self, items: &'a [String]) -> &'a str {
        &items[self.rng.gen_range(0..items.len())]
    }

    /// Travel with jitter, settle, nudge a few pixels left, then a held press.
    pub fn human_click(&mut self, target: Point, jitter: i32) -> Result<bool, InputError> {
        if !self.live() {
            return Ok(false);
        }
        let j = jitter.max(0);
        let x = target.x + self.rng.gen_range(-j..=j);
        let y = target.y + self.rng.gen_range(-j..=j);
        let travel = secs(self.uniform(0.3, 0.5));
        if !done("move", self.input.move_to(x, y, travel))? || !self.wait(secs(0.2)) {
            return Ok(false);
        }
        let nudge = self.rng.gen_range(-4..=-1);
        done("nudge", self.input.move_by(nudge, 0))?;
        if !self.wait(secs(0.3)) {
            return Ok(false);
        }

        if !done("press", self.input.mouse_down())? {
            return Ok(false);
        }
        let hold = secs(self.uniform(0.15, 0.25));
        self.wait(hold);
        done("release", self.input.mouse_up())?;
        self.wait(secs(0.5));
        Ok(true)
    }

    /// Human click on a found region, `times` presses in total.
    pub fn click_region(&mut self, region: Region, times: u32) -> Result<bool, InputError> {
        if !self.human_click(region.center(), region.safe_jitter())? {
            return Ok(false);
        }
        for _ in 1..times {
            if !self.wait(secs(0.2)) {
                break;
            }
            self.click()?;
        }
        Ok(true)
    }

    /// Straight move, no jitter.
    pub fn travel(&mut self, to: Point, duration: Duration) -> Result<bool, InputError> {
        if !self.live() {
            return Ok(false);
        }
        done("move", self.input.move_to(to.x, to.y, duration))
    }

    /// Plain click where the cursor is.
    pub fn click(&mut self) -> Result<bool, InputError> {
        if !self.live() {
            return Ok(false);
        }
        done("click", self.input.click())
    }

    pub fn double_click(&mut self) -> Result<bool, InputError> {
        let first = self.click()?;
        if !self.wait(secs(0.2)) {
            return Ok(first);
        }
        Ok(self.click()? || first)
    }

    /// Hold `key` for `duration`. The release is sent even if the run stops meanwhile.
    pub fn hold(&mut self, key: &str, duration: Duration) -> Result<bool, InputError> {
        if !self.live() || !done("key", self.input.key_down(key))? {
            return Ok(false);
        }
        self.wait(duration);
        done("key release", self.input.key_up(key))
    }

    pub fn press(&mut self, key: &str) -> Result<bool, InputError> {
        self.hold(key, secs(0.1))
    }

    /// Horizontal camera turn.
    pub fn look(&mut self, dx: i32) -> Result<bool, InputError> {
        if !self.live() {
            return Ok(false);
        }
        done("look", self.input.move_by(dx, 0))
    }

    pub fn look_span(&mut self, span: i32) -> i32 {
        self.rng.gen_range(-span..=span)
    }
}

/// Ok(true) when the call went through.
fn done(what: &str, r: Result<(), InputError>) -> Result<bool, InputError> {
    match r {
        Ok(()) => Ok(true),
        Err(InputError::Backend(e)) => {
            warn!("{} skipped: {}", what, e);
            Ok(false)
        }
        Err(e) => Err(e),
    }
}
