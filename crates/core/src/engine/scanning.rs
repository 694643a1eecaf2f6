use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info};

use super::machine::{decide_scan, ScanAction, ScanView};
use super::{Bot, Signal};
use crate::clock::secs;
use crate::types::Landmark;

/// Minimum gap between "leave visible" notes while scanning.
const LEAVE_NOTE_EVERY: Duration = Duration::from_secs(60);

impl Bot {
    /// One lobby tick.
    pub(super) fn scan(&mut self) -> Result<Signal> {
        let solo = self.eyes.find(Landmark::Solo);
        let br = self.eyes.find(Landmark::BattleRoyale);
        let view = ScanView {
            leave: self.eyes.sees(Landmark::Leave),
            results_open: self.eyes.sees(Landmark::Open),
            results_continue: self.eyes.sees(Landmark::Continue),
            solo: solo.is_some(),
            battle_royale: br.is_some(),
        };

        let (leave_duty, action) = decide_scan(&view);
        if leave_duty {
            self.note_leave();
            self.leave_duty()?;
        }

        match (action, solo, br) {
            (ScanAction::EnterResults, _, _) => {
                info!("results screen visible");
                return Ok(Signal::ResultsSeen);
            }
            (ScanAction::QueueSolo, Some(region), _) => {
                if self.hands.click_region(region, 1)? {
                    info!("solo queue joined");
                    return Ok(Signal::Queued);
                }
            }
            (ScanAction::SelectBattleRoyale, _, Some(region)) => {
                self.hands.click_region(region, 1)?;
                debug!("battle royale selected");
            }
            _ => {
                if !self.click_landmark(Landmark::Change, 1)? {
                    debug!("nothing recognized");
                }
            }
        }

        if !self.pause(secs(self.cfg.scan_interval)) {
            return Ok(Signal::Halted);
        }
        Ok(Signal::Idle)
    }

    fn note_leave(&mut self) {
        let now = self.now();
        if self.last_leave_note.map_or(true, |t| now.saturating_sub(t) >= LEAVE_NOTE_EVERY) {
            info!(mode = %self.cfg.match_mode, "leave button visible while scanning");
            self.last_leave_note = Some(now);
        }
    }
}
