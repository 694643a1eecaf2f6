use std::time::Duration;

/// Longest match duration worth reporting; anything else is a stale start time.
pub const MAX_REPORTED_SECS: u64 = 3600;

/// Match counter and the one-outcome-per-match guarantee.
#[derive(Debug, Clone, Default)]
pub struct MatchLedger {
    count: u32,
    started_at: Option<Duration>,
    notified: bool,
}

impl MatchLedger {
    /// Record a match start. Returns the new match number.
    pub fn begin(&mut self, now: Duration) -> u32 {
        self.count += 1;
        self.started_at = Some(now);
        self.notified = false;
        self.count
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Claim the outcome report for the current match; `None` once claimed.
    pub fn claim_report(&mut self) -> Option<u32> {
        if self.notified {
            return None;
        }
        self.notified = true;
        Some(self.count)
    }

    /// Seconds since the recorded start, 0 when unknown or implausible.
    pub fn elapsed_secs(&self, now: Duration) -> u64 {
        match self.started_at {
            Some(start) => sane_duration(now.as_secs_f64() - start.as_secs_f64()),
            None => 0,
        }
    }
}

/// Clamp a raw duration: values outside `0..=3600` s become 0.
pub fn sane_duration(raw_secs: f64) -> u64 {
    if raw_secs.is_finite() && (0.0..=MAX_REPORTED_SECS as f64).contains(&raw_secs) {
        raw_secs as u64
    } else {
        0
    }
}

pub fn format_duration(secs: u64) -> String {
    format!("{} min {} sec", secs / 60, secs % 60)
}

pub fn outcome_message(match_no: u32, secs: u64) -> String {
    format!("Queue #{} Finish time: {}", match_no, format_duration(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn implausible_durations_report_zero() {
        assert_eq!(sane_duration(5000.0), 0);
        assert_eq!(sane_duration(-3.0), 0);
        assert_eq!(sane_duration(3600.0), 3600);
        assert_eq!(sane_duration(125.7), 125);
    }

    #[test]
    fn report_claimed_once_per_match() {
        let mut ledger = MatchLedger::default();
        ledger.begin(Duration::from_secs(10));
        assert_eq!(ledger.claim_report(), Some(1));
        assert_eq!(ledger.claim_report(), None);
        ledger.begin(Duration::from_secs(900));
        assert_eq!(ledger.claim_report(), Some(2));
    }

    #[test]
    fn elapsed_without_start_is_zero() {
        let ledger = MatchLedger::default();
        assert_eq!(ledger.elapsed_secs(Duration::from_secs(5000)), 0);
    }

    #[test]
    fn message_format() {
        assert_eq!(outcome_message(3, 754), "Queue #3 Finish time: 12 min 34 sec");
    }
}
