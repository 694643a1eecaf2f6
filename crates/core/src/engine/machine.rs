//! Phase graph and the pure decisions the run loop is built from.
//!
//! Nothing here touches the screen or the clock, so every edge can be tested
//! by feeding observations directly.

use std::fmt;
use std::time::Duration;

use crate::types::Tone;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Scanning,
    AwaitingMatch,
    FreeRoam,
    AutoCombat,
    PostMatch,
}

impl Phase {
    /// Dashboard status text.
    pub fn label(self) -> &'static str {
        match self {
            Phase::Scanning => "CHECK / STARTING",
            Phase::AwaitingMatch => "WAITING FOR MATCH",
            Phase::FreeRoam => "IN GAME (MOVING)",
            Phase::AutoCombat => "AUTO-PUNCHING",
            Phase::PostMatch => "MATCH ENDED",
        }
    }

    pub fn tone(self) -> Tone {
        match self {
            Phase::Scanning => Tone::Info,
            Phase::AwaitingMatch => Tone::Waiting,
            Phase::FreeRoam | Phase::AutoCombat => Tone::Active,
            Phase::PostMatch => Tone::Finished,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// What a phase handler reports back to the run loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Nothing decisive this tick
    Idle,
    ResultsSeen,
    Queued,
    WaitCancelled,
    WaitTimedOut,
    EnteredLobby,
    UltimateReady,
    RoamCapped,
    CombatAborted,
    ResultsClosed,
    ResultsTimedOut,
    ResultsStalled,
    /// Handler returned an error; the loop has already backed off
    Failed,
    /// Stop flag cleared mid-phase
    Halted,
}

/// Every legal edge. `next` is a lookup in this table.
pub const TRANSITIONS: &[(Phase, Signal, Phase)] = &[
    (Phase::Scanning, Signal::Idle, Phase::Scanning),
    (Phase::Scanning, Signal::ResultsSeen, Phase::PostMatch),
    (Phase::Scanning, Signal::Queued, Phase::AwaitingMatch),
    (Phase::AwaitingMatch, Signal::WaitCancelled, Phase::Scanning),
    (Phase::AwaitingMatch, Signal::WaitTimedOut, Phase::Scanning),
    (Phase::AwaitingMatch, Signal::UltimateReady, Phase::AutoCombat),
    (Phase::AwaitingMatch, Signal::EnteredLobby, Phase::FreeRoam),
    (Phase::FreeRoam, Signal::ResultsSeen, Phase::PostMatch),
    (Phase::FreeRoam, Signal::RoamCapped, Phase::PostMatch),
    (Phase::AutoCombat, Signal::ResultsSeen, Phase::PostMatch),
    (Phase::AutoCombat, Signal::CombatAborted, Phase::PostMatch),
    (Phase::PostMatch, Signal::ResultsClosed, Phase::Scanning),
    (Phase::PostMatch, Signal::ResultsTimedOut, Phase::Scanning),
    (Phase::PostMatch, Signal::ResultsStalled, Phase::Scanning),
];

/// Next phase for `signal` raised in `phase`. `Failed` and `Halted` always
/// fall back to Scanning; other unknown pairs are `None`.
pub fn next(phase: Phase, signal: Signal) -> Option<Phase> {
    match signal {
        Signal::Failed | Signal::Halted => Some(Phase::Scanning),
        _ => TRANSITIONS
            .iter()
            .find(|(from, s, _)| *from == phase && *s == signal)
            .map(|(_, _, to)| *to),
    }
}

/// One Scanning tick's observations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanView {
    pub leave: bool,
    pub results_open: bool,
    pub results_continue: bool,
    pub solo: bool,
    pub battle_royale: bool,
}

/// The single lobby action taken after the leave duty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanAction {
    EnterResults,
    QueueSolo,
    SelectBattleRoyale,
    ChangeMode,
}

/// Scanning decision. The leave duty is independent and reported separately.
pub fn decide_scan(view: &ScanView) -> (bool, ScanAction) {
    let action = if view.results_open || view.results_continue {
        ScanAction::EnterResults
    } else if view.solo {
        ScanAction::QueueSolo
    } else if view.battle_royale {
        ScanAction::SelectBattleRoyale
    } else {
        ScanAction::ChangeMode
    };
    (view.leave, action)
}

/// Queue outcome from one AwaitingMatch poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitVerdict {
    Ultimate,
    Lobby,
    Cancelled,
}

impl WaitVerdict {
    pub fn signal(self) -> Signal {
        match self {
            WaitVerdict::Ultimate => Signal::UltimateReady,
            WaitVerdict::Lobby => Signal::EnteredLobby,
            WaitVerdict::Cancelled => Signal::WaitCancelled,
        }
    }
}

/// Ultimate wins over the lobby button so a combat-ready match always gets AutoCombat.
pub fn decide_wait(ultimate: bool, lobby: bool, change: bool) -> Option<WaitVerdict> {
    if ultimate {
        Some(WaitVerdict::Ultimate)
    } else if lobby {
        Some(WaitVerdict::Lobby)
    } else if change {
        Some(WaitVerdict::Cancelled)
    } else {
        None
    }
}

/// Debounce for the leave duty: at most one action per `every`.
#[derive(Debug, Clone, Copy)]
pub struct LeaveGate {
    every: Duration,
    last: Option<Duration>,
}

impl LeaveGate {
    pub fn new(every: Duration) -> Self {
        Self { every, last: None }
    }

    pub fn ready(&self, now: Duration) -> bool {
        self.last.map_or(true, |t| now.saturating_sub(t) > self.every)
    }

    pub fn mark(&mut self, now: Duration) {
        self.last = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> ScanView {
        ScanView::default()
    }

    #[test]
    fn scan_priority_results_then_solo_then_br_then_change() {
        let all = ScanView { leave: false, results_open: true, results_continue: true, solo: true, battle_royale: true };
        assert_eq!(decide_scan(&all).1, ScanAction::EnterResults);
        assert_eq!(decide_scan(&ScanView { solo: true, battle_royale: true, ..view() }).1, ScanAction::QueueSolo);
        assert_eq!(decide_scan(&ScanView { battle_royale: true, ..view() }).1, ScanAction::SelectBattleRoyale);
        assert_eq!(decide_scan(&view()).1, ScanAction::ChangeMode);
    }

    #[test]
    fn leave_duty_never_masks_the_lobby_action() {
        for bits in 0..16u8 {
            let v = ScanView {
                leave: true,
                results_open: bits & 1 != 0,
                results_continue: bits & 2 != 0,
                solo: bits & 4 != 0,
                battle_royale: bits & 8 != 0,
            };
            let without = ScanView { leave: false, ..v };
            let (duty, action) = decide_scan(&v);
            assert!(duty);
            assert_eq!(action, decide_scan(&without).1);
        }
    }

    #[test]
    fn ultimate_always_leads_to_combat() {
        for (lobby, change) in [(false, false), (true, false), (false, true), (true, true)] {
            let v = decide_wait(true, lobby, change).unwrap();
            assert_eq!(next(Phase::AwaitingMatch, v.signal()), Some(Phase::AutoCombat));
        }
        let v = decide_wait(false, true, false).unwrap();
        assert_eq!(next(Phase::AwaitingMatch, v.signal()), Some(Phase::FreeRoam));
        assert_eq!(decide_wait(false, false, true), Some(WaitVerdict::Cancelled));
        assert_eq!(decide_wait(false, false, false), None);
    }

    #[test]
    fn every_phase_reaches_scanning_on_failure() {
        for p in [Phase::Scanning, Phase::AwaitingMatch, Phase::FreeRoam, Phase::AutoCombat, Phase::PostMatch] {
            assert_eq!(next(p, Signal::Failed), Some(Phase::Scanning));
            assert_eq!(next(p, Signal::Halted), Some(Phase::Scanning));
        }
    }

    #[test]
    fn unknown_edges_are_rejected() {
        assert_eq!(next(Phase::Scanning, Signal::UltimateReady), None);
        assert_eq!(next(Phase::PostMatch, Signal::Queued), None);
    }

    #[test]
    fn match_loop_is_closed() {
        let mut p = Phase::Scanning;
        for s in [Signal::Queued, Signal::UltimateReady, Signal::ResultsSeen, Signal::ResultsClosed] {
            p = next(p, s).unwrap();
        }
        assert_eq!(p, Phase::Scanning);
    }

    #[test]
    fn leave_gate_allows_one_action_per_window() {
        let mut gate = LeaveGate::new(Duration::from_secs(60));
        assert!(gate.ready(Duration::from_secs(10)));
        gate.mark(Duration::from_secs(10));
        assert!(!gate.ready(Duration::from_secs(40)));
        assert!(!gate.ready(Duration::from_secs(70)));
        assert!(gate.ready(Duration::from_secs(71)));
    }
}
