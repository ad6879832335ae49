//! Trading phase and status tracking (spec §3 "Phase", §4.6 "Phase
//! handler").

use serde::{Deserialize, Serialize};
use std::fmt;

/// The trading phase of the instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradingPhase {
    /// Normal trading.
    Open,
    /// Market closed; all action requests are rejected.
    Closed,
    /// Pre-open / auction-style phase, modeled the same as `Open` for
    /// gating purposes but reported distinctly on `SecurityStatus`.
    PreOpen,
}

impl fmt::Display for TradingPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TradingPhase::Open => "Open",
            TradingPhase::Closed => "Closed",
            TradingPhase::PreOpen => "PreOpen",
        };
        write!(f, "{s}")
    }
}

/// The trading status layered on top of the phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradingStatus {
    /// Trading resumed / normal.
    Resume,
    /// Trading halted.
    Halt,
}

impl fmt::Display for TradingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TradingStatus::Resume => "Resume",
            TradingStatus::Halt => "Halt",
        };
        write!(f, "{s}")
    }
}

/// Per-phase settings that affect gating, e.g. whether cancellations are
/// still allowed under a halt (spec §3: "per-phase settings (e.g.,
/// `allow_cancels` under halt)").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseSettings {
    /// Whether `OrderCancellationRequest`s are accepted while `Halt` is
    /// active. Ignored outside `Halt`.
    pub allow_cancels: bool,
}

impl Default for PhaseSettings {
    fn default() -> Self {
        Self { allow_cancels: true }
    }
}

/// The full phase state: `(trading_phase, trading_status)` plus settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseState {
    /// Current trading phase.
    pub trading_phase: TradingPhase,
    /// Current trading status.
    pub trading_status: TradingStatus,
    /// Settings for the current phase/status combination.
    pub settings: PhaseSettings,
}

impl Default for PhaseState {
    fn default() -> Self {
        Self {
            trading_phase: TradingPhase::Open,
            trading_status: TradingStatus::Resume,
            settings: PhaseSettings::default(),
        }
    }
}

/// A request kind, used purely for phase gating (spec §4.6: "Gates
/// requests: any action request during Closed is rejected; during Halt,
/// all requests are rejected except cancellations when
/// `allow_cancels = true`.").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatedRequestKind {
    /// Placement, modification, recovery, and any other mutating action.
    Action,
    /// Cancellation.
    Cancellation,
}

/// The reason a request was rejected by phase gating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseRejection {
    /// Human-readable reason, suitable for a reject message.
    pub reason: String,
}

/// Tracks the current phase and gates requests against it.
#[derive(Debug, Clone, Default)]
pub struct PhaseHandler {
    state: PhaseState,
}

impl PhaseHandler {
    /// Builds a handler starting in the default `Open`/`Resume` state.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current phase state.
    pub fn state(&self) -> PhaseState {
        self.state
    }

    /// Transitions to a new phase/status/settings triple. Returns `true`
    /// when the new phase is `Closed` (callers trigger
    /// `ClosedPhaseElimination` on that signal).
    pub fn transition(&mut self, new_state: PhaseState) -> bool {
        self.state = new_state;
        new_state.trading_phase == TradingPhase::Closed
    }

    /// Checks whether a request of the given kind is currently allowed.
    pub fn gate(&self, kind: GatedRequestKind) -> Result<(), PhaseRejection> {
        if self.state.trading_phase == TradingPhase::Closed {
            return Err(PhaseRejection {
                reason: "market is Closed".to_string(),
            });
        }
        if self.state.trading_status == TradingStatus::Halt {
            let allowed = matches!(kind, GatedRequestKind::Cancellation) && self.state.settings.allow_cancels;
            if !allowed {
                return Err(PhaseRejection {
                    reason: "trading is Halted".to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_phase_rejects_every_kind_of_request() {
        let mut handler = PhaseHandler::new();
        handler.transition(PhaseState {
            trading_phase: TradingPhase::Closed,
            trading_status: TradingStatus::Resume,
            settings: PhaseSettings::default(),
        });
        assert!(handler.gate(GatedRequestKind::Action).is_err());
        assert!(handler.gate(GatedRequestKind::Cancellation).is_err());
    }

    #[test]
    fn halt_rejects_actions_but_allows_cancels_when_configured() {
        let mut handler = PhaseHandler::new();
        handler.transition(PhaseState {
            trading_phase: TradingPhase::Open,
            trading_status: TradingStatus::Halt,
            settings: PhaseSettings { allow_cancels: true },
        });
        assert!(handler.gate(GatedRequestKind::Action).is_err());
        assert!(handler.gate(GatedRequestKind::Cancellation).is_ok());
    }

    #[test]
    fn halt_rejects_cancels_when_not_allowed() {
        let mut handler = PhaseHandler::new();
        handler.transition(PhaseState {
            trading_phase: TradingPhase::Open,
            trading_status: TradingStatus::Halt,
            settings: PhaseSettings { allow_cancels: false },
        });
        assert!(handler.gate(GatedRequestKind::Cancellation).is_err());
    }

    #[test]
    fn transition_into_closed_signals_true() {
        let mut handler = PhaseHandler::new();
        let signaled = handler.transition(PhaseState {
            trading_phase: TradingPhase::Closed,
            trading_status: TradingStatus::Resume,
            settings: PhaseSettings::default(),
        });
        assert!(signaled);
    }
}
