//! Production-loop gate — the single answer to "may this debate keep
//! producing output".
//!
//! Combines the cross-process abort signal with the token budget so the
//! producing worker consults one source of truth before each turn.

use crate::budget::BudgetConfig;
use crate::debate::DebateId;
use crate::signal::{AbortReason, SharedAbortSignalStore};

/// Why production must stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopCause {
    /// Operator cancelled the debate.
    Cancelled,
    /// Hard token ceiling reached.
    BudgetExhausted { used: u64, limit: u64 },
}

/// Outcome of a pre-turn gate check.
#[derive(Debug, Clone, PartialEq)]
pub enum GateOutcome {
    /// Keep producing.
    Continue,
    /// Keep producing, but the warning threshold has been crossed.
    Warn { percent_used: u8 },
    /// Paused — hold this turn and poll again.
    Hold,
    /// Stop producing.
    Stop(StopCause),
}

impl GateOutcome {
    /// Whether the production loop should stop outright.
    pub fn should_stop(&self) -> bool {
        matches!(self, Self::Stop(_))
    }
}

impl std::fmt::Display for GateOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Continue => write!(f, "continue"),
            Self::Warn { percent_used } => write!(f, "warn ({}% used)", percent_used),
            Self::Hold => write!(f, "hold (paused)"),
            Self::Stop(StopCause::Cancelled) => write!(f, "stop: cancelled"),
            Self::Stop(StopCause::BudgetExhausted { used, limit }) => {
                write!(f, "stop: budget_exhausted ({} / {} tokens)", used, limit)
            }
        }
    }
}

/// Gate evaluated by the producing worker before each turn.
pub struct DebateGuard {
    signals: SharedAbortSignalStore,
    budget: BudgetConfig,
}

impl DebateGuard {
    /// Create a guard over an injected signal store and a resolved budget.
    pub fn new(signals: SharedAbortSignalStore, budget: BudgetConfig) -> Self {
        Self { signals, budget }
    }

    /// Evaluate the gate for one debate given the tokens consumed so far.
    ///
    /// Priority: cancel > pause > hard budget limit > warning threshold.
    pub fn evaluate(&self, debate_id: &DebateId, tokens_used: u64) -> GateOutcome {
        let signal = self.signals.check_signal(debate_id);
        match signal.reason {
            Some(AbortReason::Cancelled) if signal.aborted => {
                return GateOutcome::Stop(StopCause::Cancelled);
            }
            Some(AbortReason::Paused) if signal.aborted => {
                return GateOutcome::Hold;
            }
            _ => {}
        }

        let limit = self.budget.max_tokens_per_debate;
        if self.budget.hard_limit_enabled && tokens_used >= limit {
            return GateOutcome::Stop(StopCause::BudgetExhausted {
                used: tokens_used,
                limit,
            });
        }

        let percent_used = ((tokens_used.saturating_mul(100)) / limit.max(1)).min(100) as u8;
        if percent_used >= self.budget.warning_threshold_percent {
            return GateOutcome::Warn { percent_used };
        }

        GateOutcome::Continue
    }
}
