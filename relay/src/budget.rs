//! Token budget estimation and validation for debates
//!
//! Pure functions: `calculate_budget_for_turns` estimates, `validate`
//! reports. Clamping happens only in the estimator — an invalid explicit
//! config is reported, never silently substituted.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Fixed per-turn token weight used by the estimator.
pub const TOKENS_PER_TURN: u64 = 8_000;

/// Clamp range for the estimator output.
pub const MIN_DEBATE_BUDGET: u64 = 100_000;
pub const MAX_DEBATE_BUDGET: u64 = 300_000;

/// Safety bounds validated configs must satisfy.
pub const MIN_TOKENS_PER_DEBATE: u64 = 1_000;
pub const MAX_TOKENS_PER_DEBATE: u64 = 500_000;
pub const MIN_WARNING_PERCENT: u8 = 50;
pub const MAX_WARNING_PERCENT: u8 = 99;

/// Resolved budget limits for one debate. Immutable once resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetConfig {
    /// Hard ceiling on total tokens a debate may consume.
    pub max_tokens_per_debate: u64,
    /// Ceiling on tokens for any single turn.
    pub max_tokens_per_turn: u64,
    /// Percentage of the debate budget at which a warning fires.
    pub warning_threshold_percent: u8,
    /// Whether the hard ceiling stops production (vs. report-only).
    pub hard_limit_enabled: bool,
    /// Optional USD spend ceiling.
    pub cost_limit_usd: Option<f64>,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            max_tokens_per_debate: 150_000,
            max_tokens_per_turn: 8_000,
            warning_threshold_percent: 80,
            hard_limit_enabled: true,
            cost_limit_usd: None,
        }
    }
}

/// Estimate total token consumption for a debate with `turn_count` debater
/// turns.
///
/// Moderator turns run alongside debater turns (framing plus closing, so
/// debater turns + 2), all at a fixed per-turn weight. The result is
/// clamped to `[MIN_DEBATE_BUDGET, MAX_DEBATE_BUDGET]`; within the clamp
/// region it is monotonic non-decreasing in `turn_count`.
pub fn calculate_budget_for_turns(turn_count: u32) -> u64 {
    let debater_turns = turn_count as u64;
    let moderator_turns = debater_turns + 2;
    let estimate = (debater_turns + moderator_turns) * TOKENS_PER_TURN;
    estimate.clamp(MIN_DEBATE_BUDGET, MAX_DEBATE_BUDGET)
}

/// Resolve a config from environment overrides with fixed defaults.
///
/// Unparseable values fall back to the default for that field (logged);
/// the result still goes through [`validate`] before use.
pub fn resolve_config() -> BudgetConfig {
    let defaults = BudgetConfig::default();

    BudgetConfig {
        max_tokens_per_debate: env_u64("DEBATE_MAX_TOKENS_TOTAL", defaults.max_tokens_per_debate),
        max_tokens_per_turn: env_u64("DEBATE_MAX_TOKENS_PER_TURN", defaults.max_tokens_per_turn),
        warning_threshold_percent: env_u8(
            "DEBATE_BUDGET_WARN_PERCENT",
            defaults.warning_threshold_percent,
        ),
        hard_limit_enabled: env_bool("DEBATE_BUDGET_HARD_LIMIT", defaults.hard_limit_enabled),
        cost_limit_usd: std::env::var("DEBATE_COST_LIMIT_USD")
            .ok()
            .and_then(|raw| match raw.parse() {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!(raw = %raw, "Unparseable DEBATE_COST_LIMIT_USD; ignoring");
                    None
                }
            }),
    }
}

/// Check a config against the safety bounds.
///
/// Returns an empty list iff every bound holds; otherwise one
/// human-readable violation per failed bound. Never panics.
pub fn validate(config: &BudgetConfig) -> Vec<String> {
    let mut violations = Vec::new();

    if config.max_tokens_per_debate < MIN_TOKENS_PER_DEBATE {
        violations.push(format!(
            "max_tokens_per_debate must be at least {}",
            MIN_TOKENS_PER_DEBATE
        ));
    }
    if config.max_tokens_per_debate > MAX_TOKENS_PER_DEBATE {
        violations.push(format!(
            "max_tokens_per_debate must not exceed {}",
            MAX_TOKENS_PER_DEBATE
        ));
    }
    if config.max_tokens_per_turn == 0 {
        violations.push("max_tokens_per_turn must be at least 1".to_string());
    }
    if config.max_tokens_per_turn > config.max_tokens_per_debate {
        violations.push("max_tokens_per_turn must not exceed max_tokens_per_debate".to_string());
    }
    if config.warning_threshold_percent < MIN_WARNING_PERCENT
        || config.warning_threshold_percent > MAX_WARNING_PERCENT
    {
        violations.push(format!(
            "warning_threshold_percent must be in [{}, {}]",
            MIN_WARNING_PERCENT, MAX_WARNING_PERCENT
        ));
    }
    if let Some(cost) = config.cost_limit_usd {
        if cost <= 0.0 {
            violations.push("cost_limit_usd must be positive when set".to_string());
        }
    }

    violations
}

fn env_u64(name: &str, default: u64) -> u64 {
    match std::env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(name, raw = %raw, "Unparseable env override; using default");
            default
        }),
        Err(_) => default,
    }
}

fn env_u8(name: &str, default: u8) -> u8 {
    match std::env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(name, raw = %raw, "Unparseable env override; using default");
            default
        }),
        Err(_) => default,
    }
}

fn env_bool(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(raw) => match raw.as_str() {
            "1" | "true" | "yes" => true,
            "0" | "false" | "no" => false,
            _ => {
                warn!(name, raw = %raw, "Unparseable env override; using default");
                default
            }
        },
        Err(_) => default,
    }
}
