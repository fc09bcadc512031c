// src/scheduler/throttle.rs
use crate::config::OperatorConfig;
use crate::types::WalletState;
use chrono::NaiveDate;
use rand::Rng;
use rand::rngs::StdRng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleDecision {
    Allow,
    Deny(DenyReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    SlowWalletCooldown,
    FailureBackoff,
    DailyCapReached,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::SlowWalletCooldown => "slow_wallet_cooldown",
            DenyReason::FailureBackoff => "failure_backoff",
            DenyReason::DailyCapReached => "daily_cap_reached",
        }
    }
}

/// Pure pacing rules over one wallet's state and the current date. The only
/// side effects are the day-rollover resets on the state itself.
pub struct ThrottlePolicy {
    daily_limit_min: u32,
    daily_limit_max: u32,
    slow_wallet_cooldown_days: i64,
    failure_backoff_threshold: u32,
}

impl ThrottlePolicy {
    pub fn new(config: &OperatorConfig) -> Self {
        Self {
            daily_limit_min: config.daily_limit_min,
            daily_limit_max: config.daily_limit_max,
            slow_wallet_cooldown_days: config.slow_wallet_cooldown_days,
            failure_backoff_threshold: config.failure_backoff_threshold,
        }
    }

    pub fn evaluate(
        &self,
        state: &mut WalletState,
        today: NaiveDate,
        rng: &mut StdRng,
    ) -> ThrottleDecision {
        // Day rollover: reset the day's counters and redraw the cap.
        if state.last_action_date != today {
            state.actions_today = 0;
            state.last_action_date = today;
            state.daily_action_limit =
                rng.gen_range(self.daily_limit_min..=self.daily_limit_max);
            state.consecutive_failures = 0;
        }

        // Slow wallets sit out until the cooldown since their last success
        // has elapsed. Measured against last_success_date, which rollover
        // never touches, so real gaps between actions are observable here.
        if state.is_slow_wallet {
            if let Some(last_success) = state.last_success_date {
                let elapsed = today.signed_duration_since(last_success).num_days();
                if elapsed < self.slow_wallet_cooldown_days {
                    return ThrottleDecision::Deny(DenyReason::SlowWalletCooldown);
                }
            }
        }

        if state.consecutive_failures >= self.failure_backoff_threshold {
            return ThrottleDecision::Deny(DenyReason::FailureBackoff);
        }

        if state.actions_today >= state.daily_action_limit {
            return ThrottleDecision::Deny(DenyReason::DailyCapReached);
        }

        ThrottleDecision::Allow
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn policy() -> ThrottlePolicy {
        ThrottlePolicy {
            daily_limit_min: 2,
            daily_limit_max: 4,
            slow_wallet_cooldown_days: 2,
            failure_backoff_threshold: 3,
        }
    }

    fn state() -> WalletState {
        WalletState {
            next_action_index: 0,
            total_actions: 0,
            actions_today: 0,
            last_action_date: day("2026-08-05"),
            last_success_date: None,
            is_slow_wallet: false,
            daily_action_limit: 3,
            consecutive_failures: 0,
            is_initialized: false,
            funded_by: None,
        }
    }

    #[test]
    fn test_rollover_resets_counters_and_redraws_limit() {
        let policy = policy();
        let mut rng = StdRng::seed_from_u64(1);
        let mut state = state();
        state.actions_today = 3;
        state.consecutive_failures = 2;

        let decision = policy.evaluate(&mut state, day("2026-08-06"), &mut rng);
        assert_eq!(decision, ThrottleDecision::Allow);
        assert_eq!(state.actions_today, 0);
        assert_eq!(state.consecutive_failures, 0);
        assert_eq!(state.last_action_date, day("2026-08-06"));
        assert!((2..=4).contains(&state.daily_action_limit));
    }

    #[test]
    fn test_daily_cap_denies() {
        let policy = policy();
        let mut rng = StdRng::seed_from_u64(1);
        let mut state = state();
        state.last_action_date = day("2026-08-06");
        state.actions_today = 3;

        let decision = policy.evaluate(&mut state, day("2026-08-06"), &mut rng);
        assert_eq!(decision, ThrottleDecision::Deny(DenyReason::DailyCapReached));
    }

    #[test]
    fn test_slow_wallet_cooldown_spans_rollover() {
        let policy = policy();
        let mut rng = StdRng::seed_from_u64(1);
        let mut state = state();
        state.is_slow_wallet = true;
        state.last_success_date = Some(day("2026-08-05"));

        // one day since the last success: denied, even though rollover just
        // reset the daily counters
        let decision = policy.evaluate(&mut state, day("2026-08-06"), &mut rng);
        assert_eq!(
            decision,
            ThrottleDecision::Deny(DenyReason::SlowWalletCooldown)
        );

        // two full days: allowed again
        let decision = policy.evaluate(&mut state, day("2026-08-07"), &mut rng);
        assert_eq!(decision, ThrottleDecision::Allow);
    }

    #[test]
    fn test_slow_wallet_without_history_is_allowed() {
        let policy = policy();
        let mut rng = StdRng::seed_from_u64(1);
        let mut state = state();
        state.is_slow_wallet = true;

        let decision = policy.evaluate(&mut state, day("2026-08-06"), &mut rng);
        assert_eq!(decision, ThrottleDecision::Allow);
    }

    #[test]
    fn test_slow_wallet_denied_same_day_after_success() {
        let policy = policy();
        let mut rng = StdRng::seed_from_u64(1);
        let mut state = state();
        state.is_slow_wallet = true;
        state.last_action_date = day("2026-08-06");
        state.last_success_date = Some(day("2026-08-06"));
        state.actions_today = 1;

        let decision = policy.evaluate(&mut state, day("2026-08-06"), &mut rng);
        assert_eq!(
            decision,
            ThrottleDecision::Deny(DenyReason::SlowWalletCooldown)
        );
    }

    #[test]
    fn test_failure_backoff_denies_until_rollover() {
        let policy = policy();
        let mut rng = StdRng::seed_from_u64(1);
        let mut state = state();
        state.last_action_date = day("2026-08-06");
        state.consecutive_failures = 3;

        let decision = policy.evaluate(&mut state, day("2026-08-06"), &mut rng);
        assert_eq!(decision, ThrottleDecision::Deny(DenyReason::FailureBackoff));

        // next day the streak is cleared by rollover
        let decision = policy.evaluate(&mut state, day("2026-08-07"), &mut rng);
        assert_eq!(decision, ThrottleDecision::Allow);
    }
}
