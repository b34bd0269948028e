//! The ledger: live-usage derivation, settling, and guarded transitions.

use chrono::{DateTime, Utc};

use desk_protocol::Status;

use crate::error::{DeskError, Result};

use super::types::{DayState, LiveUsage};

/// Tolerance when deciding whether the break budget is exhausted. A user
/// sitting 0.01 min under the limit cannot meaningfully enter break.
pub const BREAK_EPSILON_MIN: f64 = 0.01;

const MS_PER_MIN: f64 = 60_000.0;

/// Owns one [`DayState`] and applies time accounting to it.
pub struct DayTimeLedger {
    state: DayState,
    break_limit_min: f64,
}

impl DayTimeLedger {
    /// Wraps a resolved day state. Counters are normalized on entry so the
    /// ledger invariants hold no matter what the store handed back:
    /// negatives read as zero, break is capped at the limit.
    pub fn new(mut state: DayState, break_limit_min: f64) -> Self {
        state.minutes.clamp_non_negative();
        state.minutes.break_used = state.minutes.break_used.min(break_limit_min);
        Self {
            state,
            break_limit_min,
        }
    }

    pub fn state(&self) -> &DayState {
        &self.state
    }

    pub fn status(&self) -> Status {
        self.state.status
    }

    pub fn break_limit_min(&self) -> f64 {
        self.break_limit_min
    }

    /// Minutes since the last settle. Clock skew (now before the stored
    /// timestamp) reads as zero; elapsed time is never negative.
    fn elapsed_minutes(&self, now: DateTime<Utc>) -> f64 {
        let elapsed =
            (now - self.state.last_status_change_at).num_milliseconds() as f64 / MS_PER_MIN;
        elapsed.max(0.0)
    }

    /// Minute totals as of `now`: stored counters plus the elapsed time
    /// credited to the active status, with `break_used` clamped to the
    /// limit. Pure; stored state is untouched.
    pub fn compute_live_usage(&self, now: DateTime<Utc>) -> LiveUsage {
        let mut live = LiveUsage::from(&self.state.minutes);
        live.add(self.state.status, self.elapsed_minutes(now));
        live.break_used = live.break_used.min(self.break_limit_min);
        live
    }

    /// Folds elapsed time into the active status bucket and resets the
    /// accrual point to `now`. Idempotent: replaying the same `now` sees
    /// zero elapsed and changes nothing.
    pub fn settle_elapsed(&mut self, now: DateTime<Utc>) {
        let elapsed = self.elapsed_minutes(now);
        if elapsed <= 0.0 {
            return;
        }
        self.state.minutes.add(self.state.status, elapsed);
        self.state.minutes.break_used = self.state.minutes.break_used.min(self.break_limit_min);
        self.state.last_status_change_at = now;
    }

    /// Settles, then switches to `new_status`. Entering `break` is rejected
    /// once the budget is exhausted (within [`BREAK_EPSILON_MIN`]); the
    /// caller must keep its prior selection on rejection.
    pub fn transition_to(&mut self, new_status: Status, now: DateTime<Utc>) -> Result<()> {
        if new_status == Status::Break {
            let used = self.compute_live_usage(now).break_used;
            if used >= self.break_limit_min - BREAK_EPSILON_MIN {
                return Err(DeskError::InvalidTransition {
                    used,
                    limit: self.break_limit_min,
                });
            }
        }
        self.force_to(new_status, now);
        Ok(())
    }

    /// Unguarded transition, used for the automatic break-exhaustion switch
    /// to `unavailable`. Still settles first.
    pub(crate) fn force_to(&mut self, new_status: Status, now: DateTime<Utc>) {
        self.settle_elapsed(now);
        self.state.status = new_status;
        self.state.last_status_change_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 2, 9, 0, 0).unwrap()
    }

    fn fresh_ledger() -> DayTimeLedger {
        DayTimeLedger::new(DayState::fresh("agent-01", "2025-01-02", t0()), 45.0)
    }

    #[test]
    fn live_usage_credits_elapsed_to_active_status() {
        let ledger = fresh_ledger();
        let live = ledger.compute_live_usage(t0() + Duration::minutes(10));
        assert_eq!(live.operating, 10.0);
        assert_eq!(live.meeting, 0.0);
        assert_eq!(live.break_used, 0.0);
    }

    #[test]
    fn live_usage_clamps_negative_elapsed_to_zero() {
        let ledger = fresh_ledger();
        let live = ledger.compute_live_usage(t0() - Duration::minutes(3));
        assert_eq!(live.operating, 0.0);
        assert!(live.total_minutes() == 0.0);
    }

    #[test]
    fn live_break_usage_is_clamped_even_far_in_the_future() {
        let mut ledger = fresh_ledger();
        ledger.transition_to(Status::Break, t0()).expect("enter break");
        let live = ledger.compute_live_usage(t0() + Duration::hours(12));
        assert_eq!(live.break_used, 45.0);
    }

    #[test]
    fn settle_is_idempotent_for_the_same_instant() {
        let mut ledger = fresh_ledger();
        let now = t0() + Duration::minutes(8);
        ledger.settle_elapsed(now);
        assert_eq!(ledger.state().minutes.operating, 8.0);
        ledger.settle_elapsed(now);
        assert_eq!(ledger.state().minutes.operating, 8.0);
        assert_eq!(ledger.state().last_status_change_at, now);
    }

    #[test]
    fn settle_with_negative_elapsed_is_a_no_op() {
        let mut ledger = fresh_ledger();
        ledger.settle_elapsed(t0() - Duration::minutes(5));
        assert_eq!(ledger.state().minutes.total(), 0.0);
        // The accrual point must not move backwards.
        assert_eq!(ledger.state().last_status_change_at, t0());
    }

    #[test]
    fn transition_settles_outgoing_status_first() {
        let mut ledger = fresh_ledger();
        let now = t0() + Duration::minutes(15);
        ledger.transition_to(Status::Meeting, now).expect("transition");
        assert_eq!(ledger.status(), Status::Meeting);
        assert_eq!(ledger.state().minutes.operating, 15.0);
        assert_eq!(ledger.state().last_status_change_at, now);
    }

    #[test]
    fn any_status_is_reachable_from_any_other() {
        let mut ledger = fresh_ledger();
        let mut now = t0();
        for target in [
            Status::Meeting,
            Status::Handling,
            Status::Unavailable,
            Status::Break,
            Status::Operating,
        ] {
            now += Duration::minutes(1);
            ledger.transition_to(target, now).expect("transition");
            assert_eq!(ledger.status(), target);
        }
    }

    #[test]
    fn entering_break_is_rejected_when_budget_exhausted() {
        let mut state = DayState::fresh("agent-01", "2025-01-02", t0());
        state.minutes.break_used = 45.0;
        let mut ledger = DayTimeLedger::new(state, 45.0);

        let err = ledger
            .transition_to(Status::Break, t0())
            .expect_err("must reject");
        assert!(matches!(err, DeskError::InvalidTransition { .. }));
        // Stored status is unchanged.
        assert_eq!(ledger.status(), Status::Operating);
    }

    #[test]
    fn entering_break_is_rejected_within_epsilon_of_the_limit() {
        let mut state = DayState::fresh("agent-01", "2025-01-02", t0());
        state.minutes.break_used = 45.0 - 0.005;
        let mut ledger = DayTimeLedger::new(state, 45.0);
        assert!(ledger.transition_to(Status::Break, t0()).is_err());
    }

    #[test]
    fn counters_never_go_negative_across_transitions_and_skew() {
        let mut ledger = fresh_ledger();
        let mut now = t0();
        for (minutes, target) in [
            (5, Status::Break),
            (-2, Status::Meeting),
            (9, Status::Handling),
            (0, Status::Operating),
        ] {
            now += Duration::minutes(minutes);
            ledger.transition_to(target, now).expect("transition");
            for status in Status::ALL {
                assert!(ledger.state().minutes.get(status) >= 0.0);
            }
        }
    }

    #[test]
    fn conservation_of_wall_clock_time() {
        let mut ledger = fresh_ledger();
        ledger
            .transition_to(Status::Meeting, t0() + Duration::minutes(10))
            .expect("meeting");
        ledger
            .transition_to(Status::Break, t0() + Duration::minutes(25))
            .expect("break");

        let now = t0() + Duration::minutes(40);
        let live = ledger.compute_live_usage(now);
        assert!((live.operating - 10.0).abs() < 1e-9);
        assert!((live.meeting - 15.0).abs() < 1e-9);
        assert!((live.break_used - 15.0).abs() < 1e-9);
        assert!((live.total_minutes() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn oversized_break_counter_is_capped_on_entry() {
        let mut state = DayState::fresh("agent-01", "2025-01-02", t0());
        state.minutes.break_used = 60.0;
        let ledger = DayTimeLedger::new(state, 45.0);
        assert_eq!(ledger.state().minutes.break_used, 45.0);
    }
}
