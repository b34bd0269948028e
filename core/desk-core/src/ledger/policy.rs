//! Break budget enforcement.
//!
//! The only automatic, non-user-initiated transition in the system lives
//! here: when an agent is in `break` and the budget runs out, the ledger is
//! forced to `unavailable` and a user-visible notice is emitted.

use chrono::{DateTime, Utc};

use desk_protocol::Status;

use super::time::{DayTimeLedger, BREAK_EPSILON_MIN};

/// User-visible "break limit reached" notice. Emitted at most once per
/// exhaustion because the forced transition leaves the `break` status.
#[derive(Debug, Clone, PartialEq)]
pub struct BreakNotice {
    pub used_minutes: f64,
    pub limit_minutes: f64,
}

impl BreakNotice {
    pub fn message(&self) -> String {
        format!(
            "Break limit reached ({:.0} min). Status set to Unavailable.",
            self.limit_minutes
        )
    }
}

pub struct BreakPolicy {
    limit_min: f64,
}

impl BreakPolicy {
    pub fn new(limit_min: f64) -> Self {
        Self { limit_min }
    }

    pub fn limit_min(&self) -> f64 {
        self.limit_min
    }

    /// Whether a break can still be started as of `now`.
    pub fn can_enter_break(&self, ledger: &DayTimeLedger, now: DateTime<Utc>) -> bool {
        ledger.compute_live_usage(now).break_used < self.limit_min - BREAK_EPSILON_MIN
    }

    /// Periodic check: if the agent is in `break` and live usage has hit
    /// the limit, force the status to `unavailable` (settling first, which
    /// clamps the stored counter at the limit) and return the notice.
    pub fn enforce_on_tick(
        &self,
        ledger: &mut DayTimeLedger,
        now: DateTime<Utc>,
    ) -> Option<BreakNotice> {
        if ledger.status() != Status::Break {
            return None;
        }
        let used = ledger.compute_live_usage(now).break_used;
        if used < self.limit_min {
            return None;
        }
        ledger.force_to(Status::Unavailable, now);
        Some(BreakNotice {
            used_minutes: used,
            limit_minutes: self.limit_min,
        })
    }
}
