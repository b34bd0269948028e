//! Ledger state types and their snapshot conversions.

use chrono::{DateTime, Utc};

use desk_protocol::{Status, StatusSnapshot, UserProfile};

/// Accumulated minutes per status. Values are settled totals; partial
/// minutes accrue continuously, so everything is floating point.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MinutesByStatus {
    pub operating: f64,
    pub break_used: f64,
    pub meeting: f64,
    pub handling: f64,
    pub unavailable: f64,
}

impl MinutesByStatus {
    pub fn get(&self, status: Status) -> f64 {
        match status {
            Status::Operating => self.operating,
            Status::Break => self.break_used,
            Status::Meeting => self.meeting,
            Status::Handling => self.handling,
            Status::Unavailable => self.unavailable,
        }
    }

    pub fn add(&mut self, status: Status, minutes: f64) {
        match status {
            Status::Operating => self.operating += minutes,
            Status::Break => self.break_used += minutes,
            Status::Meeting => self.meeting += minutes,
            Status::Handling => self.handling += minutes,
            Status::Unavailable => self.unavailable += minutes,
        }
    }

    pub fn total(&self) -> f64 {
        self.operating + self.break_used + self.meeting + self.handling + self.unavailable
    }

    /// Negative counters never make sense; a corrupted record reads as zero.
    pub(crate) fn clamp_non_negative(&mut self) {
        for minutes in [
            &mut self.operating,
            &mut self.break_used,
            &mut self.meeting,
            &mut self.handling,
            &mut self.unavailable,
        ] {
            if !minutes.is_finite() || *minutes < 0.0 {
                *minutes = 0.0;
            }
        }
    }
}

/// One agent's day record. Owned exclusively by that agent's session during
/// the day; persisted as a [`StatusSnapshot`] for recovery and aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct DayState {
    pub user_id: String,
    /// Calendar-day key (`YYYY-MM-DD`, local timezone). Valid only while
    /// this matches "today"; a mismatching state is stale and never resumed.
    pub day: String,
    pub status: Status,
    /// Most recent transition or settle point. Always ≤ now apart from
    /// clock skew, which the ledger reads as zero elapsed.
    pub last_status_change_at: DateTime<Utc>,
    pub minutes: MinutesByStatus,
    /// The day's first session start, preserved across reloads.
    pub login_at: DateTime<Utc>,
}

impl DayState {
    /// First login of the day: all counters zero, operating.
    pub fn fresh(user_id: impl Into<String>, day: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            day: day.into(),
            status: Status::Operating,
            last_status_change_at: now,
            minutes: MinutesByStatus::default(),
            login_at: now,
        }
    }

    /// Same-device resume: the cached record already reflects this device's
    /// session up to the last flush, so `last_status_change_at` is kept and
    /// the reload gap keeps accruing into the active status.
    pub fn resume_cached(snapshot: &StatusSnapshot, now: DateTime<Utc>) -> Self {
        let last_change =
            millis_to_datetime(snapshot.last_status_change_at).unwrap_or(now);
        Self::from_snapshot(snapshot, last_change, now)
    }

    /// Cross-device resume: counters and status are rehydrated, but the
    /// accrual point restarts at `now`. Time elapsed while no device was
    /// logged in is not credited to any bucket.
    pub fn rehydrate_remote(snapshot: &StatusSnapshot, now: DateTime<Utc>) -> Self {
        Self::from_snapshot(snapshot, now, now)
    }

    fn from_snapshot(
        snapshot: &StatusSnapshot,
        last_status_change_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut minutes = MinutesByStatus {
            operating: snapshot.operation_minutes,
            break_used: snapshot.break_used_minutes,
            meeting: snapshot.meeting_minutes,
            handling: snapshot.handling_minutes,
            unavailable: snapshot.unavailable_minutes,
        };
        minutes.clamp_non_negative();

        Self {
            user_id: snapshot.user_id.clone(),
            day: snapshot.day.clone(),
            status: snapshot.status,
            last_status_change_at,
            minutes,
            login_at: millis_to_datetime(snapshot.login_time).unwrap_or(now),
        }
    }

    /// Wire record for this state. Minute fields are the settled counters;
    /// `updated_at` is left for the store to assign.
    pub fn to_snapshot(&self, profile: &UserProfile) -> StatusSnapshot {
        StatusSnapshot {
            user_id: self.user_id.clone(),
            name: profile.name.clone(),
            role: profile.role,
            day: self.day.clone(),
            status: self.status,
            login_time: self.login_at.timestamp_millis(),
            last_status_change_at: self.last_status_change_at.timestamp_millis(),
            break_used_minutes: self.minutes.break_used,
            operation_minutes: self.minutes.operating,
            meeting_minutes: self.minutes.meeting,
            handling_minutes: self.minutes.handling,
            unavailable_minutes: self.minutes.unavailable,
            updated_at: None,
        }
    }
}

/// Minute totals as of "now": stored counters plus the live accrual since
/// the last settle. Derived on demand, never stored.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LiveUsage {
    pub operating: f64,
    pub break_used: f64,
    pub meeting: f64,
    pub handling: f64,
    pub unavailable: f64,
}

impl LiveUsage {
    pub fn get(&self, status: Status) -> f64 {
        match status {
            Status::Operating => self.operating,
            Status::Break => self.break_used,
            Status::Meeting => self.meeting,
            Status::Handling => self.handling,
            Status::Unavailable => self.unavailable,
        }
    }

    pub(crate) fn add(&mut self, status: Status, minutes: f64) {
        match status {
            Status::Operating => self.operating += minutes,
            Status::Break => self.break_used += minutes,
            Status::Meeting => self.meeting += minutes,
            Status::Handling => self.handling += minutes,
            Status::Unavailable => self.unavailable += minutes,
        }
    }

    /// Worked minutes: operating + meeting + handling + breakUsed.
    /// `unavailable` time does not count toward the daily target.
    pub fn worked_minutes(&self) -> f64 {
        self.operating + self.meeting + self.handling + self.break_used
    }

    pub fn total_minutes(&self) -> f64 {
        self.worked_minutes() + self.unavailable
    }
}

impl From<&MinutesByStatus> for LiveUsage {
    fn from(minutes: &MinutesByStatus) -> Self {
        Self {
            operating: minutes.operating,
            break_used: minutes.break_used,
            meeting: minutes.meeting,
            handling: minutes.handling,
            unavailable: minutes.unavailable,
        }
    }
}

fn millis_to_datetime(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use desk_protocol::Role;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 2, 9, 0, 0).unwrap()
    }

    fn profile() -> UserProfile {
        UserProfile::new("agent-01", "Agent 01", Role::Agent)
    }

    #[test]
    fn fresh_state_starts_operating_with_zero_counters() {
        let state = DayState::fresh("agent-01", "2025-01-02", t0());
        assert_eq!(state.status, Status::Operating);
        assert_eq!(state.minutes.total(), 0.0);
        assert_eq!(state.login_at, t0());
        assert_eq!(state.last_status_change_at, t0());
    }

    #[test]
    fn snapshot_round_trip_preserves_counters_and_times() {
        let mut state = DayState::fresh("agent-01", "2025-01-02", t0());
        state.status = Status::Meeting;
        state.minutes.meeting = 12.5;
        state.minutes.break_used = 7.0;

        let snapshot = state.to_snapshot(&profile());
        assert_eq!(snapshot.status, Status::Meeting);
        assert_eq!(snapshot.meeting_minutes, 12.5);
        assert_eq!(snapshot.break_used_minutes, 7.0);
        assert_eq!(snapshot.name, "Agent 01");

        let resumed = DayState::resume_cached(&snapshot, t0() + chrono::Duration::hours(1));
        assert_eq!(resumed, state);
    }

    #[test]
    fn cached_resume_keeps_last_change_timestamp() {
        let state = DayState::fresh("agent-01", "2025-01-02", t0());
        let snapshot = state.to_snapshot(&profile());
        let later = t0() + chrono::Duration::minutes(5);
        let resumed = DayState::resume_cached(&snapshot, later);
        assert_eq!(resumed.last_status_change_at, t0());
    }

    #[test]
    fn remote_rehydrate_restarts_accrual_at_now() {
        let state = DayState::fresh("agent-01", "2025-01-02", t0());
        let snapshot = state.to_snapshot(&profile());
        let later = t0() + chrono::Duration::minutes(30);
        let resumed = DayState::rehydrate_remote(&snapshot, later);
        assert_eq!(resumed.last_status_change_at, later);
        assert_eq!(resumed.login_at, t0());
    }

    #[test]
    fn corrupt_negative_minutes_read_as_zero() {
        let mut snapshot = DayState::fresh("agent-01", "2025-01-02", t0()).to_snapshot(&profile());
        snapshot.operation_minutes = -12.0;
        snapshot.handling_minutes = f64::NAN;
        let resumed = DayState::rehydrate_remote(&snapshot, t0());
        assert_eq!(resumed.minutes.operating, 0.0);
        assert_eq!(resumed.minutes.handling, 0.0);
    }

    #[test]
    fn worked_minutes_excludes_unavailable() {
        let live = LiveUsage {
            operating: 120.0,
            meeting: 30.0,
            handling: 10.0,
            break_used: 20.0,
            unavailable: 5.0,
        };
        assert_eq!(live.worked_minutes(), 180.0);
        assert_eq!(live.total_minutes(), 185.0);
    }
}
