//! Session recovery.
//!
//! On login (including a silent session restore) we must pick the
//! authoritative starting [`DayState`] for "today" without losing or
//! double-counting time. Priority order:
//!
//! 1. **Same-device cache** for this user and today: resume as-is. The
//!    cached record already reflects this device's session up to the last
//!    flush, and keeping its `last_status_change_at` means a reload is not
//!    treated as a gap.
//! 2. **Remote snapshot** for `(today, userId)`: rehydrate counters and
//!    status, but restart accrual at `now`. Time spent with no device
//!    logged in is deliberately discarded, not back-filled.
//! 3. **Fresh state**: first login of the day.
//!
//! A cached or fetched record whose `day` is not today is stale and is
//! never resumed. A failing remote fetch degrades to a fresh state: time
//! tracking is secondary to letting the operator work at all.

use chrono::{DateTime, Utc};

use crate::cache::DayCache;
use crate::ledger::DayState;
use crate::store::SnapshotStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeSource {
    LocalCache,
    RemoteSnapshot,
    Fresh,
}

#[derive(Debug)]
pub struct RecoveredDay {
    pub state: DayState,
    pub source: ResumeSource,
}

pub fn recover_day_state(
    user_id: &str,
    today: &str,
    now: DateTime<Utc>,
    cache: &DayCache,
    store: &dyn SnapshotStore,
) -> RecoveredDay {
    if let Some(cached) = cache.load() {
        if cached.user_id == user_id {
            if cached.day == today {
                return RecoveredDay {
                    state: DayState::resume_cached(&cached, now),
                    source: ResumeSource::LocalCache,
                };
            }
            tracing::debug!(
                user_id,
                cached_day = %cached.day,
                today,
                "Ignoring stale cached day state"
            );
        }
    }

    match store.fetch(today, user_id) {
        Ok(Some(snapshot)) if snapshot.day == today => RecoveredDay {
            state: DayState::rehydrate_remote(&snapshot, now),
            source: ResumeSource::RemoteSnapshot,
        },
        Ok(Some(snapshot)) => {
            // A mis-keyed record; never resume it.
            tracing::debug!(user_id, day = %snapshot.day, today, "Ignoring stale remote snapshot");
            fresh(user_id, today, now)
        }
        Ok(None) => fresh(user_id, today, now),
        Err(err) => {
            tracing::warn!(
                error = %err,
                user_id,
                today,
                "Snapshot fetch failed; starting a fresh day state"
            );
            fresh(user_id, today, now)
        }
    }
}

fn fresh(user_id: &str, today: &str, now: DateTime<Utc>) -> RecoveredDay {
    RecoveredDay {
        state: DayState::fresh(user_id, today, now),
        source: ResumeSource::Fresh,
    }
}
