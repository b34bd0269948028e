//! Wall-clock provider.
//!
//! The ledger never reads system time directly; every operation takes or
//! derives `now` from a [`Clock`] so tests can replay exact timelines.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Local, Utc};

use desk_protocol::DAY_KEY_FORMAT;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Calendar-day key (`YYYY-MM-DD`) in the user's local timezone.
    /// A day state is only valid while this key matches its `day` field.
    fn day_key(&self) -> String;
}

/// Production clock: system time, local-timezone day key.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn day_key(&self) -> String {
        Local::now().format(DAY_KEY_FORMAT).to_string()
    }
}

/// Manually driven clock for tests and simulations. The day key is derived
/// from the held instant's UTC date.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        if let Ok(mut guard) = self.now.lock() {
            *guard = now;
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut guard) = self.now.lock() {
            *guard += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
            .lock()
            .map(|guard| *guard)
            .unwrap_or_else(|poisoned| *poisoned.into_inner())
    }

    fn day_key(&self) -> String {
        self.now().format(DAY_KEY_FORMAT).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 1, 2, 9, 0, 0).unwrap());
        assert_eq!(clock.day_key(), "2025-01-02");
        clock.advance(Duration::minutes(90));
        assert_eq!(
            clock.now(),
            Utc.with_ymd_and_hms(2025, 1, 2, 10, 30, 0).unwrap()
        );
    }

    #[test]
    fn manual_clock_day_key_rolls_over() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 1, 2, 23, 59, 0).unwrap());
        clock.advance(Duration::minutes(2));
        assert_eq!(clock.day_key(), "2025-01-03");
    }
}
