//! Runtime configuration and data paths.
//!
//! Configuration is environment-driven. Invalid values fall back to the
//! defaults with a warning; the tracker must never refuse to start over a
//! bad knob.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const BREAK_LIMIT_ENV: &str = "BREAK_LIMIT_MIN";
pub const WORK_TARGET_ENV: &str = "WORK_TARGET_MIN";
pub const TICK_INTERVAL_ENV: &str = "TICK_INTERVAL_SECS";

pub const DEFAULT_BREAK_LIMIT_MIN: f64 = 45.0;
pub const DEFAULT_WORK_TARGET_MIN: f64 = 480.0;
pub const DEFAULT_TICK_INTERVAL_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct DeskConfig {
    /// Daily break ceiling in minutes.
    pub break_limit_min: f64,
    /// Daily work target in minutes. Display only.
    pub work_target_min: f64,
    /// Interval between ledger ticks.
    pub tick_interval: Duration,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            break_limit_min: DEFAULT_BREAK_LIMIT_MIN,
            work_target_min: DEFAULT_WORK_TARGET_MIN,
            tick_interval: Duration::from_secs(DEFAULT_TICK_INTERVAL_SECS),
        }
    }
}

impl DeskConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let break_limit_min = parse_positive_f64(
            BREAK_LIMIT_ENV,
            lookup(BREAK_LIMIT_ENV),
            DEFAULT_BREAK_LIMIT_MIN,
        );
        let work_target_min = parse_positive_f64(
            WORK_TARGET_ENV,
            lookup(WORK_TARGET_ENV),
            DEFAULT_WORK_TARGET_MIN,
        );
        let tick_secs = parse_positive_u64(
            TICK_INTERVAL_ENV,
            lookup(TICK_INTERVAL_ENV),
            DEFAULT_TICK_INTERVAL_SECS,
        );

        Self {
            break_limit_min,
            work_target_min,
            tick_interval: Duration::from_secs(tick_secs),
        }
    }
}

fn parse_positive_f64(key: &str, value: Option<String>, default: f64) -> f64 {
    match value {
        None => default,
        Some(raw) => match raw.trim().parse::<f64>() {
            Ok(parsed) if parsed.is_finite() && parsed > 0.0 => parsed,
            _ => {
                tracing::warn!(key, value = %raw, default, "Ignoring invalid config value");
                default
            }
        },
    }
}

fn parse_positive_u64(key: &str, value: Option<String>, default: u64) -> u64 {
    match value {
        None => default,
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(parsed) if parsed > 0 => parsed,
            _ => {
                tracing::warn!(key, value = %raw, default, "Ignoring invalid config value");
                default
            }
        },
    }
}

/// Returns the Opsdesk data directory (`~/.opsdesk`).
pub fn data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".opsdesk"))
}

/// Default path of the shared snapshot document file.
pub fn default_store_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("snapshots.json"))
}

/// Default path of the per-device day cache.
pub fn default_cache_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("day-cache.json"))
}
