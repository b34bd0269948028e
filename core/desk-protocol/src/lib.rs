//! Status snapshot schema shared across Opsdesk clients.
//!
//! This crate is shared by the agent client (which writes snapshots), the
//! supervisor board, and the chat layer (which read them) to prevent schema
//! drift. The store remains a dumb document keyed by `"{day}_{userId}"`;
//! consumers can rely on these types to parse whatever the agents flushed.
//!
//! Field names on the wire are fixed by the existing document format
//! (`userId`, `loginTime`, `breakUsedMinutes`, ...), so every record type
//! here serializes with camelCase renames.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const SCHEMA_VERSION: u32 = 1;

/// Wire format for day keys (`2025-01-02`). Always the agent's local date.
pub const DAY_KEY_FORMAT: &str = "%Y-%m-%d";

/// Work status of an agent. Exactly one is active at any instant.
///
/// Unknown values deserialize as [`Status::Unavailable`]: the board must
/// keep working when an older or newer client writes a status this build
/// does not know about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Operating,
    Break,
    Meeting,
    Handling,
    #[serde(other)]
    #[default]
    Unavailable,
}

impl Status {
    pub const ALL: [Status; 5] = [
        Status::Operating,
        Status::Break,
        Status::Meeting,
        Status::Handling,
        Status::Unavailable,
    ];

    /// Human label as shown on the dashboard.
    pub fn label(&self) -> &'static str {
        match self {
            Status::Operating => "In Operation",
            Status::Break => "In Break",
            Status::Meeting => "In Meeting",
            Status::Handling => "Handling",
            Status::Unavailable => "Unavailable",
        }
    }

    /// Wire name (`operating`, `break`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Operating => "operating",
            Status::Break => "break",
            Status::Meeting => "meeting",
            Status::Handling => "handling",
            Status::Unavailable => "unavailable",
        }
    }

    /// Presence tier consumed by the chat layer for its status dots.
    pub fn presence(&self) -> PresenceTier {
        match self {
            Status::Operating | Status::Handling => PresenceTier::Active,
            Status::Meeting | Status::Break => PresenceTier::Caution,
            Status::Unavailable => PresenceTier::Inactive,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = SchemaError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "operating" => Ok(Status::Operating),
            "break" => Ok(Status::Break),
            "meeting" => Ok(Status::Meeting),
            "handling" => Ok(Status::Handling),
            "unavailable" => Ok(Status::Unavailable),
            other => Err(SchemaError::new(
                "invalid_status",
                format!(
                    "unknown status '{}' (expected operating|break|meeting|handling|unavailable)",
                    other
                ),
            )),
        }
    }
}

/// Three-level presence indicator derived from [`Status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceTier {
    Active,
    Caution,
    Inactive,
}

/// Role tag carried on every snapshot. Assigned by the external identity
/// provider; unknown roles fall back to `agent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Supervisor,
    #[serde(other)]
    #[default]
    Agent,
}

/// Identity fields attached to every snapshot an agent writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub name: String,
    pub role: Role,
}

impl UserProfile {
    pub fn new(user_id: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
            role,
        }
    }
}

/// One agent's persisted day record, keyed by `"{day}_{userId}"`.
///
/// Minute fields are settled totals as of the last flush; `updatedAt` is
/// assigned by the store on write, never by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub user_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: Role,
    pub day: String,
    #[serde(default)]
    pub status: Status,
    /// Epoch milliseconds of the day's first session start.
    pub login_time: i64,
    /// Epoch milliseconds of the most recent transition or flush settle.
    pub last_status_change_at: i64,
    #[serde(default)]
    pub break_used_minutes: f64,
    #[serde(default)]
    pub operation_minutes: f64,
    #[serde(default)]
    pub meeting_minutes: f64,
    #[serde(default)]
    pub handling_minutes: f64,
    #[serde(default)]
    pub unavailable_minutes: f64,
    /// Epoch milliseconds, store-assigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

impl StatusSnapshot {
    /// Document key this record is stored under.
    pub fn key(&self) -> String {
        snapshot_key(&self.day, &self.user_id)
    }

    pub fn minutes_for(&self, status: Status) -> f64 {
        match status {
            Status::Operating => self.operation_minutes,
            Status::Break => self.break_used_minutes,
            Status::Meeting => self.meeting_minutes,
            Status::Handling => self.handling_minutes,
            Status::Unavailable => self.unavailable_minutes,
        }
    }

    /// Worked minutes: everything except `unavailable`.
    pub fn worked_minutes(&self) -> f64 {
        self.operation_minutes + self.meeting_minutes + self.handling_minutes
            + self.break_used_minutes
    }

    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.user_id.trim().is_empty() {
            return Err(SchemaError::new("missing_field", "userId is required"));
        }
        if !is_valid_day_key(&self.day) {
            return Err(SchemaError::new(
                "invalid_day",
                format!("day '{}' is not a YYYY-MM-DD key", self.day),
            ));
        }
        if self.login_time < 0 || self.last_status_change_at < 0 {
            return Err(SchemaError::new(
                "invalid_timestamp",
                "timestamps must be non-negative epoch milliseconds",
            ));
        }
        for status in Status::ALL {
            let minutes = self.minutes_for(status);
            if !minutes.is_finite() || minutes < 0.0 {
                return Err(SchemaError::new(
                    "invalid_minutes",
                    format!("{} minutes must be a non-negative number", status),
                ));
            }
        }
        Ok(())
    }
}

/// Document key for a `(day, userId)` pair.
pub fn snapshot_key(day: &str, user_id: &str) -> String {
    format!("{}_{}", day, user_id)
}

/// Checks that `day` is a real calendar date in canonical `YYYY-MM-DD` form.
pub fn is_valid_day_key(day: &str) -> bool {
    match NaiveDate::parse_from_str(day, DAY_KEY_FORMAT) {
        Ok(parsed) => parsed.format(DAY_KEY_FORMAT).to_string() == day,
        Err(_) => false,
    }
}

/// Schema-level rejection of a record or field value.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaError {
    pub code: String,
    pub message: String,
}

impl SchemaError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for SchemaError {}
