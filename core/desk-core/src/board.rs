//! Supervisor board aggregation.
//!
//! Read-only consumer of the snapshot store: collects every record for a
//! given day and groups it into per-status counts plus an agent roster.
//! Consumers of this view never see a raw status string; unknown values
//! already collapsed to `unavailable` when the snapshot was parsed.
//!
//! Freshness is whatever the agents last flushed; the board is eventually
//! consistent by design.

use serde::Serialize;

use desk_protocol::{PresenceTier, Role, Status, StatusSnapshot};

use crate::error::Result;
use crate::store::SnapshotStore;

/// Number of agents currently in each status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub operating: u32,
    #[serde(rename = "break")]
    pub on_break: u32,
    pub meeting: u32,
    pub handling: u32,
    pub unavailable: u32,
}

impl StatusCounts {
    fn record(&mut self, status: Status) {
        match status {
            Status::Operating => self.operating += 1,
            Status::Break => self.on_break += 1,
            Status::Meeting => self.meeting += 1,
            Status::Handling => self.handling += 1,
            Status::Unavailable => self.unavailable += 1,
        }
    }

    pub fn get(&self, status: Status) -> u32 {
        match status {
            Status::Operating => self.operating,
            Status::Break => self.on_break,
            Status::Meeting => self.meeting,
            Status::Handling => self.handling,
            Status::Unavailable => self.unavailable,
        }
    }

    pub fn total(&self) -> u32 {
        self.operating + self.on_break + self.meeting + self.handling + self.unavailable
    }
}

/// One agent's line on the board.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardRow {
    pub user_id: String,
    pub name: String,
    pub role: Role,
    pub status: Status,
    pub presence: PresenceTier,
    pub worked_minutes: f64,
    pub updated_at: Option<i64>,
}

impl From<&StatusSnapshot> for BoardRow {
    fn from(snapshot: &StatusSnapshot) -> Self {
        Self {
            user_id: snapshot.user_id.clone(),
            name: snapshot.name.clone(),
            role: snapshot.role,
            status: snapshot.status,
            presence: snapshot.status.presence(),
            worked_minutes: snapshot.worked_minutes(),
            updated_at: snapshot.updated_at,
        }
    }
}

/// The aggregate supervisor view for one day.
#[derive(Debug, Clone, Serialize)]
pub struct BoardView {
    pub day: String,
    pub counts: StatusCounts,
    pub agents: Vec<BoardRow>,
}

pub fn board_for_day(store: &dyn SnapshotStore, day: &str) -> Result<BoardView> {
    let snapshots = store.for_day(day)?;
    let mut counts = StatusCounts::default();
    let mut agents: Vec<BoardRow> = Vec::with_capacity(snapshots.len());

    for snapshot in &snapshots {
        counts.record(snapshot.status);
        agents.push(BoardRow::from(snapshot));
    }
    agents.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.user_id.cmp(&b.user_id)));

    Ok(BoardView {
        day: day.to_string(),
        counts,
        agents,
    })
}

/// Dashboard duration formatting: `7 min` under an hour, `2 hrs 5 min`
/// above it.
pub fn format_minutes(minutes: f64) -> String {
    let total = minutes.max(0.0).floor() as i64;
    let hours = total / 60;
    let mins = total % 60;
    if hours <= 0 {
        format!("{} min", mins)
    } else {
        format!("{} hrs {} min", hours, mins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemorySnapshotStore;
    use desk_protocol::Role;

    fn snapshot(user_id: &str, name: &str, status: Status) -> StatusSnapshot {
        StatusSnapshot {
            user_id: user_id.to_string(),
            name: name.to_string(),
            role: Role::Agent,
            day: "2025-01-02".to_string(),
            status,
            login_time: 1_735_800_000_000,
            last_status_change_at: 1_735_800_000_000,
            break_used_minutes: 10.0,
            operation_minutes: 60.0,
            meeting_minutes: 0.0,
            handling_minutes: 0.0,
            unavailable_minutes: 30.0,
            updated_at: None,
        }
    }

    #[test]
    fn counts_group_by_status() {
        let store = MemorySnapshotStore::new();
        store
            .put(snapshot("agent-01", "Agent 01", Status::Operating))
            .expect("put");
        store
            .put(snapshot("agent-02", "Agent 02", Status::Operating))
            .expect("put");
        store
            .put(snapshot("agent-03", "Agent 03", Status::Break))
            .expect("put");

        let board = board_for_day(&store, "2025-01-02").expect("board");
        assert_eq!(board.counts.operating, 2);
        assert_eq!(board.counts.on_break, 1);
        assert_eq!(board.counts.total(), 3);
        assert_eq!(board.agents.len(), 3);
    }

    #[test]
    fn unknown_status_counts_as_unavailable() {
        let store = MemorySnapshotStore::new();
        let raw = r#"{
            "userId": "agent-09",
            "name": "Agent 09",
            "day": "2025-01-02",
            "status": "coffee_run",
            "loginTime": 0,
            "lastStatusChangeAt": 0
        }"#;
        let parsed: StatusSnapshot = serde_json::from_str(raw).expect("parse");
        store.put(parsed).expect("put");

        let board = board_for_day(&store, "2025-01-02").expect("board");
        assert_eq!(board.counts.unavailable, 1);
        assert_eq!(board.agents[0].presence, PresenceTier::Inactive);
    }

    #[test]
    fn other_days_are_excluded() {
        let store = MemorySnapshotStore::new();
        let mut yesterday = snapshot("agent-01", "Agent 01", Status::Operating);
        yesterday.day = "2025-01-01".to_string();
        store.put(yesterday).expect("put");

        let board = board_for_day(&store, "2025-01-02").expect("board");
        assert_eq!(board.counts.total(), 0);
        assert!(board.agents.is_empty());
    }

    #[test]
    fn roster_is_sorted_by_name() {
        let store = MemorySnapshotStore::new();
        store
            .put(snapshot("u2", "Zaina", Status::Meeting))
            .expect("put");
        store
            .put(snapshot("u1", "Amir", Status::Handling))
            .expect("put");

        let board = board_for_day(&store, "2025-01-02").expect("board");
        let names: Vec<&str> = board.agents.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Amir", "Zaina"]);
    }

    #[test]
    fn rows_carry_presence_and_worked_minutes() {
        let store = MemorySnapshotStore::new();
        store
            .put(snapshot("agent-01", "Agent 01", Status::Handling))
            .expect("put");

        let board = board_for_day(&store, "2025-01-02").expect("board");
        let row = &board.agents[0];
        assert_eq!(row.presence, PresenceTier::Active);
        assert_eq!(row.worked_minutes, 70.0);
    }

    #[test]
    fn formats_dashboard_durations() {
        assert_eq!(format_minutes(7.0), "7 min");
        assert_eq!(format_minutes(59.9), "59 min");
        assert_eq!(format_minutes(125.0), "2 hrs 5 min");
        assert_eq!(format_minutes(-3.0), "0 min");
    }
}
