//! # desk-core
//!
//! Core library for Opsdesk: the day time ledger, break budget policy, and
//! session recovery behind the agent status dashboard.
//!
//! ## Design Principles
//!
//! - **Clock-injected**: nothing here reads system time on its own; every
//!   operation takes `now` from a [`clock::Clock`], so timelines replay
//!   exactly in tests.
//! - **Graceful degradation**: persistence failures fall back to fresh
//!   state or defer to the next flush. Time tracking must never lock an
//!   operator out of working.
//! - **Single effective writer**: one [`session::AgentSession`] owns one
//!   day state; supervisors and chat only read flushed snapshots.
//! - **Decoupled rendering**: views subscribe to ledger events; the core
//!   never touches presentation.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use desk_core::{AgentSession, JsonSnapshotStore, SessionHandle};
//!
//! let store = Arc::new(JsonSnapshotStore::new(path));
//! let session = AgentSession::login(profile, config, cache, store, clock);
//! let handle = SessionHandle::start(session);
//! handle.set_status(Status::Break)?;
//! ```

// Public modules
pub mod board;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod ledger;
pub mod publisher;
pub mod recovery;
pub mod session;
pub mod store;
pub mod ticker;

// Re-export commonly used items at crate root
pub use board::{board_for_day, format_minutes, BoardRow, BoardView, StatusCounts};
pub use cache::DayCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::DeskConfig;
pub use error::{DeskError, Result};
pub use ledger::{BreakNotice, BreakPolicy, DayState, DayTimeLedger, LiveUsage, MinutesByStatus};
pub use publisher::PresencePublisher;
pub use recovery::{recover_day_state, RecoveredDay, ResumeSource};
pub use session::{AgentSession, SessionEvent, SessionHandle};
pub use store::{JsonSnapshotStore, MemorySnapshotStore, SnapshotStore};
pub use ticker::Ticker;
