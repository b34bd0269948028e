//! Day time ledger.
//!
//! One [`DayTimeLedger`] owns one agent's [`DayState`] for one calendar day
//! and answers "how much time has accumulated in each status bucket as of
//! now". All arithmetic is pure against a caller-supplied `now`; nothing in
//! this module reads the system clock or touches storage.
//!
//! # Accrual model
//!
//! Stored minute counters only move on a *settle*: elapsed wall-clock time
//! since `last_status_change_at` is folded into the bucket of the active
//! status, and the timestamp resets to `now`. Between settles,
//! [`DayTimeLedger::compute_live_usage`] derives display values on demand
//! without mutating anything. Settles happen on every status transition and
//! on every flush.
//!
//! # Module Structure
//!
//! - [`types`]: [`DayState`], [`MinutesByStatus`], [`LiveUsage`] and the
//!   snapshot conversions
//! - [`time`]: the ledger itself
//! - [`policy`]: the break budget enforcement

mod policy;
mod time;
mod types;

pub use policy::{BreakNotice, BreakPolicy};
pub use time::{DayTimeLedger, BREAK_EPSILON_MIN};
pub use types::{DayState, LiveUsage, MinutesByStatus};
