//! Session-scoped context object.
//!
//! One [`AgentSession`] per logged-in user replaces the module-global
//! `currentUser`/`state` singletons of older dashboard builds: everything
//! the ledger needs travels in this object, constructed at login and torn
//! down at logout, so the core stays independently testable.
//!
//! Rendering is decoupled: interested views call [`AgentSession::subscribe`]
//! and receive [`SessionEvent`]s over a channel instead of the ledger
//! touching any UI.
//!
//! [`SessionHandle`] adds the periodic tick on top: a [`Ticker`] drives
//! `tick()` every configured interval, and `logout()` cancels it before the
//! final flush so no work leaks into a stale session.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use desk_protocol::{Status, UserProfile};

use crate::cache::DayCache;
use crate::clock::Clock;
use crate::config::DeskConfig;
use crate::error::Result;
use crate::ledger::{BreakNotice, BreakPolicy, DayState, DayTimeLedger, LiveUsage};
use crate::publisher::PresencePublisher;
use crate::recovery::{recover_day_state, ResumeSource};
use crate::store::SnapshotStore;
use crate::ticker::Ticker;

/// Ledger change events delivered to subscribed views.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Fresh live totals, emitted on every tick.
    Usage(LiveUsage),
    /// The status changed, by the user or by break enforcement.
    StatusChanged(Status),
    /// The break budget ran out while on break; the status was forced to
    /// `unavailable`. Emitted exactly once per exhaustion.
    BreakLimitReached(BreakNotice),
}

pub struct AgentSession {
    profile: UserProfile,
    config: DeskConfig,
    ledger: DayTimeLedger,
    policy: BreakPolicy,
    cache: DayCache,
    publisher: PresencePublisher,
    clock: Arc<dyn Clock>,
    resume_source: ResumeSource,
    subscribers: Vec<Sender<SessionEvent>>,
}

impl AgentSession {
    /// Resolves the authoritative day state (cache → remote → fresh),
    /// persists it both ways, and returns the live session. Persistence
    /// failures are logged and never block the login.
    pub fn login(
        profile: UserProfile,
        config: DeskConfig,
        cache: DayCache,
        store: Arc<dyn SnapshotStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let now = clock.now();
        let today = clock.day_key();
        let recovered = recover_day_state(&profile.user_id, &today, now, &cache, store.as_ref());
        tracing::info!(
            user_id = %profile.user_id,
            day = %today,
            source = ?recovered.source,
            status = %recovered.state.status,
            "Session started"
        );

        let mut session = Self {
            ledger: DayTimeLedger::new(recovered.state, config.break_limit_min),
            policy: BreakPolicy::new(config.break_limit_min),
            publisher: PresencePublisher::new(store),
            profile,
            config,
            cache,
            clock,
            resume_source: recovered.source,
            subscribers: Vec::new(),
        };
        session.persist(now);
        session
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn config(&self) -> &DeskConfig {
        &self.config
    }

    pub fn status(&self) -> Status {
        self.ledger.status()
    }

    pub fn day_state(&self) -> &DayState {
        self.ledger.state()
    }

    /// Which recovery branch this session resumed from.
    pub fn resume_source(&self) -> ResumeSource {
        self.resume_source
    }

    pub fn live_usage(&self) -> LiveUsage {
        self.ledger.compute_live_usage(self.clock.now())
    }

    pub fn can_enter_break(&self) -> bool {
        self.policy.can_enter_break(&self.ledger, self.clock.now())
    }

    /// User-initiated status change. On `InvalidTransition` the stored
    /// status is untouched and the caller must revert any optimistic
    /// selection.
    pub fn set_status(&mut self, status: Status) -> Result<()> {
        let now = self.clock.now();
        self.ledger.transition_to(status, now)?;
        tracing::info!(user_id = %self.profile.user_id, status = %status, "Status changed");
        self.notify(SessionEvent::StatusChanged(status));
        self.persist(now);
        Ok(())
    }

    /// One scheduler beat: enforce the break budget, publish live totals
    /// to subscribers, flush. Flush failures defer to the next tick.
    pub fn tick(&mut self) {
        let now = self.clock.now();

        if let Some(notice) = self.policy.enforce_on_tick(&mut self.ledger, now) {
            tracing::warn!(
                user_id = %self.profile.user_id,
                used_minutes = notice.used_minutes,
                limit_minutes = notice.limit_minutes,
                "Break budget exhausted; status forced to unavailable"
            );
            self.notify(SessionEvent::BreakLimitReached(notice));
            self.notify(SessionEvent::StatusChanged(Status::Unavailable));
        }

        self.notify(SessionEvent::Usage(self.ledger.compute_live_usage(now)));
        self.persist(now);
    }

    /// Final transition to `unavailable` plus a last flush.
    pub fn logout(&mut self) {
        let now = self.clock.now();
        if let Err(err) = self.ledger.transition_to(Status::Unavailable, now) {
            tracing::warn!(error = %err, "Logout transition failed");
        }
        tracing::info!(user_id = %self.profile.user_id, "Session ended");
        self.notify(SessionEvent::StatusChanged(Status::Unavailable));
        self.persist(now);
    }

    /// Registers a view for [`SessionEvent`]s. Disconnected receivers are
    /// pruned on the next notification.
    pub fn subscribe(&mut self) -> Receiver<SessionEvent> {
        let (sender, receiver) = mpsc::channel();
        self.subscribers.push(sender);
        receiver
    }

    fn notify(&mut self, event: SessionEvent) {
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }

    /// Settles elapsed time, then writes the day state to the device cache
    /// and the shared store. Both writes are best-effort.
    fn persist(&mut self, now: DateTime<Utc>) {
        self.ledger.settle_elapsed(now);
        let snapshot = self.ledger.state().to_snapshot(&self.profile);

        if let Err(err) = self.cache.save(&snapshot) {
            tracing::warn!(error = %err, user_id = %self.profile.user_id, "Day cache write failed");
        }
        if let Err(err) = self.publisher.publish(&self.profile, self.ledger.state()) {
            tracing::warn!(
                error = %err,
                user_id = %self.profile.user_id,
                "Snapshot flush failed; will retry on next tick"
            );
        }
    }
}

/// An [`AgentSession`] with its periodic tick attached.
pub struct SessionHandle {
    session: Arc<Mutex<AgentSession>>,
    ticker: Option<Ticker>,
}

impl SessionHandle {
    /// Wraps the session and starts ticking at the configured interval.
    pub fn start(session: AgentSession) -> Self {
        let interval = session.config().tick_interval;
        let shared = Arc::new(Mutex::new(session));

        let tick_target = Arc::clone(&shared);
        let ticker = Ticker::spawn(interval, move || {
            if let Ok(mut session) = tick_target.lock() {
                session.tick();
            }
        });

        Self {
            session: shared,
            ticker: Some(ticker),
        }
    }

    fn lock(&self) -> MutexGuard<'_, AgentSession> {
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_status(&self, status: Status) -> Result<()> {
        self.lock().set_status(status)
    }

    pub fn status(&self) -> Status {
        self.lock().status()
    }

    pub fn live_usage(&self) -> LiveUsage {
        self.lock().live_usage()
    }

    pub fn subscribe(&self) -> Receiver<SessionEvent> {
        self.lock().subscribe()
    }

    /// Cancels the tick first, then runs the session's final flush. After
    /// this returns no timer or subscription outlives the session.
    pub fn logout(mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.cancel();
        }
        self.lock().logout();
    }
}
