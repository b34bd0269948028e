//! Cancellable repeating task.
//!
//! The periodic ledger tick is an explicit object rather than an ambient
//! timer so cancellation on logout is a single call instead of hoping a
//! closure gets collected. The worker parks on a channel: a timeout is a
//! tick, a message (or a dropped handle) is the stop signal.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub struct Ticker {
    stop: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Spawns a worker that invokes `tick` every `interval` until the
    /// ticker is cancelled or dropped. The first invocation happens one
    /// full interval after spawn.
    pub fn spawn(interval: Duration, mut tick: impl FnMut() + Send + 'static) -> Self {
        let (stop, signal) = mpsc::channel();
        let handle = thread::spawn(move || loop {
            match signal.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => tick(),
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        });
        Self {
            stop,
            handle: Some(handle),
        }
    }

    /// Stops the worker and waits for it to exit. No tick starts after
    /// this returns.
    pub fn cancel(mut self) {
        let _ = self.stop.send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        // Unblocks the worker if cancel() was never called.
        let _ = self.stop.send(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn ticks_repeatedly_until_cancelled() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let ticker = Ticker::spawn(Duration::from_millis(5), move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        thread::sleep(Duration::from_millis(60));
        ticker.cancel();
        let after_cancel = count.load(Ordering::SeqCst);
        assert!(after_cancel >= 2, "expected several ticks, saw {}", after_cancel);

        thread::sleep(Duration::from_millis(30));
        assert_eq!(count.load(Ordering::SeqCst), after_cancel, "tick after cancel");
    }

    #[test]
    fn drop_stops_the_worker() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        {
            let _ticker = Ticker::spawn(Duration::from_millis(5), move || {
                seen.fetch_add(1, Ordering::SeqCst);
            });
            thread::sleep(Duration::from_millis(20));
        }
        let after_drop = count.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(count.load(Ordering::SeqCst), after_drop);
    }
}
