/*!
 * Operation Handle
 * One in-flight or completed asynchronous invocation
 *
 * The outcome slot is single-writer (the spawned task) and multi-reader
 * (any thread calling `join`). Publication is a mutex-guarded write plus a
 * release store on the completion flag; readers block on the condvar, never
 * on each other.
 */

use crate::core::types::Outcome;
use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::trace;
use uuid::Uuid;

/// Handle to one asynchronous invocation of a converted operation.
///
/// Cloning shares the same outcome slot; every clone observes the same
/// write-once outcome. There is no cancellation and no timeout: the task
/// runs to completion whether or not the handle is ever joined.
#[derive(Clone)]
pub struct OpHandle {
    inner: Arc<HandleShared>,
}

struct HandleShared {
    id: Uuid,
    slot: Mutex<Option<Outcome>>,
    done: Condvar,
    completed: AtomicBool,
}

impl OpHandle {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(HandleShared {
                id: Uuid::new_v4(),
                slot: Mutex::new(None),
                done: Condvar::new(),
                completed: AtomicBool::new(false),
            }),
        }
    }

    /// Unique id of the underlying task, for logs and diagnostics
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// Whether the task has published its outcome
    pub fn is_complete(&self) -> bool {
        self.inner.completed.load(Ordering::Acquire)
    }

    /// Non-blocking snapshot of the outcome, if already published
    pub fn try_outcome(&self) -> Option<Outcome> {
        self.inner.slot.lock().clone()
    }

    /// Block the calling thread until the task publishes its outcome.
    ///
    /// The outcome is write-once: repeated joins, from any number of
    /// clones, return the same value or failure.
    pub fn join(&self) -> Outcome {
        let mut slot = self.inner.slot.lock();
        loop {
            if let Some(outcome) = slot.as_ref() {
                return outcome.clone();
            }
            self.inner.done.wait(&mut slot);
        }
    }

    /// Publish the outcome. The first write wins; later writes are inert.
    pub(crate) fn complete(&self, outcome: Outcome) {
        {
            let mut slot = self.inner.slot.lock();
            if slot.is_some() {
                return;
            }
            *slot = Some(outcome);
            self.inner.completed.store(true, Ordering::Release);
        }
        self.inner.done.notify_all();
        trace!(task = %self.inner.id, "outcome published");
    }
}

impl fmt::Debug for OpHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpHandle")
            .field("id", &self.inner.id)
            .field("complete", &self.is_complete())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::thread;
    use std::time::{Duration, Instant};

    #[test]
    fn test_join_returns_published_outcome() {
        let handle = OpHandle::new();
        handle.complete(Ok(json!(42)));
        assert_eq!(handle.join().unwrap(), json!(42));
    }

    #[test]
    fn test_join_blocks_until_complete() {
        let handle = OpHandle::new();
        let publisher = handle.clone();

        thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            publisher.complete(Ok(json!("done")));
        });

        let start = Instant::now();
        let outcome = handle.join();
        assert!(start.elapsed() >= Duration::from_millis(50));
        assert_eq!(outcome.unwrap(), json!("done"));
    }

    #[test]
    fn test_repeated_joins_return_same_outcome() {
        let handle = OpHandle::new();
        handle.complete(Ok(json!([1, 2, 3])));

        let first = handle.join();
        let second = handle.join();
        let through_clone = handle.clone().join();
        assert_eq!(first, second);
        assert_eq!(first, through_clone);
    }

    #[test]
    fn test_first_write_wins() {
        let handle = OpHandle::new();
        handle.complete(Ok(json!(1)));
        handle.complete(Ok(json!(2)));
        assert_eq!(handle.join().unwrap(), json!(1));
    }

    #[test]
    fn test_observation_before_and_after_completion() {
        let handle = OpHandle::new();
        assert!(!handle.is_complete());
        assert!(handle.try_outcome().is_none());

        handle.complete(Ok(json!(null)));
        assert!(handle.is_complete());
        assert_eq!(handle.try_outcome().unwrap().unwrap(), json!(null));
    }

    #[test]
    fn test_many_joiners_observe_one_outcome() {
        let handle = OpHandle::new();
        let joiners: Vec<_> = (0..4)
            .map(|_| {
                let h = handle.clone();
                thread::spawn(move || h.join())
            })
            .collect();

        thread::sleep(Duration::from_millis(20));
        handle.complete(Ok(json!(7)));

        for joiner in joiners {
            assert_eq!(joiner.join().unwrap().unwrap(), json!(7));
        }
    }
}
