/*!
 * Registration Ledger
 * Per-type bookkeeping of requested, in-progress, and converted names
 *
 * Every transition goes through one mutex; this is the only locking the
 * engine requires. A name sits in at most one state and `Converted` is
 * terminal.
 */

use crate::core::types::OpName;
use crate::object::AttachObserver;
use ahash::HashSet;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};

/// Conversion state of one operation name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionState {
    /// Opted in, not yet wrapped
    Requested,
    /// Wrapping in flight; suppresses the re-entrant attach event
    InProgress,
    /// Wrapped; the original implementation is captured and replaced
    Converted,
}

/// Bookkeeping counts for one type's ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerStats {
    pub requested: usize,
    pub in_progress: usize,
    pub converted: usize,
}

#[derive(Default)]
struct LedgerState {
    requested: HashSet<OpName>,
    in_progress: HashSet<OpName>,
    converted: HashSet<OpName>,
}

/// Per-type registration ledger, owned by exactly one type.
///
/// Created lazily on first opt-in and alive for the lifetime of the type.
/// None of its operations fail; unknown names are simply inert.
pub struct ConversionLedger {
    state: Mutex<LedgerState>,
    prior_observer: OnceLock<Option<Arc<AttachObserver>>>,
}

impl ConversionLedger {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(LedgerState::default()),
            prior_observer: OnceLock::new(),
        }
    }

    /// Record names as requested.
    ///
    /// Idempotent: re-adding a requested, in-progress, or converted name
    /// changes nothing observable. Names without a corresponding operation
    /// are accepted as-is.
    pub fn request<I>(&self, names: I)
    where
        I: IntoIterator<Item = OpName>,
    {
        let mut state = self.state.lock();
        for name in names {
            if state.in_progress.contains(&name) || state.converted.contains(&name) {
                continue;
            }
            state.requested.insert(name);
        }
    }

    /// Whether conversion should proceed now.
    ///
    /// Marks the name in-progress when it should; re-entrant and repeated
    /// calls get `false`.
    pub fn try_convert(&self, name: &OpName) -> bool {
        let mut state = self.state.lock();
        if state.converted.contains(name) || state.in_progress.contains(name) {
            return false;
        }
        state.requested.remove(name);
        state.in_progress.insert(name.clone());
        true
    }

    /// Transition in-progress to converted. Inert for any other state.
    pub fn mark_converted(&self, name: &OpName) {
        let mut state = self.state.lock();
        if state.in_progress.remove(name) {
            state.converted.insert(name.clone());
        }
    }

    /// Roll an in-progress name back to requested.
    ///
    /// Only reachable when a captured implementation disappeared between
    /// the gate and the swap.
    pub(crate) fn cancel(&self, name: &OpName) {
        let mut state = self.state.lock();
        if state.in_progress.remove(name) {
            state.requested.insert(name.clone());
        }
    }

    pub fn state_of(&self, name: &str) -> Option<ConversionState> {
        let state = self.state.lock();
        if state.converted.contains(name) {
            Some(ConversionState::Converted)
        } else if state.in_progress.contains(name) {
            Some(ConversionState::InProgress)
        } else if state.requested.contains(name) {
            Some(ConversionState::Requested)
        } else {
            None
        }
    }

    pub fn is_requested(&self, name: &str) -> bool {
        self.state.lock().requested.contains(name)
    }

    pub fn is_in_progress(&self, name: &str) -> bool {
        self.state.lock().in_progress.contains(name)
    }

    pub fn stats(&self) -> LedgerStats {
        let state = self.state.lock();
        LedgerStats {
            requested: state.requested.len(),
            in_progress: state.in_progress.len(),
            converted: state.converted.len(),
        }
    }

    /// Capture the attach observer that was installed before ours.
    ///
    /// Set at most once, at ledger creation; later calls are inert.
    pub(crate) fn capture_prior_observer(&self, prior: Option<Arc<AttachObserver>>) {
        let _ = self.prior_observer.set(prior);
    }

    pub(crate) fn prior_observer(&self) -> Option<Arc<AttachObserver>> {
        self.prior_observer.get().and_then(|prior| prior.clone())
    }
}
