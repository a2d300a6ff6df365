/*!
 * Async Conversion Engine
 * Opt-in registry, interception hook, and wrapping transformer
 *
 * `mark_async` records operation names in the type's conversion ledger and
 * wraps each one: immediately if the operation already exists, or from the
 * attach hook when it is defined later. Wrapped invocations return an
 * `OpHandle` instead of a value.
 */

mod hook;
mod ledger;
mod transformer;

// Re-export public API
pub use ledger::{ConversionLedger, ConversionState, LedgerStats};

use crate::core::types::OpName;
use crate::object::TypeObject;
use std::sync::Arc;
use tracing::debug;

/// Declarative opt-in surface for asynchronous conversion.
pub trait Asyncify {
    /// Mark operation names for asynchronous conversion.
    ///
    /// Idempotent: marking an already-converted name changes nothing, and
    /// the installed implementation is not replaced again. Names with no
    /// corresponding operation are recorded and converted when the
    /// operation is attached later; they never raise and never create a
    /// phantom operation.
    fn mark_async<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<OpName>;

    /// Conversion bookkeeping counts, if this type has ever opted in.
    fn conversion_stats(&self) -> Option<LedgerStats>;

    /// Conversion state of one name, if this type has ever opted in and
    /// the name was marked.
    fn conversion_state(&self, name: &str) -> Option<ConversionState>;
}

impl Asyncify for TypeObject {
    fn mark_async<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<OpName>,
    {
        let names: Vec<OpName> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return;
        }
        let ledger = ledger_for(self);
        ledger.request(names.iter().cloned());
        for name in &names {
            if self.implementation(name).is_some() {
                transformer::convert(self, &ledger, name);
            }
        }
    }

    fn conversion_stats(&self) -> Option<LedgerStats> {
        self.conversion_slot().get().map(|ledger| ledger.stats())
    }

    fn conversion_state(&self, name: &str) -> Option<ConversionState> {
        self.conversion_slot()
            .get()
            .and_then(|ledger| ledger.state_of(name))
    }
}

/// The type's conversion ledger, created on first opt-in.
///
/// Creation also installs the interception hook, capturing any prior
/// attach observer exactly once. `OnceLock` serializes racing opt-ins, so
/// the capture can never happen twice.
fn ledger_for(ty: &TypeObject) -> Arc<ConversionLedger> {
    Arc::clone(ty.conversion_slot().get_or_init(|| {
        let ledger = Arc::new(ConversionLedger::new());
        let prior = ty.install_attach_observer(hook::interception_hook(Arc::clone(&ledger)));
        ledger.capture_prior_observer(prior);
        debug!(ty = ty.name(), "conversion ledger created");
        ledger
    }))
}
