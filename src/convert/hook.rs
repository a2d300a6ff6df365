/*!
 * Interception Hook
 * The observer every "operation attached" event passes through
 */

use crate::convert::ledger::ConversionLedger;
use crate::convert::transformer;
use crate::core::types::OpName;
use crate::object::{AttachObserver, TypeObject};
use std::sync::Arc;
use tracing::trace;

/// Build the observer installed when a type's ledger is created.
///
/// Event order: re-entrancy suppression first, then the captured prior
/// observer (exactly once per real definition event), then the conversion
/// decision. A re-entrant event (the transformer installing its own
/// wrapper) reaches nothing, so third-party observers never see more than
/// one event per real definition.
pub(crate) fn interception_hook(ledger: Arc<ConversionLedger>) -> AttachObserver {
    AttachObserver::new(move |ty: &TypeObject, name: &OpName| {
        if ledger.is_in_progress(name) {
            trace!(ty = ty.name(), op = %name, "suppressed re-entrant attach event");
            return;
        }
        if let Some(prior) = ledger.prior_observer() {
            prior.notify(ty, name);
        }
        if !ledger.is_requested(name) {
            return;
        }
        transformer::convert(ty, &ledger, name);
    })
}
