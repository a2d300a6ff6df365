/*!
 * Wrapping Transformer
 * Replaces an operation with a task-spawning wrapper
 *
 * The captured original stays invocable after its slot is overwritten. The
 * wrapper spawns one dedicated thread per invocation and hands the caller
 * a handle immediately; failures and panics inside the task are published
 * through the handle, never dropped.
 */

use crate::convert::ledger::ConversionLedger;
use crate::core::errors::OpError;
use crate::core::types::{OpName, Outcome, Value};
use crate::handle::OpHandle;
use crate::object::{Instance, Invocation, OpResult, OpReturn, OperationFn, TypeObject};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use tracing::{debug, instrument, trace};

/// Convert `name` on `ty`, if the ledger agrees it should happen now.
///
/// Safe to call repeatedly and from racing threads: the ledger gate admits
/// exactly one conversion per name, and installing the wrapper re-fires
/// the attach event, which the hook suppresses via the in-progress state.
#[instrument(skip_all, fields(ty = ty.name(), op = %name))]
pub(crate) fn convert(ty: &TypeObject, ledger: &Arc<ConversionLedger>, name: &OpName) {
    if !ledger.try_convert(name) {
        trace!("conversion already handled");
        return;
    }
    let Some(original) = ty.implementation(name) else {
        // Slot vanished between the gate and the capture; retry on the
        // next attach event.
        ledger.cancel(name);
        return;
    };
    ty.define(name.clone(), spawning_wrapper(name.clone(), original));
    ledger.mark_converted(name);
    debug!("operation converted");
}

/// Build the replacement implementation: run the original on its own
/// thread and return a handle to the caller without blocking.
fn spawning_wrapper(
    name: OpName,
    original: OperationFn,
) -> impl Fn(Invocation) -> OpResult + Send + Sync + 'static {
    move |invocation: Invocation| {
        let Invocation {
            receiver,
            args,
            on_complete,
        } = invocation;

        let handle = OpHandle::new();
        let publish = handle.clone();
        let original = Arc::clone(&original);
        let op = name.clone();

        let spawned = thread::Builder::new()
            .name(format!("asyncify-{op}"))
            .spawn(move || {
                let outcome = run_original(&original, receiver, args);
                if let Err(error) = &outcome {
                    debug!(op = %op, task = %publish.id(), %error, "task finished with failure");
                }
                publish.complete(outcome.clone());
                if let Some(callback) = on_complete {
                    callback(outcome);
                }
            });

        match spawned {
            Ok(_) => Ok(OpReturn::Handle(handle)),
            Err(e) => Err(OpError::SpawnFailed(e.to_string())),
        }
    }
}

/// Run the captured original bound to `receiver`, flattening any handle it
/// produced and converting panics into retrievable failures.
fn run_original(original: &OperationFn, receiver: Instance, args: Vec<Value>) -> Outcome {
    let call = AssertUnwindSafe(move || original(Invocation::new(receiver, args)));
    match panic::catch_unwind(call) {
        Ok(Ok(OpReturn::Value(value))) => Ok(value),
        Ok(Ok(OpReturn::Handle(inner))) => inner.join(),
        Ok(Err(error)) => Err(error),
        Err(payload) => Err(OpError::Panicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
