/*!
 * Dynamic Object Model
 * Types with named operation slots, attach notifications, and instances
 *
 * This is the surface the conversion engine plugs into: every operation
 * definition passes through an attach notification, implementations are
 * readable and atomically replaceable per slot, and subtypes can delegate
 * to supertype implementations.
 */

mod instance;
mod type_object;
mod types;

// Re-export public API
pub use instance::Instance;
pub use type_object::TypeObject;
pub use types::{AttachObserver, CompletionFn, Invocation, OpResult, OpReturn, OperationFn};
