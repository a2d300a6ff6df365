/*!
 * Asyncify Library
 * Declarative conversion of named operations into task-spawning ones
 *
 * Opt an operation into asynchronous execution by name with `mark_async`;
 * from then on every invocation of it runs on its own task and hands the
 * caller an [`OpHandle`] for blocking retrieval, or feeds a completion
 * callback with the outcome. Marking is idempotent, safe for names that do
 * not exist yet, and scoped to one type at a time.
 *
 * # Example
 *
 * ```
 * use asyncify::{Asyncify, OpReturn, TypeObject, Value};
 *
 * let ty = TypeObject::new("Job");
 * ty.define("compute", |inv| {
 *     let n = inv.args.first().and_then(|v| v.as_i64()).unwrap_or(5);
 *     Ok(OpReturn::Value(Value::from(n)))
 * });
 * ty.mark_async(["compute"]);
 *
 * let job = ty.instantiate();
 * match job.invoke("compute", vec![Value::from(21)]).unwrap() {
 *     OpReturn::Handle(h) => assert_eq!(h.join().unwrap(), Value::from(21)),
 *     OpReturn::Value(_) => unreachable!("converted operations return handles"),
 * }
 * ```
 */

pub mod convert;
pub mod core;
pub mod handle;
pub mod object;

// Re-exports
pub use self::convert::{Asyncify, ConversionLedger, ConversionState, LedgerStats};
pub use self::core::errors::OpError;
pub use self::core::types::{OpName, Outcome, Value};
pub use self::handle::OpHandle;
pub use self::object::{
    AttachObserver, CompletionFn, Instance, Invocation, OpResult, OpReturn, OperationFn,
    TypeObject,
};
