/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures surfaced by dispatching or executing an operation
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum OpError {
    #[error("No operation named '{0}' is defined")]
    #[diagnostic(
        code(asyncify::unknown_operation),
        help("Define the operation on the type (or an ancestor) before invoking it.")
    )]
    UnknownOperation(String),

    #[error("Operation failed: {0}")]
    #[diagnostic(
        code(asyncify::operation_failed),
        help("The original implementation returned an error. Inspect the message for details.")
    )]
    Failed(String),

    #[error("Operation panicked: {0}")]
    #[diagnostic(
        code(asyncify::operation_panicked),
        help("The original implementation panicked inside its task. The panic payload is preserved here.")
    )]
    Panicked(String),

    #[error("Failed to spawn task: {0}")]
    #[diagnostic(
        code(asyncify::spawn_failed),
        help("The system refused a new thread. Check process thread limits.")
    )]
    SpawnFailed(String),
}
