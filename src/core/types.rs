/*!
 * Core Types
 * Common aliases used across the crate
 */

use std::sync::Arc;

/// Identifier of an operation slot on a type.
///
/// Compared by name, not content; unique within a type; case-sensitive.
pub type OpName = Arc<str>;

/// Dynamic value passed to and returned from operations.
pub type Value = serde_json::Value;

/// Terminal outcome of one asynchronous invocation: the original
/// implementation's value, or the failure that prevented it.
pub type Outcome = Result<Value, crate::core::errors::OpError>;
