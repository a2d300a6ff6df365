/*!
 * Dispatch Types
 * Call frames and slot signatures for the object model
 */

use crate::core::errors::OpError;
use crate::core::types::{OpName, Outcome, Value};
use crate::handle::OpHandle;
use crate::object::instance::Instance;
use crate::object::type_object::TypeObject;
use std::sync::Arc;

/// Implementation stored in an operation slot
pub type OperationFn = Arc<dyn Fn(Invocation) -> OpResult + Send + Sync>;

/// Caller-supplied completion callback.
///
/// Converted operations invoke it exactly once with the task's outcome;
/// plain operations ignore it.
pub type CompletionFn = Box<dyn FnOnce(Outcome) + Send>;

/// Result of dispatching an operation
pub type OpResult = Result<OpReturn, OpError>;

/// Observer of "operation attached" events on a type.
///
/// A type holds at most one observer; installing a new one hands back the
/// prior so the installer can forward to it. Chains are explicit, nothing
/// is overwritten silently.
pub struct AttachObserver(Box<dyn Fn(&TypeObject, &OpName) + Send + Sync>);

impl AttachObserver {
    pub fn new(f: impl Fn(&TypeObject, &OpName) + Send + Sync + 'static) -> Self {
        Self(Box::new(f))
    }

    /// Deliver one attach event to this observer.
    pub fn notify(&self, ty: &TypeObject, name: &OpName) {
        (self.0)(ty, name)
    }
}

/// Uniform call frame passed to every operation implementation.
pub struct Invocation {
    /// Receiver the operation is bound to
    pub receiver: Instance,
    /// Positional arguments
    pub args: Vec<Value>,
    /// Completion callback, if the caller supplied one
    pub on_complete: Option<CompletionFn>,
}

impl Invocation {
    pub fn new(receiver: Instance, args: Vec<Value>) -> Self {
        Self {
            receiver,
            args,
            on_complete: None,
        }
    }
}

/// What an invocation returned to the caller.
#[derive(Debug)]
pub enum OpReturn {
    /// Direct value from an unconverted operation
    Value(Value),
    /// Handle to the spawned task of a converted operation
    Handle(OpHandle),
}

impl OpReturn {
    /// Direct value, if this was a synchronous return
    pub fn into_value(self) -> Option<Value> {
        match self {
            OpReturn::Value(v) => Some(v),
            OpReturn::Handle(_) => None,
        }
    }

    /// Task handle, if this came from a converted operation
    pub fn into_handle(self) -> Option<OpHandle> {
        match self {
            OpReturn::Value(_) => None,
            OpReturn::Handle(h) => Some(h),
        }
    }

    pub fn is_handle(&self) -> bool {
        matches!(self, OpReturn::Handle(_))
    }

    /// Collapse to a terminal outcome: a direct value as-is, a handle by
    /// joining it.
    pub fn join_value(self) -> Outcome {
        match self {
            OpReturn::Value(v) => Ok(v),
            OpReturn::Handle(h) => h.join(),
        }
    }
}
