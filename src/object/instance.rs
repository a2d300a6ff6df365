/*!
 * Instances
 * Receivers bound to a type, with shared field state
 */

use crate::core::errors::OpError;
use crate::core::types::{Outcome, Value};
use crate::object::type_object::TypeObject;
use crate::object::types::{CompletionFn, Invocation, OpResult};
use ahash::RandomState;
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;

/// An instance of a [`TypeObject`].
///
/// Clones share the same field map: a spawned task mutating the receiver
/// is observable through every clone. The receiver identity a converted
/// operation is bound to is this shared state, not any particular clone.
#[derive(Clone)]
pub struct Instance {
    ty: TypeObject,
    fields: Arc<DashMap<String, Value, RandomState>>,
}

impl Instance {
    pub(crate) fn of(ty: TypeObject) -> Self {
        Self {
            ty,
            fields: Arc::new(DashMap::with_hasher(RandomState::new())),
        }
    }

    pub fn type_object(&self) -> &TypeObject {
        &self.ty
    }

    pub fn get(&self, field: &str) -> Option<Value> {
        self.fields.get(field).map(|v| v.value().clone())
    }

    pub fn set(&self, field: impl Into<String>, value: Value) {
        self.fields.insert(field.into(), value);
    }

    /// Dispatch `name` through the type and its ancestors.
    ///
    /// A converted operation returns a handle; an unconverted one returns
    /// its value directly.
    pub fn invoke(&self, name: &str, args: Vec<Value>) -> OpResult {
        self.dispatch(name, args, None)
    }

    /// Dispatch with a completion callback.
    ///
    /// Converted operations invoke the callback on the task's own thread
    /// with the outcome; plain operations ignore it.
    pub fn invoke_with<F>(&self, name: &str, args: Vec<Value>, on_complete: F) -> OpResult
    where
        F: FnOnce(Outcome) + Send + 'static,
    {
        self.dispatch(name, args, Some(Box::new(on_complete)))
    }

    fn dispatch(
        &self,
        name: &str,
        args: Vec<Value>,
        on_complete: Option<CompletionFn>,
    ) -> OpResult {
        let op = self
            .ty
            .resolve(name)
            .ok_or_else(|| OpError::UnknownOperation(name.to_string()))?;
        op(Invocation {
            receiver: self.clone(),
            args,
            on_complete,
        })
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("type", &self.ty.name())
            .field("fields", &self.fields.len())
            .finish()
    }
}
