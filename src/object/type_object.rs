/*!
 * Type Objects
 * Named operation slots with attach notifications and inheritance
 *
 * A type owns its operation table and, once the opt-in API has touched it,
 * its conversion ledger. The attach-observer slot is swapped atomically;
 * installation hands back the prior observer so chains stay explicit.
 */

use crate::convert::ConversionLedger;
use crate::core::errors::OpError;
use crate::core::types::{OpName, Value};
use crate::object::instance::Instance;
use crate::object::types::{AttachObserver, Invocation, OpResult, OperationFn};
use ahash::RandomState;
use arc_swap::ArcSwapOption;
use dashmap::DashMap;
use log::debug;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// A dynamic type: a named bundle of operation slots.
///
/// Cloning is cheap and shares the underlying type; per-type state
/// (operations, observer, ledger) lives for the lifetime of the type.
#[derive(Clone)]
pub struct TypeObject {
    inner: Arc<TypeInner>,
}

struct TypeInner {
    name: String,
    parent: Option<TypeObject>,
    ops: DashMap<OpName, OperationFn, RandomState>,
    attach_observer: ArcSwapOption<AttachObserver>,
    conversion: OnceLock<Arc<ConversionLedger>>,
}

impl TypeObject {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_parent(name, None)
    }

    /// Create a child type inheriting this type's operations.
    ///
    /// The child gets its own operation table, observer slot, and (once it
    /// opts in) its own ledger; nothing is shared with the parent beyond
    /// resolution falling back to it.
    pub fn subtype(&self, name: impl Into<String>) -> Self {
        Self::with_parent(name, Some(self.clone()))
    }

    fn with_parent(name: impl Into<String>, parent: Option<TypeObject>) -> Self {
        Self {
            inner: Arc::new(TypeInner {
                name: name.into(),
                parent,
                ops: DashMap::with_hasher(RandomState::new()),
                attach_observer: ArcSwapOption::new(None),
                conversion: OnceLock::new(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn parent(&self) -> Option<&TypeObject> {
        self.inner.parent.as_ref()
    }

    /// Attach an operation, overwriting any existing slot of the same
    /// name, then fire the attach notification exactly once.
    ///
    /// The slot swap itself is atomic; other operations on the type are
    /// never disturbed.
    pub fn define<F>(&self, name: impl Into<OpName>, f: F)
    where
        F: Fn(Invocation) -> OpResult + Send + Sync + 'static,
    {
        let name: OpName = name.into();
        self.inner.ops.insert(name.clone(), Arc::new(f));
        debug!("defined operation '{}' on type '{}'", name, self.inner.name);
        self.notify_attached(&name);
    }

    fn notify_attached(&self, name: &OpName) {
        // Snapshot the observer outside any lock; observers may re-enter
        // define() on this same type.
        if let Some(observer) = self.inner.attach_observer.load_full() {
            observer.notify(self, name);
        }
    }

    /// The type's own implementation for `name`, if any.
    ///
    /// The returned reference stays invocable even after the slot is
    /// overwritten.
    pub fn implementation(&self, name: &str) -> Option<OperationFn> {
        self.inner.ops.get(name).map(|op| Arc::clone(op.value()))
    }

    /// Resolve `name` against this type, then its ancestors.
    pub fn resolve(&self, name: &str) -> Option<OperationFn> {
        let mut ty = Some(self);
        while let Some(t) = ty {
            if let Some(op) = t.implementation(name) {
                return Some(op);
            }
            ty = t.parent();
        }
        None
    }

    /// Whether this type itself carries an operation slot for `name`.
    pub fn has_operation(&self, name: &str) -> bool {
        self.inner.ops.contains_key(name)
    }

    pub fn operation_names(&self) -> Vec<OpName> {
        self.inner.ops.iter().map(|e| e.key().clone()).collect()
    }

    /// Install an attach observer, returning the one previously installed.
    ///
    /// The installer is responsible for forwarding events to the returned
    /// observer; the slot itself never broadcasts to more than one.
    pub fn install_attach_observer(
        &self,
        observer: AttachObserver,
    ) -> Option<Arc<AttachObserver>> {
        let prior = self.inner.attach_observer.swap(Some(Arc::new(observer)));
        debug!("installed attach observer on type '{}'", self.inner.name);
        prior
    }

    /// Invoke `name` resolved against this type, bound to `receiver`.
    ///
    /// If the resolved operation was converted, this yields a handle the
    /// caller must join before combining the value with further logic.
    pub fn invoke_on(&self, receiver: &Instance, name: &str, args: Vec<Value>) -> OpResult {
        let op = self
            .resolve(name)
            .ok_or_else(|| OpError::UnknownOperation(name.to_string()))?;
        op(Invocation::new(receiver.clone(), args))
    }

    /// Delegation: invoke the supertype's `name` bound to `receiver`.
    pub fn invoke_super(&self, receiver: &Instance, name: &str, args: Vec<Value>) -> OpResult {
        let parent = self
            .parent()
            .ok_or_else(|| OpError::UnknownOperation(name.to_string()))?;
        parent.invoke_on(receiver, name, args)
    }

    /// Create an instance bound to this type.
    pub fn instantiate(&self) -> Instance {
        Instance::of(self.clone())
    }

    pub(crate) fn conversion_slot(&self) -> &OnceLock<Arc<ConversionLedger>> {
        &self.inner.conversion
    }
}

impl fmt::Debug for TypeObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeObject")
            .field("name", &self.inner.name)
            .field("operations", &self.inner.ops.len())
            .field("parent", &self.inner.parent.as_ref().map(|p| p.name().to_string()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::types::OpReturn;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn constant(v: Value) -> impl Fn(Invocation) -> OpResult + Send + Sync + 'static {
        move |_inv| Ok(OpReturn::Value(v.clone()))
    }

    #[test]
    fn test_define_and_read_implementation() {
        let ty = TypeObject::new("T");
        assert!(ty.implementation("op").is_none());

        ty.define("op", constant(json!(1)));
        assert!(ty.has_operation("op"));
        assert!(ty.implementation("op").is_some());
        assert_eq!(ty.operation_names(), vec![OpName::from("op")]);
    }

    #[test]
    fn test_captured_implementation_survives_overwrite() {
        let ty = TypeObject::new("T");
        ty.define("op", constant(json!("old")));
        let captured = ty.implementation("op").unwrap();

        ty.define("op", constant(json!("new")));
        let inst = ty.instantiate();
        let out = captured(Invocation::new(inst, vec![])).unwrap();
        assert_eq!(out.into_value().unwrap(), json!("old"));
    }

    #[test]
    fn test_resolution_walks_ancestors() {
        let base = TypeObject::new("Base");
        base.define("inherited", constant(json!(10)));
        let child = base.subtype("Child");

        assert!(!child.has_operation("inherited"));
        assert!(child.resolve("inherited").is_some());

        child.define("inherited", constant(json!(20)));
        let inst = child.instantiate();
        let out = inst.invoke("inherited", vec![]).unwrap();
        assert_eq!(out.into_value().unwrap(), json!(20));
    }

    #[test]
    fn test_attach_observer_fires_once_per_definition() {
        let ty = TypeObject::new("T");
        let events = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&events);
        let prior = ty.install_attach_observer(AttachObserver::new(move |_ty, _name| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        assert!(prior.is_none());

        ty.define("a", constant(json!(1)));
        ty.define("b", constant(json!(2)));
        ty.define("a", constant(json!(3)));
        assert_eq!(events.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_installing_observer_returns_prior() {
        let ty = TypeObject::new("T");
        ty.install_attach_observer(AttachObserver::new(|_, _| {}));
        let prior = ty.install_attach_observer(AttachObserver::new(|_, _| {}));
        assert!(prior.is_some());
    }

    #[test]
    fn test_subtype_events_do_not_reach_parent_observer() {
        let base = TypeObject::new("Base");
        let events = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&events);
        base.install_attach_observer(AttachObserver::new(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        let child = base.subtype("Child");
        child.define("op", constant(json!(0)));
        assert_eq!(events.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_invoke_super_reaches_parent_implementation() {
        let base = TypeObject::new("Base");
        base.define("op", constant(json!("base")));
        let child = base.subtype("Child");
        child.define("op", constant(json!("child")));

        let inst = child.instantiate();
        let direct = inst.invoke("op", vec![]).unwrap();
        assert_eq!(direct.into_value().unwrap(), json!("child"));

        let delegated = child.invoke_super(&inst, "op", vec![]).unwrap();
        assert_eq!(delegated.into_value().unwrap(), json!("base"));
    }

    #[test]
    fn test_invoke_super_without_parent_is_unknown() {
        let ty = TypeObject::new("T");
        ty.define("op", constant(json!(1)));
        let inst = ty.instantiate();
        let err = ty.invoke_super(&inst, "op", vec![]).unwrap_err();
        assert_eq!(err, OpError::UnknownOperation("op".into()));
    }
}
