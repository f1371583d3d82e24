//! Dynamic dispatch gate.
//!
//! For every watched name the gate module holds a stub that forwards to the
//! receiver's `method_missing(name, args)`. The gate module is the first thing
//! the kernel includes, so any real definition anywhere in an ancestry shadows
//! the stub: once a name gains a definition, receivers prefer it through normal
//! resolution, with no per-call lookup cost.
//!
//! The watched set is append-only for the life of the runtime. Reserved names
//! are never watched; a stub for `method_missing` would forward to itself.

use rustc_hash::FxHashSet;
use weave_ir::Name;

use crate::method::Method;
use crate::module::ModuleId;
use crate::value::Value;

/// The watched-name registry and the module holding its stubs.
#[derive(Debug)]
pub struct DispatchGate {
    module: ModuleId,
    watched: FxHashSet<Name>,
    reserved: FxHashSet<Name>,
}

impl DispatchGate {
    pub(crate) fn new(module: ModuleId, reserved: impl IntoIterator<Item = Name>) -> Self {
        Self {
            module,
            watched: FxHashSet::default(),
            reserved: reserved.into_iter().collect(),
        }
    }

    /// The hidden module that carries the stubs.
    #[inline]
    pub fn module(&self) -> ModuleId {
        self.module
    }

    #[inline]
    pub fn is_watched(&self, name: Name) -> bool {
        self.watched.contains(&name)
    }

    #[inline]
    pub fn is_reserved(&self, name: Name) -> bool {
        self.reserved.contains(&name)
    }

    pub fn watched_count(&self) -> usize {
        self.watched.len()
    }

    /// Start watching `name`. Returns `true` only when the name was not
    /// watched before and is not reserved; the caller then installs the stub.
    pub(crate) fn register(&mut self, name: Name) -> bool {
        if self.is_reserved(name) {
            return false;
        }
        self.watched.insert(name)
    }
}

/// The stub installed for a watched `name`.
pub(crate) fn stub_for(name: Name) -> Method {
    Method::gate_stub(move |rt, call| {
        rt.method_missing(call.receiver(), name, call.args().to_vec())
    })
}

/// Pack a message for `method_missing(name, args)`.
pub(crate) fn missing_message(name: &str, args: Vec<Value>) -> Vec<Value> {
    vec![Value::str(name), Value::List(args)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn gate() -> DispatchGate {
        DispatchGate::new(ModuleId::from_raw(0), [Name::from_raw(1)])
    }

    #[test]
    fn test_register_is_append_only() {
        let mut gate = gate();
        let name = Name::from_raw(5);
        assert!(gate.register(name));
        assert!(!gate.register(name));
        assert!(gate.is_watched(name));
        assert_eq!(gate.watched_count(), 1);
    }

    #[test]
    fn test_reserved_names_are_never_watched() {
        let mut gate = gate();
        let reserved = Name::from_raw(1);
        assert!(gate.is_reserved(reserved));
        assert!(!gate.register(reserved));
        assert!(!gate.is_watched(reserved));
        assert_eq!(gate.watched_count(), 0);
    }

    #[test]
    fn test_stub_is_marked_as_gate() {
        assert!(stub_for(Name::from_raw(5)).is_gate_stub());
    }

    #[test]
    fn test_missing_message_layout() {
        assert_eq!(
            missing_message("fly", vec![Value::Int(1)]),
            vec![Value::str("fly"), Value::List(vec![Value::Int(1)])]
        );
    }
}
