//! Callable implementations, per-module method tables, and resolved slots.
//!
//! A [`MethodTable`] holds what a module *defines*. A [`SlotTable`] holds
//! what a resolution target *answers to*: the flattened view of its whole
//! ancestry, rewritten by resolution whenever the graph changes.

use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use weave_ir::Name;

use crate::chain::Call;
use crate::errors::EvalResult;
use crate::runtime::Runtime;

/// Signature of every method body.
///
/// The body receives the runtime (so it can send further messages and mutate
/// the graph) and its own call frame (receiver, arguments, and the cursor used
/// by [`Call::next`]).
pub type MethodFn = dyn Fn(&mut Runtime, &Call) -> EvalResult;

/// Where a method came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MethodOrigin {
    /// Defined by user code or the kernel.
    Defined,
    /// Stub installed by the dispatch gate for a watched name.
    Gate,
}

/// A callable implementation.
///
/// Cloning shares the body; identity (`same_body`) is what resolution compares
/// to decide whether a slot changed.
#[derive(Clone)]
pub struct Method {
    body: Rc<MethodFn>,
    calls_next: bool,
    origin: MethodOrigin,
}

impl Method {
    /// A method that never calls the next implementation in its chain.
    pub fn new(body: impl Fn(&mut Runtime, &Call) -> EvalResult + 'static) -> Self {
        Self {
            body: Rc::new(body),
            calls_next: false,
            origin: MethodOrigin::Defined,
        }
    }

    /// A method whose body calls [`Call::next`].
    ///
    /// Resolution stores these behind a super-call-capable slot so the chain
    /// is prepared before the body runs.
    pub fn overriding(body: impl Fn(&mut Runtime, &Call) -> EvalResult + 'static) -> Self {
        Self {
            body: Rc::new(body),
            calls_next: true,
            origin: MethodOrigin::Defined,
        }
    }

    pub(crate) fn gate_stub(body: impl Fn(&mut Runtime, &Call) -> EvalResult + 'static) -> Self {
        Self {
            body: Rc::new(body),
            calls_next: false,
            origin: MethodOrigin::Gate,
        }
    }

    #[inline]
    pub fn calls_next(&self) -> bool {
        self.calls_next
    }

    #[inline]
    pub fn origin(&self) -> MethodOrigin {
        self.origin
    }

    #[inline]
    pub fn is_gate_stub(&self) -> bool {
        self.origin == MethodOrigin::Gate
    }

    /// Whether both handles share one body.
    #[inline]
    pub fn same_body(&self, other: &Method) -> bool {
        Rc::ptr_eq(&self.body, &other.body)
    }

    #[inline]
    pub(crate) fn invoke(&self, rt: &mut Runtime, call: &Call) -> EvalResult {
        (self.body)(rt, call)
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("body", &Rc::as_ptr(&self.body).cast::<()>())
            .field("calls_next", &self.calls_next)
            .field("origin", &self.origin)
            .finish()
    }
}

/// A module's own implementations, keyed by name.
#[derive(Clone, Debug, Default)]
pub struct MethodTable {
    methods: FxHashMap<Name, Method>,
}

impl MethodTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; returns the previous implementation.
    pub fn insert(&mut self, name: Name, method: Method) -> Option<Method> {
        self.methods.insert(name, method)
    }

    pub fn get(&self, name: Name) -> Option<&Method> {
        self.methods.get(&name)
    }

    pub fn contains(&self, name: Name) -> bool {
        self.methods.contains_key(&name)
    }

    pub fn names(&self) -> impl Iterator<Item = Name> + '_ {
        self.methods.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Name, &Method)> {
        self.methods.iter().map(|(name, method)| (*name, method))
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

/// A resolved entry on a resolution target.
#[derive(Clone, Debug)]
pub enum Slot {
    /// Invoked as-is.
    Direct(Method),
    /// Invoked through the super-call chain of the receiver.
    Chained(Method),
}

impl Slot {
    /// Wrap `method` the way resolution stores it.
    pub fn for_method(method: &Method) -> Self {
        if method.calls_next() {
            Slot::Chained(method.clone())
        } else {
            Slot::Direct(method.clone())
        }
    }

    #[inline]
    pub fn method(&self) -> &Method {
        match self {
            Slot::Direct(method) | Slot::Chained(method) => method,
        }
    }

    /// A slot backed by a real definition rather than a gate stub.
    #[inline]
    pub fn is_defined(&self) -> bool {
        !self.method().is_gate_stub()
    }

    /// Whether two slots would behave identically.
    pub fn same_as(&self, other: &Slot) -> bool {
        match (self, other) {
            (Slot::Direct(a), Slot::Direct(b)) | (Slot::Chained(a), Slot::Chained(b)) => {
                a.same_body(b)
            }
            _ => false,
        }
    }
}

/// The materialized behavior surface of a resolution target.
#[derive(Clone, Debug, Default)]
pub struct SlotTable {
    slots: FxHashMap<Name, Slot>,
}

impl SlotTable {
    pub fn get(&self, name: Name) -> Option<&Slot> {
        self.slots.get(&name)
    }

    pub fn names(&self) -> impl Iterator<Item = Name> + '_ {
        self.slots.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Rewrite this table to match `fresh`, touching only entries whose
    /// backing implementation changed. Returns how many slots were written.
    pub(crate) fn sync(&mut self, fresh: FxHashMap<Name, Slot>) -> usize {
        self.slots.retain(|name, _| fresh.contains_key(name));
        let mut written = 0;
        for (name, slot) in fresh {
            match self.slots.get(&name) {
                Some(existing) if existing.same_as(&slot) => {}
                _ => {
                    self.slots.insert(name, slot);
                    written += 1;
                }
            }
        }
        written
    }
}

#[cfg(test)]
mod tests;
