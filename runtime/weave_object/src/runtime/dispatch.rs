//! Message sends, super-call chains, and the message-not-understood path.
//!
//! # Dispatch Order
//!
//! 1. Read the receiver's resolved slot for the name.
//! 2. If there is none, start watching the name so the gate installs a stub,
//!    then read again.
//! 3. Still nothing (reserved name): hand the message to `method_missing`.
//! 4. `Direct` slots run as-is; `Chained` slots run with a cursor positioned at
//!    the most specific entry of the receiver's chain.

use std::rc::Rc;

use weave_ir::Name;

use super::Runtime;
use crate::chain::Call;
use crate::errors::{no_super_method, EvalResult};
use crate::gate::missing_message;
use crate::method::{Method, Slot, SlotTable};
use crate::object::{CachedChain, ClassId, Receiver, Singleton};
use crate::stack::ensure_sufficient_stack;
use crate::value::Value;

impl Runtime {
    /// Send `name` with `args` to `receiver`.
    ///
    /// An unknown, non-reserved name is watched from then on. Its string is
    /// interned for the life of the process and its gate stub is never
    /// removed. The first miss re-resolves every module that depends on the
    /// gate; later misses on the same name cost a slot lookup.
    #[tracing::instrument(level = "trace", skip(self, args))]
    pub fn send(&mut self, receiver: Receiver, name: Name, args: Vec<Value>) -> EvalResult {
        let slot = match self.slot(receiver, name).cloned() {
            Some(slot) => slot,
            None => {
                if self.watch(name) {
                    self.resolve(self.gate.module());
                }
                match self.slot(receiver, name).cloned() {
                    Some(slot) => slot,
                    None => return self.method_missing(receiver, name, args),
                }
            }
        };
        self.invoke_slot(receiver, name, &slot, args)
    }

    /// Send by string name, interning it first.
    pub fn send_str(&mut self, receiver: Receiver, name: &str, args: Vec<Value>) -> EvalResult {
        let name = self.intern(name);
        self.send(receiver, name, args)
    }

    pub(crate) fn invoke_slot(
        &mut self,
        receiver: Receiver,
        name: Name,
        slot: &Slot,
        args: Vec<Value>,
    ) -> EvalResult {
        match slot {
            Slot::Direct(method) => {
                let call = Call::direct(receiver, name, args);
                ensure_sufficient_stack(|| method.invoke(self, &call))
            }
            Slot::Chained(method) => {
                let callees = self.chain_for(receiver, name);
                let index = callees.len().saturating_sub(1);
                let call = Call::chained(receiver, name, args, callees, index);
                ensure_sufficient_stack(|| method.invoke(self, &call))
            }
        }
    }

    /// Invoke the implementation below `call`'s cursor.
    ///
    /// A frame without a cursor (a `Direct` method calling next) gets its
    /// chain computed here, positioned at the most specific entry.
    ///
    /// # Errors
    /// `NoSuperMethod` when the chain is exhausted and the receiver's
    /// `method_missing` is the kernel default.
    pub fn call_next(&mut self, call: &Call, args: &[Value]) -> EvalResult {
        let (callees, index) = match call.cursor() {
            Some(cursor) => (Rc::clone(&cursor.callees), cursor.index),
            None => {
                let callees = self.chain_for(call.receiver(), call.name());
                let index = callees.len().saturating_sub(1);
                (callees, index)
            }
        };
        let args = call.overlay(args);

        let next = index
            .checked_sub(1)
            .and_then(|below| Some((below, callees.get(below)?.clone())));
        let Some((below, method)) = next else {
            return self.exhausted(call.receiver(), call.name(), args);
        };
        let frame = Call::chained(call.receiver(), call.name(), args, callees, below);
        ensure_sufficient_stack(|| method.invoke(self, &frame))
    }

    /// The super-call chain of `name` for `receiver`, cached until the graph
    /// changes.
    pub(crate) fn chain_for(&mut self, receiver: Receiver, name: Name) -> Rc<[Method]> {
        let generation = self.graph.generation();
        let cached = self
            .singleton(receiver)
            .and_then(|singleton| singleton.cached_chain(name, generation));
        if let Some(callees) = cached {
            return callees;
        }
        let module = self.effective_module(receiver);
        let callees: Rc<[Method]> = self.graph.lookup(module, name).into();
        self.singleton_mut(receiver).chains.insert(
            name,
            CachedChain {
                generation,
                callees: Rc::clone(&callees),
            },
        );
        callees
    }

    fn exhausted(&mut self, receiver: Receiver, name: Name, args: Vec<Value>) -> EvalResult {
        if self.has_custom_handler(receiver) {
            return self.method_missing(receiver, name, args);
        }
        Err(no_super_method(self.name_str(name), &self.describe(receiver)))
    }

    fn has_custom_handler(&self, receiver: Receiver) -> bool {
        self.slot(receiver, self.names.method_missing)
            .is_some_and(|slot| !slot.method().same_body(&self.default_handler))
    }

    /// Route `name(args)` to the receiver's `method_missing`.
    pub(crate) fn method_missing(
        &mut self,
        receiver: Receiver,
        name: Name,
        args: Vec<Value>,
    ) -> EvalResult {
        let handler_name = self.names.method_missing;
        let message = missing_message(self.name_str(name), args);
        match self.slot(receiver, handler_name).cloned() {
            Some(slot) => self.invoke_slot(receiver, handler_name, &slot, message),
            None => {
                let handler = self.default_handler.clone();
                handler.invoke(self, &Call::direct(receiver, handler_name, message))
            }
        }
    }

    /// The receiver's `inspect` text, falling back to the built-in form if
    /// `inspect` fails or returns a non-string.
    ///
    /// A receiver whose `inspect` ends up describing itself again (say, by
    /// sending an unknown message) gets the built-in form for the inner call.
    pub fn describe(&mut self, receiver: Receiver) -> String {
        if !self.describing.insert(receiver) {
            return self.default_inspect(receiver);
        }
        let inspected = self.send(receiver, self.names.inspect, Vec::new());
        self.describing.remove(&receiver);
        match inspected {
            Ok(Value::Str(text)) => text,
            _ => self.default_inspect(receiver),
        }
    }

    /// `#<ClassName>` for objects, the class name for classes, the module
    /// name for modules.
    pub fn default_inspect(&self, receiver: Receiver) -> String {
        match receiver {
            Receiver::Object(id) => format!("#<{}>", self.class_name(self.class_of(id))),
            Receiver::Class(id) => self.class_name(id).to_string(),
            Receiver::Module(id) => self.module_label(id),
        }
    }

    /// Whether `receiver` has a real (non-gate) implementation of `name`.
    pub fn respond_to(&self, receiver: Receiver, name: Name) -> bool {
        self.slot(receiver, name).is_some_and(Slot::is_defined)
    }

    pub(crate) fn slot(&self, receiver: Receiver, name: Name) -> Option<&Slot> {
        self.slot_table(receiver).get(name)
    }

    /// The table a receiver answers from.
    ///
    /// Objects without an eigenclass share their class prototype. Classes
    /// without an eigenclass borrow the nearest superclass's class side, or the
    /// runtime's base table. Modules without one share the module base table.
    fn slot_table(&self, receiver: Receiver) -> &SlotTable {
        match receiver {
            Receiver::Object(id) => {
                let object = &self.objects[id.index()];
                if object.singleton.eigenclass.is_some() {
                    &object.singleton.slots
                } else {
                    &self.classes[object.class.index()].prototype
                }
            }
            Receiver::Class(id) => match self.class_side_owner(id) {
                Some(owner) => &self.classes[owner.index()].class_side.slots,
                None => &self.class_base,
            },
            Receiver::Module(id) => match self.module_sides.get(&id) {
                Some(side) if side.eigenclass.is_some() => &side.slots,
                _ => &self.module_base,
            },
        }
    }

    /// The nearest class, starting at `id`, with a materialized eigenclass.
    pub(crate) fn class_side_owner(&self, id: ClassId) -> Option<ClassId> {
        let mut current = Some(id);
        while let Some(class) = current {
            let data = &self.classes[class.index()];
            if data.class_side.eigenclass.is_some() {
                return Some(class);
            }
            current = data.superclass;
        }
        None
    }

    fn singleton(&self, receiver: Receiver) -> Option<&Singleton> {
        match receiver {
            Receiver::Object(id) => Some(&self.objects[id.index()].singleton),
            Receiver::Class(id) => Some(&self.classes[id.index()].class_side),
            Receiver::Module(id) => self.module_sides.get(&id),
        }
    }

    fn singleton_mut(&mut self, receiver: Receiver) -> &mut Singleton {
        match receiver {
            Receiver::Object(id) => &mut self.objects[id.index()].singleton,
            Receiver::Class(id) => &mut self.classes[id.index()].class_side,
            Receiver::Module(id) => self.module_sides.entry(id).or_default(),
        }
    }
}
