//! Super-call chains and the per-invocation call frame.
//!
//! # Cursor Model
//!
//! A chain is the `lookup` list of one receiver and name: every
//! implementation along the receiver's ancestry, most specific last. The frame
//! of an invocation remembers which entry is running; `next` invokes the one
//! directly below it with a fresh frame, so nested and re-entrant calls never
//! share cursor state.
//!
//! ```text
//! callees = [Base#greet, Mixin#greet, Own#greet]
//!                                     ^ index 2 (entered from the slot)
//! Own#greet calls next   -> Mixin#greet runs with index 1
//! Mixin#greet calls next -> Base#greet runs with index 0
//! Base#greet calls next  -> exhausted: method_missing or NoSuperMethod
//! ```

use std::rc::Rc;

use weave_ir::Name;

use crate::errors::EvalResult;
use crate::method::Method;
use crate::object::Receiver;
use crate::runtime::Runtime;
use crate::value::Value;

/// Position of a running implementation inside its chain.
#[derive(Clone, Debug)]
pub(crate) struct ChainCursor {
    pub(crate) callees: Rc<[Method]>,
    pub(crate) index: usize,
}

/// The frame handed to every method body.
#[derive(Debug)]
pub struct Call {
    receiver: Receiver,
    name: Name,
    args: Vec<Value>,
    cursor: Option<ChainCursor>,
}

impl Call {
    /// A frame for a slot invoked without a prepared chain.
    pub(crate) fn direct(receiver: Receiver, name: Name, args: Vec<Value>) -> Self {
        Self {
            receiver,
            name,
            args,
            cursor: None,
        }
    }

    /// A frame positioned at `index` of `callees`.
    pub(crate) fn chained(
        receiver: Receiver,
        name: Name,
        args: Vec<Value>,
        callees: Rc<[Method]>,
        index: usize,
    ) -> Self {
        Self {
            receiver,
            name,
            args,
            cursor: Some(ChainCursor { callees, index }),
        }
    }

    #[inline]
    pub fn receiver(&self) -> Receiver {
        self.receiver
    }

    /// The receiver as a value, for passing it on.
    pub fn receiver_value(&self) -> Value {
        self.receiver.into()
    }

    #[inline]
    pub fn name(&self) -> Name {
        self.name
    }

    #[inline]
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// The `index`-th argument, or `Void` when the caller passed fewer.
    pub fn arg(&self, index: usize) -> Value {
        self.args.get(index).cloned().unwrap_or_default()
    }

    pub(crate) fn cursor(&self) -> Option<&ChainCursor> {
        self.cursor.as_ref()
    }

    /// The current arguments with `overrides` laid over the leading positions.
    pub(crate) fn overlay(&self, overrides: &[Value]) -> Vec<Value> {
        let mut merged = self.args.clone();
        for (i, value) in overrides.iter().enumerate() {
            match merged.get_mut(i) {
                Some(slot) => *slot = value.clone(),
                None => merged.push(value.clone()),
            }
        }
        merged
    }

    /// Invoke the next implementation down the chain.
    ///
    /// `args` replace the current arguments position by position; pass `&[]`
    /// to forward them unchanged.
    ///
    /// # Errors
    /// Returns `NoSuperMethod` when the chain is exhausted and the receiver
    /// has no custom `method_missing`, or whatever the invoked body returns.
    pub fn next(&self, rt: &mut Runtime, args: &[Value]) -> EvalResult {
        rt.call_next(self, args)
    }
}
