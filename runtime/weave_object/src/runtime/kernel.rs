//! The root module mixed into every class.
//!
//! The kernel carries the message-not-understood handler and the
//! introspection methods. It includes the dispatch gate module first, so gate
//! stubs sit below every real definition in any ancestry.

use weave_ir::{Name, StringInterner};

use crate::errors::{
    undefined_method, wrong_arg_count, wrong_arg_type, DispatchError, EvalResult,
};
use crate::method::Method;
use crate::module::{ModuleGraph, ModuleId};
use crate::object::Ancestor;
use crate::value::Value;

/// Pre-interned names the runtime consults on hot paths.
///
/// Interned once at construction so dispatch compares `Name`s instead of
/// hashing strings.
#[derive(Clone, Copy)]
pub(crate) struct KernelNames {
    pub(crate) method_missing: Name,
    pub(crate) initialize: Name,
    pub(crate) inspect: Name,
    pub(crate) respond_to: Name,
    pub(crate) is_a: Name,
}

impl KernelNames {
    pub(crate) fn new(interner: &StringInterner) -> Self {
        Self {
            method_missing: interner.intern("method_missing"),
            initialize: interner.intern("initialize"),
            inspect: interner.intern("inspect"),
            respond_to: interner.intern("respond_to"),
            is_a: interner.intern("is_a"),
        }
    }
}

/// The default `method_missing(name, args)`: always fails, naming the
/// message and the receiver.
pub(crate) fn default_handler() -> Method {
    Method::new(|rt, call| match call.arg(0) {
        Value::Str(name) => Err(undefined_method(&name, &rt.describe(call.receiver()))),
        other => Err(wrong_arg_type("str", &other)),
    })
}

fn single_arg(method: &str, args: &[Value]) -> Result<Value, DispatchError> {
    match args {
        [arg] => Ok(arg.clone()),
        _ => Err(wrong_arg_count(method, 1, args.len())),
    }
}

fn inspect() -> Method {
    Method::new(|rt, call| Ok(Value::Str(rt.default_inspect(call.receiver()))))
}

fn respond_to() -> Method {
    Method::new(|rt, call| -> EvalResult {
        let Value::Str(name) = single_arg("respond_to", call.args())? else {
            return Err(wrong_arg_type("str", &call.arg(0)));
        };
        let name = rt.intern(&name);
        Ok(Value::Bool(rt.respond_to(call.receiver(), name)))
    })
}

fn is_a() -> Method {
    Method::new(|rt, call| -> EvalResult {
        let ancestor = match single_arg("is_a", call.args())? {
            Value::Module(id) => Ancestor::Module(id),
            Value::Class(id) => Ancestor::Class(id),
            other => return Err(wrong_arg_type("module or class", &other)),
        };
        Ok(Value::Bool(rt.is_a(call.receiver(), ancestor)))
    })
}

/// Store the kernel's native methods in `kernel`'s own table.
pub(crate) fn install(
    graph: &mut ModuleGraph,
    kernel: ModuleId,
    names: KernelNames,
    handler: Method,
) {
    graph.set_method(kernel, names.method_missing, handler);
    graph.set_method(kernel, names.inspect, inspect());
    graph.set_method(kernel, names.respond_to, respond_to());
    graph.set_method(kernel, names.is_a, is_a());
}
