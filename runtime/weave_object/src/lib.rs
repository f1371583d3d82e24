//! Weave Object - runtime module/class composition engine.
//!
//! Modules are mixed into one another and into classes; every receiver sees a
//! resolved view of its linearized ancestry that stays current as the graph
//! changes after the fact.
//!
//! # Architecture
//!
//! - `ModuleGraph`: arena of modules with `included` and `dependents` edges
//! - `AncestryResolver`: deduplicated post-order linearization
//! - `SlotTable`: the resolved behavior of a class prototype, class side, or
//!   object eigenclass, rewritten by `Runtime::resolve`
//! - `Call`: per-invocation frame carrying the super-call cursor
//! - `DispatchGate`: routes unknown names to `method_missing`
//! - `Runtime`: owns all of the above; every public operation lives on it
//!
//! # Re-exports
//!
//! `Name` and the interner types come from `weave_ir`.

mod ancestry;
mod chain;
pub mod errors;
mod gate;
mod method;
mod module;
mod object;
mod runtime;
mod stack;
mod value;

use std::sync::Once;

pub use ancestry::AncestryResolver;
pub use chain::Call;
pub use errors::{DispatchError, DispatchErrorKind, EvalResult};
pub use gate::DispatchGate;
pub use method::{Method, MethodFn, MethodOrigin, MethodTable, Slot, SlotTable};
pub use module::{
    Hook, IncludeOptions, ModuleData, ModuleGraph, ModuleHooks, ModuleId, Record,
    ResolutionTarget, Source,
};
pub use object::{Ancestor, ClassId, ObjectId, Receiver};
pub use runtime::{BoundMethod, MethodAddedObserver, Runtime, RuntimeBuilder, RuntimeConfig};
pub use value::Value;
pub use weave_ir::{Name, SharedInterner, StringInterner};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call multiple times. Does nothing unless `RUST_LOG` is set, e.g.
/// `RUST_LOG=weave_object=debug` for graph edits or `=trace` for slot writes.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
