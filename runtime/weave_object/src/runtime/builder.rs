//! `RuntimeBuilder` for creating `Runtime` instances with various configurations.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;
use weave_ir::SharedInterner;

use super::kernel::{self, KernelNames};
use super::Runtime;
use crate::gate::DispatchGate;
use crate::method::SlotTable;
use crate::module::{ModuleGraph, ResolutionTarget};

/// Names the runtime reads at construction.
#[derive(Clone, Debug, Default)]
pub struct RuntimeConfig {
    /// Names routed through the dispatch gate from the start.
    pub watched_names: Vec<String>,
    /// Names the gate must never shadow. `method_missing` and `initialize`
    /// are always reserved, whether listed or not.
    pub reserved_names: Vec<String>,
}

/// Builder for creating `Runtime` instances.
///
/// ```text
/// let rt = Runtime::builder()
///     .watch("fly")
///     .reserve("constructor")
///     .build();
/// ```
#[derive(Default)]
pub struct RuntimeBuilder {
    interner: Option<SharedInterner>,
    config: RuntimeConfig,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Share an interner the host already uses.
    #[must_use]
    pub fn interner(mut self, interner: SharedInterner) -> Self {
        self.interner = Some(interner);
        self
    }

    /// Replace the whole configuration.
    #[must_use]
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn watch(mut self, name: impl Into<String>) -> Self {
        self.config.watched_names.push(name.into());
        self
    }

    #[must_use]
    pub fn reserve(mut self, name: impl Into<String>) -> Self {
        self.config.reserved_names.push(name.into());
        self
    }

    /// Bootstrap the kernel, the gate, and the module- and class-side base
    /// modules.
    pub fn build(self) -> Runtime {
        let interner = self.interner.unwrap_or_default();
        let names = KernelNames::new(&interner);

        let mut graph = ModuleGraph::new();
        let gate_module = graph.alloc(None, None);
        graph.set_hidden(gate_module);
        let kernel = graph.alloc(Some(interner.intern("Kernel")), None);
        graph.add_edge(kernel, gate_module);
        let module_root = graph.alloc(
            Some(interner.intern("Module")),
            Some(ResolutionTarget::ModuleBase),
        );
        graph.add_edge(module_root, kernel);
        let class_module = graph.alloc(
            Some(interner.intern("Class")),
            Some(ResolutionTarget::ClassBase),
        );
        graph.add_edge(class_module, module_root);

        let default_handler = kernel::default_handler();
        kernel::install(&mut graph, kernel, names, default_handler.clone());

        let reserved = self
            .config
            .reserved_names
            .iter()
            .map(|name| interner.intern(name))
            .chain([names.method_missing, names.initialize]);
        let gate = DispatchGate::new(gate_module, reserved);

        let mut rt = Runtime {
            names,
            graph,
            classes: Vec::new(),
            objects: Vec::new(),
            gate,
            kernel,
            module_root,
            module_base: SlotTable::default(),
            module_sides: FxHashMap::default(),
            class_module,
            class_base: SlotTable::default(),
            default_handler,
            observers: Vec::new(),
            describing: FxHashSet::default(),
            free_objects: Vec::new(),
            interner,
        };
        for name in &self.config.watched_names {
            let name = rt.intern(name);
            rt.watch(name);
        }
        rt.resolve(gate_module);

        debug!(
            watched = rt.gate.watched_count(),
            modules = rt.graph.len(),
            "runtime bootstrapped"
        );
        rt
    }
}
