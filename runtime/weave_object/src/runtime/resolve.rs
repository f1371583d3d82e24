//! Propagation of graph edits into resolved slot tables.
//!
//! # Resolution
//!
//! After an edit to module `M`, every module whose behavior may have changed
//! is `M` plus the transitive closure of its dependents. Each of those holding
//! a [`ResolutionTarget`] recomputes its linearization (gate module included)
//! and folds the method tables into a fresh name-to-slot map, later modules
//! overwriting earlier ones. The target table is then synced against that map:
//! only slots whose backing implementation changed are rewritten.
//!
//! Resolution is idempotent. Running it twice, or re-entering it from a hook
//! that mutates the graph, converges on the same tables.

use rustc_hash::FxHashMap;
use tracing::trace;
use weave_ir::Name;

use super::Runtime;
use crate::ancestry::AncestryResolver;
use crate::method::{Slot, SlotTable};
use crate::module::{ModuleId, ResolutionTarget};

impl Runtime {
    /// Re-resolve `from` and everything that depends on it.
    ///
    /// Called automatically by every mutating operation unless it was asked to
    /// defer; call it directly after a batch of deferred edits.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn resolve(&mut self, from: ModuleId) {
        for id in self.graph.dependents_closure(from) {
            if let Some(target) = self.graph.get(id).target() {
                self.resolve_target(id, target);
            }
        }
    }

    fn resolve_target(&mut self, id: ModuleId, target: ResolutionTarget) {
        let fresh = self.fresh_slots(id);
        let written = self.target_table_mut(target).sync(fresh);
        if written > 0 {
            trace!(module = id.index(), ?target, written, "rewrote slots");
        }
    }

    fn fresh_slots(&self, id: ModuleId) -> FxHashMap<Name, Slot> {
        let mut fresh = FxHashMap::default();
        for module in AncestryResolver::new(&self.graph).with_hidden().linearize(id) {
            for (name, method) in self.graph.get(module).methods().iter() {
                fresh.insert(name, Slot::for_method(method));
            }
        }
        fresh
    }

    fn target_table_mut(&mut self, target: ResolutionTarget) -> &mut SlotTable {
        match target {
            ResolutionTarget::ClassPrototype(id) => &mut self.classes[id.index()].prototype,
            ResolutionTarget::ClassSide(id) => &mut self.classes[id.index()].class_side.slots,
            ResolutionTarget::Object(id) => &mut self.objects[id.index()].singleton.slots,
            ResolutionTarget::ClassBase => &mut self.class_base,
            ResolutionTarget::ModuleSide(id) => &mut self.module_sides.entry(id).or_default().slots,
            ResolutionTarget::ModuleBase => &mut self.module_base,
        }
    }
}
