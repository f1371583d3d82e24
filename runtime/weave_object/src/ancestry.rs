//! Linearization of the inclusion graph.
//!
//! # Resolution Order
//!
//! The ancestry of a module is its depth-first, post-order walk over
//! `included`, with the module itself appended last and every node kept only
//! at its first occurrence:
//!
//! ```text
//! A includes [B, C]; B includes [D]; C includes [D]
//! ancestors(A) = [D, B, C, A]
//! ```
//!
//! A node is marked when the walk *enters* it, so inclusion cycles (including
//! a module that transitively includes itself) terminate and simply dedup.
//!
//! The same order drives `is_a` queries, super-call chains (`lookup`), and slot
//! resolution: later entries shadow earlier ones.

use rustc_hash::FxHashSet;
use weave_ir::Name;

use crate::method::Method;
use crate::module::{ModuleGraph, ModuleId};
use crate::stack::ensure_sufficient_stack;

/// Computes linearizations over a borrowed graph.
pub struct AncestryResolver<'g> {
    graph: &'g ModuleGraph,
    show_hidden: bool,
}

impl<'g> AncestryResolver<'g> {
    /// A resolver that omits hidden modules (the dispatch gate).
    pub fn new(graph: &'g ModuleGraph) -> Self {
        Self {
            graph,
            show_hidden: false,
        }
    }

    /// Also report hidden modules. Used by slot resolution, which must see
    /// gate stubs.
    #[must_use]
    pub fn with_hidden(mut self) -> Self {
        self.show_hidden = true;
        self
    }

    /// The deduplicated post-order inclusion list of `root`, `root` last.
    pub fn linearize(&self, root: ModuleId) -> Vec<ModuleId> {
        let mut seen = FxHashSet::default();
        let mut out = Vec::new();
        self.visit(root, &mut seen, &mut out);
        out
    }

    fn visit(&self, id: ModuleId, seen: &mut FxHashSet<ModuleId>, out: &mut Vec<ModuleId>) {
        if !seen.insert(id) {
            return;
        }
        let module = self.graph.get(id);
        for &inc in &module.included {
            ensure_sufficient_stack(|| self.visit(inc, seen, out));
        }
        if self.show_hidden || !module.hidden {
            out.push(id);
        }
    }

    /// Whether `target` is `from` or reachable from it through `included`.
    pub fn reaches(&self, from: ModuleId, target: ModuleId) -> bool {
        let mut seen = FxHashSet::default();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            if id == target {
                return true;
            }
            if seen.insert(id) {
                stack.extend(self.graph.get(id).included.iter().copied());
            }
        }
        false
    }
}

impl ModuleGraph {
    /// The ancestry of `id` (hidden modules omitted).
    pub fn ancestors(&self, id: ModuleId) -> Vec<ModuleId> {
        AncestryResolver::new(self).linearize(id)
    }

    /// True if `target` is `id` or appears in its transitive `included` closure.
    pub fn includes(&self, id: ModuleId, target: ModuleId) -> bool {
        AncestryResolver::new(self).reaches(id, target)
    }

    /// Every implementation of `name` along the ancestry of `id`, in ancestry
    /// order: the most specific implementation is last.
    ///
    /// Only modules that define `name` themselves contribute. This list is the
    /// super-call chain.
    pub fn lookup(&self, id: ModuleId, name: Name) -> Vec<Method> {
        self.ancestors(id)
            .into_iter()
            .filter_map(|m| self.get(m).methods.get(name).cloned())
            .collect()
    }

    /// The most specific implementation of `name`, if any.
    pub fn instance_method(&self, id: ModuleId, name: Name) -> Option<Method> {
        self.lookup(id, name).pop()
    }

    /// Distinct method names visible through `id`.
    ///
    /// With `include_inherited == false` only `id`'s own names are returned.
    /// Names come out in ancestry order, most specific module first.
    pub fn instance_methods(&self, id: ModuleId, include_inherited: bool) -> Vec<Name> {
        let modules = if include_inherited {
            let mut ancestors = self.ancestors(id);
            ancestors.reverse();
            ancestors
        } else {
            vec![id]
        };

        let mut seen = FxHashSet::default();
        let mut names = Vec::new();
        for module in modules {
            let mut own: Vec<Name> = self.get(module).methods.names().collect();
            own.sort_unstable();
            for name in own {
                if seen.insert(name) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Every module whose resolution depends on `id`: `id` itself plus the
    /// transitive closure of its dependents, each listed once.
    pub fn dependents_closure(&self, id: ModuleId) -> Vec<ModuleId> {
        let mut seen = FxHashSet::default();
        let mut order = Vec::new();
        let mut queue = std::collections::VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current) {
                continue;
            }
            order.push(current);
            queue.extend(self.get(current).dependents.iter().copied());
        }
        order
    }
}

#[cfg(test)]
mod tests;
