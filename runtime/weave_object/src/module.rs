//! Module nodes and the arena that owns them.
//!
//! The graph is an explicit directed graph: `included` edges point from a
//! module to the modules it composes, `dependents` edges point back. Nodes are
//! addressed by [`ModuleId`]. Removing a node unlinks it from both edge lists
//! and puts its slot on a free list for the next allocation.

use std::rc::Rc;

use smallvec::SmallVec;
use weave_ir::Name;

use crate::method::{Method, MethodTable};
use crate::object::{ClassId, ObjectId};
use crate::runtime::Runtime;
use crate::value::Value;

/// Index of a module in the [`ModuleGraph`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(u32);

impl ModuleId {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        ModuleId(raw)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// The concrete surface a module keeps in sync with its linearization.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ResolutionTarget {
    /// Slot table shared by every instance of the class without an eigenclass.
    ClassPrototype(ClassId),
    /// Class-level ("static") slot table of the class.
    ClassSide(ClassId),
    /// Singleton slot table of one object.
    Object(ObjectId),
    /// Fallback class-level table for classes without an eigenclass.
    ClassBase,
    /// Singleton slot table of a module used as a receiver.
    ModuleSide(ModuleId),
    /// Fallback table for modules without an eigenclass.
    ModuleBase,
}

/// Callback fired when a module is included into another module or extended
/// onto a receiver. Receives the includer (or the extended receiver).
pub type Hook = Rc<dyn Fn(&mut Runtime, Value)>;

/// Optional lifecycle callbacks of a module.
#[derive(Clone, Default)]
pub struct ModuleHooks {
    pub included: Option<Hook>,
    pub extended: Option<Hook>,
}

/// One node of the graph.
#[derive(Default)]
pub struct ModuleData {
    pub(crate) name: Option<Name>,
    pub(crate) methods: MethodTable,
    pub(crate) included: SmallVec<[ModuleId; 4]>,
    pub(crate) dependents: SmallVec<[ModuleId; 4]>,
    pub(crate) target: Option<ResolutionTarget>,
    pub(crate) hooks: ModuleHooks,
    /// Hidden modules are resolved into slots but never reported as ancestors.
    pub(crate) hidden: bool,
}

impl ModuleData {
    pub fn name(&self) -> Option<Name> {
        self.name
    }

    pub fn methods(&self) -> &MethodTable {
        &self.methods
    }

    pub fn included(&self) -> &[ModuleId] {
        &self.included
    }

    pub fn dependents(&self) -> &[ModuleId] {
        &self.dependents
    }

    pub fn target(&self) -> Option<ResolutionTarget> {
        self.target
    }
}

/// Arena of modules plus the mutation generation counter.
///
/// Every edit bumps `generation`; cached super-call chains compare against it
/// to know when they went stale.
#[derive(Default)]
pub struct ModuleGraph {
    modules: Vec<ModuleData>,
    free: Vec<ModuleId>,
    generation: u64,
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an empty module.
    ///
    /// # Panics
    /// Panics if more than `u32::MAX` modules are allocated.
    pub fn alloc(&mut self, name: Option<Name>, target: Option<ResolutionTarget>) -> ModuleId {
        let data = ModuleData {
            name,
            target,
            ..ModuleData::default()
        };
        if let Some(id) = self.free.pop() {
            self.modules[id.index()] = data;
            return id;
        }
        let id = u32::try_from(self.modules.len())
            .unwrap_or_else(|_| panic!("module arena exceeded u32::MAX entries"));
        self.modules.push(data);
        ModuleId(id)
    }

    /// Unlink `id` from every edge and free its slot.
    ///
    /// Returns the modules that included `id`; the caller re-resolves them.
    pub(crate) fn remove(&mut self, id: ModuleId) -> SmallVec<[ModuleId; 4]> {
        let data = std::mem::take(self.get_mut(id));
        for &inc in &data.included {
            self.get_mut(inc).dependents.retain(|dep| *dep != id);
        }
        for &dep in &data.dependents {
            self.get_mut(dep).included.retain(|inc| *inc != id);
        }
        self.free.push(id);
        self.bump_generation();
        data.dependents
    }

    /// Borrow a module.
    ///
    /// Ids are only minted by this arena, so indexing cannot miss for ids
    /// obtained from the same runtime.
    #[inline]
    pub fn get(&self, id: ModuleId) -> &ModuleData {
        &self.modules[id.index()]
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, id: ModuleId) -> &mut ModuleData {
        &mut self.modules[id.index()]
    }

    /// Number of live modules.
    pub fn len(&self) -> usize {
        self.modules.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn bump_generation(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    /// Store `method` under `name` in `owner`'s own table.
    pub(crate) fn set_method(&mut self, owner: ModuleId, name: Name, method: Method) {
        self.get_mut(owner).methods.insert(name, method);
        self.bump_generation();
    }

    /// Append an inclusion edge and register the back-pointer.
    ///
    /// The forward edge may repeat; linearization dedups it. The back-pointer
    /// is stored once.
    pub(crate) fn add_edge(&mut self, owner: ModuleId, other: ModuleId) {
        self.get_mut(owner).included.push(other);
        let dependents = &mut self.get_mut(other).dependents;
        if !dependents.contains(&owner) {
            dependents.push(owner);
        }
        self.bump_generation();
    }

    pub(crate) fn set_hidden(&mut self, id: ModuleId) {
        self.get_mut(id).hidden = true;
    }
}

/// What `include` and `extend` accept.
#[derive(Clone)]
pub enum Source {
    /// A real module: establishes a graph edge.
    Module(ModuleId),
    /// A plain data record: flattened into the owner.
    Record(Record),
}

impl From<ModuleId> for Source {
    fn from(id: ModuleId) -> Self {
        Source::Module(id)
    }
}

impl From<Record> for Source {
    fn from(record: Record) -> Self {
        Source::Record(record)
    }
}

/// A plain record of methods with optional nested `include`/`extend` lists.
///
/// Including a record copies its methods into the owner instead of adding an
/// edge; nested sources are applied first.
#[derive(Clone, Default)]
pub struct Record {
    pub(crate) methods: Vec<(String, Method)>,
    pub(crate) include: Vec<Source>,
    pub(crate) extend: Vec<Source>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn method(mut self, name: impl Into<String>, method: Method) -> Self {
        self.methods.push((name.into(), method));
        self
    }

    #[must_use]
    pub fn include(mut self, source: impl Into<Source>) -> Self {
        self.include.push(source.into());
        self
    }

    #[must_use]
    pub fn extend(mut self, source: impl Into<Source>) -> Self {
        self.extend.push(source.into());
        self
    }
}

/// Options for [`Runtime::include`].
#[derive(Clone, Debug)]
pub struct IncludeOptions {
    /// Value reported to method-added observers for flattened records.
    /// Defaults to the includer.
    pub notify_as: Option<Value>,
    /// Run resolution after the edit. `false` batches edits; call
    /// [`Runtime::resolve`] afterwards.
    pub resolve: bool,
}

impl Default for IncludeOptions {
    fn default() -> Self {
        Self {
            notify_as: None,
            resolve: true,
        }
    }
}

impl IncludeOptions {
    /// Skip resolution for this edit.
    #[must_use]
    pub fn deferred() -> Self {
        Self {
            resolve: false,
            ..Self::default()
        }
    }
}
