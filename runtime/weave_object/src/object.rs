//! Classes, instances, and their singleton behavior spaces.
//!
//! Objects live in an arena. A released slot is handed out again by the next
//! `instantiate`, so an `ObjectId` must not be used after its object is
//! released.

use std::rc::Rc;

use rustc_hash::FxHashMap;
use weave_ir::Name;

use crate::method::{Method, SlotTable};
use crate::module::ModuleId;
use crate::value::Value;

/// Index of a class in the runtime's class arena.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(u32);

impl ClassId {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        ClassId(raw)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of an instance in the runtime's object arena.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u32);

impl ObjectId {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        ObjectId(raw)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Anything that can be sent a message.
///
/// Modules are receivers too: they answer the kernel methods and can be
/// extended like any object.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Receiver {
    Object(ObjectId),
    Class(ClassId),
    Module(ModuleId),
}

/// One entry of a linearization as seen from outside: a class's own module is
/// reported as the class itself.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Ancestor {
    Module(ModuleId),
    Class(ClassId),
}

impl From<ModuleId> for Ancestor {
    fn from(id: ModuleId) -> Self {
        Ancestor::Module(id)
    }
}

impl From<ClassId> for Ancestor {
    fn from(id: ClassId) -> Self {
        Ancestor::Class(id)
    }
}

/// A super-call chain computed for one (receiver, name) pair.
#[derive(Clone, Debug)]
pub(crate) struct CachedChain {
    pub(crate) generation: u64,
    pub(crate) callees: Rc<[Method]>,
}

/// Per-receiver singleton state.
///
/// `eigenclass` is created lazily on first `extend`; until then the receiver
/// answers through its class's shared table and `slots` stays empty.
#[derive(Debug, Default)]
pub(crate) struct Singleton {
    pub(crate) eigenclass: Option<ModuleId>,
    pub(crate) slots: SlotTable,
    pub(crate) chains: FxHashMap<Name, CachedChain>,
}

impl Singleton {
    /// The cached chain for `name`, if it was computed at `generation`.
    pub(crate) fn cached_chain(&self, name: Name, generation: u64) -> Option<Rc<[Method]>> {
        self.chains
            .get(&name)
            .filter(|chain| chain.generation == generation)
            .map(|chain| Rc::clone(&chain.callees))
    }
}

pub(crate) struct ClassData {
    pub(crate) name: Name,
    /// The class's own module; its resolution target is `prototype`.
    pub(crate) instance_module: ModuleId,
    pub(crate) superclass: Option<ClassId>,
    /// Slots shared by every instance without an eigenclass.
    pub(crate) prototype: SlotTable,
    /// Class-level behavior.
    pub(crate) class_side: Singleton,
}

pub(crate) struct ObjectData {
    pub(crate) class: ClassId,
    pub(crate) fields: FxHashMap<Name, Value>,
    pub(crate) singleton: Singleton,
    pub(crate) released: bool,
}
