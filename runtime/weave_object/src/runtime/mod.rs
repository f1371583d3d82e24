//! The runtime: sole owner of the module graph and everything resolved from it.
//!
//! # Architecture
//!
//! - `builder`: configuration and kernel bootstrap
//! - `kernel`: native methods every receiver answers to
//! - `resolve`: propagation of graph edits into slot tables
//! - `dispatch`: sends, super-call chains, message-not-understood handling
//!
//! Every mutating operation here edits the graph and then resolves the touched
//! module and its dependents before returning, so the next send observes the
//! edit. Hooks and observers run after resolution and may mutate the graph
//! again.

mod builder;
mod dispatch;
mod kernel;
mod resolve;

use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;
use weave_ir::{Name, SharedInterner};

use crate::errors::{duplicate_definition, undefined_method, DispatchError, EvalResult};
use crate::gate::{self, DispatchGate};
use crate::method::{Method, Slot, SlotTable};
use crate::module::{IncludeOptions, ModuleGraph, ModuleId, Record, ResolutionTarget, Source};
use crate::object::{Ancestor, ClassData, ClassId, ObjectData, ObjectId, Receiver, Singleton};
use crate::stack::ensure_sufficient_stack;
use crate::value::Value;

pub use builder::{RuntimeBuilder, RuntimeConfig};
use kernel::KernelNames;

/// Callback told about every method added with a notify target.
pub type MethodAddedObserver = Rc<dyn Fn(&mut Runtime, Name, Value)>;

/// The composition engine.
///
/// Single-threaded: method bodies are `Rc` closures that receive
/// `&mut Runtime`, so the runtime is neither `Send` nor `Sync`.
pub struct Runtime {
    interner: SharedInterner,
    names: KernelNames,
    graph: ModuleGraph,
    classes: Vec<ClassData>,
    objects: Vec<ObjectData>,
    gate: DispatchGate,
    kernel: ModuleId,
    /// Root of every module-side ancestry; its resolved table is `module_base`.
    module_root: ModuleId,
    module_base: SlotTable,
    /// Singleton state of modules used as receivers, created on first use.
    module_sides: FxHashMap<ModuleId, Singleton>,
    /// Root of every class-side ancestry; its resolved table is `class_base`.
    class_module: ModuleId,
    class_base: SlotTable,
    default_handler: Method,
    observers: Vec<MethodAddedObserver>,
    /// Receivers whose `inspect` is running inside `describe`.
    describing: FxHashSet<Receiver>,
    free_objects: Vec<ObjectId>,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    /// A runtime with an empty configuration.
    pub fn new() -> Self {
        RuntimeBuilder::new().build()
    }

    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    // Names

    pub fn interner(&self) -> &SharedInterner {
        &self.interner
    }

    #[inline]
    pub fn intern(&self, s: &str) -> Name {
        self.interner.intern(s)
    }

    #[inline]
    pub fn name_str(&self, name: Name) -> &'static str {
        self.interner.lookup(name)
    }

    // Graph access

    pub fn graph(&self) -> &ModuleGraph {
        &self.graph
    }

    /// The module mixed into every class.
    pub fn kernel(&self) -> ModuleId {
        self.kernel
    }

    pub fn gate(&self) -> &DispatchGate {
        &self.gate
    }

    /// Start routing `name` through the gate.
    ///
    /// Installs the stub in the gate module but does not resolve; returns
    /// `true` when the caller should resolve the gate module.
    pub(crate) fn watch(&mut self, name: Name) -> bool {
        if !self.gate.register(name) {
            return false;
        }
        debug!(name = self.name_str(name), "watching name");
        self.graph
            .set_method(self.gate.module(), name, gate::stub_for(name));
        true
    }

    // Modules

    /// Allocate an empty, named module.
    pub fn define_module(&mut self, name: &str) -> ModuleId {
        let interned = self.intern(name);
        let id = self.graph.alloc(Some(interned), None);
        debug!(module = id.index(), name, "defined module");
        id
    }

    /// Define (or redefine) `name` on `owner` and resolve.
    pub fn define_method(&mut self, owner: ModuleId, name: Name, method: Method) {
        self.define(owner, name, method, None, true);
    }

    /// Define `name` on `owner`, refusing to replace an existing definition.
    pub fn define_unique_method(
        &mut self,
        owner: ModuleId,
        name: Name,
        method: Method,
    ) -> Result<(), DispatchError> {
        if self.graph.get(owner).methods().contains(name) {
            return Err(duplicate_definition(self.name_str(name)));
        }
        self.define_method(owner, name, method);
        Ok(())
    }

    fn define(
        &mut self,
        owner: ModuleId,
        name: Name,
        method: Method,
        notify: Option<Value>,
        resolve: bool,
    ) {
        debug!(
            module = owner.index(),
            name = self.name_str(name),
            calls_next = method.calls_next(),
            "define method"
        );
        self.graph.set_method(owner, name, method);
        let newly_watched = self.watch(name);
        if resolve {
            self.resolve(owner);
            if newly_watched {
                self.resolve(self.gate.module());
            }
        }
        if let Some(target) = notify {
            self.notify_method_added(name, target);
        }
    }

    /// Include `source` into `owner`.
    ///
    /// Modules become an inclusion edge and fire their `included` hook after
    /// resolution. Records are flattened: nested `include`s are applied to
    /// `owner`, nested `extend`s to the receiver `owner` backs, then the
    /// record's methods are defined with method-added notifications.
    ///
    /// # Errors
    /// Errors from nested sources propagate unchanged.
    pub fn include(
        &mut self,
        owner: ModuleId,
        source: impl Into<Source>,
        options: IncludeOptions,
    ) -> Result<ModuleId, DispatchError> {
        match source.into() {
            Source::Module(other) => {
                debug!(module = owner.index(), other = other.index(), "include");
                self.graph.add_edge(owner, other);
                if options.resolve {
                    self.resolve(owner);
                }
                if let Some(hook) = self.graph.get(other).hooks.included.clone() {
                    let includer = self.module_value(owner);
                    hook(self, includer);
                }
            }
            Source::Record(record) => self.flatten(owner, record, &options)?,
        }
        Ok(owner)
    }

    fn flatten(
        &mut self,
        owner: ModuleId,
        record: Record,
        options: &IncludeOptions,
    ) -> Result<(), DispatchError> {
        let Record {
            methods,
            include,
            extend,
        } = record;
        for source in include {
            ensure_sufficient_stack(|| self.include(owner, source, options.clone()))?;
        }
        let receiver = self.module_receiver(owner);
        for source in extend {
            ensure_sufficient_stack(|| self.extend(receiver, source))?;
        }
        let notify = options
            .notify_as
            .clone()
            .unwrap_or_else(|| self.module_value(owner));
        for (key, method) in methods {
            let name = self.intern(&key);
            self.define(owner, name, method, Some(notify.clone()), options.resolve);
        }
        Ok(())
    }

    /// Attach `source` to `receiver`'s eigenclass.
    ///
    /// Siblings are unaffected. For classes the methods become class-level
    /// methods, inherited by subclasses. Modules extend only themselves.
    pub fn extend(
        &mut self,
        receiver: Receiver,
        source: impl Into<Source>,
    ) -> Result<Receiver, DispatchError> {
        let eigen = self.eigenclass(receiver);
        match source.into() {
            Source::Module(other) => {
                debug!(?receiver, other = other.index(), "extend");
                self.graph.add_edge(eigen, other);
                self.resolve(eigen);
                if let Some(hook) = self.graph.get(other).hooks.extended.clone() {
                    hook(self, receiver.into());
                }
            }
            Source::Record(record) => {
                let options = IncludeOptions {
                    notify_as: Some(receiver.into()),
                    ..IncludeOptions::default()
                };
                self.include(eigen, record, options)?;
            }
        }
        Ok(receiver)
    }

    /// The receiver's eigenclass, created on first use.
    ///
    /// An object's eigenclass includes its class's module; a class's eigenclass
    /// includes its superclass's eigenclass (created too if needed) or the
    /// runtime's class module. A module's eigenclass includes the runtime's
    /// module root.
    pub fn eigenclass(&mut self, receiver: Receiver) -> ModuleId {
        match receiver {
            Receiver::Object(id) => {
                if let Some(eigen) = self.objects[id.index()].singleton.eigenclass {
                    return eigen;
                }
                let parent = self.classes[self.class_of(id).index()].instance_module;
                let eigen = self.graph.alloc(None, Some(ResolutionTarget::Object(id)));
                self.objects[id.index()].singleton.eigenclass = Some(eigen);
                self.graph.add_edge(eigen, parent);
                debug!(object = id.index(), module = eigen.index(), "materialized eigenclass");
                self.resolve(eigen);
                eigen
            }
            Receiver::Class(id) => {
                if let Some(eigen) = self.classes[id.index()].class_side.eigenclass {
                    return eigen;
                }
                let superclass = self.classes[id.index()].superclass;
                let parent = match superclass {
                    Some(superclass) => {
                        ensure_sufficient_stack(|| self.eigenclass(Receiver::Class(superclass)))
                    }
                    None => self.class_module,
                };
                let eigen = self
                    .graph
                    .alloc(None, Some(ResolutionTarget::ClassSide(id)));
                self.classes[id.index()].class_side.eigenclass = Some(eigen);
                self.graph.add_edge(eigen, parent);
                debug!(class = id.index(), module = eigen.index(), "materialized eigenclass");
                self.resolve(eigen);
                eigen
            }
            Receiver::Module(id) => {
                if let Some(eigen) = self.module_sides.get(&id).and_then(|side| side.eigenclass) {
                    return eigen;
                }
                let eigen = self
                    .graph
                    .alloc(None, Some(ResolutionTarget::ModuleSide(id)));
                self.module_sides.entry(id).or_default().eigenclass = Some(eigen);
                self.graph.add_edge(eigen, self.module_root);
                debug!(of = id.index(), module = eigen.index(), "materialized eigenclass");
                self.resolve(eigen);
                eigen
            }
        }
    }

    pub fn on_included(&mut self, module: ModuleId, hook: impl Fn(&mut Runtime, Value) + 'static) {
        self.graph.get_mut(module).hooks.included = Some(Rc::new(hook));
    }

    pub fn on_extended(&mut self, module: ModuleId, hook: impl Fn(&mut Runtime, Value) + 'static) {
        self.graph.get_mut(module).hooks.extended = Some(Rc::new(hook));
    }

    /// Register a method-added observer. Observers run newest first.
    pub fn on_method_added(&mut self, observer: impl Fn(&mut Runtime, Name, Value) + 'static) {
        self.observers.push(Rc::new(observer));
    }

    fn notify_method_added(&mut self, name: Name, target: Value) {
        let observers: Vec<MethodAddedObserver> = self.observers.iter().rev().cloned().collect();
        for observer in observers {
            observer(self, name, target.clone());
        }
    }

    // Classes and objects

    /// Define a class. Root classes include the kernel; subclasses include
    /// their superclass's module.
    ///
    /// # Panics
    /// Panics if more than `u32::MAX` classes are defined.
    pub fn define_class(&mut self, name: &str, superclass: Option<ClassId>) -> ClassId {
        let id = ClassId::from_raw(
            u32::try_from(self.classes.len())
                .unwrap_or_else(|_| panic!("class arena exceeded u32::MAX entries")),
        );
        let class_name = self.intern(name);
        let module = self
            .graph
            .alloc(Some(class_name), Some(ResolutionTarget::ClassPrototype(id)));
        self.classes.push(ClassData {
            name: class_name,
            instance_module: module,
            superclass,
            prototype: SlotTable::default(),
            class_side: Singleton::default(),
        });
        let parent = superclass.map_or(self.kernel, |s| self.classes[s.index()].instance_module);
        self.graph.add_edge(module, parent);
        debug!(class = id.index(), name, "defined class");
        self.resolve(module);
        id
    }

    /// The module holding a class's instance methods.
    pub fn instance_module(&self, class: ClassId) -> ModuleId {
        self.classes[class.index()].instance_module
    }

    pub fn superclass(&self, class: ClassId) -> Option<ClassId> {
        self.classes[class.index()].superclass
    }

    pub fn class_name(&self, class: ClassId) -> &'static str {
        self.name_str(self.classes[class.index()].name)
    }

    pub fn class_of(&self, object: ObjectId) -> ClassId {
        self.objects[object.index()].class
    }

    /// Define an instance method on `class`.
    pub fn define_instance_method(&mut self, class: ClassId, name: &str, method: Method) {
        let name = self.intern(name);
        let module = self.instance_module(class);
        self.define_method(module, name, method);
    }

    /// Define a class-level method on `class`, materializing its eigenclass.
    pub fn define_class_method(&mut self, class: ClassId, name: &str, method: Method) {
        let name = self.intern(name);
        let eigen = self.eigenclass(Receiver::Class(class));
        self.define_method(eigen, name, method);
    }

    /// Create an instance and run `initialize(args)` when the class has one.
    ///
    /// Reuses the slot of a released object when there is one.
    ///
    /// # Panics
    /// Panics if more than `u32::MAX` objects are live.
    pub fn instantiate(
        &mut self,
        class: ClassId,
        args: Vec<Value>,
    ) -> Result<ObjectId, DispatchError> {
        let data = ObjectData {
            class,
            fields: FxHashMap::default(),
            singleton: Singleton::default(),
            released: false,
        };
        let id = if let Some(id) = self.free_objects.pop() {
            self.objects[id.index()] = data;
            id
        } else {
            let id = ObjectId::from_raw(
                u32::try_from(self.objects.len())
                    .unwrap_or_else(|_| panic!("object arena exceeded u32::MAX entries")),
            );
            self.objects.push(data);
            id
        };
        let receiver = Receiver::Object(id);
        if self.respond_to(receiver, self.names.initialize) {
            self.send(receiver, self.names.initialize, args)?;
        }
        Ok(id)
    }

    /// Drop an instance: its fields, its eigenclass and every cache.
    ///
    /// The eigenclass is unlinked from the modules it included, so later
    /// definitions on the class no longer re-resolve it. Modules that included
    /// the eigenclass are re-resolved. The id must not be used afterwards; a
    /// later `instantiate` may hand it out again.
    pub fn release(&mut self, object: ObjectId) {
        let data = &mut self.objects[object.index()];
        if data.released {
            return;
        }
        data.released = true;
        data.fields = FxHashMap::default();
        let eigen = std::mem::take(&mut data.singleton).eigenclass;
        if let Some(eigen) = eigen {
            for dependent in self.graph.remove(eigen) {
                self.resolve(dependent);
            }
        }
        self.free_objects.push(object);
        debug!(object = object.index(), "released object");
    }

    pub fn field(&self, object: ObjectId, name: &str) -> Value {
        self.interner
            .get(name)
            .and_then(|name| self.objects[object.index()].fields.get(&name).cloned())
            .unwrap_or_default()
    }

    pub fn set_field(&mut self, object: ObjectId, name: &str, value: Value) {
        let name = self.intern(name);
        self.objects[object.index()].fields.insert(name, value);
    }

    // Introspection

    /// The module whose ancestry a receiver answers through.
    pub(crate) fn effective_module(&self, receiver: Receiver) -> ModuleId {
        match receiver {
            Receiver::Object(id) => {
                let object = &self.objects[id.index()];
                object
                    .singleton
                    .eigenclass
                    .unwrap_or(self.classes[object.class.index()].instance_module)
            }
            Receiver::Class(id) => self
                .class_side_owner(id)
                .and_then(|owner| self.classes[owner.index()].class_side.eigenclass)
                .unwrap_or(self.class_module),
            Receiver::Module(id) => self
                .module_sides
                .get(&id)
                .and_then(|side| side.eigenclass)
                .unwrap_or(self.module_root),
        }
    }

    /// Whether `ancestor` is part of `receiver`'s ancestry.
    ///
    /// Never materializes an eigenclass.
    pub fn is_a(&self, receiver: Receiver, ancestor: impl Into<Ancestor>) -> bool {
        let target = match ancestor.into() {
            Ancestor::Module(id) => id,
            Ancestor::Class(id) => self.instance_module(id),
        };
        self.graph.includes(self.effective_module(receiver), target)
    }

    /// The receiver's ancestry, classes reported as classes.
    pub fn ancestors_of(&self, receiver: Receiver) -> Vec<Ancestor> {
        self.ancestor_entries(self.effective_module(receiver))
    }

    /// `module`'s ancestry with each class module reported as its class.
    pub fn ancestor_entries(&self, module: ModuleId) -> Vec<Ancestor> {
        self.graph
            .ancestors(module)
            .into_iter()
            .map(|id| match self.graph.get(id).target() {
                Some(ResolutionTarget::ClassPrototype(class)) => Ancestor::Class(class),
                _ => Ancestor::Module(id),
            })
            .collect()
    }

    /// Every implementation of `name` along `owner`'s ancestry, most specific
    /// last.
    pub fn lookup(&self, owner: ModuleId, name: Name) -> Vec<Method> {
        self.graph.lookup(owner, name)
    }

    pub fn instance_method(&self, owner: ModuleId, name: Name) -> Option<Method> {
        self.graph.instance_method(owner, name)
    }

    /// Method names visible through `owner`, as strings.
    pub fn instance_methods(&self, owner: ModuleId, include_inherited: bool) -> Vec<&'static str> {
        self.graph
            .instance_methods(owner, include_inherited)
            .into_iter()
            .map(|name| self.name_str(name))
            .collect()
    }

    /// The resolved implementation of `name` bound to `receiver`.
    ///
    /// # Errors
    /// `UndefinedMethod` when the receiver has no real implementation.
    pub fn method(&mut self, receiver: Receiver, name: Name) -> Result<BoundMethod, DispatchError> {
        match self.slot(receiver, name).filter(|slot| slot.is_defined()).cloned() {
            Some(slot) => Ok(BoundMethod {
                receiver,
                name,
                slot,
            }),
            None => Err(undefined_method(self.name_str(name), &self.describe(receiver))),
        }
    }

    /// Run `f` with `receiver`, then hand the receiver back.
    pub fn tap(
        &mut self,
        receiver: Receiver,
        f: impl FnOnce(&mut Runtime, Receiver) -> Result<(), DispatchError>,
    ) -> Result<Receiver, DispatchError> {
        f(self, receiver)?;
        Ok(receiver)
    }

    /// The value hooks and observers see for `module`.
    fn module_value(&self, module: ModuleId) -> Value {
        self.module_receiver(module).into()
    }

    /// The receiver whose behavior `module` resolves; the module itself when
    /// it backs no class or object.
    fn module_receiver(&self, module: ModuleId) -> Receiver {
        match self.graph.get(module).target() {
            Some(ResolutionTarget::ClassPrototype(id) | ResolutionTarget::ClassSide(id)) => {
                Receiver::Class(id)
            }
            Some(ResolutionTarget::Object(id)) => Receiver::Object(id),
            Some(ResolutionTarget::ModuleSide(id)) => Receiver::Module(id),
            Some(ResolutionTarget::ClassBase | ResolutionTarget::ModuleBase) | None => {
                Receiver::Module(module)
            }
        }
    }

    fn module_label(&self, module: ModuleId) -> String {
        match self.graph.get(module).name() {
            Some(name) => self.name_str(name).to_string(),
            None => format!("#<Module {}>", module.index()),
        }
    }
}

/// A method implementation captured together with its receiver.
///
/// Later redefinitions do not affect an already bound method.
#[derive(Clone, Debug)]
pub struct BoundMethod {
    receiver: Receiver,
    name: Name,
    slot: Slot,
}

impl BoundMethod {
    pub fn receiver(&self) -> Receiver {
        self.receiver
    }

    pub fn name(&self) -> Name {
        self.name
    }

    pub fn call(&self, rt: &mut Runtime, args: Vec<Value>) -> EvalResult {
        rt.invoke_slot(self.receiver, self.name, &self.slot, args)
    }
}
