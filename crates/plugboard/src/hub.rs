//! Hub - the routing layer that synthesizes an attribute surface
//!
//! A hub owns no domain logic. Its entire job is bookkeeping: which modules
//! are attached at which priority, and how a named attribute access maps
//! onto them. The priority buckets are flattened into a single resolution
//! order after every membership change, so attribute accesses are a single
//! linear scan.

use crate::module::{ModuleHandle, StateHandle};
use crate::{Error, Result, Value};
use indexmap::IndexSet;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

/// Resolution precedence among modules supplying the same name
///
/// Priorities are totally ordered; a higher priority always wins reads over
/// a lower one. Within one priority, the most recently attached module wins.
pub type Priority = i64;

/// Priority assigned by [`Hub::attach`]
pub const DEFAULT_PRIORITY: Priority = 0;

/// Registry entry: a module's behavior object plus its shared state
///
/// The state handle is carried separately so resolution can consult a
/// module's supply map and attribute bag while the behavior object is
/// mutably borrowed by one of its own lifecycle hooks.
#[derive(Clone)]
struct Attachment {
    module: ModuleHandle,
    state: StateHandle,
}

/// Routes attribute access to attached modules
///
/// All modules attached to a hub are given a back-reference to it, through
/// which they interact with their siblings to perform their behavior. The
/// hub resolves a read to the winning supplier and fans a write out to every
/// supplier.
///
/// # Example
///
/// ```
/// use plugboard::{DataModule, Hub, Module, Value};
///
/// let hub = Hub::new();
/// let base = DataModule::new()
///     .with_attr("speed", 1.0f64)
///     .with_supply("speed")
///     .into_handle();
/// let buff = DataModule::new()
///     .with_attr("speed", 2.5f64)
///     .with_supply("speed")
///     .into_handle();
///
/// hub.attach(&base);
/// hub.attach_at(&buff, 1);
/// assert_eq!(hub.get("speed").unwrap(), Value::Float(2.5));
///
/// hub.detach(&buff);
/// assert_eq!(hub.get("speed").unwrap(), Value::Float(1.0));
/// ```
pub struct Hub {
    /// Priority -> modules attached at that priority, in attachment order
    registry: RefCell<BTreeMap<Priority, Vec<Attachment>>>,
    /// Flattened resolution order, rebuilt on every membership change
    order: RefCell<Vec<Attachment>>,
    /// Weak self-handle, cloned into each attached module's binding
    self_ref: Weak<Hub>,
}

impl Hub {
    /// Create a new hub with no attached modules
    ///
    /// The hub is handed out as an `Rc` so attached modules can hold weak
    /// back-references to it. A hub with zero modules is valid; it simply
    /// resolves nothing.
    pub fn new() -> Rc<Self> {
        Rc::new_cyclic(|self_ref| Self {
            registry: RefCell::new(BTreeMap::new()),
            order: RefCell::new(Vec::new()),
            self_ref: self_ref.clone(),
        })
    }

    /// Attach a module at the default priority
    ///
    /// See [`Hub::attach_at`].
    pub fn attach(&self, module: &ModuleHandle) {
        self.attach_at(module, DEFAULT_PRIORITY);
    }

    /// Attach a module at an explicit priority
    ///
    /// If multiple attached modules supply the same name, the one attached
    /// last wins reads; `priority` overrides that, with higher priorities
    /// considered later. A priority of `1` always beats the default `0`.
    ///
    /// The module's binding is established first and its `connected` hook is
    /// invoked last, so the hook can already resolve supplied attributes
    /// through the hub, its own included.
    ///
    /// Attaching the same module twice is permitted and produces duplicate
    /// registry entries; a single [`Hub::detach`] removes them all.
    pub fn attach_at(&self, module: &ModuleHandle, priority: Priority) {
        let state = module.borrow().state().clone();
        state.borrow_mut().bind(self.self_ref.clone());
        self.registry
            .borrow_mut()
            .entry(priority)
            .or_default()
            .push(Attachment {
                module: Rc::clone(module),
                state,
            });
        self.compile();
        module.borrow_mut().connected();
    }

    /// Detach a module from the hub
    ///
    /// The module's `disconnected` hook runs first, while its binding and
    /// registration are still intact, so it can clean up state that depends
    /// on sibling resolution. Every occurrence of the module is then removed
    /// and its binding cleared.
    ///
    /// Detaching a module that is not registered removes nothing but still
    /// fires the hook; a module bound to a different hub keeps that binding.
    pub fn detach(&self, module: &ModuleHandle) {
        module.borrow_mut().disconnected();
        {
            let mut registry = self.registry.borrow_mut();
            for bucket in registry.values_mut() {
                bucket.retain(|entry| !Rc::ptr_eq(&entry.module, module));
            }
            registry.retain(|_, bucket| !bucket.is_empty());
        }
        self.compile();

        let state = module.borrow().state().clone();
        let mut state = state.borrow_mut();
        if state.bound_to(&self.self_ref) {
            state.unbind();
        }
    }

    /// Rebuild the flattened resolution order from the registry
    ///
    /// BTreeMap iteration gives ascending priority; each bucket keeps
    /// attachment order. The rebuild is full, not incremental, so the order
    /// can never go stale relative to the registry.
    fn compile(&self) {
        let registry = self.registry.borrow();
        let mut order = self.order.borrow_mut();
        order.clear();
        for bucket in registry.values() {
            order.extend(bucket.iter().cloned());
        }
    }

    /// Snapshot the resolution order for one access
    ///
    /// Accesses iterate over the snapshot rather than a held borrow, so a
    /// module reached mid-scan may itself attach or detach modules without
    /// aliasing the order cell.
    fn scan(&self) -> Vec<Attachment> {
        self.order.borrow().clone()
    }

    /// Read the attribute `name`
    ///
    /// Every module supplying `name` is consulted in resolution order and
    /// the last match wins: highest priority, then most recently attached.
    /// Fails with [`Error::NotSupplied`] when no module supplies `name`.
    ///
    /// Resolution works from inside lifecycle hooks too, including for
    /// names the hooked module itself supplies: while a behavior object is
    /// mutably borrowed by its own hook, the scan reads that module's
    /// shared attribute bag directly instead of going through
    /// [`crate::Module::read_attr`].
    pub fn get(&self, name: &str) -> Result<Value> {
        let mut result = None;
        for entry in self.scan() {
            let target = match entry.state.borrow().supplies().target(name) {
                Some(target) => target.to_string(),
                None => continue,
            };
            let value = match entry.module.try_borrow() {
                Ok(module) => module.read_attr(&target),
                // Hook in progress on this module; its state cell is free
                Err(_) => entry
                    .state
                    .borrow()
                    .get_attr(&target)
                    .cloned()
                    .unwrap_or_default(),
            };
            result = Some(value);
        }
        result.ok_or_else(|| Error::NotSupplied(name.to_string()))
    }

    /// Read the attribute `name`, or `None` when nothing supplies it
    pub fn try_get(&self, name: &str) -> Option<Value> {
        self.get(name).ok()
    }

    /// Read the attribute `name`, or a default when nothing supplies it
    pub fn get_or(&self, name: &str, default: impl Into<Value>) -> Value {
        self.try_get(name).unwrap_or_else(|| default.into())
    }

    /// Write the attribute `name` on every module that supplies it
    ///
    /// All matches are updated, not just the read winner. Unlike reads, a
    /// write that matches nothing is a silent no-op; the asymmetry is
    /// load-bearing for callers that probe with reads.
    ///
    /// Like reads, writes reach a module whose own hook is currently
    /// executing: the fan-out falls back to that module's shared attribute
    /// bag when the behavior object is busy.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        for entry in self.scan() {
            let target = match entry.state.borrow().supplies().target(name) {
                Some(target) => target.to_string(),
                None => continue,
            };
            match entry.module.try_borrow_mut() {
                Ok(mut module) => module.write_attr(&target, value.clone()),
                Err(_) => entry.state.borrow_mut().set_attr(target, value.clone()),
            }
        }
        Ok(())
    }

    /// Check whether any attached module supplies `name`
    pub fn supplies(&self, name: &str) -> bool {
        self.scan()
            .iter()
            .any(|entry| entry.state.borrow().supplies().contains(name))
    }

    /// List every supplied alias, deduplicated, in resolution order
    pub fn supplied_names(&self) -> Vec<String> {
        let mut names = IndexSet::new();
        for entry in self.scan() {
            for (alias, _) in entry.state.borrow().supplies().iter() {
                names.insert(alias.to_string());
            }
        }
        names.into_iter().collect()
    }

    /// Check whether a module is currently attached
    pub fn contains(&self, module: &ModuleHandle) -> bool {
        self.order
            .borrow()
            .iter()
            .any(|entry| Rc::ptr_eq(&entry.module, module))
    }

    /// Get the number of registry entries
    ///
    /// Duplicate attachments count once per occurrence.
    pub fn module_count(&self) -> usize {
        self.order.borrow().len()
    }

    /// Check if no modules are attached
    pub fn is_empty(&self) -> bool {
        self.order.borrow().is_empty()
    }
}

impl fmt::Debug for Hub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hub")
            .field("modules", &self.order.borrow().len())
            .field("priorities", &self.registry.borrow().len())
            .finish()
    }
}
