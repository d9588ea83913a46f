//! Module contract: supply mapping, hub binding, and lifecycle hooks
//!
//! A module is a self-contained slice of behavior or data. It decides which
//! of its internal attributes are visible through a hub by registering them
//! in its [`SupplyMap`], and it reaches sibling modules by resolving names
//! against the hub it is bound to.
//!
//! A module is two cells: the behavior object (a [`ModuleHandle`]) and its
//! shared [`ModuleState`] (a [`StateHandle`]). Hub resolution reads the
//! state cell directly, so a module stays resolvable even while its
//! behavior object is mutably borrowed by one of its own lifecycle hooks.

use crate::hub::Hub;
use crate::{Error, Result, Value, ValueMap};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Shared handle to a module's behavior object
///
/// The hub stores clones of this handle in its registry; the caller keeps its
/// own clone to drive [`Hub::detach`] and to reach the module directly.
/// Module identity (for detachment) is pointer identity, not value equality.
pub type ModuleHandle = Rc<RefCell<dyn Module>>;

/// Shared handle to a module's [`ModuleState`]
///
/// Held separately from the behavior object so the hub can consult the
/// supply map and attribute bag mid-hook.
pub type StateHandle = Rc<RefCell<ModuleState>>;

/// Mapping from externally-visible alias to internal attribute name
///
/// Keys are the names other code sees on the hub; values are the names the
/// owning module stores them under. Insertion order is preserved, and
/// re-registering an alias overwrites its target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyMap {
    entries: IndexMap<String, String>,
}

impl SupplyMap {
    /// Create an empty supply map
    pub fn new() -> Self {
        Self::default()
    }

    /// Expose the internal attribute `name` under `name` itself
    pub fn supply(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.entries.insert(name.clone(), name);
    }

    /// Expose the internal attribute `name` under `alias` instead
    ///
    /// Only `alias` becomes addressable on the hub; `name` stays private
    /// unless separately supplied.
    pub fn supply_as(&mut self, name: impl Into<String>, alias: impl Into<String>) {
        self.entries.insert(alias.into(), name.into());
    }

    /// Get the internal attribute name registered under `alias`
    pub fn target(&self, alias: &str) -> Option<&str> {
        self.entries.get(alias).map(String::as_str)
    }

    /// Check whether `alias` is registered
    pub fn contains(&self, alias: &str) -> bool {
        self.entries.contains_key(alias)
    }

    /// Iterate over `(alias, internal name)` pairs in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(a, n)| (a.as_str(), n.as_str()))
    }

    /// Get the number of registered aliases
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no aliases are registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Per-module bookkeeping every module embeds
///
/// Holds the supply map, a dynamic attribute bag used by the default
/// [`Module::read_attr`]/[`Module::write_attr`] implementations, and the
/// binding to the current hub. The binding is written only by
/// [`Hub::attach`] and [`Hub::detach`], never by the module itself.
///
/// Hub resolution borrows the state cell briefly on every scan; hook code
/// should take its own borrows short-lived (the [`Module::hub`] helper
/// already does).
#[derive(Debug, Default)]
pub struct ModuleState {
    /// What this module exposes, alias -> internal name
    supplies: SupplyMap,
    /// Dynamic attribute storage
    attrs: ValueMap,
    /// Weak handle to the hub this module is currently attached to
    hub: Option<Weak<Hub>>,
}

impl ModuleState {
    /// Create an empty, unbound state
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap this state in a shared [`StateHandle`]
    pub fn into_handle(self) -> StateHandle {
        Rc::new(RefCell::new(self))
    }

    /// Get the supply map
    pub fn supplies(&self) -> &SupplyMap {
        &self.supplies
    }

    /// Get the supply map mutably
    pub fn supplies_mut(&mut self) -> &mut SupplyMap {
        &mut self.supplies
    }

    /// Shorthand for `supplies_mut().supply(name)`
    pub fn supply(&mut self, name: impl Into<String>) {
        self.supplies.supply(name);
    }

    /// Shorthand for `supplies_mut().supply_as(name, alias)`
    pub fn supply_as(&mut self, name: impl Into<String>, alias: impl Into<String>) {
        self.supplies.supply_as(name, alias);
    }

    /// Get the attribute bag
    pub fn attrs(&self) -> &ValueMap {
        &self.attrs
    }

    /// Get the attribute bag mutably
    pub fn attrs_mut(&mut self) -> &mut ValueMap {
        &mut self.attrs
    }

    /// Get an attribute from the bag
    pub fn get_attr(&self, name: &str) -> Option<&Value> {
        self.attrs.get(name)
    }

    /// Set an attribute in the bag
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.attrs.insert(name.into(), value.into());
    }

    /// Get the hub this module is attached to, if any
    ///
    /// Returns `None` both when unattached and when the hub has been dropped.
    pub fn hub(&self) -> Option<Rc<Hub>> {
        self.hub.as_ref().and_then(Weak::upgrade)
    }

    /// Get the hub this module is attached to, or [`Error::NotBound`]
    pub fn require_hub(&self) -> Result<Rc<Hub>> {
        self.hub().ok_or(Error::NotBound)
    }

    /// Check whether this module is attached to a live hub
    pub fn is_bound(&self) -> bool {
        self.hub().is_some()
    }

    pub(crate) fn bind(&mut self, hub: Weak<Hub>) {
        self.hub = Some(hub);
    }

    pub(crate) fn unbind(&mut self) {
        self.hub = None;
    }

    pub(crate) fn bound_to(&self, hub: &Weak<Hub>) -> bool {
        self.hub.as_ref().is_some_and(|bound| Weak::ptr_eq(bound, hub))
    }
}

/// A single slice of behavior or data, attachable to a [`Hub`]
///
/// Implementors embed a [`StateHandle`] and hand it out through
/// [`state`](Module::state); everything else has a default. Override the
/// hooks to react to attachment, and override
/// [`read_attr`](Module::read_attr)/[`write_attr`](Module::write_attr) when
/// supplied attributes are computed rather than stored in the bag.
pub trait Module {
    /// Get this module's shared bookkeeping state
    ///
    /// The hub clones this handle at attach time and borrows it briefly
    /// during every resolution scan.
    fn state(&self) -> &StateHandle;

    /// Called by the hub once this module is firmly attached
    ///
    /// The binding is already in place: `self.hub()` resolves, and supplied
    /// attributes (its own included) can be read and written through it.
    fn connected(&mut self) {}

    /// Called by the hub as this module is being detached
    ///
    /// The binding and registration are still valid, but not for much
    /// longer. Use it to clean up any state that depends on siblings.
    fn disconnected(&mut self) {}

    /// Read the internal attribute `name`
    ///
    /// `name` here is the internal name a supply entry points at, not the
    /// alias. The default reads the [`ModuleState`] bag and yields
    /// [`Value::Null`] for a missing attribute.
    fn read_attr(&self, name: &str) -> Value {
        self.state().borrow().attrs.get(name).cloned().unwrap_or_default()
    }

    /// Write the internal attribute `name`
    fn write_attr(&mut self, name: &str, value: Value) {
        self.state().borrow_mut().attrs.insert(name.to_string(), value);
    }

    /// Get the hub this module is currently attached to
    ///
    /// Takes only a transient borrow of the state cell, so it is safe to
    /// call from inside lifecycle hooks.
    fn hub(&self) -> Option<Rc<Hub>> {
        self.state().borrow().hub()
    }

    /// Wrap this module in a shared [`ModuleHandle`]
    fn into_handle(self) -> ModuleHandle
    where
        Self: Sized + 'static,
    {
        Rc::new(RefCell::new(self))
    }
}

/// A behavior-free module: just supplied data
///
/// Useful for plugs that only contribute attributes (stat blocks, config,
/// shared blackboard slots) and for tests.
///
/// # Example
///
/// ```
/// use plugboard::{DataModule, Hub, Module, Value};
///
/// let hub = Hub::new();
/// let stats = DataModule::new()
///     .with_attr("hp", 100i64)
///     .with_supply("hp")
///     .into_handle();
/// hub.attach(&stats);
///
/// assert_eq!(hub.get("hp").unwrap(), Value::Int(100));
/// ```
#[derive(Debug, Default)]
pub struct DataModule {
    state: StateHandle,
}

impl DataModule {
    /// Create an empty data module
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a data module with a pre-populated attribute bag
    pub fn with_attrs(attrs: ValueMap) -> Self {
        let module = Self::default();
        module.state.borrow_mut().attrs = attrs;
        module
    }

    /// Set an attribute (builder style)
    pub fn with_attr(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.state.borrow_mut().set_attr(name, value);
        self
    }

    /// Supply an attribute under its own name (builder style)
    pub fn with_supply(self, name: impl Into<String>) -> Self {
        self.state.borrow_mut().supply(name);
        self
    }

    /// Supply an attribute under an alias (builder style)
    pub fn with_supply_as(
        self,
        name: impl Into<String>,
        alias: impl Into<String>,
    ) -> Self {
        self.state.borrow_mut().supply_as(name, alias);
        self
    }
}

impl Module for DataModule {
    fn state(&self) -> &StateHandle {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supply_map() {
        let mut supplies = SupplyMap::new();
        assert!(supplies.is_empty());

        supplies.supply("hp");
        supplies.supply_as("hp", "health");
        assert_eq!(supplies.len(), 2);
        assert_eq!(supplies.target("hp"), Some("hp"));
        assert_eq!(supplies.target("health"), Some("hp"));
        assert!(!supplies.contains("mana"));
    }

    #[test]
    fn test_supply_map_overwrite() {
        let mut supplies = SupplyMap::new();
        supplies.supply_as("old_hp", "health");
        supplies.supply_as("hp", "health");

        // Re-registering an alias replaces its target
        assert_eq!(supplies.len(), 1);
        assert_eq!(supplies.target("health"), Some("hp"));
    }

    #[test]
    fn test_default_attr_accessors() {
        let mut module = DataModule::new().with_attr("hp", 10i64);
        assert_eq!(module.read_attr("hp"), Value::Int(10));
        assert_eq!(module.read_attr("missing"), Value::Null);

        module.write_attr("hp", Value::Int(3));
        assert_eq!(module.read_attr("hp"), Value::Int(3));
    }

    #[test]
    fn test_unbound_state() {
        let module = DataModule::new();
        assert!(!module.state().borrow().is_bound());
        assert!(module.hub().is_none());
        assert!(matches!(
            module.state().borrow().require_hub(),
            Err(Error::NotBound)
        ));
    }

    #[test]
    fn test_data_module_from_ron() {
        // Attribute bags are plain ValueMaps, so data-only plugs can be
        // loaded from RON content
        let attrs: ValueMap = ron::from_str(
            r#"{
                "hp": Int(100),
                "name": String("recruit"),
                "agility": Float(1.5),
            }"#,
        )
        .unwrap();

        let module = DataModule::with_attrs(attrs)
            .with_supply("hp")
            .with_supply_as("name", "label");

        assert_eq!(module.read_attr("hp"), Value::Int(100));
        assert_eq!(module.state().borrow().supplies().target("label"), Some("name"));
    }
}
