//! Plugboard - component composition through priority-routed attribute supply
//!
//! A [`Hub`] holds no domain logic of its own; its whole attribute surface is
//! synthesized from the [`Module`]s attached to it. Each module registers
//! which of its internal attributes are externally addressable (its
//! [`SupplyMap`]), and the hub routes every named read and write across the
//! attached modules.
//!
//! ## Architecture
//!
//! ```text
//! Hub (owns the registry, no behavior)
//!  │
//!  ├── registry: priority -> [ModuleHandle]
//!  ├── resolution order (flattened, rebuilt on every attach/detach)
//!  │
//!  └── Module (trait) ← behavior and data live here
//!       ├── SupplyMap: alias -> internal attribute name
//!       └── weak back-reference to the hub (sibling communication)
//! ```
//!
//! ## Resolution rules
//!
//! - A read of a name several modules supply returns the value from the
//!   highest-priority supplier; ties go to the most recently attached.
//! - A write of a supplied name updates **every** supplier.
//! - A read of a name nothing supplies fails with [`Error::NotSupplied`];
//!   the same write is a silent no-op.
//!
//! ## Design principles
//!
//! 1. **The hub never interprets values** - it only routes them
//! 2. **Modules never know their siblings** - all cross-module traffic goes
//!    back through the hub, so membership can change at runtime
//! 3. **Lifecycle hooks always see a consistent hub** - `connected` runs
//!    after the binding is established, `disconnected` before it is torn down
//!
//! ## Example
//!
//! ```
//! use plugboard::{DataModule, Hub, Module, Value};
//!
//! let hub = Hub::new();
//!
//! let stats = DataModule::new()
//!     .with_attr("hp", 100i64)
//!     .with_supply_as("hp", "health")
//!     .into_handle();
//! hub.attach(&stats);
//!
//! assert_eq!(hub.get("health").unwrap(), Value::Int(100));
//! hub.set("health", 60i64).unwrap();
//! assert_eq!(hub.get("health").unwrap(), Value::Int(60));
//! ```

mod error;
mod hub;
mod module;
mod value;

pub use error::{Error, Result};
pub use hub::{Hub, Priority, DEFAULT_PRIORITY};
pub use module::{DataModule, Module, ModuleHandle, ModuleState, StateHandle, SupplyMap};
pub use value::{Value, ValueMap};
