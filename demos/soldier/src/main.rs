//! Soldier Demo
//!
//! Composes one entity out of plugboard modules: a stat block, a buff that
//! overrides a stat by priority, and a report module that talks to its
//! siblings through the hub.

use plugboard::{DataModule, Hub, Module, StateHandle, Value};

/// Behavior module: reads sibling attributes through the hub in its hooks
struct BattleReport {
    state: StateHandle,
}

impl BattleReport {
    fn new() -> Self {
        Self {
            state: StateHandle::default(),
        }
    }
}

impl Module for BattleReport {
    fn state(&self) -> &StateHandle {
        &self.state
    }

    fn connected(&mut self) {
        if let Some(hub) = self.hub() {
            println!(
                "[report] joined a soldier with {} health and {} attack",
                hub.get_or("health", Value::Null),
                hub.get_or("attack", Value::Null),
            );
        }
    }

    fn disconnected(&mut self) {
        if let Some(hub) = self.hub() {
            println!(
                "[report] leaving; soldier ends with {} health",
                hub.get_or("health", Value::Null),
            );
        }
    }
}

fn main() {
    println!("=== Plugboard Soldier Demo ===\n");

    let soldier = Hub::new();

    // Base stat block at the default priority
    let stats = DataModule::new()
        .with_attr("hp", 100i64)
        .with_attr("attack", 10i64)
        .with_supply_as("hp", "health")
        .with_supply("attack")
        .into_handle();
    soldier.attach(&stats);

    // Behavior module announcing itself through the hub
    let report = BattleReport::new().into_handle();
    soldier.attach(&report);

    println!(
        "\nBase soldier: health={}, attack={}",
        soldier.get("health").unwrap(),
        soldier.get("attack").unwrap(),
    );

    // Berserk buff at priority 1: overrides attack while attached
    let berserk = DataModule::new()
        .with_attr("attack", 25i64)
        .with_supply("attack")
        .into_handle();
    soldier.attach_at(&berserk, 1);

    println!(
        "Berserk attached: attack={} (buff wins by priority)",
        soldier.get("attack").unwrap(),
    );

    // Writes fan out to every supplier
    soldier.set("health", 40i64).unwrap();
    println!("Took damage: health={}", soldier.get("health").unwrap());

    soldier.detach(&berserk);
    println!(
        "Berserk detached: attack={} (base stat again)",
        soldier.get("attack").unwrap(),
    );

    println!("\nSupplied attributes: {:?}", soldier.supplied_names());

    soldier.detach(&report);
    soldier.detach(&stats);

    println!("\n=== Demo Complete ===");
}
