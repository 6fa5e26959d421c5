//! Part, resource and celestial body metadata.
//!
//! The catalog is the read-only lookup table the rest of the crate consults
//! for display titles, catalog costs and resource densities. Lookups are
//! fail-soft: callers log and skip an unknown name, nothing here panics.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Catalog entry for a part type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartDefinition {
    /// Internal part name (lookup key).
    pub name: String,
    /// Human readable title.
    pub title: String,
    /// Catalog cost, including a full load of every resource the part holds.
    pub cost: f64,
}

/// Catalog entry for a resource type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDefinition {
    pub name: String,
    /// Mass per unit in tons. Zero for massless resources such as electric charge.
    pub density: f64,
    /// Funds per unit.
    pub unit_cost: f64,
}

impl ResourceDefinition {
    /// Whether a unit of this resource weighs anything.
    pub fn has_mass(&self) -> bool {
        self.density > 0.0
    }
}

/// Catalog entry for a celestial body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyDefinition {
    pub name: String,
    /// Mean radius in meters.
    pub radius: f64,
    /// Altitude of the top of the atmosphere in meters, 0 for airless bodies.
    pub atmosphere_height: f64,
}

/// Lookup table for parts, resources and bodies.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    parts: HashMap<String, PartDefinition>,
    resources: HashMap<String, ResourceDefinition>,
    bodies: HashMap<String, BodyDefinition>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a part type. A duplicate name keeps the first definition.
    pub fn add_part(&mut self, name: &str, title: &str, cost: f64) {
        if self.parts.contains_key(name) {
            log::error!("duplicate part definition '{name}' ignored");
            return;
        }
        self.parts.insert(
            name.to_string(),
            PartDefinition {
                name: name.to_string(),
                title: title.to_string(),
                cost,
            },
        );
    }

    /// Register a resource type. A duplicate name keeps the first definition.
    pub fn add_resource(&mut self, name: &str, density: f64, unit_cost: f64) {
        if self.resources.contains_key(name) {
            log::error!("duplicate resource definition '{name}' ignored");
            return;
        }
        self.resources.insert(
            name.to_string(),
            ResourceDefinition {
                name: name.to_string(),
                density,
                unit_cost,
            },
        );
    }

    /// Register a celestial body. A duplicate name keeps the first definition.
    pub fn add_body(&mut self, name: &str, radius: f64, atmosphere_height: f64) {
        if self.bodies.contains_key(name) {
            log::error!("duplicate body definition '{name}' ignored");
            return;
        }
        self.bodies.insert(
            name.to_string(),
            BodyDefinition {
                name: name.to_string(),
                radius,
                atmosphere_height,
            },
        );
    }

    pub fn with_part(mut self, name: &str, title: &str, cost: f64) -> Self {
        self.add_part(name, title, cost);
        self
    }

    pub fn with_resource(mut self, name: &str, density: f64, unit_cost: f64) -> Self {
        self.add_resource(name, density, unit_cost);
        self
    }

    pub fn with_body(mut self, name: &str, radius: f64, atmosphere_height: f64) -> Self {
        self.add_body(name, radius, atmosphere_height);
        self
    }

    /// Look up a part by its (possibly decorated) name.
    pub fn part(&self, name: &str) -> Option<&PartDefinition> {
        self.parts.get(sanitize_part_name(name))
    }

    pub fn resource(&self, name: &str) -> Option<&ResourceDefinition> {
        self.resources.get(name)
    }

    pub fn body(&self, name: &str) -> Option<&BodyDefinition> {
        self.bodies.get(name)
    }

    /// Display title of a part, falling back to the raw name.
    pub fn part_title(&self, name: &str) -> String {
        match self.part(name) {
            Some(def) => def.title.clone(),
            None => name.to_string(),
        }
    }

    /// Lowest altitude at which a stable orbit around `body` is possible.
    ///
    /// Unknown bodies report 0, which keeps deployment disabled there.
    pub fn min_safe_altitude(&self, body: &str) -> f64 {
        self.body(body).map(|b| b.atmosphere_height).unwrap_or(0.0)
    }

    /// Density of a resource, 0 when unknown.
    pub fn density(&self, resource: &str) -> f64 {
        self.resource(resource).map(|r| r.density).unwrap_or(0.0)
    }

    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }
}

/// Strip a vessel-name decoration such as `"probeCore (Relay 1)"` from a part name.
///
/// Only a trailing parenthesised group is removed, and only when the name
/// ends with `)`.
pub fn sanitize_part_name(name: &str) -> &str {
    if !name.ends_with(')') {
        return name;
    }
    match name.find(" (") {
        Some(index) => &name[..index],
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::new()
            .with_part("dockingPort2", "Clamp-O-Tron Docking Port", 280.0)
            .with_resource("LiquidFuel", 0.005, 0.8)
            .with_resource("ElectricCharge", 0.0, 0.0)
            .with_body("Kerbin", 600_000.0, 70_000.0)
    }

    #[test]
    fn test_sanitize_strips_vessel_suffix() {
        assert_eq!(sanitize_part_name("probeCoreOcto (Relay 1)"), "probeCoreOcto");
        assert_eq!(sanitize_part_name("fuelTank"), "fuelTank");
        assert_eq!(sanitize_part_name("weird(name)"), "weird(name)");
        assert_eq!(sanitize_part_name("tank (A) spare"), "tank (A) spare");
    }

    #[test]
    fn test_part_lookup_uses_sanitized_name() {
        let cat = catalog();
        let def = cat.part("dockingPort2 (Station)").unwrap();
        assert_eq!(def.cost, 280.0);
        assert_eq!(cat.part_title("dockingPort2"), "Clamp-O-Tron Docking Port");
    }

    #[test]
    fn test_unknown_part_title_falls_back_to_name() {
        assert_eq!(catalog().part_title("mysteryPart"), "mysteryPart");
    }

    #[test]
    fn test_duplicate_definitions_keep_first() {
        let mut cat = catalog();
        cat.add_resource("LiquidFuel", 1.0, 1.0);
        cat.add_part("dockingPort2", "Other", 1.0);
        assert_eq!(cat.resource("LiquidFuel").unwrap().density, 0.005);
        assert_eq!(cat.part_title("dockingPort2"), "Clamp-O-Tron Docking Port");
        assert_eq!(cat.resource_count(), 2);
        assert_eq!(cat.part_count(), 1);
    }

    #[test]
    fn test_massless_resource() {
        let cat = catalog();
        assert!(cat.resource("LiquidFuel").unwrap().has_mass());
        assert!(!cat.resource("ElectricCharge").unwrap().has_mass());
        assert_eq!(cat.density("Unobtainium"), 0.0);
    }

    #[test]
    fn test_min_safe_altitude() {
        let cat = catalog();
        assert_eq!(cat.min_safe_altitude("Kerbin"), 70_000.0);
        assert_eq!(cat.min_safe_altitude("Mun"), 0.0);
    }
}
