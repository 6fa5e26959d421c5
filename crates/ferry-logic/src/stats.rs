//! Snapshot of the numbers a flight recording needs from its vessel.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::part_graph::PartId;
use crate::partition::{find_payload_assemblies, Assembly};
use crate::vessel::Vessel;

/// A mass-bearing resource that could be dumped into a target vessel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadResource {
    pub name: String,
    pub amount: f64,
    /// Mass per unit (the resource density), in tons.
    pub mass: f64,
}

impl PayloadResource {
    pub fn total_mass(&self) -> f64 {
        self.amount * self.mass
    }
}

/// Cost, mass, capabilities and payload options of a vessel at one instant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VesselStats {
    /// Dry cost of every part plus the value of the resources currently aboard.
    pub cost: f64,
    /// Total mass including resources, in tons.
    pub mass: f64,
    pub has_docking_port: bool,
    pub has_separator: bool,
    pub has_crew: bool,
    pub has_rcs: bool,
    /// Mass-bearing resources aboard, keyed by name.
    pub payload_resources: BTreeMap<String, PayloadResource>,
    pub payload_assemblies: Vec<Assembly>,
    pub docking_port_types: Vec<String>,
}

impl VesselStats {
    /// Gather stats for `vessel`, treating `used` parts as ineligible payload.
    pub fn gather(vessel: &Vessel, catalog: &Catalog, used: &BTreeSet<PartId>) -> Self {
        let graph = &vessel.parts;
        let mut stats = VesselStats {
            has_crew: graph.crew_count() > 0,
            docking_port_types: graph.docking_port_types(),
            ..Default::default()
        };

        for part in graph.parts() {
            if part.has_docking_port() {
                stats.has_docking_port = true;
            }
            if part.capabilities.decoupler {
                stats.has_separator = true;
            }
            if part.capabilities.rcs {
                stats.has_rcs = true;
            }

            stats.mass += part.total_mass(catalog);

            let mut resource_cost = 0.0;
            let mut resource_cost_max = 0.0;
            for resource in &part.resources {
                let Some(def) = catalog.resource(&resource.name) else {
                    log::warn!("resource '{}' not found in catalog", resource.name);
                    continue;
                };
                resource_cost += resource.amount * def.unit_cost;
                resource_cost_max += resource.max_amount * def.unit_cost;

                if def.has_mass() && resource.amount > 0.0 {
                    stats
                        .payload_resources
                        .entry(resource.name.clone())
                        .and_modify(|p| p.amount += resource.amount)
                        .or_insert_with(|| PayloadResource {
                            name: resource.name.clone(),
                            amount: resource.amount,
                            mass: def.density,
                        });
                }
            }
            stats.cost += resource_cost;

            match catalog.part(&part.name) {
                Some(def) => stats.cost += def.cost - resource_cost_max,
                None => log::warn!("part '{}' not found in catalog", part.name),
            }
        }

        let crewed = graph.crewed_parts();
        stats.payload_assemblies = find_payload_assemblies(graph, catalog, used, &crewed);
        stats
    }

    /// Payload resources in name order.
    pub fn payload_resources(&self) -> Vec<PayloadResource> {
        self.payload_resources.values().cloned().collect()
    }

    /// Candidate assemblies, most valuable first.
    pub fn payload_assemblies(&self) -> Vec<Assembly> {
        let mut out = self.payload_assemblies.clone();
        out.sort_by(|a, b| b.value.total_cmp(&a.value));
        out
    }
}
