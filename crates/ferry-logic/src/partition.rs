//! Payload partitioning: find the detachable sub-assemblies of a vessel.
//!
//! The walk starts at the root part and visits the attachment tree in
//! post-order, never stepping back over the edge it arrived on. Every
//! separator (decoupler or docking port) with something on its far side is a
//! cut point. If nothing beyond the cut was used during the flight or holds
//! crew, the far side is offered as an [`Assembly`]. Nested candidates are
//! all offered; deployment picks them largest-first.
//!
//! A tainted cut point drops everything gathered below it, so an outer
//! separator only sees the separator itself and what lies on the near side.
//! Separator orientation is not considered: a docking port that stays on the
//! carrier counts the same as one that leaves with the payload.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::part_graph::{Part, PartGraph, PartId};

/// A group of connected parts that can be jettisoned as a unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assembly {
    /// Id of the separator the group is cut from.
    pub id: PartId,
    /// Title of the separator part.
    pub name: String,
    /// Current mass including held resources, in tons.
    pub mass: f64,
    /// Current value, catalog cost adjusted for the actual resource fill.
    pub value: f64,
    pub part_count: usize,
    /// The separator itself. It stays with the carrier when the group is cut.
    pub detachment_part: PartId,
    /// Parts of the group in post-order. Excludes the separator.
    pub parts: Vec<PartId>,
    pub contains_invalid_parts: bool,
}

#[derive(Debug, Clone, Default)]
struct Accumulator {
    mass: f64,
    value: f64,
    part_count: usize,
    parts: Vec<PartId>,
    contains_invalid_parts: bool,
}

impl Accumulator {
    fn absorb(&mut self, other: Accumulator) {
        self.mass += other.mass;
        self.value += other.value;
        self.part_count += other.part_count;
        self.parts.extend(other.parts);
        self.contains_invalid_parts |= other.contains_invalid_parts;
    }

    fn add_part(&mut self, part: &Part, catalog: &Catalog) {
        self.mass += part.total_mass(catalog);
        self.value += part_value(part, catalog);
        self.part_count += 1;
        self.parts.push(part.id);
    }
}

/// Recursive walker over one vessel's part graph.
pub struct PayloadPartitioner<'a> {
    graph: &'a PartGraph,
    catalog: &'a Catalog,
    used: &'a BTreeSet<PartId>,
    crewed: &'a BTreeSet<PartId>,
    found: Vec<Assembly>,
}

impl<'a> PayloadPartitioner<'a> {
    pub fn new(
        graph: &'a PartGraph,
        catalog: &'a Catalog,
        used: &'a BTreeSet<PartId>,
        crewed: &'a BTreeSet<PartId>,
    ) -> Self {
        Self {
            graph,
            catalog,
            used,
            crewed,
            found: Vec::new(),
        }
    }

    /// Walk from the root and return every valid candidate in emission order.
    pub fn run(mut self) -> Vec<Assembly> {
        if let Some(root) = self.graph.root() {
            self.walk(root, None);
        }
        self.found
    }

    fn walk(&mut self, id: PartId, from: Option<PartId>) -> Accumulator {
        let graph = self.graph;
        let Some(part) = graph.part(id) else {
            return Accumulator::default();
        };

        let mut acc = Accumulator::default();
        for neighbor in graph.neighbors(id) {
            if Some(neighbor) == from {
                continue;
            }
            let sub = self.walk(neighbor, Some(id));
            acc.absorb(sub);
        }

        if acc.part_count > 0 && part.is_separator() {
            if acc.contains_invalid_parts {
                acc = Accumulator::default();
            } else if !self.found.iter().any(|a| a.id == id) {
                self.found.push(Assembly {
                    id,
                    name: self.catalog.part_title(&part.name),
                    mass: acc.mass,
                    value: acc.value,
                    part_count: acc.part_count,
                    detachment_part: id,
                    parts: acc.parts.clone(),
                    contains_invalid_parts: false,
                });
            }
        }

        if self.used.contains(&id) || self.crewed.contains(&id) {
            acc.contains_invalid_parts = true;
        }

        acc.add_part(part, self.catalog);
        acc
    }
}

/// Find every detachable payload assembly of `graph`.
pub fn find_payload_assemblies(
    graph: &PartGraph,
    catalog: &Catalog,
    used: &BTreeSet<PartId>,
    crewed: &BTreeSet<PartId>,
) -> Vec<Assembly> {
    PayloadPartitioner::new(graph, catalog, used, crewed).run()
}

/// Value of a part at its current resource fill.
///
/// Parts missing from the catalog are worth nothing; resources missing from
/// the catalog are skipped.
pub fn part_value(part: &Part, catalog: &Catalog) -> f64 {
    let Some(def) = catalog.part(&part.name) else {
        return 0.0;
    };
    let mut value = def.cost;
    for resource in &part.resources {
        let Some(res) = catalog.resource(&resource.name) else {
            continue;
        };
        value -= res.unit_cost * resource.max_amount;
        value += res.unit_cost * resource.amount;
    }
    value
}

/// Candidates not contained in any other candidate.
pub fn top_level(assemblies: &[Assembly]) -> Vec<&Assembly> {
    assemblies
        .iter()
        .filter(|a| {
            !assemblies
                .iter()
                .any(|outer| outer.id != a.id && outer.parts.contains(&a.detachment_part))
        })
        .collect()
}
