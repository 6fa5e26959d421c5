//! Structural part graph of a single vessel.
//!
//! Parts live in a flat table addressed by [`PartId`]. Attachment edges are
//! stored as parent/child ids on each part, so the graph is a tree whose root
//! is the first part in the table. Walking it never needs shared ownership:
//! every step is an id lookup.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;

/// Stable per-vessel part identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartId(pub u32);

impl fmt::Display for PartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A resource container on a part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartResource {
    pub name: String,
    pub amount: f64,
    pub max_amount: f64,
}

impl PartResource {
    pub fn new(name: &str, amount: f64, max_amount: f64) -> Self {
        Self {
            name: name.to_string(),
            amount,
            max_amount,
        }
    }

    /// Room left in this container.
    pub fn free(&self) -> f64 {
        (self.max_amount - self.amount).max(0.0)
    }
}

/// Capability modules fitted to a part.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Decoupler or separator.
    pub decoupler: bool,
    /// Docking node types, e.g. `"size1"`.
    pub docking_ports: Vec<String>,
    pub rcs: bool,
    pub engine: bool,
    /// Number of crew seats.
    pub crew_capacity: u32,
}

/// One structural node of a vessel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub id: PartId,
    /// Internal part name, possibly decorated with a vessel name suffix.
    pub name: String,
    /// Dry mass in tons.
    pub mass: f64,
    pub resources: Vec<PartResource>,
    pub capabilities: Capabilities,
    /// Current engine thrust in kN.
    pub thrust: f64,
    /// Names of the crew seated in this part.
    pub crew: Vec<String>,
    pub parent: Option<PartId>,
    pub children: Vec<PartId>,
}

impl Part {
    pub fn new(id: u32, name: &str, mass: f64) -> Self {
        Self {
            id: PartId(id),
            name: name.to_string(),
            mass,
            resources: Vec::new(),
            capabilities: Capabilities::default(),
            thrust: 0.0,
            crew: Vec::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn with_resource(mut self, name: &str, amount: f64, max_amount: f64) -> Self {
        self.resources.push(PartResource::new(name, amount, max_amount));
        self
    }

    pub fn with_decoupler(mut self) -> Self {
        self.capabilities.decoupler = true;
        self
    }

    pub fn with_docking_port(mut self, node_type: &str) -> Self {
        self.capabilities.docking_ports.push(node_type.to_string());
        self
    }

    pub fn with_rcs(mut self) -> Self {
        self.capabilities.rcs = true;
        self
    }

    pub fn with_engine(mut self) -> Self {
        self.capabilities.engine = true;
        self
    }

    pub fn with_seats(mut self, seats: u32) -> Self {
        self.capabilities.crew_capacity = seats;
        self
    }

    /// Seat a crew member. Ignored when every seat is taken.
    pub fn with_crew(mut self, name: &str) -> Self {
        if self.free_seats() > 0 {
            self.crew.push(name.to_string());
        }
        self
    }

    /// Decouplers and docking ports are legal detachment boundaries.
    pub fn is_separator(&self) -> bool {
        self.capabilities.decoupler || !self.capabilities.docking_ports.is_empty()
    }

    pub fn has_docking_port(&self) -> bool {
        !self.capabilities.docking_ports.is_empty()
    }

    pub fn resource(&self, name: &str) -> Option<&PartResource> {
        self.resources.iter().find(|r| r.name == name)
    }

    pub fn free_seats(&self) -> u32 {
        self.capabilities
            .crew_capacity
            .saturating_sub(self.crew.len() as u32)
    }

    /// Mass of the resources currently held, using catalog densities.
    pub fn resource_mass(&self, catalog: &Catalog) -> f64 {
        self.resources
            .iter()
            .map(|r| r.amount * catalog.density(&r.name))
            .sum()
    }

    /// Dry mass plus the resources currently held.
    pub fn total_mass(&self, catalog: &Catalog) -> f64 {
        self.mass + self.resource_mass(catalog)
    }
}

/// Structural errors raised while building a graph.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    #[error("part {0} already exists")]
    DuplicatePart(PartId),
    #[error("unknown part {0}")]
    UnknownPart(PartId),
    #[error("graph already has a root part")]
    RootExists,
}

/// Attachment tree of a vessel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartGraph {
    parts: Vec<Part>,
}

impl PartGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place the root part. Fails if the graph is not empty.
    pub fn add_root(&mut self, mut part: Part) -> Result<PartId, GraphError> {
        if !self.parts.is_empty() {
            return Err(GraphError::RootExists);
        }
        part.parent = None;
        part.children.clear();
        let id = part.id;
        self.parts.push(part);
        Ok(id)
    }

    /// Attach `part` below `parent`.
    pub fn attach(&mut self, parent: PartId, mut part: Part) -> Result<PartId, GraphError> {
        if self.contains(part.id) {
            return Err(GraphError::DuplicatePart(part.id));
        }
        let id = part.id;
        let parent_part = self
            .part_mut(parent)
            .ok_or(GraphError::UnknownPart(parent))?;
        parent_part.children.push(id);
        part.parent = Some(parent);
        part.children.clear();
        self.parts.push(part);
        Ok(id)
    }

    pub fn root(&self) -> Option<PartId> {
        self.parts.first().map(|p| p.id)
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn contains(&self, id: PartId) -> bool {
        self.parts.iter().any(|p| p.id == id)
    }

    pub fn part(&self, id: PartId) -> Option<&Part> {
        self.parts.iter().find(|p| p.id == id)
    }

    pub fn part_mut(&mut self, id: PartId) -> Option<&mut Part> {
        self.parts.iter_mut().find(|p| p.id == id)
    }

    /// All parts in table order (root first).
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn parts_mut(&mut self) -> &mut [Part] {
        &mut self.parts
    }

    /// Children first, then the parent.
    pub fn neighbors(&self, id: PartId) -> Vec<PartId> {
        let Some(part) = self.part(id) else {
            return Vec::new();
        };
        let mut out = part.children.clone();
        out.extend(part.parent);
        out
    }

    /// `id` and everything attached below it, in pre-order.
    pub fn subtree(&self, id: PartId) -> Vec<PartId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(part) = self.part(current) else {
                continue;
            };
            out.push(current);
            stack.extend(part.children.iter().rev().copied());
        }
        out
    }

    /// Cut every child subtree off `id` and return each as its own graph.
    ///
    /// `id` itself stays in this graph. Returns nothing if `id` is unknown.
    pub fn detach_children(&mut self, id: PartId) -> Vec<PartGraph> {
        let Some(children) = self.part(id).map(|p| p.children.clone()) else {
            return Vec::new();
        };
        let mut detached = Vec::with_capacity(children.len());
        for child in children {
            let ids = self.subtree(child);
            let mut graph = PartGraph::new();
            for part_id in &ids {
                if let Some(index) = self.parts.iter().position(|p| p.id == *part_id) {
                    let mut part = self.parts.remove(index);
                    if part.id == child {
                        part.parent = None;
                    }
                    graph.parts.push(part);
                }
            }
            detached.push(graph);
        }
        if let Some(part) = self.part_mut(id) {
            part.children.clear();
        }
        detached
    }

    /// Ids of every part holding at least one crew member.
    pub fn crewed_parts(&self) -> BTreeSet<PartId> {
        self.parts
            .iter()
            .filter(|p| !p.crew.is_empty())
            .map(|p| p.id)
            .collect()
    }

    /// Names of everyone aboard, in part order.
    pub fn crew(&self) -> Vec<String> {
        self.parts.iter().flat_map(|p| p.crew.iter().cloned()).collect()
    }

    pub fn crew_count(&self) -> u32 {
        self.parts.iter().map(|p| p.crew.len() as u32).sum()
    }

    pub fn crew_capacity(&self) -> u32 {
        self.parts.iter().map(|p| p.capabilities.crew_capacity).sum()
    }

    /// Distinct docking node types, in first-seen order.
    pub fn docking_port_types(&self) -> Vec<String> {
        let mut types: Vec<String> = Vec::new();
        for port in self.parts.iter().flat_map(|p| &p.capabilities.docking_ports) {
            if !types.contains(port) {
                types.push(port.clone());
            }
        }
        types
    }

    pub fn total_mass(&self, catalog: &Catalog) -> f64 {
        self.parts.iter().map(|p| p.total_mass(catalog)).sum()
    }

    /// Total amount of one resource across all parts.
    pub fn resource_amount(&self, name: &str) -> f64 {
        self.parts
            .iter()
            .flat_map(|p| &p.resources)
            .filter(|r| r.name == name)
            .map(|r| r.amount)
            .sum()
    }

    /// Drain up to `amount` of a resource, taking from parts in table order.
    ///
    /// Returns the amount actually drained.
    pub fn drain_resource(&mut self, name: &str, amount: f64) -> f64 {
        let mut remaining = amount.max(0.0);
        let mut drained = 0.0;
        for resource in self
            .parts
            .iter_mut()
            .flat_map(|p| p.resources.iter_mut())
            .filter(|r| r.name == name)
        {
            if remaining <= 0.0 {
                break;
            }
            let take = resource.amount.min(remaining);
            resource.amount -= take;
            remaining -= take;
            drained += take;
        }
        drained
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// pod(1) -> tank(2) -> decoupler(3) -> probe(4) -> tank(5)
    fn stack() -> PartGraph {
        let mut g = PartGraph::new();
        g.add_root(Part::new(1, "pod", 1.0).with_seats(1)).unwrap();
        g.attach(PartId(1), Part::new(2, "tank", 0.5).with_resource("LiquidFuel", 100.0, 100.0))
            .unwrap();
        g.attach(PartId(2), Part::new(3, "decoupler", 0.1).with_decoupler())
            .unwrap();
        g.attach(PartId(3), Part::new(4, "probe", 0.2)).unwrap();
        g.attach(PartId(4), Part::new(5, "tank", 0.5).with_resource("LiquidFuel", 40.0, 50.0))
            .unwrap();
        g
    }

    #[test]
    fn test_attach_rejects_duplicates_and_unknown_parents() {
        let mut g = stack();
        assert_eq!(
            g.attach(PartId(1), Part::new(2, "dup", 1.0)),
            Err(GraphError::DuplicatePart(PartId(2)))
        );
        assert_eq!(
            g.attach(PartId(99), Part::new(6, "orphan", 1.0)),
            Err(GraphError::UnknownPart(PartId(99)))
        );
        assert_eq!(g.add_root(Part::new(7, "root", 1.0)), Err(GraphError::RootExists));
        assert_eq!(g.len(), 5);
    }

    #[test]
    fn test_neighbors_children_then_parent() {
        let g = stack();
        assert_eq!(g.neighbors(PartId(3)), vec![PartId(4), PartId(2)]);
        assert_eq!(g.neighbors(PartId(1)), vec![PartId(2)]);
        assert!(g.neighbors(PartId(42)).is_empty());
    }

    #[test]
    fn test_subtree_preorder() {
        let g = stack();
        assert_eq!(g.subtree(PartId(3)), vec![PartId(3), PartId(4), PartId(5)]);
    }

    #[test]
    fn test_detach_children_keeps_separator() {
        let mut g = stack();
        let detached = g.detach_children(PartId(3));
        assert_eq!(detached.len(), 1);
        assert_eq!(detached[0].root(), Some(PartId(4)));
        assert_eq!(detached[0].len(), 2);
        assert_eq!(detached[0].part(PartId(4)).unwrap().parent, None);
        assert_eq!(g.len(), 3);
        assert!(g.contains(PartId(3)));
        assert!(g.part(PartId(3)).unwrap().children.is_empty());
    }

    #[test]
    fn test_drain_resource_in_part_order() {
        let mut g = stack();
        let drained = g.drain_resource("LiquidFuel", 120.0);
        assert_eq!(drained, 120.0);
        assert_eq!(g.part(PartId(2)).unwrap().resources[0].amount, 0.0);
        assert_eq!(g.part(PartId(5)).unwrap().resources[0].amount, 20.0);
        assert_eq!(g.drain_resource("LiquidFuel", 500.0), 20.0);
        assert_eq!(g.resource_amount("LiquidFuel"), 0.0);
    }

    #[test]
    fn test_crew_bookkeeping() {
        let mut g = stack();
        g.part_mut(PartId(1)).unwrap().crew.push("Jebediah".into());
        assert_eq!(g.crew_count(), 1);
        assert_eq!(g.crew_capacity(), 1);
        assert_eq!(g.crewed_parts().into_iter().collect::<Vec<_>>(), vec![PartId(1)]);
        assert_eq!(g.part(PartId(1)).unwrap().free_seats(), 0);
    }

    #[test]
    fn test_docking_port_types_are_deduplicated() {
        let mut g = PartGraph::new();
        g.add_root(Part::new(1, "core", 1.0).with_docking_port("size1")).unwrap();
        g.attach(PartId(1), Part::new(2, "port", 0.1).with_docking_port("size1"))
            .unwrap();
        g.attach(PartId(1), Part::new(3, "port", 0.1).with_docking_port("size2"))
            .unwrap();
        assert_eq!(g.docking_port_types(), vec!["size1".to_string(), "size2".to_string()]);
    }

    #[test]
    fn test_with_crew_respects_seats() {
        let part = Part::new(1, "pod", 1.0).with_seats(1).with_crew("A").with_crew("B");
        assert_eq!(part.crew, vec!["A".to_string()]);
    }
}
