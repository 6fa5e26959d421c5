//! Per-tick usage sampling.
//!
//! A part counts as used once an engine on it produced thrust, or once the
//! amount of any mass-bearing resource in it differs from the amount first
//! observed. Used parts can no longer be delivered as payload.

use std::collections::{BTreeSet, HashMap};

use crate::catalog::Catalog;
use crate::part_graph::{PartGraph, PartId};

/// Remembers the first observed resource levels of every part.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsageTracker {
    baseline: HashMap<PartId, HashMap<String, f64>>,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every baseline.
    pub fn reset(&mut self) {
        self.baseline.clear();
    }

    /// Sample the graph once and return parts that became used since the last call.
    ///
    /// Parts already in `used` are skipped. Baselines are recorded on first
    /// sight and never updated afterwards.
    pub fn sample(
        &mut self,
        graph: &PartGraph,
        catalog: &Catalog,
        used: &BTreeSet<PartId>,
    ) -> Vec<PartId> {
        let mut newly_used = Vec::new();
        for part in graph.parts() {
            if used.contains(&part.id) {
                continue;
            }

            let mut is_used = part.capabilities.engine && part.thrust > 0.0;
            let seen = self.baseline.entry(part.id).or_default();
            for resource in &part.resources {
                let Some(def) = catalog.resource(&resource.name) else {
                    continue;
                };
                if !def.has_mass() {
                    continue;
                }
                match seen.get(&resource.name) {
                    Some(&first) => {
                        if first != resource.amount {
                            is_used = true;
                        }
                    }
                    None => {
                        seen.insert(resource.name.clone(), resource.amount);
                    }
                }
            }

            if is_used {
                newly_used.push(part.id);
            }
        }
        newly_used
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::part_graph::Part;

    fn catalog() -> Catalog {
        Catalog::new()
            .with_resource("LiquidFuel", 0.005, 0.8)
            .with_resource("ElectricCharge", 0.0, 0.0)
    }

    fn graph() -> PartGraph {
        let mut g = PartGraph::new();
        g.add_root(
            Part::new(1, "probe", 0.1).with_resource("ElectricCharge", 10.0, 10.0),
        )
        .unwrap();
        g.attach(PartId(1), Part::new(2, "tank", 1.0).with_resource("LiquidFuel", 90.0, 90.0))
            .unwrap();
        g.attach(PartId(2), Part::new(3, "engine", 1.5).with_engine())
            .unwrap();
        g
    }

    #[test]
    fn test_first_sample_marks_nothing() {
        let mut tracker = UsageTracker::new();
        assert!(tracker.sample(&graph(), &catalog(), &BTreeSet::new()).is_empty());
    }

    #[test]
    fn test_drained_tank_is_used() {
        let mut tracker = UsageTracker::new();
        let mut g = graph();
        tracker.sample(&g, &catalog(), &BTreeSet::new());
        g.part_mut(PartId(2)).unwrap().resources[0].amount = 80.0;
        assert_eq!(tracker.sample(&g, &catalog(), &BTreeSet::new()), vec![PartId(2)]);
    }

    #[test]
    fn test_massless_drain_is_ignored() {
        let mut tracker = UsageTracker::new();
        let mut g = graph();
        tracker.sample(&g, &catalog(), &BTreeSet::new());
        g.part_mut(PartId(1)).unwrap().resources[0].amount = 2.0;
        assert!(tracker.sample(&g, &catalog(), &BTreeSet::new()).is_empty());
    }

    #[test]
    fn test_thrusting_engine_is_used_immediately() {
        let mut tracker = UsageTracker::new();
        let mut g = graph();
        g.part_mut(PartId(3)).unwrap().thrust = 215.0;
        assert_eq!(tracker.sample(&g, &catalog(), &BTreeSet::new()), vec![PartId(3)]);
    }

    #[test]
    fn test_baseline_is_never_updated() {
        let mut tracker = UsageTracker::new();
        let mut g = graph();
        tracker.sample(&g, &catalog(), &BTreeSet::new());
        g.part_mut(PartId(2)).unwrap().resources[0].amount = 80.0;
        tracker.sample(&g, &catalog(), &BTreeSet::new());
        // Refilled back to the first observed level: no longer differs.
        g.part_mut(PartId(2)).unwrap().resources[0].amount = 90.0;
        assert!(tracker.sample(&g, &catalog(), &BTreeSet::new()).is_empty());
    }

    #[test]
    fn test_already_used_parts_are_skipped() {
        let mut tracker = UsageTracker::new();
        let mut g = graph();
        g.part_mut(PartId(3)).unwrap().thrust = 10.0;
        let used: BTreeSet<PartId> = [PartId(3)].into_iter().collect();
        assert!(tracker.sample(&g, &catalog(), &used).is_empty());
    }
}
