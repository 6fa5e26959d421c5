//! Mission scheduler: pending missions keyed by id, executed when due.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::mission::{Mission, MissionContext};

/// Stable handle for a scheduled mission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MissionId(pub u64);

/// What one scheduler tick did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub completed: Vec<MissionId>,
    /// Due but not executable yet. Retried next tick.
    pub deferred: Vec<MissionId>,
    /// Dropped because execution failed.
    pub failed: Vec<MissionId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MissionScheduler {
    missions: BTreeMap<MissionId, Mission>,
    next_id: u64,
}

impl MissionScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, mission: Mission) -> MissionId {
        let id = MissionId(self.next_id);
        self.next_id += 1;
        log::info!(
            "scheduled {} mission '{}' due at {:.0}",
            mission.kind.label(),
            mission.profile_name,
            mission.eta()
        );
        self.missions.insert(id, mission);
        id
    }

    pub fn cancel(&mut self, id: MissionId) -> Option<Mission> {
        self.missions.remove(&id)
    }

    /// Drop every mission flown with `profile_name`. Returns how many went.
    pub fn cancel_profile(&mut self, profile_name: &str) -> usize {
        let before = self.missions.len();
        self.missions.retain(|_, m| m.profile_name != profile_name);
        before - self.missions.len()
    }

    /// Point missions flown with `old` at the renamed profile `new`.
    pub fn rename_profile(&mut self, old: &str, new: &str) -> usize {
        let mut renamed = 0;
        for mission in self.missions.values_mut().filter(|m| m.profile_name == old) {
            mission.profile_name = new.to_string();
            renamed += 1;
        }
        renamed
    }

    pub fn get(&self, id: MissionId) -> Option<&Mission> {
        self.missions.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (MissionId, &Mission)> {
        self.missions.iter().map(|(id, m)| (*id, m))
    }

    pub fn len(&self) -> usize {
        self.missions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.missions.is_empty()
    }

    /// The mission a crew member is booked on, if any.
    pub fn crew_mission(&self, name: &str) -> Option<MissionId> {
        self.iter().find(|(_, m)| m.involves_crew(name)).map(|(id, _)| id)
    }

    /// Execute every due mission in id order.
    pub fn tick(&mut self, ctx: &mut MissionContext<'_>) -> TickReport {
        let mut report = TickReport::default();
        let due: Vec<MissionId> = self
            .missions
            .iter()
            .filter(|(_, m)| m.is_due(ctx.now))
            .map(|(id, _)| *id)
            .collect();

        for id in due {
            let Some(mission) = self.missions.get(&id) else {
                continue;
            };
            match mission.try_execute(ctx) {
                Ok(true) => {
                    self.missions.remove(&id);
                    report.completed.push(id);
                }
                Ok(false) => report.deferred.push(id),
                Err(err) => {
                    log::error!("cancelling broken {} mission '{}': {err}", mission.kind.label(), mission.profile_name);
                    ctx.notices.push(format!("Mission '{}' cancelled: {err}", mission.profile_name));
                    self.missions.remove(&id);
                    report.failed.push(id);
                }
            }
        }
        report
    }
}
