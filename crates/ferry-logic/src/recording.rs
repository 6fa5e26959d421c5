//! Flight recording: the live tracking object for one vessel's current flight.
//!
//! A recording walks `Prelaunch -> Ascending -> Descending` and never goes
//! back. While pre-launch it keeps capturing the launch cost and mass; while
//! ascending it tracks whether the vessel sits in a stable orbit around its
//! launch body; deploying payload moves it to descending, after which it can
//! be finished into a [`MissionProfile`](crate::profile::MissionProfile).
//!
//! Deployment calls made in the wrong state do nothing. Callers gate them with
//! [`FlightRecording::can_deploy`] and [`FlightRecording::can_perform_mission`].

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::part_graph::{PartGraph, PartId};
use crate::partition::Assembly;
use crate::profile::ProfileType;
use crate::stats::{PayloadResource, VesselStats};
use crate::usage::UsageTracker;
use crate::vessel::{Situation, Vessel};

/// Recording phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordingStatus {
    Prelaunch,
    Ascending,
    Descending,
}

impl RecordingStatus {
    pub fn label(self) -> &'static str {
        match self {
            RecordingStatus::Prelaunch => "pre-launch",
            RecordingStatus::Ascending => "ascending",
            RecordingStatus::Descending => "descending",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct LastSeen {
    body: String,
    situation: Situation,
}

/// Tracks one vessel's flight from the launch pad to the finished profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightRecording {
    pub status: RecordingStatus,
    /// Name the finished profile will get. Defaults to the vessel name.
    pub profile_name: String,
    /// Set once payload was deployed.
    pub mission_type: Option<ProfileType>,
    pub start_time: f64,
    pub deployment_time: f64,
    pub launch_cost: f64,
    /// Launch mass in tons.
    pub launch_mass: f64,
    pub launch_body: String,
    /// Lowest altitude of a stable orbit around the launch body.
    pub min_altitude: f64,
    /// Periapsis while in a stable orbit around the launch body, else 0.
    pub max_altitude: f64,
    pub payload_mass: f64,
    /// Crew was aboard at launch, so the vessel has to land again.
    pub must_return: bool,
    pub used_part_ids: BTreeSet<PartId>,
    /// Docking node types captured at deployment.
    pub docking_port_types: Vec<String>,

    #[serde(skip)]
    stats: Option<VesselStats>,
    #[serde(skip)]
    tracker: UsageTracker,
    #[serde(skip)]
    last_seen: Option<LastSeen>,
}

impl FlightRecording {
    /// Start a pre-launch recording for `vessel` at time `now`.
    pub fn new(vessel: &Vessel, catalog: &Catalog, now: f64) -> Self {
        let mut recording = Self {
            status: RecordingStatus::Prelaunch,
            profile_name: vessel.name.clone(),
            mission_type: None,
            start_time: now,
            deployment_time: 0.0,
            launch_cost: 0.0,
            launch_mass: 0.0,
            launch_body: vessel.body.clone(),
            min_altitude: catalog.min_safe_altitude(&vessel.body),
            max_altitude: 0.0,
            payload_mass: 0.0,
            must_return: false,
            used_part_ids: BTreeSet::new(),
            docking_port_types: Vec::new(),
            stats: None,
            tracker: UsageTracker::new(),
            last_seen: None,
        };
        recording.update(vessel, catalog);
        recording
    }

    /// The vessel left the pad.
    pub fn launch(&mut self) {
        if self.status == RecordingStatus::Prelaunch {
            self.status = RecordingStatus::Ascending;
        }
    }

    /// Refresh stats and phase-dependent values from the current vessel state.
    pub fn update(&mut self, vessel: &Vessel, catalog: &Catalog) {
        let stats = VesselStats::gather(vessel, catalog, &self.used_part_ids);

        match self.status {
            RecordingStatus::Prelaunch => {
                self.launch_cost = stats.cost;
                self.launch_mass = stats.mass;
                self.must_return = stats.has_crew;
            }
            RecordingStatus::Ascending => {
                self.max_altitude = match &vessel.orbit {
                    Some(orbit) if vessel.is_orbiting(&self.launch_body) => orbit.periapsis,
                    _ => 0.0,
                };
            }
            RecordingStatus::Descending => {}
        }

        self.stats = Some(stats);
        self.last_seen = Some(LastSeen {
            body: vessel.body.clone(),
            situation: vessel.situation,
        });
    }

    /// Sample engine thrust and resource levels, marking parts as used.
    ///
    /// Returns the parts marked by this call.
    pub fn sample_usage(&mut self, vessel: &Vessel, catalog: &Catalog) -> Vec<PartId> {
        let newly_used = self.tracker.sample(&vessel.parts, catalog, &self.used_part_ids);
        for id in &newly_used {
            if let Some(part) = vessel.parts.part(*id) {
                log::info!("marking part {} ({}) as used", part.name, id);
            }
            self.used_part_ids.insert(*id);
        }
        newly_used
    }

    /// Drop usage baselines, e.g. after switching to another vessel.
    pub fn reset_usage_baseline(&mut self) {
        self.tracker.reset();
    }

    /// Whether the vessel as last seen could fly a mission of this type.
    pub fn can_perform_mission(&self, kind: ProfileType) -> bool {
        let Some(stats) = &self.stats else {
            return false;
        };
        match kind {
            ProfileType::Transport => stats.has_docking_port && stats.has_rcs,
            ProfileType::Deploy => !stats.payload_assemblies.is_empty(),
        }
    }

    /// Ascending and already in a stable orbit.
    pub fn can_deploy(&self) -> bool {
        self.status == RecordingStatus::Ascending
            && self.min_altitude > 0.0
            && self.max_altitude > 0.0
    }

    /// Payload delivered and back where the flight started.
    pub fn can_finish(&self) -> bool {
        if self.status != RecordingStatus::Descending || self.payload_mass <= 0.0 {
            return false;
        }
        let Some(seen) = &self.last_seen else {
            return false;
        };
        if seen.body != self.launch_body {
            return false;
        }
        !self.must_return || seen.situation.is_landed()
    }

    /// Dump mass-bearing resources from the vessel as transport payload.
    ///
    /// Each requested amount is clamped to what is aboard and drained from the
    /// parts in order. Returns the dumped mass; 0 leaves the recording unchanged.
    pub fn deploy_payload_resources(
        &mut self,
        vessel: &mut Vessel,
        catalog: &Catalog,
        requested: &BTreeMap<String, f64>,
        now: f64,
    ) -> f64 {
        if !self.can_deploy() {
            return 0.0;
        }
        self.update(vessel, catalog);
        if !self.can_perform_mission(ProfileType::Transport) {
            return 0.0;
        }
        let Some(stats) = self.stats.clone() else {
            return 0.0;
        };

        let mut dumped_mass = 0.0;
        let mut dumped_funds = 0.0;
        for (name, amount) in requested {
            let Some(available) = stats.payload_resources.get(name) else {
                continue;
            };
            let amount = amount.min(available.amount).max(0.0);
            if amount <= 0.0 {
                continue;
            }
            let drained = vessel.parts.drain_resource(name, amount);
            if drained <= 0.0 {
                continue;
            }
            log::info!("dumped {drained:.2} of {name} from {}", vessel.name);
            dumped_mass += drained * available.mass;
            if let Some(def) = catalog.resource(name) {
                dumped_funds += drained * def.unit_cost;
            }
        }

        if dumped_mass > 0.0 {
            self.commit_deployment(ProfileType::Transport, dumped_mass, dumped_funds, &stats, now);
            self.update(vessel, catalog);
        }
        dumped_mass
    }

    /// Detach the selected assemblies, largest first.
    ///
    /// Assemblies whose separator is gone (cut off with a bigger one) are
    /// skipped. Returns the detached part graphs.
    pub fn deploy_payload_assemblies(
        &mut self,
        vessel: &mut Vessel,
        catalog: &Catalog,
        mut selected: Vec<Assembly>,
        now: f64,
    ) -> Vec<PartGraph> {
        if selected.is_empty() || !self.can_deploy() {
            return Vec::new();
        }
        self.update(vessel, catalog);
        let Some(stats) = self.stats.clone() else {
            return Vec::new();
        };

        selected.sort_by(|a, b| b.part_count.cmp(&a.part_count));

        let mut detached = Vec::new();
        let mut deployed_mass = 0.0;
        let mut deployed_funds = 0.0;
        for assembly in &selected {
            if !vessel.parts.contains(assembly.detachment_part) {
                continue;
            }
            let pieces = vessel.parts.detach_children(assembly.detachment_part);
            if pieces.is_empty() {
                continue;
            }
            log::info!("detached '{}' ({} parts) from {}", assembly.name, assembly.part_count, vessel.name);
            deployed_mass += assembly.mass;
            deployed_funds += assembly.value;
            detached.extend(pieces);
        }

        if deployed_mass > 0.0 {
            self.commit_deployment(ProfileType::Deploy, deployed_mass, deployed_funds, &stats, now);
            self.update(vessel, catalog);
        }
        detached
    }

    fn commit_deployment(
        &mut self,
        kind: ProfileType,
        mass: f64,
        funds: f64,
        stats: &VesselStats,
        now: f64,
    ) {
        self.payload_mass = mass;
        self.mission_type = Some(kind);
        self.deployment_time = now;
        self.status = RecordingStatus::Descending;
        self.docking_port_types = stats.docking_port_types.clone();
        self.launch_mass -= mass;
        self.launch_cost -= funds.round();
        log::info!(
            "recording '{}' deployed {:.2} t of {} payload",
            self.profile_name,
            mass,
            kind.label()
        );
    }

    /// Recovered stage funds reduce what the flight cost.
    pub fn apply_recovered_funds(&mut self, funds: f64) {
        if self.status != RecordingStatus::Prelaunch {
            self.launch_cost -= funds;
        }
    }

    pub fn stats(&self) -> Option<&VesselStats> {
        self.stats.as_ref()
    }

    /// Mass-bearing resources aboard as last seen.
    pub fn payload_resources(&self) -> Vec<PayloadResource> {
        self.stats
            .as_ref()
            .map(VesselStats::payload_resources)
            .unwrap_or_default()
    }

    /// Detachable assemblies as last seen, most valuable first.
    pub fn payload_assemblies(&self) -> Vec<Assembly> {
        self.stats
            .as_ref()
            .map(VesselStats::payload_assemblies)
            .unwrap_or_default()
    }

    /// Value of the vessel as last seen.
    pub fn current_vessel_value(&self) -> f64 {
        self.stats.as_ref().map(|s| s.cost).unwrap_or(0.0)
    }

    pub fn mission_duration(&self) -> f64 {
        if self.deployment_time > 0.0 {
            self.deployment_time - self.start_time
        } else {
            0.0
        }
    }
}
