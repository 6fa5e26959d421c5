//! Scheduled missions and their execution.
//!
//! A [`Mission`] is a future action derived from a profile: put a new vessel
//! into orbit, build one next to a space dock, or deliver resources and crew
//! to a vessel already in orbit. Its `eta` is fixed at creation. Execution is
//! driven by the [`MissionScheduler`](crate::scheduler::MissionScheduler).
//!
//! [`Mission::try_execute`] separates three outcomes:
//! - `Ok(true)`: done, including an abort because the target is gone
//! - `Ok(false)`: not safe right now, try again next tick
//! - `Err(_)`: broken, drop the mission

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::crew::CrewRoster;
use crate::profile::{MissionProfile, ProfileRegistry};
use crate::settings::Settings;
use crate::stats::PayloadResource;
use crate::target;
use crate::vessel::{Orbit, Vessel, VesselId};

/// What a mission does when it comes due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissionKind {
    Deploy,
    Transport,
    Construct,
}

impl MissionKind {
    pub fn label(self) -> &'static str {
        match self {
            MissionKind::Deploy => "deployment",
            MissionKind::Transport => "transport",
            MissionKind::Construct => "construction",
        }
    }
}

/// Unrecoverable mission failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MissionError {
    #[error("mission profile '{0}' is missing")]
    MissingProfile(String),
    #[error("ship template '{0}' not found")]
    MissingTemplate(String),
    #[error("deployment mission has no orbit")]
    MissingOrbit,
    #[error("vessel {0} is loaded, transfers only work on unloaded vessels")]
    VesselLoaded(VesselId),
    #[error("vessel {0} not found")]
    UnknownVessel(VesselId),
    #[error("vessels cannot be created while in flight")]
    InFlight,
}

/// Direction of a crew transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferDirection {
    Deliver,
    Collect,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewTransfer {
    pub name: String,
    pub direction: TransferDirection,
}

impl CrewTransfer {
    pub fn deliver(name: &str) -> Self {
        Self {
            name: name.to_string(),
            direction: TransferDirection::Deliver,
        }
    }

    pub fn collect(name: &str) -> Self {
        Self {
            name: name.to_string(),
            direction: TransferDirection::Collect,
        }
    }
}

/// A new vessel to build from a template.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShipOrder {
    pub ship_name: String,
    pub template: String,
    /// Crew to seat on the new vessel.
    pub crew: Vec<String>,
    pub flag: Option<String>,
}

impl ShipOrder {
    pub fn new(ship_name: &str, template: &str) -> Self {
        Self {
            ship_name: ship_name.to_string(),
            template: template.to_string(),
            ..Default::default()
        }
    }

    pub fn with_crew(mut self, name: &str) -> Self {
        self.crew.push(name.to_string());
        self
    }

    pub fn with_flag(mut self, flag: &str) -> Self {
        self.flag = Some(flag.to_string());
        self
    }
}

/// Normalise a template path: forward slashes, no empty or `.` segments.
pub fn sanitize_template_path(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let absolute = unified.starts_with('/');
    let joined = unified
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/");
    if absolute {
        format!("/{joined}")
    } else {
        joined
    }
}

/// A vessel to create when a deploy or construct mission executes.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnRequest {
    pub kind: MissionKind,
    pub ship_name: String,
    pub template: String,
    pub orbit: Orbit,
    pub flag: Option<String>,
}

/// Vessel access the missions need from the session.
pub trait VesselStore {
    fn vessel_mut(&mut self, id: VesselId) -> Option<&mut Vessel>;

    /// Create a new unloaded vessel in orbit.
    fn spawn(&mut self, request: SpawnRequest) -> Result<VesselId, MissionError>;
}

/// Everything a mission may read or change while executing.
pub struct MissionContext<'a> {
    pub now: f64,
    /// A vessel is being physically simulated.
    pub in_flight: bool,
    pub active_vessel: Option<VesselId>,
    pub profiles: &'a ProfileRegistry,
    pub catalog: &'a Catalog,
    pub settings: &'a Settings,
    pub vessels: &'a mut dyn VesselStore,
    pub roster: &'a mut CrewRoster,
    pub notices: &'a mut Vec<String>,
}

/// A pending future action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    pub kind: MissionKind,
    eta: f64,
    pub profile_name: String,
    pub ship_name: String,
    /// Sanitized template path of the vessel to build.
    pub ship_template: String,
    /// Orbit of the vessel a deploy mission creates.
    pub orbit: Option<Orbit>,
    /// Transport target or construction space dock.
    pub target_vessel_id: Option<VesselId>,
    pub crew_to_deliver: Vec<String>,
    pub crew_to_collect: Vec<String>,
    pub resources_to_deliver: BTreeMap<String, f64>,
    pub flag: Option<String>,
}

impl Mission {
    fn blank(kind: MissionKind, profile: &MissionProfile, eta: f64) -> Self {
        Self {
            kind,
            eta,
            profile_name: profile.profile_name.clone(),
            ship_name: String::new(),
            ship_template: String::new(),
            orbit: None,
            target_vessel_id: None,
            crew_to_deliver: Vec::new(),
            crew_to_collect: Vec::new(),
            resources_to_deliver: BTreeMap::new(),
            flag: None,
        }
    }

    /// Launch a new vessel into `orbit`, arriving after the profile's flight time.
    pub fn deployment(order: ShipOrder, orbit: Orbit, profile: &MissionProfile, now: f64) -> Self {
        let mut mission = Self::blank(MissionKind::Deploy, profile, now + profile.mission_duration);
        mission.ship_name = order.ship_name;
        mission.ship_template = sanitize_template_path(&order.template);
        mission.orbit = Some(orbit);
        mission.crew_to_deliver = order.crew;
        mission.flag = order.flag;
        mission
    }

    /// Fly resources and crew to `target`. Non-positive resource amounts are dropped.
    pub fn transport(
        target: VesselId,
        profile: &MissionProfile,
        resources: &[PayloadResource],
        crew_transfers: &[CrewTransfer],
        now: f64,
    ) -> Self {
        let mut mission = Self::blank(MissionKind::Transport, profile, now + profile.mission_duration);
        mission.target_vessel_id = Some(target);
        for resource in resources.iter().filter(|r| r.amount > 0.0) {
            *mission
                .resources_to_deliver
                .entry(resource.name.clone())
                .or_insert(0.0) += resource.amount;
        }
        for transfer in crew_transfers {
            match transfer.direction {
                TransferDirection::Deliver => mission.crew_to_deliver.push(transfer.name.clone()),
                TransferDirection::Collect => mission.crew_to_collect.push(transfer.name.clone()),
            }
        }
        mission
    }

    /// Build a new vessel next to `space_dock` after `construction_time` seconds.
    pub fn construction(
        order: ShipOrder,
        space_dock: VesselId,
        profile: &MissionProfile,
        construction_time: f64,
        now: f64,
    ) -> Self {
        let mut mission = Self::blank(MissionKind::Construct, profile, now + construction_time);
        mission.ship_name = order.ship_name;
        mission.ship_template = sanitize_template_path(&order.template);
        mission.target_vessel_id = Some(space_dock);
        mission.crew_to_deliver = order.crew;
        mission.flag = order.flag;
        mission
    }

    /// Due time. Fixed at creation.
    pub fn eta(&self) -> f64 {
        self.eta
    }

    pub fn is_due(&self, now: f64) -> bool {
        self.eta <= now
    }

    /// Seconds until due, never negative.
    pub fn remaining(&self, now: f64) -> f64 {
        (self.eta - now).max(0.0)
    }

    pub fn involves_crew(&self, name: &str) -> bool {
        self.crew_to_deliver.iter().any(|c| c == name)
            || self.crew_to_collect.iter().any(|c| c == name)
    }

    /// Mass of the resources to deliver. Unknown resources weigh nothing.
    pub fn cargo_mass(&self, catalog: &Catalog) -> f64 {
        self.resources_to_deliver
            .iter()
            .map(|(name, amount)| catalog.density(name) * amount)
            .sum()
    }

    /// One-line description for listings.
    pub fn summary(&self, catalog: &Catalog, now: f64) -> String {
        let mut text = format!("{} ({})", self.profile_name, self.kind.label());
        if !self.ship_name.is_empty() {
            text.push_str(&format!(", ship {}", self.ship_name));
        }
        if let Some(orbit) = &self.orbit {
            text.push_str(&format!(", {} @ {:.0} m", orbit.body, orbit.apoapsis));
        }
        if !self.resources_to_deliver.is_empty() {
            text.push_str(&format!(", cargo {:.2} t", self.cargo_mass(catalog)));
        }
        if !self.crew_to_deliver.is_empty() {
            text.push_str(&format!(", outbound {}", self.crew_to_deliver.join(", ")));
        }
        if !self.crew_to_collect.is_empty() {
            text.push_str(&format!(", inbound {}", self.crew_to_collect.join(", ")));
        }
        text.push_str(&format!(", eta {:.0} s", self.remaining(now)));
        text
    }

    /// Attempt the mission. See the module docs for the outcome contract.
    pub fn try_execute(&self, ctx: &mut MissionContext<'_>) -> Result<bool, MissionError> {
        match self.kind {
            MissionKind::Deploy => {
                if ctx.in_flight {
                    return Ok(false);
                }
                let orbit = self.orbit.clone().ok_or(MissionError::MissingOrbit)?;
                self.create_ship(ctx, orbit)?;
                Ok(true)
            }
            MissionKind::Construct => {
                if ctx.in_flight {
                    return Ok(false);
                }
                let profiles = ctx.profiles;
                let settings = ctx.settings;
                let profile = profiles
                    .get(&self.profile_name)
                    .ok_or_else(|| MissionError::MissingProfile(self.profile_name.clone()))?;

                let dock_orbit = self
                    .target_vessel_id
                    .and_then(|id| ctx.vessels.vessel_mut(id))
                    .filter(|dock| target::is_valid_target(dock, &settings.home_body, Some(profile)))
                    .and_then(|dock| dock.orbit.clone());
                let Some(dock_orbit) = dock_orbit else {
                    log::warn!("aborting construction mission: space dock missing or out of range");
                    ctx.notices.push(
                        "Aborting construction mission: space dock not found at expected rendezvous coordinates"
                            .to_string(),
                    );
                    return Ok(true);
                };

                let radius = ctx.catalog.body(&dock_orbit.body).map(|b| b.radius).unwrap_or(0.0);
                let orbit = dock_orbit.following(settings.construct_follow_distance_m, radius);
                self.create_ship(ctx, orbit)?;
                Ok(true)
            }
            MissionKind::Transport => {
                if ctx.active_vessel.is_some() && ctx.active_vessel == self.target_vessel_id {
                    return Ok(false);
                }
                let profiles = ctx.profiles;
                let settings = ctx.settings;
                let profile = profiles
                    .get(&self.profile_name)
                    .ok_or_else(|| MissionError::MissingProfile(self.profile_name.clone()))?;

                let Some(vessel) = self
                    .target_vessel_id
                    .and_then(|id| ctx.vessels.vessel_mut(id))
                    .filter(|v| target::is_valid_target(v, &settings.home_body, Some(profile)))
                else {
                    log::warn!("aborting transport mission: target vessel missing or out of range");
                    ctx.notices.push(
                        "Aborting transport mission: target vessel not found at expected rendezvous coordinates"
                            .to_string(),
                    );
                    return Ok(true);
                };
                if vessel.loaded {
                    return Ok(false);
                }

                for (name, amount) in &self.resources_to_deliver {
                    target::add_resources(vessel, name, *amount, settings.resource_epsilon, ctx.notices)?;
                }
                for name in &self.crew_to_collect {
                    target::recover_crew_member(vessel, ctx.roster, name, &settings.home_body, ctx.notices)?;
                }
                for name in &self.crew_to_deliver {
                    target::add_crew_member(vessel, ctx.roster, name, &settings.home_body, ctx.notices)?;
                }
                Ok(true)
            }
        }
    }

    fn create_ship(&self, ctx: &mut MissionContext<'_>, orbit: Orbit) -> Result<VesselId, MissionError> {
        let id = ctx.vessels.spawn(SpawnRequest {
            kind: self.kind,
            ship_name: self.ship_name.clone(),
            template: self.ship_template.clone(),
            orbit,
            flag: self.flag.clone(),
        })?;
        log::info!("deployed new ship '{}' as {}", self.ship_name, id);
        ctx.notices.push(format!("Vessel '{}' deployed", self.ship_name));

        if !self.crew_to_deliver.is_empty() {
            let home_body = &ctx.settings.home_body;
            let vessel = ctx.vessels.vessel_mut(id).ok_or(MissionError::UnknownVessel(id))?;
            for name in &self.crew_to_deliver {
                target::add_crew_member(vessel, ctx.roster, name, home_body, ctx.notices)?;
            }
        }
        Ok(id)
    }
}
