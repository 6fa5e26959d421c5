//! Session engine - main entry point for running ferry missions

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::f64::consts::TAU;

use hecs::{Entity, World};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use ferry_logic::catalog::Catalog;
use ferry_logic::crew::CrewRoster;
use ferry_logic::mission::{
    sanitize_template_path, Mission, MissionContext, MissionError, SpawnRequest, VesselStore,
};
use ferry_logic::part_graph::{PartGraph, PartId};
use ferry_logic::partition::Assembly;
use ferry_logic::profile::{MissionProfile, ProfileRegistry};
use ferry_logic::recording::RecordingStatus;
use ferry_logic::scheduler::{MissionId, MissionScheduler, TickReport};
use ferry_logic::settings::{validate_settings, Settings};
use ferry_logic::stats::VesselStats;
use ferry_logic::vessel::Situation;

use crate::components::*;
use crate::persistence::{self, SaveData, SaveError, SavedVessel, SAVE_VERSION};

/// Rejected engine commands.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("vessel {0} not found")]
    UnknownVessel(VesselId),
    #[error("vessel {0} already exists")]
    DuplicateVessel(VesselId),
    #[error("vessel {0} is already being recorded")]
    DuplicateRecording(VesselId),
    #[error("vessel {0} is not on a launch site")]
    NotEligible(VesselId),
    #[error("vessel {0} has no flight recording")]
    NoRecording(VesselId),
    #[error("recording of vessel {0} cannot be finished yet")]
    CannotFinish(VesselId),
}

fn rejected(err: EngineError) -> EngineError {
    log::error!("{err}");
    err
}

/// On the pad, or landed at one of the configured launch sites.
fn at_launch_site(vessel: &Vessel, settings: &Settings) -> bool {
    vessel.situation == Situation::Prelaunch
        || (vessel.situation.is_landed()
            && vessel
                .landed_at
                .as_deref()
                .is_some_and(|site| settings.is_launch_site(site)))
}

fn fresh_vessel_id(rng: &mut StdRng, index: &HashMap<VesselId, Entity>) -> VesselId {
    loop {
        let id = VesselId(rng.gen());
        if id.0 != 0 && !index.contains_key(&id) {
            return id;
        }
    }
}

/// Main session engine
pub struct SessionEngine {
    /// ECS world containing all vessels
    pub world: World,
    /// Game time in seconds
    pub universal_time: f64,
    pub catalog: Catalog,
    pub settings: Settings,
    pub profiles: ProfileRegistry,
    pub scheduler: MissionScheduler,
    pub roster: CrewRoster,
    /// Ship templates keyed by sanitized path
    pub templates: BTreeMap<String, PartGraph>,

    scene: Scene,
    active_vessel: Option<VesselId>,
    notices: Vec<String>,
    index: HashMap<VesselId, Entity>,
    rng: StdRng,

    // Update timing
    last_tick: f64,
    last_sampled: Option<VesselId>,
}

/// The world seen through the mission `VesselStore` seam.
struct VesselYard<'w> {
    world: &'w mut World,
    index: &'w mut HashMap<VesselId, Entity>,
    templates: &'w BTreeMap<String, PartGraph>,
    rng: &'w mut StdRng,
    phase_jitter: f64,
}

impl VesselStore for VesselYard<'_> {
    fn vessel_mut(&mut self, id: VesselId) -> Option<&mut Vessel> {
        let entity = *self.index.get(&id)?;
        self.world.query_one_mut::<&mut Vessel>(entity).ok()
    }

    fn spawn(&mut self, request: SpawnRequest) -> Result<VesselId, MissionError> {
        let parts = self
            .templates
            .get(&request.template)
            .cloned()
            .ok_or_else(|| MissionError::MissingTemplate(request.template.clone()))?;

        let id = fresh_vessel_id(self.rng, self.index);
        let mut orbit = request.orbit;
        if self.phase_jitter > 0.0 {
            let offset = self.rng.gen_range(0.0..self.phase_jitter);
            orbit.phase = (orbit.phase + offset).rem_euclid(TAU);
        }
        let mut vessel = Vessel::new(id, &request.ship_name, &orbit.body, parts).with_orbit(orbit);
        vessel.flag = request.flag;

        let entity = self.world.spawn((vessel,));
        self.index.insert(id, entity);
        log::info!("spawned {} vessel '{}' as {id}", request.kind.label(), request.ship_name);
        Ok(id)
    }
}

impl SessionEngine {
    /// Create an empty session. Invalid settings are logged, not rejected.
    pub fn new(catalog: Catalog, settings: Settings) -> Self {
        for problem in validate_settings(&settings) {
            log::warn!("settings: {problem}");
        }
        let rng = match settings.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            world: World::new(),
            universal_time: 0.0,
            catalog,
            settings,
            profiles: ProfileRegistry::new(),
            scheduler: MissionScheduler::new(),
            roster: CrewRoster::new(),
            templates: BTreeMap::new(),
            scene: Scene::SpaceCenter,
            active_vessel: None,
            notices: Vec::new(),
            index: HashMap::new(),
            rng,
            last_tick: 0.0,
            last_sampled: None,
        }
    }

    /// Advance game time by `delta_seconds`, ticking at the configured cadence.
    pub fn update(&mut self, delta_seconds: f64) {
        self.universal_time += delta_seconds;
        if self.scene == Scene::MainMenu {
            self.last_tick = self.universal_time;
            return;
        }
        if self.universal_time - self.last_tick >= self.settings.tick_interval_secs {
            self.tick();
            self.last_tick = self.universal_time;
        }
    }

    /// One timer tick: sample the active vessel, then run due missions.
    pub fn tick(&mut self) -> TickReport {
        self.sample_active_vessel();

        let mut yard = VesselYard {
            world: &mut self.world,
            index: &mut self.index,
            templates: &self.templates,
            rng: &mut self.rng,
            phase_jitter: self.settings.spawn_phase_jitter,
        };
        let mut ctx = MissionContext {
            now: self.universal_time,
            in_flight: self.scene == Scene::Flight,
            active_vessel: self.active_vessel,
            profiles: &self.profiles,
            catalog: &self.catalog,
            settings: &self.settings,
            vessels: &mut yard,
            roster: &mut self.roster,
            notices: &mut self.notices,
        };
        self.scheduler.tick(&mut ctx)
    }

    fn sample_active_vessel(&mut self) {
        let Some(id) = self.active_vessel.filter(|_| self.scene == Scene::Flight) else {
            self.last_sampled = None;
            return;
        };
        let Some(&entity) = self.index.get(&id) else {
            return;
        };
        let switched = self.last_sampled != Some(id);
        self.last_sampled = Some(id);

        let Ok((vessel, recording)) = self
            .world
            .query_one_mut::<(&Vessel, &mut FlightRecording)>(entity)
        else {
            return;
        };
        if switched {
            recording.reset_usage_baseline();
        }
        if recording.status == RecordingStatus::Prelaunch && !at_launch_site(vessel, &self.settings) {
            recording.launch();
            log::info!("recording '{}' launched", recording.profile_name);
        }
        recording.sample_usage(vessel, &self.catalog);
        recording.update(vessel, &self.catalog);
    }

    // ── Scenes ─────────────────────────────────────────────────────────

    pub fn scene(&self) -> Scene {
        self.scene
    }

    pub fn active_vessel(&self) -> Option<VesselId> {
        self.active_vessel
    }

    /// Start simulating `id`. The vessel becomes loaded.
    pub fn enter_flight(&mut self, id: VesselId) -> Result<(), EngineError> {
        self.entity(id)?;
        self.unload_active();
        if let Some(vessel) = self.vessel_mut(id) {
            vessel.loaded = true;
        }
        self.scene = Scene::Flight;
        self.active_vessel = Some(id);
        Ok(())
    }

    /// Leave flight for another scene, unloading the active vessel.
    pub fn leave_flight(&mut self, scene: Scene) {
        self.unload_active();
        self.active_vessel = None;
        self.scene = if scene == Scene::Flight { Scene::SpaceCenter } else { scene };
    }

    fn unload_active(&mut self) {
        if let Some(previous) = self.active_vessel {
            if let Some(vessel) = self.vessel_mut(previous) {
                vessel.loaded = false;
            }
        }
    }

    // ── Vessels ────────────────────────────────────────────────────────

    fn entity(&self, id: VesselId) -> Result<Entity, EngineError> {
        self.index
            .get(&id)
            .copied()
            .ok_or_else(|| rejected(EngineError::UnknownVessel(id)))
    }

    pub fn add_vessel(&mut self, vessel: Vessel) -> Result<VesselId, EngineError> {
        let id = vessel.id;
        if self.index.contains_key(&id) {
            return Err(rejected(EngineError::DuplicateVessel(id)));
        }
        let entity = self.world.spawn((vessel,));
        self.index.insert(id, entity);
        Ok(id)
    }

    /// Remove a vessel and any recording attached to it.
    pub fn remove_vessel(&mut self, id: VesselId) -> Option<Vessel> {
        let entity = self.index.remove(&id)?;
        let vessel = self.world.remove_one::<Vessel>(entity).ok();
        let _ = self.world.despawn(entity);
        if self.active_vessel == Some(id) {
            self.active_vessel = None;
        }
        vessel
    }

    pub fn vessel(&self, id: VesselId) -> Option<hecs::Ref<'_, Vessel>> {
        let entity = *self.index.get(&id)?;
        self.world.get::<&Vessel>(entity).ok()
    }

    pub fn vessel_mut(&mut self, id: VesselId) -> Option<&mut Vessel> {
        let entity = *self.index.get(&id)?;
        self.world.query_one_mut::<&mut Vessel>(entity).ok()
    }

    pub fn vessel_count(&self) -> usize {
        self.index.len()
    }

    /// Vessels with the given name, in no particular order.
    pub fn find_vessels(&self, name: &str) -> Vec<VesselId> {
        self.world
            .query::<&Vessel>()
            .iter()
            .filter(|(_, v)| v.name == name)
            .map(|(_, v)| v.id)
            .collect()
    }

    /// Register a ship template under its sanitized path.
    pub fn add_template(&mut self, path: &str, parts: PartGraph) -> String {
        let key = sanitize_template_path(path);
        self.templates.insert(key.clone(), parts);
        key
    }

    fn spawn_detached(&mut self, carrier: &Vessel, name: String, parts: PartGraph, parent: Option<VesselId>) -> VesselId {
        let id = fresh_vessel_id(&mut self.rng, &self.index);
        let mut vessel = Vessel::new(id, &name, &carrier.body, parts);
        vessel.situation = carrier.situation;
        vessel.orbit = carrier.orbit.clone();
        vessel.flag = carrier.flag.clone();
        let entity = match parent {
            Some(parent) => self.world.spawn((vessel, ParentVessel(parent))),
            None => self.world.spawn((vessel,)),
        };
        self.index.insert(id, entity);
        id
    }

    /// Drop a spent stage below the separator `part`. Recovering it later
    /// credits the carrier's recording.
    pub fn detach_stage(&mut self, id: VesselId, part: PartId) -> Result<Vec<VesselId>, EngineError> {
        let entity = self.entity(id)?;
        let (pieces, carrier) = {
            let vessel = self
                .world
                .query_one_mut::<&mut Vessel>(entity)
                .map_err(|_| rejected(EngineError::UnknownVessel(id)))?;
            let pieces = vessel.parts.detach_children(part);
            (pieces, vessel.clone())
        };
        let name = format!("{} Debris", carrier.name);
        Ok(pieces
            .into_iter()
            .map(|graph| self.spawn_detached(&carrier, name.clone(), graph, Some(id)))
            .collect())
    }

    /// Recover a vessel for its current value. Returns the funds.
    pub fn recover_vessel(&mut self, id: VesselId) -> Result<f64, EngineError> {
        let entity = self.entity(id)?;
        let parent = self.world.get::<&ParentVessel>(entity).ok().map(|p| p.0);
        let value = {
            let vessel = self
                .world
                .get::<&Vessel>(entity)
                .map_err(|_| rejected(EngineError::UnknownVessel(id)))?;
            VesselStats::gather(&vessel, &self.catalog, &BTreeSet::new()).cost
        };
        self.remove_vessel(id);
        log::info!("recovered vessel {id} for {value:.0} funds");

        if let Some(parent) = parent {
            self.on_stage_recovered(parent, value);
        }
        Ok(value)
    }

    /// Credit recovered stage funds to the carrier's recording.
    pub fn on_stage_recovered(&mut self, parent: VesselId, funds: f64) {
        let Some(&entity) = self.index.get(&parent) else {
            return;
        };
        if let Ok(recording) = self.world.query_one_mut::<&mut FlightRecording>(entity) {
            recording.apply_recovered_funds(funds);
            log::info!("credited {funds:.0} recovered funds to recording '{}'", recording.profile_name);
        }
    }

    // ── Flight recordings ──────────────────────────────────────────────

    /// Whether `id` could start a new recording right now.
    pub fn is_eligible(&self, id: VesselId) -> bool {
        let Some(&entity) = self.index.get(&id) else {
            return false;
        };
        if self.world.get::<&FlightRecording>(entity).is_ok() {
            return false;
        }
        self.world
            .get::<&Vessel>(entity)
            .map(|v| at_launch_site(&v, &self.settings))
            .unwrap_or(false)
    }

    pub fn start_recording(&mut self, id: VesselId) -> Result<(), EngineError> {
        let entity = self.entity(id)?;
        if self.world.get::<&FlightRecording>(entity).is_ok() {
            return Err(rejected(EngineError::DuplicateRecording(id)));
        }
        if !self.is_eligible(id) {
            return Err(rejected(EngineError::NotEligible(id)));
        }
        let recording = {
            let vessel = self
                .world
                .get::<&Vessel>(entity)
                .map_err(|_| rejected(EngineError::UnknownVessel(id)))?;
            FlightRecording::new(&vessel, &self.catalog, self.universal_time)
        };
        log::info!("started recording of '{}'", recording.profile_name);
        let _ = self.world.insert_one(entity, recording);
        Ok(())
    }

    pub fn cancel_recording(&mut self, id: VesselId) -> Result<FlightRecording, EngineError> {
        let entity = self.entity(id)?;
        let recording = self
            .world
            .remove_one::<FlightRecording>(entity)
            .map_err(|_| rejected(EngineError::NoRecording(id)))?;
        log::info!("cancelled recording of '{}'", recording.profile_name);
        Ok(recording)
    }

    pub fn recording(&self, id: VesselId) -> Option<hecs::Ref<'_, FlightRecording>> {
        let entity = *self.index.get(&id)?;
        self.world.get::<&FlightRecording>(entity).ok()
    }

    /// Vessels with a running recording.
    pub fn recorded_vessels(&self) -> Vec<VesselId> {
        let mut ids: Vec<VesselId> = self
            .world
            .query::<(&Vessel, &FlightRecording)>()
            .iter()
            .map(|(_, (v, _))| v.id)
            .collect();
        ids.sort();
        ids
    }

    /// Refresh a recording from its vessel outside the timer.
    pub fn refresh_recording(&mut self, id: VesselId) -> Result<(), EngineError> {
        let entity = self.entity(id)?;
        let (vessel, recording) = self
            .world
            .query_one_mut::<(&Vessel, &mut FlightRecording)>(entity)
            .map_err(|_| rejected(EngineError::NoRecording(id)))?;
        recording.update(vessel, &self.catalog);
        Ok(())
    }

    /// Preview of what a new recording of `id` would capture. Not stored.
    pub fn preview_recording(&self, id: VesselId) -> Option<FlightRecording> {
        if !self.is_eligible(id) {
            return None;
        }
        let vessel = self.vessel(id)?;
        Some(FlightRecording::new(&vessel, &self.catalog, self.universal_time))
    }

    pub fn deploy_payload_resources(
        &mut self,
        id: VesselId,
        requested: &BTreeMap<String, f64>,
    ) -> Result<f64, EngineError> {
        let entity = self.entity(id)?;
        let (vessel, recording) = self
            .world
            .query_one_mut::<(&mut Vessel, &mut FlightRecording)>(entity)
            .map_err(|_| rejected(EngineError::NoRecording(id)))?;
        Ok(recording.deploy_payload_resources(vessel, &self.catalog, requested, self.universal_time))
    }

    /// Detach the selected assemblies as new vessels. Returns their ids.
    pub fn deploy_payload_assemblies(
        &mut self,
        id: VesselId,
        selected: Vec<Assembly>,
    ) -> Result<Vec<VesselId>, EngineError> {
        let entity = self.entity(id)?;
        let now = self.universal_time;
        let (pieces, carrier) = {
            let (vessel, recording) = self
                .world
                .query_one_mut::<(&mut Vessel, &mut FlightRecording)>(entity)
                .map_err(|_| rejected(EngineError::NoRecording(id)))?;
            let pieces = recording.deploy_payload_assemblies(vessel, &self.catalog, selected, now);
            (pieces, vessel.clone())
        };
        let name = format!("{} Payload", carrier.name);
        Ok(pieces
            .into_iter()
            .map(|graph| self.spawn_detached(&carrier, name.clone(), graph, None))
            .collect())
    }

    /// Turn a finished recording into a saved profile. Returns the profile name.
    pub fn finish_recording(&mut self, id: VesselId, profile_name: Option<&str>) -> Result<String, EngineError> {
        let entity = self.entity(id)?;
        let profile = {
            let (vessel, recording) = self
                .world
                .query_one_mut::<(&Vessel, &mut FlightRecording)>(entity)
                .map_err(|_| rejected(EngineError::NoRecording(id)))?;
            recording.update(vessel, &self.catalog);
            if !recording.can_finish() {
                return Err(rejected(EngineError::CannotFinish(id)));
            }
            let mut profile = MissionProfile::from_recording(vessel, recording)
                .ok_or_else(|| rejected(EngineError::CannotFinish(id)))?;
            if let Some(name) = profile_name {
                profile.profile_name = name.to_string();
            }
            profile
        };

        let name = self.profiles.insert(profile, &self.settings.fallback_profile_name);
        let _ = self.world.remove_one::<FlightRecording>(entity);
        self.notices.push(format!("Mission profile '{name}' saved"));
        Ok(name)
    }

    // ── Profiles and missions ──────────────────────────────────────────

    pub fn schedule_mission(&mut self, mission: Mission) -> MissionId {
        self.scheduler.schedule(mission)
    }

    pub fn cancel_mission(&mut self, id: MissionId) -> bool {
        self.scheduler.cancel(id).is_some()
    }

    /// Delete a profile and cancel every mission flying it.
    pub fn delete_profile(&mut self, name: &str) -> bool {
        if self.profiles.remove(name).is_none() {
            return false;
        }
        let cancelled = self.scheduler.cancel_profile(name);
        log::info!("deleted mission profile '{name}', cancelled {cancelled} missions");
        if cancelled > 0 {
            self.notices.push(format!("Cancelled {cancelled} missions!"));
        }
        true
    }

    /// Rename a profile and the missions flying it. Returns the name used.
    pub fn rename_profile(&mut self, name: &str, new_name: &str) -> Option<String> {
        let renamed = self
            .profiles
            .rename(name, new_name, &self.settings.fallback_profile_name)?;
        self.scheduler.rename_profile(name, &renamed);
        Some(renamed)
    }

    /// Take every pending user-visible message.
    pub fn drain_notices(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notices)
    }

    // ── Persistence ────────────────────────────────────────────────────

    /// Save session state to a writer
    pub fn save<W: std::io::Write>(&self, writer: W) -> Result<(), SaveError> {
        let mut vessels = Vec::new();
        let mut recordings = Vec::new();
        for (_, (vessel, recording, parent)) in self
            .world
            .query::<(&Vessel, Option<&FlightRecording>, Option<&ParentVessel>)>()
            .iter()
        {
            vessels.push(SavedVessel {
                vessel: vessel.clone(),
                parent: parent.copied(),
            });
            if let Some(recording) = recording {
                recordings.push((vessel.id, recording.clone()));
            }
        }
        vessels.sort_by_key(|v| v.vessel.id);
        recordings.sort_by_key(|(id, _)| *id);

        let data = SaveData {
            version: SAVE_VERSION,
            universal_time: self.universal_time,
            profiles: self.profiles.clone(),
            missions: self.scheduler.clone(),
            roster: self.roster.clone(),
            templates: self.templates.clone(),
            vessels,
            recordings,
        };
        persistence::save_session(writer, &data)
    }

    /// Load session state from a reader. Returns to the space center.
    pub fn load<R: std::io::Read>(&mut self, reader: R) -> Result<(), SaveError> {
        let data = persistence::load_session(reader)?;

        self.world = World::new();
        self.index.clear();
        for saved in data.vessels {
            let id = saved.vessel.id;
            let mut vessel = saved.vessel;
            vessel.loaded = false;
            let entity = match saved.parent {
                Some(parent) => self.world.spawn((vessel, parent)),
                None => self.world.spawn((vessel,)),
            };
            self.index.insert(id, entity);
        }
        for (id, recording) in data.recordings {
            if let Some(&entity) = self.index.get(&id) {
                let _ = self.world.insert_one(entity, recording);
            }
        }

        self.universal_time = data.universal_time;
        self.profiles = data.profiles;
        self.scheduler = data.missions;
        self.roster = data.roster;
        self.templates = data.templates;
        self.scene = Scene::SpaceCenter;
        self.active_vessel = None;
        self.notices.clear();

        // Reset update timers
        self.last_tick = self.universal_time;
        self.last_sampled = None;
        Ok(())
    }
}

impl Default for SessionEngine {
    fn default() -> Self {
        Self::new(Catalog::new(), Settings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferry_logic::mission::ShipOrder;
    use ferry_logic::part_graph::Part;
    use ferry_logic::profile::ProfileType;
    use ferry_logic::vessel::Orbit;

    fn seeded() -> SessionEngine {
        let settings = Settings {
            rng_seed: Some(7),
            ..Settings::default()
        };
        let catalog = Catalog::new()
            .with_part("probe", "Probe Core", 300.0)
            .with_part("decoupler", "Decoupler", 100.0)
            .with_body("Kerbin", 600_000.0, 70_000.0);
        SessionEngine::new(catalog, settings)
    }

    fn pad_vessel(id: u64) -> Vessel {
        let mut g = PartGraph::new();
        g.add_root(Part::new(1, "probe", 0.1)).unwrap();
        g.attach(PartId(1), Part::new(2, "decoupler", 0.05).with_decoupler())
            .unwrap();
        g.attach(PartId(2), Part::new(3, "probe", 0.1)).unwrap();
        Vessel::new(VesselId(id), "Lifter", "Kerbin", g).with_landed_at("LaunchPad")
    }

    fn profile(name: &str) -> MissionProfile {
        MissionProfile {
            profile_name: name.into(),
            vessel_name: name.into(),
            mission_type: ProfileType::Deploy,
            launch_cost: 1.0,
            launch_mass: 1.0,
            payload_mass: 1.0,
            min_altitude: 70_000.0,
            max_altitude: 100_000.0,
            body_name: "Kerbin".into(),
            mission_duration: 30.0,
            one_way_mission: true,
            crew_capacity: 0,
            docking_port_types: Vec::new(),
        }
    }

    #[test]
    fn test_engine_creation() {
        let engine = SessionEngine::default();
        assert_eq!(engine.vessel_count(), 0);
        assert_eq!(engine.scene(), Scene::SpaceCenter);
        assert!(engine.active_vessel().is_none());
    }

    #[test]
    fn test_duplicate_vessel_rejected() {
        let mut engine = seeded();
        engine.add_vessel(pad_vessel(1)).unwrap();
        assert_eq!(engine.add_vessel(pad_vessel(1)), Err(EngineError::DuplicateVessel(VesselId(1))));
    }

    #[test]
    fn test_recording_eligibility() {
        let mut engine = seeded();
        engine.add_vessel(pad_vessel(1)).unwrap();
        engine
            .add_vessel(pad_vessel(2).with_orbit(Orbit::circular("Kerbin", 80_000.0, 0.0)))
            .unwrap();

        assert!(engine.is_eligible(VesselId(1)));
        assert!(engine.preview_recording(VesselId(1)).is_some());
        assert!(!engine.is_eligible(VesselId(2)));
        assert_eq!(engine.start_recording(VesselId(2)), Err(EngineError::NotEligible(VesselId(2))));

        engine.start_recording(VesselId(1)).unwrap();
        assert!(!engine.is_eligible(VesselId(1)));
        assert_eq!(
            engine.start_recording(VesselId(1)),
            Err(EngineError::DuplicateRecording(VesselId(1)))
        );
        assert_eq!(engine.recorded_vessels(), vec![VesselId(1)]);

        engine.cancel_recording(VesselId(1)).unwrap();
        assert!(engine.recording(VesselId(1)).is_none());
        assert_eq!(engine.cancel_recording(VesselId(1)).unwrap_err(), EngineError::NoRecording(VesselId(1)));
    }

    #[test]
    fn test_launch_detected_in_flight() {
        let mut engine = seeded();
        engine.add_vessel(pad_vessel(1)).unwrap();
        engine.start_recording(VesselId(1)).unwrap();
        engine.enter_flight(VesselId(1)).unwrap();
        assert!(engine.vessel(VesselId(1)).unwrap().loaded);

        engine.update(1.0);
        assert_eq!(engine.recording(VesselId(1)).unwrap().status, RecordingStatus::Prelaunch);

        if let Some(v) = engine.vessel_mut(VesselId(1)) {
            v.situation = Situation::Flying;
        }
        engine.update(1.0);
        assert_eq!(engine.recording(VesselId(1)).unwrap().status, RecordingStatus::Ascending);

        engine.leave_flight(Scene::TrackingStation);
        assert!(!engine.vessel(VesselId(1)).unwrap().loaded);
        assert_eq!(engine.scene(), Scene::TrackingStation);
    }

    #[test]
    fn test_timer_skips_main_menu() {
        let mut engine = seeded();
        engine.add_template("sat.craft", pad_vessel(9).parts);
        engine.profiles.insert(profile("Sat"), "Ferry");
        let mission = Mission::deployment(
            ShipOrder::new("Sat 1", "sat.craft"),
            Orbit::circular("Kerbin", 90_000.0, 0.0),
            &profile("Sat"),
            0.0,
        );
        engine.schedule_mission(mission);

        engine.leave_flight(Scene::MainMenu);
        engine.update(60.0);
        assert_eq!(engine.vessel_count(), 0);

        engine.leave_flight(Scene::SpaceCenter);
        engine.update(1.0);
        assert_eq!(engine.vessel_count(), 1);
        assert!(engine.scheduler.is_empty());
        assert_eq!(engine.find_vessels("Sat 1").len(), 1);
        assert_eq!(engine.drain_notices(), vec!["Vessel 'Sat 1' deployed".to_string()]);
        assert!(engine.drain_notices().is_empty());
    }

    #[test]
    fn test_delete_profile_cancels_missions() {
        let mut engine = seeded();
        engine.profiles.insert(profile("Sat"), "Ferry");
        for _ in 0..2 {
            engine.schedule_mission(Mission::deployment(
                ShipOrder::new("Sat", "sat.craft"),
                Orbit::circular("Kerbin", 90_000.0, 0.0),
                &profile("Sat"),
                0.0,
            ));
        }
        assert!(engine.delete_profile("Sat"));
        assert!(engine.scheduler.is_empty());
        assert_eq!(engine.drain_notices(), vec!["Cancelled 2 missions!".to_string()]);
        assert!(!engine.delete_profile("Sat"));
    }

    #[test]
    fn test_rename_profile_follows_missions() {
        let mut engine = seeded();
        engine.profiles.insert(profile("Sat"), "Ferry");
        let id = engine.schedule_mission(Mission::deployment(
            ShipOrder::new("Sat", "sat.craft"),
            Orbit::circular("Kerbin", 90_000.0, 0.0),
            &profile("Sat"),
            0.0,
        ));
        assert_eq!(engine.rename_profile("Sat", "Relay").as_deref(), Some("Relay"));
        assert_eq!(engine.scheduler.get(id).unwrap().profile_name, "Relay");
    }

    #[test]
    fn test_stage_recovery_credits_carrier() {
        let mut engine = seeded();
        engine.add_vessel(pad_vessel(1)).unwrap();
        engine.start_recording(VesselId(1)).unwrap();
        let launch_cost = engine.recording(VesselId(1)).unwrap().launch_cost;
        assert_eq!(launch_cost, 700.0);

        engine.enter_flight(VesselId(1)).unwrap();
        if let Some(v) = engine.vessel_mut(VesselId(1)) {
            v.situation = Situation::Flying;
        }
        engine.update(1.0);

        let debris = engine.detach_stage(VesselId(1), PartId(2)).unwrap();
        assert_eq!(debris.len(), 1);
        assert_eq!(engine.vessel(debris[0]).unwrap().name, "Lifter Debris");
        let funds = engine.recover_vessel(debris[0]).unwrap();
        assert_eq!(funds, 300.0);
        assert_eq!(engine.recording(VesselId(1)).unwrap().launch_cost, 400.0);
        assert_eq!(engine.vessel_count(), 1);
    }
}
