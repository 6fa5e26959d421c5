//! Session-level scenarios driven through the engine.
//!
//! Vessels are put on the pad, flown by editing their situation between
//! timer ticks, and inspected through the engine's accessors.

use std::collections::BTreeMap;

use ferry_core::prelude::*;
use ferry_logic::crew::{CrewRoster, RosterStatus};
use ferry_logic::mission::{CrewTransfer, Mission, ShipOrder};
use ferry_logic::part_graph::{Part, PartGraph, PartId};
use ferry_logic::profile::{MissionProfile, ProfileType};
use ferry_logic::recording::RecordingStatus;
use ferry_logic::stats::PayloadResource;
use ferry_logic::vessel::Orbit;
use pretty_assertions::assert_eq;

// ── Helpers ────────────────────────────────────────────────────────────

fn engine() -> SessionEngine {
    let catalog = Catalog::new()
        .with_part("probe", "Probe Core", 300.0)
        .with_part("port", "Docking Port", 200.0)
        .with_part("tank", "Fuel Tank", 500.0)
        .with_part("engine", "Engine", 1_000.0)
        .with_resource("LiquidFuel", 0.005, 0.8)
        .with_body("Kerbin", 600_000.0, 70_000.0);
    let settings = Settings {
        rng_seed: Some(11),
        ..Settings::default()
    };
    SessionEngine::new(catalog, settings)
}

/// probe(1) -> port(2) -> probe(3) -> tank(4); engine(5) on the core.
fn port_carrier(id: u64) -> Vessel {
    let mut g = PartGraph::new();
    g.add_root(Part::new(1, "probe", 0.1)).unwrap();
    g.attach(PartId(1), Part::new(2, "port", 0.05).with_docking_port("size1"))
        .unwrap();
    g.attach(PartId(2), Part::new(3, "probe", 0.1).with_engine())
        .unwrap();
    g.attach(PartId(3), Part::new(4, "tank", 0.5).with_resource("LiquidFuel", 100.0, 100.0))
        .unwrap();
    g.attach(PartId(1), Part::new(5, "engine", 1.5).with_engine())
        .unwrap();
    Vessel::new(VesselId(id), "Carrier", "Kerbin", g).with_landed_at("LaunchPad")
}

fn set_thrust(engine: &mut SessionEngine, id: VesselId, part: PartId, thrust: f64) {
    if let Some(p) = engine.vessel_mut(id).and_then(|v| v.parts.part_mut(part)) {
        p.thrust = thrust;
    }
}

fn reach_orbit(engine: &mut SessionEngine, id: VesselId, altitude: f64) {
    if let Some(v) = engine.vessel_mut(id) {
        v.situation = ferry_logic::vessel::Situation::Orbiting;
        v.orbit = Some(Orbit::circular("Kerbin", altitude, 0.0));
    }
    engine.update(engine.settings.tick_interval_secs);
}

fn launch(engine: &mut SessionEngine, vessel: Vessel) -> VesselId {
    let id = engine.add_vessel(vessel).unwrap();
    engine.start_recording(id).unwrap();
    engine.enter_flight(id).unwrap();
    id
}

fn transport_profile() -> MissionProfile {
    MissionProfile {
        profile_name: "Tanker".into(),
        vessel_name: "Tanker".into(),
        mission_type: ProfileType::Transport,
        launch_cost: 8_000.0,
        launch_mass: 4.0,
        payload_mass: 1.5,
        min_altitude: 70_000.0,
        max_altitude: 150_000.0,
        body_name: "Kerbin".into(),
        mission_duration: 10.0,
        one_way_mission: true,
        crew_capacity: 1,
        docking_port_types: vec!["size1".into()],
    }
}

// ── Scenario A ─────────────────────────────────────────────────────────

#[test]
fn single_port_yields_one_candidate_below_port() {
    let mut engine = engine();
    let id = launch(&mut engine, port_carrier(1));
    set_thrust(&mut engine, id, PartId(5), 200.0);
    reach_orbit(&mut engine, id, 80_000.0);

    let recording = engine.recording(id).unwrap();
    assert_eq!(recording.status, RecordingStatus::Ascending);
    assert!(recording.used_part_ids.contains(&PartId(5)));
    let candidates = recording.payload_assemblies();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].detachment_part, PartId(2));
    assert_eq!(candidates[0].parts, vec![PartId(4), PartId(3)]);
    assert_eq!(candidates[0].name, "Docking Port");
}

// ── Scenario B ─────────────────────────────────────────────────────────

#[test]
fn used_child_of_port_suppresses_candidate() {
    let mut engine = engine();
    let id = launch(&mut engine, port_carrier(1));
    set_thrust(&mut engine, id, PartId(3), 50.0);
    reach_orbit(&mut engine, id, 80_000.0);

    let recording = engine.recording(id).unwrap();
    assert!(recording.used_part_ids.contains(&PartId(3)));
    assert!(recording.payload_assemblies().is_empty());
    assert!(!recording.can_perform_mission(ProfileType::Deploy));
}

// ── Scenario C ─────────────────────────────────────────────────────────

#[test]
fn transport_to_missing_target_is_dropped_after_one_tick() {
    let mut engine = engine();
    engine.roster = CrewRoster::new().with_member("Jeb", "Pilot");
    engine.profiles.insert(transport_profile(), "Ferry");
    let mut station = PartGraph::new();
    station
        .add_root(Part::new(1, "tank", 0.5).with_docking_port("size1").with_resource("LiquidFuel", 0.0, 100.0))
        .unwrap();
    let bystander = engine
        .add_vessel(Vessel::new(VesselId(5), "Station", "Kerbin", station).with_orbit(Orbit::circular("Kerbin", 90_000.0, 0.0)))
        .unwrap();

    let cargo = [PayloadResource {
        name: "LiquidFuel".into(),
        amount: 100.0,
        mass: 0.005,
    }];
    engine.schedule_mission(Mission::transport(
        VesselId(77),
        &transport_profile(),
        &cargo,
        &[CrewTransfer::deliver("Jeb")],
        0.0,
    ));

    engine.update(20.0);
    assert!(engine.scheduler.is_empty());
    let notices = engine.drain_notices();
    assert_eq!(notices.len(), 1);
    assert!(notices[0].starts_with("Aborting transport mission"));
    assert_eq!(engine.vessel(bystander).unwrap().parts.resource_amount("LiquidFuel"), 0.0);
    assert_eq!(engine.roster.get("Jeb").unwrap().status, RosterStatus::Available);
}

// ── Scenario D ─────────────────────────────────────────────────────────

#[test]
fn draining_more_than_available_drains_what_is_there() {
    let mut engine = engine();
    let mut g = PartGraph::new();
    g.add_root(Part::new(1, "probe", 0.1).with_docking_port("size1").with_rcs())
        .unwrap();
    g.attach(PartId(1), Part::new(2, "tank", 0.5).with_resource("LiquidFuel", 30.0, 100.0))
        .unwrap();
    let id = launch(&mut engine, Vessel::new(VesselId(4), "Tanker", "Kerbin", g).with_landed_at("LaunchPad"));
    reach_orbit(&mut engine, id, 90_000.0);

    let request = BTreeMap::from([("LiquidFuel".to_string(), 50.0)]);
    let dumped = engine.deploy_payload_resources(id, &request).unwrap();
    assert!((dumped - 0.15).abs() < 1e-9);
    assert_eq!(engine.vessel(id).unwrap().parts.resource_amount("LiquidFuel"), 0.0);
    assert_eq!(engine.recording(id).unwrap().status, RecordingStatus::Descending);

    let again = engine.deploy_payload_resources(id, &request).unwrap();
    assert_eq!(again, 0.0);
}

// ── Full loop ──────────────────────────────────────────────────────────

#[test]
fn finished_recording_becomes_profile_and_deploys_again() {
    let mut engine = engine();
    let id = launch(&mut engine, port_carrier(1));
    set_thrust(&mut engine, id, PartId(5), 200.0);
    engine.update(1.0);
    reach_orbit(&mut engine, id, 85_000.0);
    assert_eq!(engine.finish_recording(id, None), Err(EngineError::CannotFinish(id)));

    let selected = engine.recording(id).unwrap().payload_assemblies();
    let payload = engine.deploy_payload_assemblies(id, selected).unwrap();
    assert_eq!(payload.len(), 1);
    assert_eq!(engine.vessel(payload[0]).unwrap().parts.len(), 2);
    assert_eq!(engine.vessel(id).unwrap().parts.len(), 3);

    let name = engine.finish_recording(id, Some("Sat Lifter")).unwrap();
    assert_eq!(name, "Sat Lifter");
    assert!(engine.recording(id).is_none());
    let profile = engine.profiles.get(&name).unwrap().clone();
    assert_eq!(profile.mission_type, ProfileType::Deploy);
    assert!((profile.payload_mass - 1.1).abs() < 1e-9);

    let template = engine.vessel(payload[0]).unwrap().parts.clone();
    engine.add_template("Ships/VAB/Sat.craft", template);
    engine.leave_flight(Scene::SpaceCenter);
    let now = engine.universal_time;
    engine.schedule_mission(Mission::deployment(
        ShipOrder::new("Sat 2", "Ships/VAB/Sat.craft"),
        Orbit::circular("Kerbin", 85_000.0, 0.0),
        &profile,
        now,
    ));
    let eta = now + profile.mission_duration;
    while engine.universal_time < eta + 1.0 {
        engine.update(1.0);
    }
    assert!(engine.scheduler.is_empty());
    let spawned = engine.find_vessels("Sat 2");
    assert_eq!(spawned.len(), 1);
    assert_eq!(engine.vessel(spawned[0]).unwrap().apoapsis(), Some(85_000.0));
}
