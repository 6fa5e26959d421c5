//! Ferry Headless Scenario Harness
//!
//! Flies recorded ferry flights and replays them as missions entirely
//! in-process. No game client, no rendering.
//!
//! Usage:
//!   cargo run -p ferry-simtest
//!   cargo run -p ferry-simtest -- --verbose
//!   cargo run -p ferry-simtest -- --settings ferry.json

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use ferry_core::config::load_settings;
use ferry_core::persistence::{from_document, to_document};
use ferry_core::prelude::*;
use ferry_logic::catalog::{BodyDefinition, PartDefinition, ResourceDefinition};
use ferry_logic::crew::{CrewRoster, RosterStatus};
use ferry_logic::mission::{CrewTransfer, Mission, ShipOrder};
use ferry_logic::part_graph::{Part, PartGraph, PartId};
use ferry_logic::partition::{find_payload_assemblies, top_level};
use ferry_logic::profile::{MissionProfile, ProfileFilter, ProfileType};
use ferry_logic::recording::RecordingStatus;
use ferry_logic::target;
use ferry_logic::vessel::{Orbit, Situation};
use serde::Deserialize;

// ── Catalog (parts, resources, bodies) ──────────────────────────────────
const CATALOG_JSON: &str = include_str!("../../../data/catalog.json");

#[derive(Debug, Deserialize)]
struct CatalogFile {
    parts: Vec<PartDefinition>,
    resources: Vec<ResourceDefinition>,
    bodies: Vec<BodyDefinition>,
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn check(results: &mut Vec<TestResult>, name: &str, passed: bool, detail: String) {
    results.push(TestResult {
        name: name.into(),
        passed,
        detail,
    });
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let verbose = args.iter().any(|a| a == "--verbose");
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if verbose { "info" } else { "warn" }),
    )
    .init();

    println!("=== Ferry Scenario Harness ===\n");

    let settings = match args.iter().position(|a| a == "--settings").and_then(|i| args.get(i + 1)) {
        Some(path) => match load_settings(Path::new(path)) {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("  ✗ settings: {e}");
                std::process::exit(1);
            }
        },
        None => Settings {
            rng_seed: Some(0x5eed),
            ..Settings::default()
        },
    };

    let mut results = Vec::new();

    // 1. Catalog
    let Some(catalog) = validate_catalog(&mut results) else {
        report(&results, verbose);
        return;
    };

    // 2. Payload partitioning
    validate_partition(&mut results, &catalog);

    // 3. Deployment flight replayed as a mission
    validate_deploy_flow(&mut results, &catalog, &settings);

    // 4. Transport flight refuelling a station
    let engine = validate_transport_flow(&mut results, &catalog, &settings);

    // 5. Persistence
    validate_persistence(&mut results, &catalog, &settings, &engine);

    report(&results, verbose);
}

fn report(results: &[TestResult], verbose: bool) {
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!("\n=== RESULT: {}/{} passed, {} failed ===", passed, total, failed);

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Catalog ──────────────────────────────────────────────────────────

fn validate_catalog(results: &mut Vec<TestResult>) -> Option<Catalog> {
    println!("--- Catalog ---");
    let file: CatalogFile = match serde_json::from_str(CATALOG_JSON) {
        Ok(f) => f,
        Err(e) => {
            check(results, "catalog_parse", false, format!("JSON parse error: {e}"));
            return None;
        }
    };

    let mut catalog = Catalog::new();
    for p in &file.parts {
        catalog.add_part(&p.name, &p.title, p.cost);
    }
    for r in &file.resources {
        catalog.add_resource(&r.name, r.density, r.unit_cost);
    }
    for b in &file.bodies {
        catalog.add_body(&b.name, b.radius, b.atmosphere_height);
    }

    log::info!(
        "catalog: {} parts, {} resources, {} bodies",
        file.parts.len(),
        file.resources.len(),
        file.bodies.len()
    );
    check(
        results,
        "catalog_unique_parts",
        catalog.part_count() == file.parts.len(),
        format!("{} parts, {} resources", catalog.part_count(), catalog.resource_count()),
    );
    let bad_density: Vec<_> = file.resources.iter().filter(|r| r.density < 0.0).collect();
    check(
        results,
        "catalog_densities_non_negative",
        bad_density.is_empty(),
        format!("{} resources with negative density", bad_density.len()),
    );
    check(
        results,
        "catalog_home_body",
        catalog.min_safe_altitude("Kerbin") > 0.0,
        format!("Kerbin atmosphere ends at {:.0} m", catalog.min_safe_altitude("Kerbin")),
    );
    Some(catalog)
}

// ── 2. Payload partitioning ─────────────────────────────────────────────

/// octo(1) -> decoupler(2) -> octo(3) -> port(4) -> tank(5); engine(6) and tank(7) on the core.
fn nested_stack() -> PartGraph {
    let mut g = PartGraph::new();
    let _ = g.add_root(Part::new(1, "probeCoreOcto", 0.1));
    let _ = g.attach(PartId(1), Part::new(2, "decoupler1-2", 0.04).with_decoupler());
    let _ = g.attach(PartId(2), Part::new(3, "probeCoreOcto", 0.1));
    let _ = g.attach(PartId(3), Part::new(4, "dockingPort2", 0.05).with_docking_port("size1"));
    let _ = g.attach(PartId(4), Part::new(5, "fuelTank", 0.25).with_resource("LiquidFuel", 180.0, 180.0));
    let _ = g.attach(PartId(1), Part::new(6, "liquidEngine2", 1.5).with_engine());
    let _ = g.attach(PartId(1), Part::new(7, "fuelTank", 0.25).with_resource("LiquidFuel", 180.0, 180.0));
    g
}

fn validate_partition(results: &mut Vec<TestResult>, catalog: &Catalog) {
    println!("--- Payload Partitioning ---");
    let graph = nested_stack();
    let none = BTreeSet::new();

    let found = find_payload_assemblies(&graph, catalog, &none, &none);
    check(
        results,
        "partition_nested_candidates",
        found.len() == 2,
        format!("{} candidates at {:?}", found.len(), found.iter().map(|a| a.id).collect::<Vec<_>>()),
    );

    let top = top_level(&found);
    let covered: usize = top.iter().map(|a| a.part_count).sum();
    let distinct: BTreeSet<PartId> = top.iter().flat_map(|a| a.parts.iter().copied()).collect();
    let remaining = graph.len() - distinct.len();
    check(
        results,
        "partition_counts_add_up",
        distinct.len() == covered && covered + remaining == graph.len(),
        format!("{covered} parts in {} top-level candidates, {remaining} left", top.len()),
    );

    let used = BTreeSet::from([PartId(5)]);
    let tainted = find_payload_assemblies(&graph, catalog, &used, &none);
    check(
        results,
        "partition_used_part_excluded",
        tainted.iter().all(|a| !a.parts.contains(&PartId(5))) && tainted.iter().all(|a| a.id != PartId(4)),
        format!("{} candidates with part 5 used", tainted.len()),
    );

    let crewed = BTreeSet::from([PartId(3)]);
    let locked = find_payload_assemblies(&graph, catalog, &none, &crewed);
    check(
        results,
        "partition_crewed_part_excluded",
        locked.len() == 1 && locked[0].id == PartId(4),
        format!("{} candidates with part 3 crewed", locked.len()),
    );
}

// ── 3. Deployment flight ────────────────────────────────────────────────

/// octo(1) -> decoupler(2) -> octo(3) -> {dish(4), battery(5)}; engine(6) and tank(7) on the core.
fn relay_lifter() -> Vessel {
    let mut g = PartGraph::new();
    let _ = g.add_root(Part::new(1, "probeCoreOcto", 0.1));
    let _ = g.attach(PartId(1), Part::new(2, "decoupler1-2", 0.04).with_decoupler());
    let _ = g.attach(PartId(2), Part::new(3, "probeCoreOcto", 0.1));
    let _ = g.attach(PartId(3), Part::new(4, "commDish", 0.025));
    let _ = g.attach(PartId(3), Part::new(5, "batteryPack", 0.005).with_resource("ElectricCharge", 100.0, 100.0));
    let _ = g.attach(PartId(1), Part::new(6, "liquidEngine2", 1.5).with_engine());
    let _ = g.attach(
        PartId(1),
        Part::new(7, "fuelTank", 0.25)
            .with_resource("LiquidFuel", 180.0, 180.0)
            .with_resource("Oxidizer", 220.0, 220.0),
    );
    Vessel::new(VesselId(100), "Relay Lifter", "Kerbin", g).with_landed_at("LaunchPad")
}

fn fly(engine: &mut SessionEngine, id: VesselId, burner: PartId, altitude: f64) {
    let tick = engine.settings.tick_interval_secs;
    engine.update(tick);
    if let Some(v) = engine.vessel_mut(id) {
        v.situation = Situation::Flying;
        if let Some(p) = v.parts.part_mut(burner) {
            p.thrust = 200.0;
        }
    }
    engine.update(tick);
    if let Some(v) = engine.vessel_mut(id) {
        if let Some(p) = v.parts.part_mut(burner) {
            p.thrust = 0.0;
        }
        v.situation = Situation::Orbiting;
        v.orbit = Some(Orbit::circular("Kerbin", altitude, 0.0));
    }
    engine.update(tick);
}

fn run_until(engine: &mut SessionEngine, time: f64) {
    let tick = engine.settings.tick_interval_secs;
    while engine.universal_time < time {
        engine.update(tick);
    }
}

fn validate_deploy_flow(results: &mut Vec<TestResult>, catalog: &Catalog, settings: &Settings) {
    println!("--- Deployment Flight ---");
    let mut engine = SessionEngine::new(catalog.clone(), settings.clone());
    let id = match engine.add_vessel(relay_lifter()) {
        Ok(id) => id,
        Err(e) => {
            check(results, "deploy_add_vessel", false, e.to_string());
            return;
        }
    };

    check(results, "deploy_eligible_on_pad", engine.is_eligible(id), "vessel on launch pad".into());
    let started = engine.start_recording(id).and_then(|_| engine.enter_flight(id));
    check(results, "deploy_recording_started", started.is_ok(), format!("{started:?}"));
    fly(&mut engine, id, PartId(6), 80_000.0);

    let (status, candidates) = match engine.recording(id) {
        Some(r) => (Some(r.status), r.payload_assemblies()),
        None => (None, Vec::new()),
    };
    check(
        results,
        "deploy_in_orbit",
        status == Some(RecordingStatus::Ascending),
        format!("status {:?}", status.map(|s| s.label())),
    );
    check(
        results,
        "deploy_single_candidate",
        candidates.len() == 1 && candidates[0].part_count == 3,
        format!("{} candidates", candidates.len()),
    );

    let payload = engine.deploy_payload_assemblies(id, candidates).unwrap_or_default();
    check(results, "deploy_detached", payload.len() == 1, format!("{} vessels detached", payload.len()));

    let finished = engine.finish_recording(id, None);
    check(results, "deploy_profile_saved", finished.is_ok(), format!("{finished:?}"));
    let Some(profile) = finished.ok().and_then(|name| engine.profiles.get(&name).cloned()) else {
        return;
    };
    check(
        results,
        "deploy_profile_payload_mass",
        (profile.payload_mass - 0.13).abs() < 1e-6,
        format!("payload {:.3} t, duration {:.0} s", profile.payload_mass, profile.mission_duration),
    );

    let template = payload
        .first()
        .and_then(|p| engine.vessel(*p).map(|v| v.parts.clone()))
        .unwrap_or_default();
    engine.add_template("Ships/VAB/Relay.craft", template);
    engine.leave_flight(Scene::SpaceCenter);

    let filter = ProfileFilter::new()
        .with_mission_type(ProfileType::Deploy)
        .with_altitude(75_000.0)
        .with_payload_mass(0.1);
    let chosen = engine.profiles.matching(&filter).next().cloned();
    check(results, "deploy_profile_matches", chosen.is_some(), "filter picked a profile".into());
    let Some(chosen) = chosen else {
        return;
    };

    let now = engine.universal_time;
    engine.schedule_mission(Mission::deployment(
        ShipOrder::new("Relay 2", "Ships\\VAB\\Relay.craft"),
        Orbit::circular("Kerbin", 75_000.0, 0.0),
        &chosen,
        now,
    ));
    run_until(&mut engine, now + chosen.mission_duration + 1.0);
    let spawned = engine.find_vessels("Relay 2");
    check(
        results,
        "deploy_mission_spawned",
        engine.scheduler.is_empty() && spawned.len() == 1,
        format!("{} vessels named Relay 2", spawned.len()),
    );
}

// ── 4. Transport flight ─────────────────────────────────────────────────

fn tanker() -> Vessel {
    let mut g = PartGraph::new();
    let _ = g.add_root(Part::new(1, "probeCoreOcto", 0.1));
    let _ = g.attach(PartId(1), Part::new(2, "RCSBlock", 0.05).with_rcs());
    let _ = g.attach(PartId(1), Part::new(3, "dockingPort2", 0.05).with_docking_port("size1"));
    let _ = g.attach(PartId(1), Part::new(4, "fuelTank", 0.25).with_resource("LiquidFuel", 360.0, 360.0));
    let _ = g.attach(PartId(1), Part::new(5, "liquidEngine2", 1.5).with_engine());
    Vessel::new(VesselId(200), "Tanker", "Kerbin", g).with_landed_at("LaunchPad")
}

fn station() -> Vessel {
    let mut g = PartGraph::new();
    let _ = g.add_root(Part::new(1, "dockingPort2", 0.05).with_docking_port("size1"));
    let _ = g.attach(PartId(1), Part::new(2, "mk1pod", 0.8).with_seats(1).with_crew("Bill"));
    let _ = g.attach(PartId(1), Part::new(3, "fuelTank", 0.25).with_resource("LiquidFuel", 50.0, 360.0));
    Vessel::new(VesselId(300), "Station", "Kerbin", g).with_orbit(Orbit::circular("Kerbin", 90_000.0, 0.0))
}

fn validate_transport_flow(results: &mut Vec<TestResult>, catalog: &Catalog, settings: &Settings) -> SessionEngine {
    println!("--- Transport Flight ---");
    let mut engine = SessionEngine::new(catalog.clone(), settings.clone());
    engine.roster = CrewRoster::new().with_member("Bill", "Engineer").with_member("Bob", "Scientist");
    engine.roster.set_status("Bill", RosterStatus::Assigned);

    let (Ok(id), Ok(station_id)) = (engine.add_vessel(tanker()), engine.add_vessel(station())) else {
        check(results, "transport_add_vessels", false, "duplicate vessel ids".into());
        return engine;
    };
    let started = engine.start_recording(id).and_then(|_| engine.enter_flight(id));
    check(results, "transport_recording_started", started.is_ok(), format!("{started:?}"));
    fly(&mut engine, id, PartId(5), 100_000.0);

    let can_transport = engine
        .recording(id)
        .map(|r| r.can_perform_mission(ProfileType::Transport))
        .unwrap_or(false);
    check(results, "transport_capable", can_transport, "docking port and RCS aboard".into());

    let request = BTreeMap::from([("LiquidFuel".to_string(), 200.0)]);
    let dumped = engine.deploy_payload_resources(id, &request).unwrap_or(0.0);
    check(results, "transport_fuel_dumped", (dumped - 1.0).abs() < 1e-9, format!("{dumped:.3} t dumped"));

    let finished = engine.finish_recording(id, Some("Fuel Run"));
    check(results, "transport_profile_saved", finished.is_ok(), format!("{finished:?}"));
    let Some(profile) = finished.ok().and_then(|name| engine.profiles.get(&name).cloned()) else {
        return engine;
    };
    engine.leave_flight(Scene::SpaceCenter);

    let cargo = match engine.vessel(station_id) {
        Some(v) if target::is_valid_target(&v, &engine.settings.home_body, Some(&profile)) => {
            let mut free = target::free_resource_capacities(&v, &engine.catalog, engine.settings.resource_epsilon);
            for r in &mut free {
                r.amount = r.amount.min(profile.payload_mass / r.mass);
            }
            free
        }
        _ => Vec::new(),
    };
    check(results, "transport_target_valid", cargo.len() == 1, format!("{} resources to deliver", cargo.len()));

    let crew = [CrewTransfer::deliver("Bob"), CrewTransfer::collect("Bill")];
    let now = engine.universal_time;
    let mission = engine.schedule_mission(Mission::transport(station_id, &profile, &cargo, &crew, now));
    check(
        results,
        "transport_crew_booked",
        engine.scheduler.crew_mission("Bob") == Some(mission),
        "Bob booked on the transport".into(),
    );

    // The station is active: the mission waits.
    let _ = engine.enter_flight(station_id);
    run_until(&mut engine, now + profile.mission_duration + 2.0);
    check(
        results,
        "transport_waits_for_active_target",
        engine.scheduler.get(mission).is_some(),
        "mission still pending while the station is in flight".into(),
    );

    engine.leave_flight(Scene::TrackingStation);
    let report = engine.tick();
    let (fuel, aboard) = engine
        .vessel(station_id)
        .map(|v| (v.parts.resource_amount("LiquidFuel"), v.parts.crew()))
        .unwrap_or_default();
    check(
        results,
        "transport_delivered",
        report.completed == vec![mission] && engine.scheduler.is_empty() && (fuel - 250.0).abs() < 1e-6,
        format!("station holds {fuel:.1} LiquidFuel"),
    );
    check(
        results,
        "transport_crew_swapped",
        aboard == vec!["Bob".to_string()]
            && engine.roster.get("Bill").map(|m| m.status) == Some(RosterStatus::Available),
        format!("aboard: {}", aboard.join(", ")),
    );
    engine
}

// ── 5. Persistence ──────────────────────────────────────────────────────

fn validate_persistence(results: &mut Vec<TestResult>, catalog: &Catalog, settings: &Settings, engine: &SessionEngine) {
    println!("--- Persistence ---");
    let mut buffer = Vec::new();
    if let Err(e) = engine.save(&mut buffer) {
        check(results, "persistence_save", false, e.to_string());
        return;
    }

    let mut loaded = SessionEngine::new(catalog.clone(), settings.clone());
    let outcome = loaded.load(&buffer[..]);
    check(
        results,
        "persistence_roundtrip",
        outcome.is_ok()
            && loaded.vessel_count() == engine.vessel_count()
            && loaded.profiles == engine.profiles
            && loaded.roster == engine.roster,
        format!("{} bytes, {} vessels", buffer.len(), loaded.vessel_count()),
    );

    let document = engine.profiles.iter().next().map(|p| {
        to_document(p).and_then(|doc| from_document::<MissionProfile>(&doc).map(|back| back == *p))
    });
    check(
        results,
        "persistence_profile_document",
        matches!(document, Some(Ok(true))),
        "profile survives a JSON document round-trip".into(),
    );
}
