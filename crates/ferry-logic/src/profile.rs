//! Mission profiles: reusable templates distilled from finished flights.
//!
//! A profile is created once from a [`FlightRecording`] in the descending
//! phase and never changes afterwards, except for its name. Profiles are
//! keyed by a unique name inside a [`ProfileRegistry`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::recording::FlightRecording;
use crate::vessel::Vessel;

/// What kind of payload a profile delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProfileType {
    /// Puts a new vessel into orbit.
    Deploy,
    /// Docks with an existing vessel and hands over resources or crew.
    Transport,
}

impl ProfileType {
    pub fn label(self) -> &'static str {
        match self {
            ProfileType::Deploy => "deployment",
            ProfileType::Transport => "transport",
        }
    }
}

/// A recorded flight, reusable for scheduled missions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionProfile {
    pub profile_name: String,
    pub vessel_name: String,
    pub mission_type: ProfileType,
    pub launch_cost: f64,
    /// Carrier mass without payload, in tons.
    pub launch_mass: f64,
    /// Payload capacity in tons.
    pub payload_mass: f64,
    pub min_altitude: f64,
    pub max_altitude: f64,
    pub body_name: String,
    /// Seconds from launch to payload deployment.
    pub mission_duration: f64,
    pub one_way_mission: bool,
    /// Free seats at the end of the recorded flight.
    pub crew_capacity: u32,
    pub docking_port_types: Vec<String>,
}

impl MissionProfile {
    /// Distill a profile from a deployed recording.
    ///
    /// Returns `None` when nothing was deployed yet. A vessel that came back
    /// down makes a round-trip profile whose cost excludes the recovered vessel.
    pub fn from_recording(vessel: &Vessel, recording: &FlightRecording) -> Option<Self> {
        let mission_type = recording.mission_type?;
        let mut profile = Self {
            profile_name: recording.profile_name.clone(),
            vessel_name: vessel.name.clone(),
            mission_type,
            launch_cost: recording.launch_cost,
            launch_mass: recording.launch_mass - recording.payload_mass,
            payload_mass: recording.payload_mass,
            min_altitude: recording.min_altitude,
            max_altitude: recording.max_altitude,
            body_name: recording.launch_body.clone(),
            mission_duration: recording.deployment_time - recording.start_time,
            one_way_mission: true,
            crew_capacity: vessel
                .parts
                .crew_capacity()
                .saturating_sub(vessel.parts.crew_count()),
            docking_port_types: recording.docking_port_types.clone(),
        };

        if vessel.situation.is_landed() {
            profile.one_way_mission = false;
            profile.launch_cost = (profile.launch_cost - recording.current_vessel_value()).max(0.0);
        }
        Some(profile)
    }

    /// Shares at least one docking node type with `types`.
    pub fn fits_ports(&self, types: &[String]) -> bool {
        self.docking_port_types.iter().any(|t| types.contains(t))
    }
}

const NAME_SUFFIXES: [&str; 11] = [
    "Alpha", "Beta", "Delta", "Epsilon", "Zeta", "Eta", "Theta", "Iota", "Kappa", "Lambda",
    "Omega",
];

/// Make `name` unique among the names for which `taken` returns true.
///
/// Blank names become `fallback`. Collisions get a Greek letter suffix, then
/// a number once the letters run out. All-lowercase names stay lowercase.
pub fn unique_profile_name(name: &str, fallback: &str, taken: impl Fn(&str) -> bool) -> String {
    let base = match name.trim() {
        "" => fallback.trim(),
        trimmed => trimmed,
    };
    let lowercase = base.to_lowercase() == base;

    let mut candidate = base.to_string();
    let mut counter = 0usize;
    while taken(&candidate) {
        candidate = match NAME_SUFFIXES.get(counter) {
            Some(suffix) => format!("{base} {suffix}"),
            None => format!("{base} {counter}"),
        };
        if lowercase {
            candidate = candidate.to_lowercase();
        }
        counter += 1;
    }
    candidate
}

/// Criteria for choosing a profile for a planned mission. Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileFilter {
    pub mission_type: Option<ProfileType>,
    pub body: Option<String>,
    /// Target apoapsis the profile must be able to reach.
    pub altitude: Option<f64>,
    pub docking_port_types: Option<Vec<String>>,
    pub crew_capacity: Option<u32>,
    /// Payload mass the profile must carry, compared at 0.1 t resolution.
    pub payload_mass: Option<f64>,
    pub round_trip: Option<bool>,
}

impl ProfileFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mission_type(mut self, kind: ProfileType) -> Self {
        self.mission_type = Some(kind);
        self
    }

    pub fn with_body(mut self, body: &str) -> Self {
        self.body = Some(body.to_string());
        self
    }

    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = Some(altitude);
        self
    }

    pub fn with_docking_port_types(mut self, types: Vec<String>) -> Self {
        self.docking_port_types = Some(types);
        self
    }

    pub fn with_crew_capacity(mut self, seats: u32) -> Self {
        self.crew_capacity = Some(seats);
        self
    }

    pub fn with_payload_mass(mut self, mass: f64) -> Self {
        self.payload_mass = Some(mass);
        self
    }

    pub fn with_round_trip(mut self, round_trip: bool) -> Self {
        self.round_trip = Some(round_trip);
        self
    }

    /// Human-readable reasons `profile` is unsuitable; empty when it fits.
    pub fn rejections(&self, profile: &MissionProfile) -> Vec<String> {
        let mut reasons = Vec::new();
        if let Some(round_trip) = self.round_trip {
            if round_trip == profile.one_way_mission {
                reasons.push(if round_trip {
                    "vessel does not return".to_string()
                } else {
                    "vessel must return".to_string()
                });
            }
        }
        if let Some(kind) = self.mission_type {
            if kind != profile.mission_type {
                reasons.push(format!("not a {} profile", kind.label()));
            }
        }
        if let Some(types) = &self.docking_port_types {
            if !profile.fits_ports(types) {
                reasons.push("no fitting docking port".to_string());
            }
        }
        if let Some(seats) = self.crew_capacity {
            if seats > profile.crew_capacity {
                reasons.push(format!("needs {seats} seats, has {}", profile.crew_capacity));
            }
        }
        if let Some(mass) = self.payload_mass {
            if round_tenth(mass) > round_tenth(profile.payload_mass) {
                reasons.push(format!(
                    "payload of {mass:.1} t exceeds {:.1} t",
                    profile.payload_mass
                ));
            }
        }
        if let Some(body) = &self.body {
            if *body != profile.body_name {
                reasons.push(format!("launches to {}", profile.body_name));
            }
        }
        if let Some(altitude) = self.altitude {
            if altitude > profile.max_altitude {
                reasons.push(format!(
                    "cannot reach {altitude:.0} m (max {:.0} m)",
                    profile.max_altitude
                ));
            }
        }
        reasons
    }

    pub fn accepts(&self, profile: &MissionProfile) -> bool {
        self.rejections(profile).is_empty()
    }
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Saved profiles keyed by their unique name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileRegistry {
    profiles: BTreeMap<String, MissionProfile>,
}

impl ProfileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `profile` under a unique version of its name and return that name.
    pub fn insert(&mut self, mut profile: MissionProfile, fallback: &str) -> String {
        let name = unique_profile_name(&profile.profile_name, fallback, |n| {
            self.profiles.contains_key(n)
        });
        profile.profile_name = name.clone();
        log::info!("saved new mission profile '{name}'");
        self.profiles.insert(name.clone(), profile);
        name
    }

    pub fn get(&self, name: &str) -> Option<&MissionProfile> {
        self.profiles.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.profiles.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<MissionProfile> {
        self.profiles.remove(name)
    }

    /// Rename a profile. The new name is made unique among the other profiles.
    ///
    /// Returns the name actually used, or `None` if `name` is unknown.
    pub fn rename(&mut self, name: &str, new_name: &str, fallback: &str) -> Option<String> {
        let mut profile = self.profiles.remove(name)?;
        let unique = unique_profile_name(new_name, fallback, |n| self.profiles.contains_key(n));
        profile.profile_name = unique.clone();
        self.profiles.insert(unique.clone(), profile);
        Some(unique)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MissionProfile> {
        self.profiles.values()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Profiles accepted by `filter`, in name order.
    pub fn matching<'a>(&'a self, filter: &'a ProfileFilter) -> impl Iterator<Item = &'a MissionProfile> {
        self.profiles.values().filter(move |p| filter.accepts(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::part_graph::{Part, PartGraph, PartId};
    use crate::recording::RecordingStatus;
    use crate::vessel::{Orbit, Situation, VesselId};

    fn sample_profile(name: &str) -> MissionProfile {
        MissionProfile {
            profile_name: name.to_string(),
            vessel_name: "Tanker".to_string(),
            mission_type: ProfileType::Transport,
            launch_cost: 12_000.0,
            launch_mass: 8.0,
            payload_mass: 2.34,
            min_altitude: 70_000.0,
            max_altitude: 120_000.0,
            body_name: "Kerbin".to_string(),
            mission_duration: 1_800.0,
            one_way_mission: true,
            crew_capacity: 2,
            docking_port_types: vec!["size1".to_string()],
        }
    }

    fn taken<'a>(names: &'a [&'a str]) -> impl Fn(&str) -> bool + 'a {
        move |n| names.iter().any(|x| *x == n)
    }

    #[test]
    fn test_unique_name_unchanged_when_free() {
        assert_eq!(unique_profile_name("  Tanker ", "Ferry", taken(&[])), "Tanker");
    }

    #[test]
    fn test_unique_name_blank_uses_fallback() {
        assert_eq!(unique_profile_name("   ", "Ferry", taken(&[])), "Ferry");
        assert_eq!(unique_profile_name("", "Ferry", taken(&["Ferry"])), "Ferry Alpha");
    }

    #[test]
    fn test_unique_name_suffix_sequence() {
        let names = ["Tanker", "Tanker Alpha", "Tanker Beta"];
        assert_eq!(unique_profile_name("Tanker", "Ferry", taken(&names)), "Tanker Delta");
    }

    #[test]
    fn test_unique_name_numbers_after_letters() {
        let mut names: Vec<String> = vec!["Tanker".to_string()];
        names.extend(NAME_SUFFIXES.iter().map(|s| format!("Tanker {s}")));
        let name = unique_profile_name("Tanker", "Ferry", |n| names.iter().any(|x| x == n));
        assert_eq!(name, "Tanker 11");
    }

    #[test]
    fn test_unique_name_keeps_lowercase() {
        assert_eq!(unique_profile_name("tug", "Ferry", taken(&["tug"])), "tug alpha");
    }

    #[test]
    fn test_registry_insert_and_rename() {
        let mut registry = ProfileRegistry::new();
        assert_eq!(registry.insert(sample_profile("Tanker"), "Ferry"), "Tanker");
        assert_eq!(registry.insert(sample_profile("Tanker"), "Ferry"), "Tanker Alpha");
        assert_eq!(registry.len(), 2);

        let renamed = registry.rename("Tanker Alpha", "Tanker", "Ferry").unwrap();
        assert_eq!(renamed, "Tanker Alpha");
        let renamed = registry.rename("Tanker Alpha", "Heavy", "Ferry").unwrap();
        assert_eq!(renamed, "Heavy");
        assert_eq!(registry.get("Heavy").unwrap().profile_name, "Heavy");
        assert!(registry.rename("Missing", "X", "Ferry").is_none());
    }

    #[test]
    fn test_rename_to_own_name_keeps_it() {
        let mut registry = ProfileRegistry::new();
        registry.insert(sample_profile("Tanker"), "Ferry");
        assert_eq!(registry.rename("Tanker", "Tanker", "Ferry").unwrap(), "Tanker");
    }

    #[test]
    fn test_filter_checks_every_criterion() {
        let p = sample_profile("Tanker");
        assert!(ProfileFilter::new().accepts(&p));
        assert!(ProfileFilter::new()
            .with_mission_type(ProfileType::Transport)
            .with_body("Kerbin")
            .with_altitude(100_000.0)
            .with_docking_port_types(vec!["size0".into(), "size1".into()])
            .with_crew_capacity(2)
            .with_payload_mass(2.3)
            .with_round_trip(false)
            .accepts(&p));

        assert!(!ProfileFilter::new().with_mission_type(ProfileType::Deploy).accepts(&p));
        assert!(!ProfileFilter::new().with_body("Mun").accepts(&p));
        assert!(!ProfileFilter::new().with_altitude(150_000.0).accepts(&p));
        assert!(!ProfileFilter::new()
            .with_docking_port_types(vec!["size2".into()])
            .accepts(&p));
        assert!(!ProfileFilter::new().with_crew_capacity(3).accepts(&p));
        assert!(!ProfileFilter::new().with_round_trip(true).accepts(&p));
    }

    #[test]
    fn test_filter_payload_mass_rounds_to_tenths() {
        let p = sample_profile("Tanker");
        assert!(ProfileFilter::new().with_payload_mass(2.34).accepts(&p));
        assert!(ProfileFilter::new().with_payload_mass(2.33).accepts(&p));
        assert!(!ProfileFilter::new().with_payload_mass(2.36).accepts(&p));
    }

    #[test]
    fn test_registry_matching() {
        let mut registry = ProfileRegistry::new();
        registry.insert(sample_profile("A"), "Ferry");
        let mut deploy = sample_profile("B");
        deploy.mission_type = ProfileType::Deploy;
        registry.insert(deploy, "Ferry");
        let filter = ProfileFilter::new().with_mission_type(ProfileType::Deploy);
        let names: Vec<&str> = registry.matching(&filter).map(|p| p.profile_name.as_str()).collect();
        assert_eq!(names, vec!["B"]);
    }

    fn deployed_recording(vessel: &Vessel, cat: &Catalog) -> FlightRecording {
        let mut r = FlightRecording::new(vessel, cat, 100.0);
        r.status = RecordingStatus::Descending;
        r.mission_type = Some(ProfileType::Deploy);
        r.launch_mass = 10.0;
        r.launch_cost = 5_000.0;
        r.payload_mass = 3.0;
        r.deployment_time = 700.0;
        r.max_altitude = 90_000.0;
        r
    }

    fn carrier() -> Vessel {
        let mut g = PartGraph::new();
        g.add_root(Part::new(1, "pod", 1.0).with_seats(3).with_crew("Jeb"))
            .unwrap();
        g.attach(PartId(1), Part::new(2, "tank", 1.0)).unwrap();
        Vessel::new(VesselId(3), "Lifter", "Kerbin", g)
            .with_orbit(Orbit::circular("Kerbin", 90_000.0, 0.0))
    }

    #[test]
    fn test_from_recording_one_way() {
        let cat = Catalog::new()
            .with_part("pod", "Pod", 1_000.0)
            .with_part("tank", "Tank", 400.0);
        let v = carrier();
        let r = deployed_recording(&v, &cat);
        let p = MissionProfile::from_recording(&v, &r).unwrap();
        assert_eq!(p.launch_mass, 7.0);
        assert_eq!(p.payload_mass, 3.0);
        assert_eq!(p.mission_duration, 600.0);
        assert_eq!(p.crew_capacity, 2);
        assert!(p.one_way_mission);
        assert_eq!(p.launch_cost, 5_000.0);
        assert_eq!(p.max_altitude, 90_000.0);
        assert_eq!(p.body_name, "Kerbin");
    }

    #[test]
    fn test_from_recording_round_trip_subtracts_vessel_value() {
        let cat = Catalog::new()
            .with_part("pod", "Pod", 1_000.0)
            .with_part("tank", "Tank", 400.0);
        let mut v = carrier();
        let mut r = deployed_recording(&v, &cat);
        v.situation = Situation::Landed;
        r.update(&v, &cat);
        let p = MissionProfile::from_recording(&v, &r).unwrap();
        assert!(!p.one_way_mission);
        assert_eq!(p.launch_cost, 3_600.0);

        r.launch_cost = 100.0;
        let p = MissionProfile::from_recording(&v, &r).unwrap();
        assert_eq!(p.launch_cost, 0.0);
    }

    #[test]
    fn test_from_recording_needs_deployment() {
        let cat = Catalog::new();
        let v = carrier();
        let r = FlightRecording::new(&v, &cat, 0.0);
        assert!(MissionProfile::from_recording(&v, &r).is_none());
    }
}
