//! Vessel state: identity, situation, orbit and part graph.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::part_graph::PartGraph;

/// Persistent vessel identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VesselId(pub u64);

impl fmt::Display for VesselId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Coarse flight situation of a vessel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Situation {
    Prelaunch,
    Landed,
    Splashed,
    Flying,
    SubOrbital,
    Orbiting,
    Escaping,
    Docked,
}

impl Situation {
    /// Resting on the surface (land or water).
    pub fn is_landed(self) -> bool {
        matches!(self, Situation::Landed | Situation::Splashed)
    }

    pub fn label(self) -> &'static str {
        match self {
            Situation::Prelaunch => "pre-launch",
            Situation::Landed => "landed",
            Situation::Splashed => "splashed",
            Situation::Flying => "flying",
            Situation::SubOrbital => "sub-orbital",
            Situation::Orbiting => "orbiting",
            Situation::Escaping => "escaping",
            Situation::Docked => "docked",
        }
    }
}

/// Orbit around a body. Altitudes are measured from the body's surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Orbit {
    pub body: String,
    pub periapsis: f64,
    pub apoapsis: f64,
    /// Degrees.
    pub inclination: f64,
    /// Position along the orbit in radians.
    pub phase: f64,
}

impl Orbit {
    pub fn circular(body: &str, altitude: f64, inclination: f64) -> Self {
        Self {
            body: body.to_string(),
            periapsis: altitude,
            apoapsis: altitude,
            inclination,
            phase: 0.0,
        }
    }

    /// Semi-major axis for a body of the given radius.
    pub fn semi_major_axis(&self, body_radius: f64) -> f64 {
        body_radius + (self.periapsis + self.apoapsis) / 2.0
    }

    /// The same orbit, `distance` meters ahead along the track.
    pub fn following(&self, distance: f64, body_radius: f64) -> Self {
        let sma = self.semi_major_axis(body_radius);
        let mut next = self.clone();
        if sma > 0.0 {
            let chord = (distance / (2.0 * sma)).clamp(-1.0, 1.0);
            next.phase = (self.phase + 2.0 * chord.asin()).rem_euclid(std::f64::consts::TAU);
        }
        next
    }
}

/// Everything the crate needs to know about one vessel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vessel {
    pub id: VesselId,
    pub name: String,
    pub situation: Situation,
    /// Body the vessel is orbiting or resting on.
    pub body: String,
    pub orbit: Option<Orbit>,
    /// Launch site or other named location while landed.
    pub landed_at: Option<String>,
    /// Physically simulated right now. Part transfers only touch unloaded vessels.
    pub loaded: bool,
    pub flag: Option<String>,
    pub parts: PartGraph,
}

impl Vessel {
    pub fn new(id: VesselId, name: &str, body: &str, parts: PartGraph) -> Self {
        Self {
            id,
            name: name.to_string(),
            situation: Situation::Prelaunch,
            body: body.to_string(),
            orbit: None,
            landed_at: None,
            loaded: false,
            flag: None,
            parts,
        }
    }

    pub fn with_orbit(mut self, orbit: Orbit) -> Self {
        self.body = orbit.body.clone();
        self.orbit = Some(orbit);
        self.situation = Situation::Orbiting;
        self
    }

    pub fn with_landed_at(mut self, site: &str) -> Self {
        self.situation = Situation::Landed;
        self.landed_at = Some(site.to_string());
        self.orbit = None;
        self
    }

    pub fn periapsis(&self) -> Option<f64> {
        self.orbit.as_ref().map(|o| o.periapsis)
    }

    pub fn apoapsis(&self) -> Option<f64> {
        self.orbit.as_ref().map(|o| o.apoapsis)
    }

    /// In a stable orbit around `body`.
    pub fn is_orbiting(&self, body: &str) -> bool {
        self.situation == Situation::Orbiting && self.body == body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_orbit_sets_situation_and_body() {
        let v = Vessel::new(VesselId(1), "Relay", "Kerbin", PartGraph::new())
            .with_orbit(Orbit::circular("Mun", 30_000.0, 0.0));
        assert!(v.is_orbiting("Mun"));
        assert!(!v.is_orbiting("Kerbin"));
        assert_eq!(v.periapsis(), Some(30_000.0));
    }

    #[test]
    fn test_landed_situations() {
        assert!(Situation::Landed.is_landed());
        assert!(Situation::Splashed.is_landed());
        assert!(!Situation::Prelaunch.is_landed());
    }

    #[test]
    fn test_following_orbit_advances_phase() {
        let orbit = Orbit::circular("Kerbin", 100_000.0, 0.0);
        let next = orbit.following(100.0, 600_000.0);
        let expected = 2.0 * (100.0f64 / 1_400_000.0).asin();
        assert!((next.phase - expected).abs() < 1e-12);
        assert_eq!(next.apoapsis, orbit.apoapsis);
    }

    #[test]
    fn test_vessel_id_display_is_hex() {
        assert_eq!(VesselId(255).to_string(), "00000000000000ff");
    }
}
