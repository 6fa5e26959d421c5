//! Crew roster and flight logs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Where a crew member currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RosterStatus {
    Available,
    Assigned,
    Missing,
}

/// Flight log milestone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlightEventKind {
    Launch,
    Flight,
    Suborbit,
    Orbit,
    Land,
    Recover,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightEvent {
    pub kind: FlightEventKind,
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewMember {
    pub name: String,
    /// Specialisation such as "Pilot" or "Engineer".
    pub role: String,
    pub status: RosterStatus,
    /// Events of the flight in progress.
    pub flight_log: Vec<FlightEvent>,
    /// Archived flights.
    pub career_log: Vec<Vec<FlightEvent>>,
}

impl CrewMember {
    pub fn new(name: &str, role: &str) -> Self {
        Self {
            name: name.to_string(),
            role: role.to_string(),
            status: RosterStatus::Available,
            flight_log: Vec::new(),
            career_log: Vec::new(),
        }
    }

    pub fn log(&mut self, kind: FlightEventKind, body: Option<&str>) {
        self.flight_log.push(FlightEvent {
            kind,
            body: body.map(str::to_string),
        });
    }

    /// Move the current flight log into the career log.
    pub fn archive_flight_log(&mut self) {
        if !self.flight_log.is_empty() {
            self.career_log.push(std::mem::take(&mut self.flight_log));
        }
    }
}

/// Every crew member known to the session, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrewRoster {
    members: BTreeMap<String, CrewMember>,
}

impl CrewRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hire a crew member. Returns false if the name is taken.
    pub fn hire(&mut self, name: &str, role: &str) -> bool {
        if self.members.contains_key(name) {
            return false;
        }
        self.members.insert(name.to_string(), CrewMember::new(name, role));
        true
    }

    pub fn with_member(mut self, name: &str, role: &str) -> Self {
        self.hire(name, role);
        self
    }

    pub fn get(&self, name: &str) -> Option<&CrewMember> {
        self.members.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut CrewMember> {
        self.members.get_mut(name)
    }

    pub fn set_status(&mut self, name: &str, status: RosterStatus) {
        if let Some(member) = self.members.get_mut(name) {
            member.status = status;
        }
    }

    /// Crew members free for a new assignment, in name order.
    pub fn available(&self) -> impl Iterator<Item = &CrewMember> {
        self.members
            .values()
            .filter(|m| m.status == RosterStatus::Available)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
