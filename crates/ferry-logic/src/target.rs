//! Operations on the target vessel of a transport mission.
//!
//! Everything that mutates a vessel here refuses to touch one that is
//! currently loaded: transfers only operate on the background copy.

use crate::catalog::Catalog;
use crate::crew::{CrewRoster, FlightEventKind, RosterStatus};
use crate::mission::MissionError;
use crate::profile::MissionProfile;
use crate::stats::PayloadResource;
use crate::vessel::{Situation, Vessel};

/// Display name of a docking node type.
pub fn docking_port_name(node_type: &str) -> &str {
    match node_type {
        "size0" => "Clamp-O-Tron Jr.",
        "size1" => "Clamp-O-Tron",
        "size2" => "Clamp-O-Tron Sr.",
        other => other,
    }
}

/// Whether `vessel` can receive a transport flight launched from `home_body`.
///
/// With a profile, the vessel must also offer a matching docking port and
/// stay below the profile's maximum altitude.
pub fn is_valid_target(vessel: &Vessel, home_body: &str, profile: Option<&MissionProfile>) -> bool {
    if vessel.situation != Situation::Orbiting {
        return false;
    }
    let Some(orbit) = &vessel.orbit else {
        return false;
    };
    if orbit.body != home_body {
        return false;
    }
    let ports = vessel.parts.docking_port_types();
    if ports.is_empty() {
        return false;
    }
    if let Some(profile) = profile {
        if !profile.fits_ports(&ports) {
            return false;
        }
        if orbit.apoapsis > profile.max_altitude {
            return false;
        }
    }
    true
}

/// Room for mass-bearing resources, aggregated by name in part order.
///
/// Containers with less than `epsilon` free space are ignored.
pub fn free_resource_capacities(vessel: &Vessel, catalog: &Catalog, epsilon: f64) -> Vec<PayloadResource> {
    let mut free: Vec<PayloadResource> = Vec::new();
    for resource in vessel.parts.parts().iter().flat_map(|p| &p.resources) {
        let room = resource.max_amount - resource.amount;
        if room < epsilon {
            continue;
        }
        let Some(def) = catalog.resource(&resource.name) else {
            continue;
        };
        if !def.has_mass() {
            continue;
        }
        match free.iter_mut().find(|r| r.name == resource.name) {
            Some(entry) => entry.amount += room,
            None => free.push(PayloadResource {
                name: resource.name.clone(),
                amount: room,
                mass: def.density,
            }),
        }
    }
    free
}

/// Seats on the vessel, occupied or not.
pub fn crew_capacity(vessel: &Vessel) -> u32 {
    vessel.parts.crew_capacity()
}

/// Fill `amount` of a resource into the vessel's containers in part order.
///
/// A container left with less than `epsilon` free space is topped up to
/// full. Returns the amount actually added.
pub fn add_resources(
    vessel: &mut Vessel,
    name: &str,
    amount: f64,
    epsilon: f64,
    notices: &mut Vec<String>,
) -> Result<f64, MissionError> {
    if vessel.loaded {
        return Err(MissionError::VesselLoaded(vessel.id));
    }

    let mut to_add = amount.max(0.0);
    let mut added = 0.0;
    for resource in vessel
        .parts
        .parts_mut()
        .iter_mut()
        .flat_map(|p| p.resources.iter_mut())
        .filter(|r| r.name == name)
    {
        if to_add <= 0.0 {
            break;
        }
        let room = resource.max_amount - resource.amount;
        if room <= 0.0 {
            continue;
        }
        if room > to_add {
            let fill = if room - to_add < epsilon { room } else { to_add };
            resource.amount += fill;
            added += fill;
            to_add = 0.0;
        } else {
            resource.amount += room;
            added += room;
            to_add -= room;
        }
    }

    log::info!("added {added:.2} / {amount:.2} of {name} to {}", vessel.name);
    notices.push(format!("{} received {:.0} of {name}", vessel.name, added));
    Ok(added)
}

/// Seat a roster member in the first part with a free seat.
///
/// Returns false with a notice when the member is unknown or no seat is free.
pub fn add_crew_member(
    vessel: &mut Vessel,
    roster: &mut CrewRoster,
    name: &str,
    home_body: &str,
    notices: &mut Vec<String>,
) -> Result<bool, MissionError> {
    if vessel.loaded {
        return Err(MissionError::VesselLoaded(vessel.id));
    }

    let Some(member) = roster.get_mut(name) else {
        log::warn!("unable to complete crew transfer to {}, {name} unavailable", vessel.name);
        notices.push(format!(
            "Crew transfer aborted: {name} unavailable for transfer to {}",
            vessel.name
        ));
        return Ok(false);
    };

    let Some(part) = vessel.parts.parts_mut().iter_mut().find(|p| p.free_seats() > 0) else {
        log::warn!("unable to complete crew transfer to {}, no free seats", vessel.name);
        notices.push(format!(
            "Crew transfer aborted: {} had no free seat for {name}",
            vessel.name
        ));
        return Ok(false);
    };

    part.crew.push(name.to_string());
    member.status = RosterStatus::Assigned;
    for kind in [
        FlightEventKind::Launch,
        FlightEventKind::Flight,
        FlightEventKind::Suborbit,
        FlightEventKind::Orbit,
    ] {
        member.log(kind, Some(home_body));
    }

    log::info!("added {name} to vessel {}", vessel.name);
    notices.push(format!("{name} transferred to {}", vessel.name));
    Ok(true)
}

/// Take a crew member off the vessel and return them to the roster.
///
/// Returns false with a notice when the member is not aboard.
pub fn recover_crew_member(
    vessel: &mut Vessel,
    roster: &mut CrewRoster,
    name: &str,
    home_body: &str,
    notices: &mut Vec<String>,
) -> Result<bool, MissionError> {
    if vessel.loaded {
        return Err(MissionError::VesselLoaded(vessel.id));
    }

    let Some(part) = vessel
        .parts
        .parts_mut()
        .iter_mut()
        .find(|p| p.crew.iter().any(|c| c == name))
    else {
        log::warn!("unable to recover {name} from {}, not aboard", vessel.name);
        notices.push(format!(
            "Crew transfer aborted: {name} not present on {}",
            vessel.name
        ));
        return Ok(false);
    };
    part.crew.retain(|c| c != name);

    if roster.get(name).is_none() {
        roster.hire(name, "");
    }
    if let Some(member) = roster.get_mut(name) {
        member.status = RosterStatus::Available;
        member.log(FlightEventKind::Land, Some(home_body));
        member.log(FlightEventKind::Recover, None);
        member.archive_flight_log();
    }

    log::info!("recovered {name} from vessel {}", vessel.name);
    notices.push(format!("{name} recovered from {}", vessel.name));
    Ok(true)
}
