//! Save/Load functionality for persisting session state
//!
//! The whole session is written with bincode. Recordings are stored next to
//! the vessels rather than inside them and are dropped on load when their
//! vessel no longer exists.
//!
//! Single records (a recording, a profile or a mission) can also be written
//! as a JSON document for inspection or exchange.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{Read, Write};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use ferry_logic::crew::CrewRoster;
use ferry_logic::part_graph::PartGraph;
use ferry_logic::profile::ProfileRegistry;
use ferry_logic::scheduler::MissionScheduler;

use crate::components::*;

/// Version number for save file format (increment when format changes)
pub const SAVE_VERSION: u32 = 1;

/// Serializable snapshot of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveData {
    pub version: u32,
    /// Game time in seconds
    pub universal_time: f64,
    pub profiles: ProfileRegistry,
    pub missions: MissionScheduler,
    pub roster: CrewRoster,
    pub templates: BTreeMap<String, PartGraph>,
    pub vessels: Vec<SavedVessel>,
    /// Recordings keyed by the vessel they track
    pub recordings: Vec<(VesselId, FlightRecording)>,
}

/// A vessel entity with its optional parent link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedVessel {
    pub vessel: Vessel,
    pub parent: Option<ParentVessel>,
}

/// Errors that can occur during save/load
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Bincode(#[from] bincode::Error),
    #[error("document error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("save version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Write a session snapshot
pub fn save_session<W: Write>(writer: W, data: &SaveData) -> Result<(), SaveError> {
    bincode::serialize_into(writer, data)?;
    log::info!(
        "saved session: {} vessels, {} recordings, {} profiles, {} missions",
        data.vessels.len(),
        data.recordings.len(),
        data.profiles.len(),
        data.missions.len()
    );
    Ok(())
}

/// Read a session snapshot, dropping recordings of vanished vessels
pub fn load_session<R: Read>(reader: R) -> Result<SaveData, SaveError> {
    let mut data: SaveData = bincode::deserialize_from(reader)?;

    if data.version != SAVE_VERSION {
        return Err(SaveError::VersionMismatch {
            expected: SAVE_VERSION,
            found: data.version,
        });
    }

    let known: BTreeSet<VesselId> = data.vessels.iter().map(|v| v.vessel.id).collect();
    data.recordings.retain(|(id, recording)| {
        let keep = known.contains(id);
        if !keep {
            log::info!("dropping recording '{}' of vanished vessel {id}", recording.profile_name);
        }
        keep
    });
    Ok(data)
}

/// Render a record as a JSON document
pub fn to_document<T: Serialize>(value: &T) -> Result<String, SaveError> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Parse a record from a JSON document
pub fn from_document<T: DeserializeOwned>(text: &str) -> Result<T, SaveError> {
    Ok(serde_json::from_str(text)?)
}
