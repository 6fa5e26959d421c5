//! Component definitions for the session world.
//!
//! Every vessel is an entity holding a [`Vessel`]. A vessel whose flight is
//! being recorded also holds a [`FlightRecording`]. Payload cut loose from a
//! carrier holds a [`ParentVessel`] so recovered funds can be credited back
//! to the carrier's recording.

use serde::{Deserialize, Serialize};

pub use ferry_logic::recording::FlightRecording;
pub use ferry_logic::vessel::{Vessel, VesselId};

/// The carrier a detached vessel came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentVessel(pub VesselId);

/// Which part of the game the session is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Scene {
    /// No game loaded. Timers do not run.
    MainMenu,
    #[default]
    SpaceCenter,
    TrackingStation,
    /// A vessel is physically simulated.
    Flight,
}
