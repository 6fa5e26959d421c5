//! Ferry Core - session engine for recorded ferry flights
//!
//! Owns the game-session state that the pure logic in `ferry_logic` works on:
//! a `hecs` world of vessels, the flight recordings attached to them, the
//! mission profile registry, the mission scheduler and the crew roster.
//!
//! # Architecture
//!
//! - **Entities**: vessels (carriers, stations, spawned ships, detached payload)
//! - **Components**: [`Vessel`](components::Vessel), [`FlightRecording`](components::FlightRecording),
//!   [`ParentVessel`](components::ParentVessel)
//! - **Engine**: a fixed-cadence timer samples the active vessel's recording
//!   and runs due missions
//!
//! # Example
//!
//! ```rust,no_run
//! use ferry_core::prelude::*;
//!
//! let mut engine = SessionEngine::new(Catalog::new(), Settings::default());
//! loop {
//!     engine.update(1.0 / 60.0);
//!     for notice in engine.drain_notices() {
//!         println!("{notice}");
//!     }
//! }
//! ```

pub mod components;
pub mod config;
pub mod engine;
pub mod persistence;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::engine::{EngineError, SessionEngine};
    pub use ferry_logic::catalog::Catalog;
    pub use ferry_logic::settings::Settings;
}
