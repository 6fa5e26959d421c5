//! Pure ferry logic.
//!
//! Records a real flight of a carrier vessel, works out which part of it was
//! payload, turns the flight into a reusable [`profile::MissionProfile`] and
//! later replays that profile as a scheduled mission without simulating it.
//! Nothing here touches an ECS, a clock or the filesystem: functions take
//! plain data and return results.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`catalog`] | Part, resource and body definitions (cost, density, atmosphere) |
//! | [`crew`] | Crew roster and flight logs |
//! | [`mission`] | Deploy, transport and construct missions and their execution |
//! | [`part_graph`] | Vessel part tree, resources, crew seats |
//! | [`partition`] | Payload assembly discovery over the part tree |
//! | [`profile`] | Mission profiles, unique naming, filtering |
//! | [`recording`] | Flight recording state machine and payload deployment |
//! | [`scheduler`] | Pending missions executed when due |
//! | [`settings`] | Session settings and validation |
//! | [`stats`] | Vessel cost, mass and payload statistics |
//! | [`target`] | Transport targets: validity, resource fill, crew transfer |
//! | [`usage`] | Used-part detection during a flight |
//! | [`vessel`] | Vessel identity, situation and orbit |

pub mod catalog;
pub mod crew;
pub mod mission;
pub mod part_graph;
pub mod partition;
pub mod profile;
pub mod recording;
pub mod scheduler;
pub mod settings;
pub mod stats;
pub mod target;
pub mod usage;
pub mod vessel;
