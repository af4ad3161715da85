//! Shared type definitions for the FlexGrid simulation.
//!
//! This crate holds every type that crosses the boundary between the engine
//! and its consumers. Types defined here flow downstream to `TypeScript` via
//! `ts-rs` for the browser UI.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for subscriptions and event occurrences
//! - [`enums`] -- Impact side, engine status, grid band, game-over reason
//! - [`structs`] -- Published snapshots and active events

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{EngineStatus, GameOverReason, GridBand, Impact};
pub use ids::{ActiveEventId, SubscriptionId};
pub use structs::{ActiveEvent, GameSnapshot};
