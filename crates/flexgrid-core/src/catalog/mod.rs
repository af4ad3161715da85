//! Static game catalogs: random events, player tools, infrastructure tiers.
//!
//! Catalog entries are plain data shared by `'static` reference. Nothing in
//! the engine mutates them; runtime state only ever points into them.

pub mod events;
pub mod tiers;
pub mod tools;

pub use events::{ALL_EVENTS, EventDefinition, event_by_id, events_for};
pub use tiers::{InfrastructureTier, SETTLEMENT, TIERS, target_population, tier_for_population};
pub use tools::{ALL_TOOLS, ToolDefinition, ToolKind, tool_by_id};
