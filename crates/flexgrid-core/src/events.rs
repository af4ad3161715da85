//! Active random events: expiry, admission, and multiplier composition.
//!
//! Each tick the manager first drops events whose window has closed, then,
//! on check ticks, tries to admit one new event. Admission makes a bounded
//! number of uniform draws over the catalog and takes the first candidate
//! that is neither already active nor in conflict with anything active.
//! When the budget runs out the manager gives up until the next check tick.

use flexgrid_types::{ActiveEvent, ActiveEventId, Impact};
use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::debug;

use crate::catalog::{self, EventDefinition};

/// Most events that may be active at once.
pub const MAX_ACTIVE_EVENTS: usize = 4;

/// Draws attempted per check tick before giving up.
pub const MAX_ADMISSION_ATTEMPTS: u32 = 10;

/// One occurrence of a catalog event.
#[derive(Debug, Clone, PartialEq)]
struct Occurrence {
    instance_id: ActiveEventId,
    definition: &'static EventDefinition,
    start_tick: u64,
    end_tick: u64,
}

impl Occurrence {
    fn to_active_event(&self) -> ActiveEvent {
        ActiveEvent {
            instance_id: self.instance_id,
            event_id: self.definition.id.to_owned(),
            name: self.definition.name.to_owned(),
            description: self.definition.description.to_owned(),
            impact: self.definition.impact,
            multiplier: self.definition.multiplier,
            duration_ticks: self.definition.duration_ticks,
            probability: self.definition.probability,
            conflicts: self
                .definition
                .conflicts
                .iter()
                .map(|id| (*id).to_owned())
                .collect(),
            start_tick: self.start_tick,
            end_tick: self.end_tick,
        }
    }
}

/// What changed during one [`EventManager::update`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventUpdate {
    /// Catalog ids of events that expired this tick.
    pub expired: Vec<&'static str>,
    /// Catalog id of the event admitted this tick, if any.
    pub admitted: Option<&'static str>,
}

/// Owns the set of active events.
#[derive(Debug, Clone)]
pub struct EventManager {
    /// Pool that admission draws from.
    catalog: &'static [EventDefinition],
    /// Admission runs on ticks divisible by this.
    check_interval: u64,
    /// Active occurrences in admission order.
    active: Vec<Occurrence>,
}

impl EventManager {
    /// Create a manager over the built-in event catalog.
    pub fn new(check_interval: u64) -> Self {
        Self::with_catalog(catalog::ALL_EVENTS, check_interval)
    }

    /// Create a manager drawing from a custom catalog.
    pub const fn with_catalog(catalog: &'static [EventDefinition], check_interval: u64) -> Self {
        Self {
            catalog,
            check_interval,
            active: Vec::new(),
        }
    }

    /// Expire closed events, then attempt an admission on check ticks.
    pub fn update(&mut self, tick: u64, rng: &mut impl Rng) -> EventUpdate {
        let mut update = EventUpdate::default();

        self.active.retain(|occurrence| {
            let keep = occurrence.end_tick > tick;
            if !keep {
                update.expired.push(occurrence.definition.id);
            }
            keep
        });
        for id in &update.expired {
            debug!(tick, event = *id, "event expired");
        }

        if tick.checked_rem(self.check_interval) == Some(0) {
            update.admitted = self.try_admit(tick, rng);
        }

        update
    }

    /// Draw up to [`MAX_ADMISSION_ATTEMPTS`] candidates and activate the
    /// first admissible one.
    fn try_admit(&mut self, tick: u64, rng: &mut impl Rng) -> Option<&'static str> {
        if self.active.len() >= MAX_ACTIVE_EVENTS {
            return None;
        }

        for _ in 0..MAX_ADMISSION_ATTEMPTS {
            let Some(candidate) = self.catalog.choose(rng) else {
                return None;
            };
            if !self.is_admissible(candidate) {
                continue;
            }
            self.active.push(Occurrence {
                instance_id: ActiveEventId::new(),
                definition: candidate,
                start_tick: tick,
                end_tick: tick.saturating_add(candidate.duration_ticks),
            });
            debug!(
                tick,
                event = candidate.id,
                impact = candidate.impact.as_str(),
                multiplier = candidate.multiplier,
                "event admitted"
            );
            return Some(candidate.id);
        }

        debug!(tick, attempts = MAX_ADMISSION_ATTEMPTS, "no admissible event drawn");
        None
    }

    /// Not active and not in conflict with any active event.
    fn is_admissible(&self, candidate: &EventDefinition) -> bool {
        !self.active.iter().any(|occurrence| {
            occurrence.definition.id == candidate.id
                || occurrence.definition.conflicts_with(candidate)
        })
    }

    /// Product of the multipliers of active events with the given impact.
    pub fn multiplier(&self, impact: Impact) -> f64 {
        self.active
            .iter()
            .filter(|occurrence| occurrence.definition.impact == impact)
            .map(|occurrence| occurrence.definition.multiplier)
            .product()
    }

    /// Owned copies of the active events, in admission order.
    pub fn active_events(&self) -> Vec<ActiveEvent> {
        self.active.iter().map(Occurrence::to_active_event).collect()
    }

    /// Number of active events.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Drop every active event.
    pub fn clear(&mut self) {
        self.active.clear();
    }
}
