//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Identifiers use UUID v7 (time-ordered), so a list of ids sorts in
//! creation order. Two kinds exist: listener registrations on the engine
//! and individual occurrences of catalog events.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

define_id! {
    /// Identifier of a state-update listener registered on the engine.
    SubscriptionId
}

define_id! {
    /// Identifier of one occurrence of a catalog event.
    ///
    /// The same catalog event can recur over a game; each admission gets a
    /// fresh id so a UI can key its list of active events.
    ActiveEventId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let a = SubscriptionId::new();
        let b = SubscriptionId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn ids_sort_in_creation_order() {
        let first = ActiveEventId::new();
        let second = ActiveEventId::new();
        assert!(first <= second);
    }

    #[test]
    fn display_matches_inner_uuid() {
        let id = ActiveEventId::new();
        assert_eq!(id.to_string(), id.into_inner().to_string());
    }
}
