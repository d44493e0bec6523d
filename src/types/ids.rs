//! Strongly typed identifiers

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        #[allow(clippy::new_without_default)]
        impl $name {
            /// Generate a fresh random id.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Build a deterministic id, mostly useful in fixtures.
            pub const fn from_u128(value: u128) -> Self {
                Self(Uuid::from_u128(value))
            }

            /// Underlying UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }
    };
}

id_type!(
    /// Identifies a race, the scoping key for all configuration.
    RaceId
);
id_type!(
    /// Identifies an event within a race.
    EventId
);
id_type!(
    /// Identifies a configured split.
    SplitId
);
id_type!(
    /// Identifies a start wave.
    WaveId
);
id_type!(
    /// Identifies a physical time reader.
    TimeReaderId
);
id_type!(
    /// Identifies an athlete category.
    CategoryId
);
id_type!(
    /// Identifies an athlete.
    AthleteId
);
