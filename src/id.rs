//! Opaque identifiers for states and transitions
//!
//! Identifiers are process-unique 128-bit random values. They are never
//! persisted by the generic machine codec (state names are the durable
//! on-disk key); the VHDL binding is the one place identifiers cross the
//! serialization boundary, which is why both types round-trip through their
//! hyphenated string form.

use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(Uuid);

        impl $name {
            /// Draw a fresh, process-unique identifier.
            pub fn fresh() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.hyphenated().fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                Uuid::from_str(s).map(Self)
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
    /// Identifier of a [`State`](crate::fsm::State).
    StateId
}

define_id! {
    /// Identifier of a [`Transition`](crate::fsm::Transition).
    TransitionId
}
