//! Surrogate identifiers for persons, classes and sessions.
//!
//! Every entity gets an id when the address book creates it. Ids are never
//! reused, so an id held by a caller after a delete simply fails to resolve.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! surrogate_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            #[must_use]
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "-{}"), self.0)
            }
        }
    };
}

surrogate_id!(
    /// Stable id of a person, independent of name, phone or role.
    PersonId,
    "p"
);
surrogate_id!(
    /// Stable id of a tuition class, independent of its (renameable) name.
    ClassId,
    "c"
);
surrogate_id!(
    /// Stable id of a class session. Name and date-time are plain data.
    SessionId,
    "s"
);

/// Monotonic id source owned by the address book.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub(crate) fn person(&mut self) -> PersonId {
        PersonId(self.bump())
    }

    pub(crate) fn class(&mut self) -> ClassId {
        ClassId(self.bump())
    }

    pub(crate) fn session(&mut self) -> SessionId {
        SessionId(self.bump())
    }

    fn bump(&mut self) -> u64 {
        self.next = self.next.saturating_add(1);
        self.next
    }
}
