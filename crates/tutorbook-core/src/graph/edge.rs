use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::id::{ClassId, PersonId};
use crate::model::person::Role;

/// A kind of edge, seen from the person that holds it.
///
/// Every kind is legal for exactly one role, which is what makes a role
/// change lossy: every edge the person holds belongs to the old role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// Student → parent.
    Parent,
    /// Parent → child (student).
    Child,
    /// Student → enrolled class.
    Enrollment,
    /// Tutor → assigned class.
    Assignment,
}

impl EdgeKind {
    pub const ALL: [Self; 4] = [Self::Parent, Self::Child, Self::Enrollment, Self::Assignment];

    /// The only role allowed to hold this kind of edge.
    #[must_use]
    pub const fn holder(self) -> Role {
        match self {
            Self::Parent | Self::Enrollment => Role::Student,
            Self::Child => Role::Parent,
            Self::Assignment => Role::Tutor,
        }
    }

    /// Singular noun phrase used in user-facing loss reports.
    #[must_use]
    pub const fn noun(self) -> &'static str {
        match self {
            Self::Parent => "parent relationship",
            Self::Child => "child relationship",
            Self::Enrollment => "class enrollment",
            Self::Assignment => "class assignment",
        }
    }
}

/// One concrete bidirectional edge, stored on both endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Edge {
    ParentChild { parent: PersonId, child: PersonId },
    Enrollment { class: ClassId, student: PersonId },
    Assignment { class: ClassId, tutor: PersonId },
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ParentChild { parent, child } => write!(f, "parent {parent} of {child}"),
            Self::Enrollment { class, student } => write!(f, "student {student} in {class}"),
            Self::Assignment { class, tutor } => write!(f, "tutor {tutor} of {class}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_role_holds_some_kind() {
        for role in Role::ALL {
            assert!(EdgeKind::ALL.iter().any(|k| k.holder() == role), "{role}");
        }
    }

    #[test]
    fn edge_display_names_both_ends() {
        let edge = Edge::ParentChild {
            parent: PersonId::new(1),
            child: PersonId::new(2),
        };
        assert_eq!(edge.to_string(), "parent p-1 of p-2");
    }
}
