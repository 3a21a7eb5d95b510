//! Role-change planning.
//!
//! Changing a person's role is a re-tag of the [`Links`] sum type. No edge
//! survives a re-tag: every edge kind is legal for exactly one role, so the
//! edges held under the old role are exactly the edges that must be unwound
//! on the other endpoints.
//!
//! This module only *plans*. [`plan_role_change`] is a pure function of the
//! person's current links and the target role; the address book decides
//! whether the plan may run (force flag) and performs the unwinding.

#![allow(clippy::module_name_repetitions)]

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::graph::edge::{Edge, EdgeKind};
use crate::model::id::PersonId;
use crate::model::person::{Links, Role};

/// How many edges of one kind a role change would drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeLoss {
    pub kind: EdgeKind,
    pub count: usize,
}

impl fmt::Display for EdgeLoss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plural = if self.count == 1 { "" } else { "s" };
        write!(f, "{} {}{plural}", self.count, self.kind.noun())
    }
}

/// Join losses into a sentence fragment: `"1 parent relationship, 2 class enrollments"`.
#[must_use]
pub fn describe_losses(losses: &[EdgeLoss]) -> String {
    losses
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Everything a role change would remove, computed before anything is touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleChangePlan {
    pub person: PersonId,
    pub from: Role,
    pub to: Role,
    /// Concrete edges to unwind, on both endpoints.
    pub drops: Vec<Edge>,
}

impl RoleChangePlan {
    /// True when the role actually changes.
    #[must_use]
    pub fn is_role_change(&self) -> bool {
        self.from != self.to
    }

    /// True when applying the plan drops nothing.
    #[must_use]
    pub fn is_lossless(&self) -> bool {
        self.drops.is_empty()
    }

    /// Drops grouped by kind, in [`EdgeKind::ALL`] order, omitting zero counts.
    #[must_use]
    pub fn losses(&self) -> Vec<EdgeLoss> {
        EdgeKind::ALL
            .iter()
            .filter(|kind| kind.holder() == self.from)
            .map(|kind| EdgeLoss {
                kind: *kind,
                count: self
                    .drops
                    .iter()
                    .filter(|edge| kind_of(**edge, self.from) == Some(*kind))
                    .count(),
            })
            .filter(|loss| loss.count > 0)
            .collect()
    }
}

/// Which kind an edge is, seen from a holder with role `holder`.
fn kind_of(edge: Edge, holder: Role) -> Option<EdgeKind> {
    match (edge, holder) {
        (Edge::ParentChild { .. }, Role::Student) => Some(EdgeKind::Parent),
        (Edge::ParentChild { .. }, Role::Parent) => Some(EdgeKind::Child),
        (Edge::Enrollment { .. }, Role::Student) => Some(EdgeKind::Enrollment),
        (Edge::Assignment { .. }, Role::Tutor) => Some(EdgeKind::Assignment),
        _ => None,
    }
}

/// Plan re-tagging `person` (currently holding `links`) as `to`.
///
/// Same-role edits keep every edge and produce an empty plan.
#[must_use]
pub fn plan_role_change(person: PersonId, links: &Links, to: Role) -> RoleChangePlan {
    let from = links.role();
    let drops = if from == to {
        Vec::new()
    } else {
        held_edges(person, links)
    };
    RoleChangePlan {
        person,
        from,
        to,
        drops,
    }
}

/// Every edge `person` holds, expressed from both endpoints' point of view.
#[must_use]
pub fn held_edges(person: PersonId, links: &Links) -> Vec<Edge> {
    match links {
        Links::Student(s) => s
            .parents()
            .iter()
            .map(|parent| Edge::ParentChild {
                parent: *parent,
                child: person,
            })
            .chain(s.classes().iter().map(|class| Edge::Enrollment {
                class: *class,
                student: person,
            }))
            .collect(),
        Links::Tutor(t) => t
            .classes()
            .iter()
            .map(|class| Edge::Assignment {
                class: *class,
                tutor: person,
            })
            .collect(),
        Links::Parent(p) => p
            .children()
            .iter()
            .map(|child| Edge::ParentChild {
                parent: person,
                child: *child,
            })
            .collect(),
    }
}
