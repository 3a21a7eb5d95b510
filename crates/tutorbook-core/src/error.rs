use std::fmt;

use chrono::NaiveDateTime;

use crate::graph::edge::Edge;
use crate::graph::role_change::{EdgeLoss, describe_losses};
use crate::model::id::{ClassId, PersonId, SessionId};
use crate::model::person::Role;

/// Machine-readable error codes for callers that branch on failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    EntityNotFound,
    DuplicateEntity,
    ScheduleConflict,
    InvalidRelationship,
    AlreadyLinked,
    AlreadyEnrolled,
    NotLinked,
    NotEnrolled,
    DestructiveEditRejected,
    InvalidField,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::EntityNotFound => "E2001",
            Self::DuplicateEntity => "E2002",
            Self::ScheduleConflict => "E2003",
            Self::InvalidRelationship => "E3001",
            Self::AlreadyLinked => "E3002",
            Self::AlreadyEnrolled => "E3003",
            Self::NotLinked => "E3004",
            Self::NotEnrolled => "E3005",
            Self::DestructiveEditRejected => "E4001",
            Self::InvalidField => "E5001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::EntityNotFound => "Entity not found",
            Self::DuplicateEntity => "Entity already exists",
            Self::ScheduleConflict => "Session time already taken",
            Self::InvalidRelationship => "Relationship not allowed for this role",
            Self::AlreadyLinked => "Relationship already exists",
            Self::AlreadyEnrolled => "Student already enrolled",
            Self::NotLinked => "Relationship does not exist",
            Self::NotEnrolled => "Student not enrolled",
            Self::DestructiveEditRejected => "Edit would drop relationships",
            Self::InvalidField => "Invalid field value",
        }
    }

    /// Optional remediation hint that can be surfaced to the user.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in .tutorbook/config.toml and retry."),
            Self::EntityNotFound => Some("List entries again; the target may have been deleted."),
            Self::DuplicateEntity => Some("Pick a different name, or edit the existing entry."),
            Self::ScheduleConflict => Some("Choose another date-time for this class."),
            Self::InvalidRelationship => {
                Some("Parents link to students; classes enroll students and assign tutors.")
            }
            Self::DestructiveEditRejected => {
                Some("Re-run the edit with force to drop the listed relationships.")
            }
            Self::AlreadyLinked
            | Self::AlreadyEnrolled
            | Self::NotLinked
            | Self::NotEnrolled
            | Self::InvalidField => None,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// The kind of entity an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Person,
    Class,
    Session,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Person => "person",
            Self::Class => "class",
            Self::Session => "session",
        })
    }
}

/// Every recoverable failure an address-book operation can report.
///
/// Operations validate before they mutate, so receiving any of these means
/// the book is exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookError {
    #[error("{kind} already exists: {name}")]
    DuplicateEntity { kind: EntityKind, name: String },

    #[error("{kind} not found: {key}")]
    EntityNotFound { kind: EntityKind, key: String },

    #[error("class {class} already has a session at {at}")]
    ScheduleConflict { class: ClassId, at: NaiveDateTime },

    #[error("{person} is a {actual}, expected a {expected}")]
    InvalidRelationship {
        person: PersonId,
        expected: Role,
        actual: Role,
    },

    #[error("already linked: {0}")]
    AlreadyLinked(Edge),

    #[error("student {student} is already enrolled in {class}")]
    AlreadyEnrolled { student: PersonId, class: ClassId },

    #[error("not linked: {0}")]
    NotLinked(Edge),

    #[error("student {student} is not enrolled in {class}")]
    NotEnrolled { student: PersonId, class: ClassId },

    #[error("changing {person} from {from} to {to} would drop {}", describe_losses(.losses))]
    DestructiveEditRejected {
        person: PersonId,
        from: Role,
        to: Role,
        losses: Vec<EdgeLoss>,
    },

    #[error("invalid {field}: '{value}' ({reason})")]
    InvalidField {
        field: &'static str,
        value: String,
        reason: &'static str,
    },
}

impl BookError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::DuplicateEntity { .. } => ErrorCode::DuplicateEntity,
            Self::EntityNotFound { .. } => ErrorCode::EntityNotFound,
            Self::ScheduleConflict { .. } => ErrorCode::ScheduleConflict,
            Self::InvalidRelationship { .. } => ErrorCode::InvalidRelationship,
            Self::AlreadyLinked(_) => ErrorCode::AlreadyLinked,
            Self::AlreadyEnrolled { .. } => ErrorCode::AlreadyEnrolled,
            Self::NotLinked(_) => ErrorCode::NotLinked,
            Self::NotEnrolled { .. } => ErrorCode::NotEnrolled,
            Self::DestructiveEditRejected { .. } => ErrorCode::DestructiveEditRejected,
            Self::InvalidField { .. } => ErrorCode::InvalidField,
        }
    }

    /// Optional remediation hint for the user.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }

    pub(crate) fn person_not_found(id: PersonId) -> Self {
        Self::EntityNotFound {
            kind: EntityKind::Person,
            key: id.to_string(),
        }
    }

    pub(crate) fn class_not_found(id: ClassId) -> Self {
        Self::EntityNotFound {
            kind: EntityKind::Class,
            key: id.to_string(),
        }
    }

    pub(crate) fn session_not_found(id: SessionId) -> Self {
        Self::EntityNotFound {
            kind: EntityKind::Session,
            key: id.to_string(),
        }
    }
}
