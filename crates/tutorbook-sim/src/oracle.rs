use serde::{Deserialize, Serialize};
use tutorbook_core::AddressBook;
use tutorbook_core::error::BookError;
use tutorbook_core::model::id::{ClassId, PersonId, SessionId};
use tutorbook_core::verify::check_consistency;

use crate::workload::Op;

// ── Core result types ─────────────────────────────────────────────────────────

/// Oracle result for one step or a whole run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleResult {
    /// `true` iff no violations were found.
    pub passed: bool,
    /// Every invariant that was violated.
    pub violations: Vec<InvariantViolation>,
}

impl OracleResult {
    #[must_use]
    pub const fn pass() -> Self {
        Self {
            passed: true,
            violations: Vec::new(),
        }
    }

    #[must_use]
    fn from_violations(violations: Vec<InvariantViolation>) -> Self {
        Self {
            passed: violations.is_empty(),
            violations,
        }
    }

    /// Merge another result into this one (failures accumulate).
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        if !other.passed {
            self.passed = false;
            self.violations.extend(other.violations);
        }
        self
    }
}

// ── Invariant violation diagnostics ──────────────────────────────────────────

/// Diagnostic information for a single failed invariant check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InvariantViolation {
    /// The structural verifier found a broken edge, dangling id or
    /// uniqueness clash after the step.
    Structural { step: usize, detail: String },

    /// An operation returned an error but the book changed anyway.
    FailedOpMutated {
        step: usize,
        op: String,
        error: String,
    },

    /// A successful removal left the person in the book.
    RemovedStillPresent { step: usize, person: PersonId },

    /// A marked attendance entry changed or vanished without a step that
    /// is allowed to touch it.
    AttendanceRewritten {
        step: usize,
        class: ClassId,
        session: SessionId,
        student: PersonId,
    },

    /// After initialization a roster student still has no entry.
    AttendanceNotSeeded {
        step: usize,
        session: SessionId,
        student: PersonId,
    },

    /// A role change kept edges from the previous role.
    RoleChangeKeptEdges {
        step: usize,
        person: PersonId,
        remaining: usize,
    },
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Structural { step, detail } => write!(f, "step {step}: {detail}"),
            Self::FailedOpMutated { step, op, error } => {
                write!(f, "step {step}: `{op}` failed ({error}) but changed the book")
            }
            Self::RemovedStillPresent { step, person } => {
                write!(f, "step {step}: {person} was removed but is still present")
            }
            Self::AttendanceRewritten {
                step,
                class,
                session,
                student,
            } => write!(
                f,
                "step {step}: marked attendance of {student} at {session} in {class} was rewritten"
            ),
            Self::AttendanceNotSeeded {
                step,
                session,
                student,
            } => write!(f, "step {step}: {student} has no entry in {session} after sync"),
            Self::RoleChangeKeptEdges {
                step,
                person,
                remaining,
            } => write!(
                f,
                "step {step}: {person} changed role but kept {remaining} edge(s)"
            ),
        }
    }
}

// ── Checks ────────────────────────────────────────────────────────────────────

/// Check one applied step.
///
/// `before` is the book just before `op`, `after` the book once it ran and
/// `outcome` what the operation returned.
#[must_use]
pub fn check_step(
    step: usize,
    op: &Op,
    before: &AddressBook,
    after: &AddressBook,
    outcome: &Result<(), BookError>,
) -> OracleResult {
    let mut violations: Vec<InvariantViolation> = check_consistency(after)
        .violations
        .into_iter()
        .map(|v| InvariantViolation::Structural {
            step,
            detail: v.to_string(),
        })
        .collect();

    match outcome {
        Err(error) => {
            if before != after {
                violations.push(InvariantViolation::FailedOpMutated {
                    step,
                    op: op.to_string(),
                    error: error.to_string(),
                });
            }
        }
        Ok(()) => {
            check_success(step, op, before, after, &mut violations);
        }
    }
    check_attendance_history(step, op, outcome.is_ok(), before, after, &mut violations);

    if !violations.is_empty() {
        tracing::warn!(step, %op, count = violations.len(), "oracle violations");
    }
    OracleResult::from_violations(violations)
}

fn check_success(
    step: usize,
    op: &Op,
    before: &AddressBook,
    after: &AddressBook,
    out: &mut Vec<InvariantViolation>,
) {
    match op {
        Op::RemovePerson { person } => {
            if after.person(*person).is_some() {
                out.push(InvariantViolation::RemovedStillPresent {
                    step,
                    person: *person,
                });
            }
        }
        Op::EditPerson { person, role, .. } => {
            let was = before.person(*person).map(|p| p.role());
            if was != Some(*role) {
                if let Some(changed) = after.person(*person) {
                    let remaining = changed.links().total();
                    if remaining > 0 {
                        out.push(InvariantViolation::RoleChangeKeptEdges {
                            step,
                            person: *person,
                            remaining,
                        });
                    }
                }
            }
        }
        Op::InitAttendance { class, session } => {
            let Some(c) = after.class(*class) else {
                return;
            };
            let Some(s) = c.session(*session) else {
                return;
            };
            for student in c.roster() {
                if s.attendance_of(*student).is_none() {
                    out.push(InvariantViolation::AttendanceNotSeeded {
                        step,
                        session: *session,
                        student: *student,
                    });
                }
            }
        }
        _ => {}
    }
}

/// Marked entries survive every step except the ones allowed to touch them:
/// re-marking that entry, removing the student, or a purging sync once the
/// student has left the roster. Removed sessions and classes are skipped.
fn check_attendance_history(
    step: usize,
    op: &Op,
    succeeded: bool,
    before: &AddressBook,
    after: &AddressBook,
    out: &mut Vec<InvariantViolation>,
) {
    let purging = after.config().attendance.purge_stale;
    for class in before.classes() {
        let Some(after_class) = after.class(class.id()) else {
            continue;
        };
        for session in class.sessions() {
            let Some(after_session) = after_class.session(session.id()) else {
                continue;
            };
            for (student, entry) in session.attendance() {
                if entry.is_unset() {
                    continue;
                }
                let excused = succeeded
                    && match op {
                        Op::Mark {
                            session: s,
                            student: p,
                            ..
                        } => *s == session.id() && p == student,
                        Op::RemovePerson { person } => person == student,
                        Op::InitAttendance { session: s, .. } => {
                            purging && *s == session.id() && !after_class.has_student(*student)
                        }
                        _ => false,
                    };
                if !excused && after_session.attendance_of(*student) != Some(*entry) {
                    out.push(InvariantViolation::AttendanceRewritten {
                        step,
                        class: class.id(),
                        session: session.id(),
                        student: *student,
                    });
                }
            }
        }
    }
}
