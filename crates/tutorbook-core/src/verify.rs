//! Whole-book consistency checks.
//!
//! [`check_consistency`] walks every person and class and reports each
//! structural rule that does not hold. A book built only through
//! [`AddressBook`] operations always passes; the checker exists for tests,
//! the simulator, and anything that loads a book from outside.
//!
//! [`check_attendance_synced`] is separate because attendance is only
//! seeded on demand: enrolling a student does not touch existing sessions.

use std::collections::BTreeMap;
use std::fmt;

use crate::book::AddressBook;
use crate::model::id::{ClassId, PersonId, SessionId};
use crate::model::person::{Links, Role};

// ── Violations ───────────────────────────────────────────────────────────────

/// One broken rule found by a consistency check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// Only one side of a parent-child link is recorded.
    ParentChildMismatch { parent: PersonId, child: PersonId },

    /// Only one side of an enrollment is recorded.
    RosterMismatch { class: ClassId, student: PersonId },

    /// The class's tutor and the tutor's class list disagree.
    TutorMismatch { class: ClassId, tutor: PersonId },

    /// An id-set references a person that is not in the book.
    DanglingPerson { holder: String, person: PersonId },

    /// A person references a class that is not in the book.
    DanglingClass { person: PersonId, class: ClassId },

    /// An edge endpoint has a role that cannot hold that edge.
    WrongRole {
        person: PersonId,
        expected: Role,
        actual: Role,
    },

    /// Two persons share a name + phone identity.
    DuplicatePerson { first: PersonId, second: PersonId },

    /// Two classes share a case-folded name.
    DuplicateClassName { first: ClassId, second: ClassId },

    /// Two sessions of one class share a normalized name.
    DuplicateSessionName {
        class: ClassId,
        first: SessionId,
        second: SessionId,
    },

    /// Two sessions of one class share an exact date-time.
    DuplicateSessionTime {
        class: ClassId,
        first: SessionId,
        second: SessionId,
    },

    /// A session is stored under a class other than the one it records.
    SessionOwnerMismatch {
        session: SessionId,
        stored_in: ClassId,
        recorded: ClassId,
    },

    /// A roster student has no attendance entry in a session.
    MissingAttendance {
        class: ClassId,
        session: SessionId,
        student: PersonId,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ParentChildMismatch { parent, child } => {
                write!(f, "parent link {parent} -> {child} is one-sided")
            }
            Self::RosterMismatch { class, student } => {
                write!(f, "enrollment of {student} in {class} is one-sided")
            }
            Self::TutorMismatch { class, tutor } => {
                write!(f, "assignment of {tutor} to {class} is one-sided")
            }
            Self::DanglingPerson { holder, person } => {
                write!(f, "{holder} references missing person {person}")
            }
            Self::DanglingClass { person, class } => {
                write!(f, "{person} references missing class {class}")
            }
            Self::WrongRole {
                person,
                expected,
                actual,
            } => write!(f, "{person} is a {actual} where a {expected} is required"),
            Self::DuplicatePerson { first, second } => {
                write!(f, "{first} and {second} are the same person")
            }
            Self::DuplicateClassName { first, second } => {
                write!(f, "{first} and {second} have the same name")
            }
            Self::DuplicateSessionName {
                class,
                first,
                second,
            } => write!(f, "{first} and {second} in {class} have the same name"),
            Self::DuplicateSessionTime {
                class,
                first,
                second,
            } => write!(f, "{first} and {second} in {class} are at the same time"),
            Self::SessionOwnerMismatch {
                session,
                stored_in,
                recorded,
            } => write!(f, "{session} is stored in {stored_in} but belongs to {recorded}"),
            Self::MissingAttendance {
                class,
                session,
                student,
            } => write!(f, "{student} on {class} roster has no entry in {session}"),
        }
    }
}

/// Result of a consistency check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsistencyReport {
    pub violations: Vec<Violation>,
}

impl ConsistencyReport {
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.violations.is_empty()
    }

    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        self.violations.extend(other.violations);
        self
    }
}

impl fmt::Display for ConsistencyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.violations.is_empty() {
            return f.write_str("consistent");
        }
        writeln!(f, "{} violation(s):", self.violations.len())?;
        for v in &self.violations {
            writeln!(f, "  - {v}")?;
        }
        Ok(())
    }
}

// ── Checks ───────────────────────────────────────────────────────────────────

/// Check edge symmetry, referential integrity, role legality and uniqueness.
#[must_use]
pub fn check_consistency(book: &AddressBook) -> ConsistencyReport {
    let mut violations = Vec::new();
    check_person_edges(book, &mut violations);
    check_class_edges(book, &mut violations);
    check_uniqueness(book, &mut violations);
    if !violations.is_empty() {
        tracing::warn!(count = violations.len(), "address book is inconsistent");
    }
    ConsistencyReport { violations }
}

/// Check that every roster student has an entry in every session of the class.
#[must_use]
pub fn check_attendance_synced(book: &AddressBook) -> ConsistencyReport {
    let violations = book
        .classes()
        .flat_map(|class| {
            class.sessions().iter().flat_map(move |session| {
                class
                    .roster()
                    .iter()
                    .filter(move |student| session.attendance_of(**student).is_none())
                    .map(move |student| Violation::MissingAttendance {
                        class: class.id(),
                        session: session.id(),
                        student: *student,
                    })
            })
        })
        .collect();
    ConsistencyReport { violations }
}

fn expect_role(
    book: &AddressBook,
    id: PersonId,
    expected: Role,
    holder: String,
    out: &mut Vec<Violation>,
) -> bool {
    match book.person(id) {
        None => {
            out.push(Violation::DanglingPerson { holder, person: id });
            false
        }
        Some(p) if p.role() != expected => {
            out.push(Violation::WrongRole {
                person: id,
                expected,
                actual: p.role(),
            });
            false
        }
        Some(_) => true,
    }
}

/// Walk edges from the person side and confirm the far side agrees.
fn check_person_edges(book: &AddressBook, out: &mut Vec<Violation>) {
    for person in book.persons() {
        let id = person.id();
        match person.links() {
            Links::Student(links) => {
                for parent in links.parents() {
                    if expect_role(book, *parent, Role::Parent, id.to_string(), out)
                        && !book
                            .person(*parent)
                            .is_some_and(|p| p.children().contains(&id))
                    {
                        out.push(Violation::ParentChildMismatch {
                            parent: *parent,
                            child: id,
                        });
                    }
                }
                for class in links.classes() {
                    match book.class(*class) {
                        None => out.push(Violation::DanglingClass {
                            person: id,
                            class: *class,
                        }),
                        Some(c) if !c.has_student(id) => out.push(Violation::RosterMismatch {
                            class: *class,
                            student: id,
                        }),
                        Some(_) => {}
                    }
                }
            }
            Links::Tutor(links) => {
                for class in links.classes() {
                    match book.class(*class) {
                        None => out.push(Violation::DanglingClass {
                            person: id,
                            class: *class,
                        }),
                        Some(c) if c.tutor() != Some(id) => out.push(Violation::TutorMismatch {
                            class: *class,
                            tutor: id,
                        }),
                        Some(_) => {}
                    }
                }
            }
            Links::Parent(links) => {
                for child in links.children() {
                    if expect_role(book, *child, Role::Student, id.to_string(), out)
                        && !book
                            .person(*child)
                            .is_some_and(|c| c.parents().contains(&id))
                    {
                        out.push(Violation::ParentChildMismatch {
                            parent: id,
                            child: *child,
                        });
                    }
                }
            }
        }
    }
}

/// Walk edges from the class side.
fn check_class_edges(book: &AddressBook, out: &mut Vec<Violation>) {
    for class in book.classes() {
        let id = class.id();
        for student in class.roster() {
            if expect_role(book, *student, Role::Student, id.to_string(), out)
                && !book
                    .person(*student)
                    .is_some_and(|p| p.classes().contains(&id))
            {
                out.push(Violation::RosterMismatch {
                    class: id,
                    student: *student,
                });
            }
        }
        if let Some(tutor) = class.tutor() {
            if expect_role(book, tutor, Role::Tutor, id.to_string(), out)
                && !book
                    .person(tutor)
                    .is_some_and(|p| p.classes().contains(&id))
            {
                out.push(Violation::TutorMismatch { class: id, tutor });
            }
        }
        for session in class.sessions() {
            if session.class() != id {
                out.push(Violation::SessionOwnerMismatch {
                    session: session.id(),
                    stored_in: id,
                    recorded: session.class(),
                });
            }
            for attendee in session.attendance().keys() {
                if book.person(*attendee).is_none() {
                    out.push(Violation::DanglingPerson {
                        holder: session.id().to_string(),
                        person: *attendee,
                    });
                }
            }
        }
    }
}

fn check_uniqueness(book: &AddressBook, out: &mut Vec<Violation>) {
    let mut people: BTreeMap<_, PersonId> = BTreeMap::new();
    for person in book.persons() {
        if let Some(first) = people.insert(person.key(), person.id()) {
            out.push(Violation::DuplicatePerson {
                first,
                second: person.id(),
            });
        }
    }

    let mut class_names: BTreeMap<String, ClassId> = BTreeMap::new();
    for class in book.classes() {
        if let Some(first) = class_names.insert(class.name().key(), class.id()) {
            out.push(Violation::DuplicateClassName {
                first,
                second: class.id(),
            });
        }

        let mut names: BTreeMap<String, SessionId> = BTreeMap::new();
        let mut times = BTreeMap::new();
        for session in class.sessions() {
            if let Some(first) = names.insert(session.name().key(), session.id()) {
                out.push(Violation::DuplicateSessionName {
                    class: class.id(),
                    first,
                    second: session.id(),
                });
            }
            if let Some(first) = times.insert(session.at(), session.id()) {
                out.push(Violation::DuplicateSessionTime {
                    class: class.id(),
                    first,
                    second: session.id(),
                });
            }
        }
    }
}
