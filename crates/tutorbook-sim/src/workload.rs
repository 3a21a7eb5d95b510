//! Random address-book operations.
//!
//! [`generate`] draws one operation against the live book: most operations
//! target existing entities, a small share target ids that were never
//! allocated so the not-found paths get exercised too. Name pools are small
//! on purpose so identity and uniqueness clashes happen regularly.

use std::fmt;

use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};
use tutorbook_core::AddressBook;
use tutorbook_core::clock::FixedClock;
use tutorbook_core::error::{BookError, EntityKind};
use tutorbook_core::model::class::ClassName;
use tutorbook_core::model::id::{ClassId, PersonId, SessionId};
use tutorbook_core::model::person::{
    Address, Email, Name, PersonDetails, PersonEdit, Phone, Role,
};
use tutorbook_core::model::session::{SessionEdit, SessionName};

use crate::rng::Entropy;

const FIRST_NAMES: [&str; 8] = [
    "Alice", "Bob", "Carol", "Dave", "Eve", "Frank", "Grace", "Heidi",
];
const CLASS_NAMES: [&str; 5] = ["Math101", "Physics", "Chemistry", "Biology", "math101 "];
const SESSION_NAMES: [&str; 6] = ["Week1", "Week2", "Week3", "week1 ", "Revision", "Mock Exam"];

/// Share of entity picks that deliberately miss, in percent.
const MISS_PERCENT: u8 = 5;

/// Ids at or above this are never allocated by a simulated book.
const UNKNOWN_ID_BASE: u64 = 1 << 40;

/// One simulated operation, with every argument resolved to a concrete value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    AddPerson {
        name: String,
        phone: String,
        role: Role,
    },
    EditPerson {
        person: PersonId,
        rename: Option<String>,
        role: Role,
        force: bool,
    },
    RemovePerson {
        person: PersonId,
    },
    LinkParent {
        parent: PersonId,
        child: PersonId,
    },
    UnlinkParent {
        parent: PersonId,
        child: PersonId,
    },
    AddClass {
        name: String,
    },
    RenameClass {
        class: ClassId,
        name: String,
    },
    RemoveClass {
        class: ClassId,
    },
    Enroll {
        class: ClassId,
        student: PersonId,
    },
    Unenroll {
        class: ClassId,
        student: PersonId,
    },
    AssignTutor {
        class: ClassId,
        tutor: Option<PersonId>,
    },
    AddSession {
        class: ClassId,
        name: String,
        at: NaiveDateTime,
    },
    MoveSession {
        class: ClassId,
        session: SessionId,
        at: NaiveDateTime,
    },
    RemoveSession {
        class: ClassId,
        session: SessionId,
    },
    InitAttendance {
        class: ClassId,
        session: SessionId,
    },
    Mark {
        class: ClassId,
        session: SessionId,
        student: PersonId,
        present: bool,
    },
    AdvanceClock {
        minutes: i64,
    },
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddPerson { name, phone, role } => write!(f, "add {role} {name} ({phone})"),
            Self::EditPerson {
                person,
                rename,
                role,
                force,
            } => {
                write!(f, "edit {person} as {role}")?;
                if let Some(name) = rename {
                    write!(f, " named {name}")?;
                }
                if *force {
                    f.write_str(" (forced)")?;
                }
                Ok(())
            }
            Self::RemovePerson { person } => write!(f, "remove {person}"),
            Self::LinkParent { parent, child } => write!(f, "link {parent} -> {child}"),
            Self::UnlinkParent { parent, child } => write!(f, "unlink {parent} -> {child}"),
            Self::AddClass { name } => write!(f, "add class {name:?}"),
            Self::RenameClass { class, name } => write!(f, "rename {class} to {name:?}"),
            Self::RemoveClass { class } => write!(f, "remove {class}"),
            Self::Enroll { class, student } => write!(f, "enroll {student} in {class}"),
            Self::Unenroll { class, student } => write!(f, "unenroll {student} from {class}"),
            Self::AssignTutor { class, tutor } => match tutor {
                Some(tutor) => write!(f, "assign {tutor} to {class}"),
                None => write!(f, "unassign tutor of {class}"),
            },
            Self::AddSession { class, name, at } => write!(f, "add session {name:?} to {class} at {at}"),
            Self::MoveSession { class, session, at } => write!(f, "move {session} of {class} to {at}"),
            Self::RemoveSession { class, session } => write!(f, "remove {session} of {class}"),
            Self::InitAttendance { class, session } => write!(f, "sync attendance of {session} in {class}"),
            Self::Mark {
                class,
                session,
                student,
                present,
            } => {
                let word = if *present { "present" } else { "absent" };
                write!(f, "mark {student} {word} at {session} of {class}")
            }
            Self::AdvanceClock { minutes } => write!(f, "advance clock {minutes}m"),
        }
    }
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Draw one operation against the current state of `book`.
pub fn generate<E: Entropy>(entropy: &mut E, book: &AddressBook) -> Op {
    let now = book.now();
    match entropy.next_bounded(100) {
        0..=11 => Op::AddPerson {
            name: pick(entropy, &FIRST_NAMES).to_string(),
            phone: format!("9100{}", entropy.next_bounded(4)),
            role: pick_role(entropy),
        },
        12..=16 => Op::EditPerson {
            person: pick_person(entropy, book),
            rename: entropy
                .hit_rate_percent(30)
                .then(|| pick(entropy, &FIRST_NAMES).to_string()),
            role: pick_role(entropy),
            force: entropy.hit_rate_percent(50),
        },
        17..=20 => Op::RemovePerson {
            person: pick_person(entropy, book),
        },
        21..=29 => Op::LinkParent {
            parent: pick_person(entropy, book),
            child: pick_person(entropy, book),
        },
        30..=32 => Op::UnlinkParent {
            parent: pick_person(entropy, book),
            child: pick_person(entropy, book),
        },
        33..=37 => Op::AddClass {
            name: pick(entropy, &CLASS_NAMES).to_string(),
        },
        38..=39 => Op::RenameClass {
            class: pick_class(entropy, book),
            name: pick(entropy, &CLASS_NAMES).to_string(),
        },
        40..=42 => Op::RemoveClass {
            class: pick_class(entropy, book),
        },
        43..=54 => Op::Enroll {
            class: pick_class(entropy, book),
            student: pick_person(entropy, book),
        },
        55..=58 => Op::Unenroll {
            class: pick_class(entropy, book),
            student: pick_person(entropy, book),
        },
        59..=64 => Op::AssignTutor {
            class: pick_class(entropy, book),
            tutor: (!entropy.hit_rate_percent(20)).then(|| pick_person(entropy, book)),
        },
        65..=73 => Op::AddSession {
            class: pick_class(entropy, book),
            name: pick(entropy, &SESSION_NAMES).to_string(),
            at: pick_time(entropy, now),
        },
        74..=76 => {
            let class = pick_class(entropy, book);
            Op::MoveSession {
                class,
                session: pick_session(entropy, book, class),
                at: pick_time(entropy, now),
            }
        }
        77..=78 => {
            let class = pick_class(entropy, book);
            Op::RemoveSession {
                class,
                session: pick_session(entropy, book, class),
            }
        }
        79..=83 => {
            let class = pick_class(entropy, book);
            Op::InitAttendance {
                class,
                session: pick_session(entropy, book, class),
            }
        }
        84..=95 => {
            let class = pick_class(entropy, book);
            let session = pick_session(entropy, book, class);
            let student = pick_roster_student(entropy, book, class);
            Op::Mark {
                class,
                session,
                student,
                present: entropy.hit_rate_percent(70),
            }
        }
        _ => Op::AdvanceClock {
            minutes: i64::try_from(entropy.next_bounded(60 * 24 * 3)).unwrap_or(0),
        },
    }
}

fn pick<'a, E: Entropy>(entropy: &mut E, pool: &[&'a str]) -> &'a str {
    pool[entropy.pick_index(pool.len())]
}

fn pick_role<E: Entropy>(entropy: &mut E) -> Role {
    Role::ALL[entropy.pick_index(Role::ALL.len())]
}

fn unknown<E: Entropy>(entropy: &mut E) -> u64 {
    UNKNOWN_ID_BASE + entropy.next_bounded(8)
}

fn pick_person<E: Entropy>(entropy: &mut E, book: &AddressBook) -> PersonId {
    let ids: Vec<PersonId> = book.persons().map(|p| p.id()).collect();
    if ids.is_empty() || entropy.hit_rate_percent(MISS_PERCENT) {
        return PersonId::new(unknown(entropy));
    }
    ids[entropy.pick_index(ids.len())]
}

fn pick_class<E: Entropy>(entropy: &mut E, book: &AddressBook) -> ClassId {
    let ids: Vec<ClassId> = book.classes().map(|c| c.id()).collect();
    if ids.is_empty() || entropy.hit_rate_percent(MISS_PERCENT) {
        return ClassId::new(unknown(entropy));
    }
    ids[entropy.pick_index(ids.len())]
}

fn pick_session<E: Entropy>(entropy: &mut E, book: &AddressBook, class: ClassId) -> SessionId {
    let ids: Vec<SessionId> = book
        .class(class)
        .map(|c| c.sessions().iter().map(|s| s.id()).collect())
        .unwrap_or_default();
    if ids.is_empty() || entropy.hit_rate_percent(MISS_PERCENT) {
        return SessionId::new(unknown(entropy));
    }
    ids[entropy.pick_index(ids.len())]
}

/// Mostly roster students, so marking usually succeeds.
fn pick_roster_student<E: Entropy>(entropy: &mut E, book: &AddressBook, class: ClassId) -> PersonId {
    let roster: Vec<PersonId> = book
        .class(class)
        .map(|c| c.roster().iter().copied().collect())
        .unwrap_or_default();
    if roster.is_empty() || entropy.hit_rate_percent(15) {
        return pick_person(entropy, book);
    }
    roster[entropy.pick_index(roster.len())]
}

/// Within three days before to eleven days after `now`, on the hour.
fn pick_time<E: Entropy>(entropy: &mut E, now: NaiveDateTime) -> NaiveDateTime {
    let hours = i64::try_from(entropy.next_bounded(24 * 14)).unwrap_or(0) - 24 * 3;
    let midnight = now.date().and_hms_opt(0, 0, 0).unwrap_or(now);
    midnight + TimeDelta::hours(hours)
}

// ---------------------------------------------------------------------------
// Application
// ---------------------------------------------------------------------------

/// Apply `op` to `book`; clock moves go to `clock`.
///
/// # Errors
///
/// Returns whatever [`BookError`] the address book reports. Generated names
/// and phones are always valid, so only relationship and lookup errors occur.
pub fn apply(book: &mut AddressBook, clock: &FixedClock, op: &Op) -> Result<(), BookError> {
    match op {
        Op::AddPerson { name, phone, role } => {
            let details = details(name, phone)?;
            book.add_person(details, *role).map(|_| ())
        }
        Op::EditPerson {
            person,
            rename,
            role,
            force,
        } => {
            let mut details = match book.person(*person) {
                Some(p) => p.details().clone(),
                None => details("Ghost", "9999")?,
            };
            if let Some(name) = rename {
                details.name = Name::new(name)?;
            }
            let edit = PersonEdit {
                details,
                role: *role,
            };
            book.set_person(*person, edit, *force).map(|_| ())
        }
        Op::RemovePerson { person } => book.remove_person(*person).map(|_| ()),
        Op::LinkParent { parent, child } => book.link_parent(*parent, *child),
        Op::UnlinkParent { parent, child } => book.unlink_parent(*parent, *child),
        Op::AddClass { name } => book.add_class(ClassName::new(name)?).map(|_| ()),
        Op::RenameClass { class, name } => book.rename_class(*class, ClassName::new(name)?),
        Op::RemoveClass { class } => book.remove_class(*class).map(|_| ()),
        Op::Enroll { class, student } => book.enroll_student(*class, *student),
        Op::Unenroll { class, student } => book.unenroll_student(*class, *student),
        Op::AssignTutor { class, tutor } => book.assign_tutor(*class, *tutor).map(|_| ()),
        Op::AddSession { class, name, at } => book
            .add_session(*class, SessionName::new(name)?, *at, None)
            .map(|_| ()),
        Op::MoveSession { class, session, at } => {
            let edit = book
                .class(*class)
                .and_then(|c| c.session(*session))
                .map(SessionEdit::from_session);
            match edit {
                Some(mut edit) => {
                    edit.at = *at;
                    book.update_session(*class, *session, edit)
                }
                None => {
                    let (kind, key) = if book.class(*class).is_some() {
                        (EntityKind::Session, session.to_string())
                    } else {
                        (EntityKind::Class, class.to_string())
                    };
                    Err(BookError::EntityNotFound { kind, key })
                }
            }
        }
        Op::RemoveSession { class, session } => {
            book.remove_session(*class, *session).map(|_| ())
        }
        Op::InitAttendance { class, session } => {
            book.initialize_attendance(*class, *session).map(|_| ())
        }
        Op::Mark {
            class,
            session,
            student,
            present,
        } => book
            .mark_attendance(*class, *session, *student, *present)
            .map(|_| ()),
        Op::AdvanceClock { minutes } => {
            clock.advance(TimeDelta::minutes(*minutes));
            Ok(())
        }
    }
}

fn details(name: &str, phone: &str) -> Result<PersonDetails, BookError> {
    Ok(PersonDetails::new(
        Name::new(name)?,
        Phone::new(phone)?,
        Email::new(&format!("{}@example.com", name.to_lowercase()))?,
        Address::new("1 Simulation Way")?,
    ))
}
