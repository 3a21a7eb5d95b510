//! The address book: sole owner of every person and class.
//!
//! # Edge discipline
//!
//! Every relationship is stored on both endpoints (see [`crate::graph`]).
//! The only code that touches those id-sets is [`AddressBook::connect`] and
//! [`AddressBook::disconnect`], which always update both sides together.
//!
//! # Validate, then commit
//!
//! Public operations are split into two phases. The first phase only reads:
//! it resolves ids, checks roles and uniqueness, and plans any cascade. The
//! second phase performs infallible mutations. A returned error therefore
//! always means nothing changed.
//!
//! ## Submodules
//!
//! - [`people`]: person lifecycle, edits with role-change cascade, parent links.
//! - [`classes`]: class lifecycle, roster and tutor management.
//! - [`sessions`]: session lifecycle and attendance.

#![allow(clippy::module_name_repetitions)]

mod classes;
mod people;
mod sessions;

use std::collections::BTreeMap;
use std::rc::Rc;

use chrono::NaiveDateTime;

use crate::clock::{Clock, SystemClock};
use crate::config::BookConfig;
use crate::error::BookError;
use crate::graph::edge::Edge;
use crate::model::class::TuitionClass;
use crate::model::id::{ClassId, IdAllocator, PersonId, SessionId};
use crate::model::person::{Person, PersonKey, Role};
use crate::model::session::ClassSession;

/// In-memory repository of persons and tuition classes.
///
/// Construct one per working set; there is no global instance.
#[derive(Debug, Clone)]
pub struct AddressBook {
    ids: IdAllocator,
    pub(crate) persons: BTreeMap<PersonId, Person>,
    pub(crate) classes: BTreeMap<ClassId, TuitionClass>,
    pub(crate) config: BookConfig,
    clock: Rc<dyn Clock>,
}

impl Default for AddressBook {
    fn default() -> Self {
        Self::new(BookConfig::default())
    }
}

/// Structural equality: same entities with the same edges. Configuration and
/// clock are not part of the book's contents.
impl PartialEq for AddressBook {
    fn eq(&self, other: &Self) -> bool {
        self.ids == other.ids && self.persons == other.persons && self.classes == other.classes
    }
}

impl Eq for AddressBook {}

impl AddressBook {
    /// An empty book using the system clock.
    #[must_use]
    pub fn new(config: BookConfig) -> Self {
        Self::with_clock(config, Rc::new(SystemClock))
    }

    /// An empty book with an injected clock.
    #[must_use]
    pub fn with_clock(config: BookConfig, clock: Rc<dyn Clock>) -> Self {
        Self {
            ids: IdAllocator::default(),
            persons: BTreeMap::new(),
            classes: BTreeMap::new(),
            config,
            clock,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &BookConfig {
        &self.config
    }

    /// Current time according to the book's clock.
    #[must_use]
    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    #[must_use]
    pub fn person(&self, id: PersonId) -> Option<&Person> {
        self.persons.get(&id)
    }

    #[must_use]
    pub fn class(&self, id: ClassId) -> Option<&TuitionClass> {
        self.classes.get(&id)
    }

    /// Resolve a person by identity fields (name + phone).
    ///
    /// # Errors
    ///
    /// [`BookError::EntityNotFound`] if no person matches.
    pub fn find_person(&self, key: &PersonKey) -> Result<PersonId, BookError> {
        self.persons
            .values()
            .find(|p| p.key() == *key)
            .map(Person::id)
            .ok_or_else(|| BookError::EntityNotFound {
                kind: crate::error::EntityKind::Person,
                key: key.to_string(),
            })
    }

    /// Resolve a class by name, ignoring case and surrounding whitespace.
    ///
    /// # Errors
    ///
    /// [`BookError::EntityNotFound`] if no class matches.
    pub fn find_class(&self, name: &str) -> Result<ClassId, BookError> {
        let key = name.trim().to_lowercase();
        self.classes
            .values()
            .find(|c| c.name().key() == key)
            .map(TuitionClass::id)
            .ok_or_else(|| BookError::EntityNotFound {
                kind: crate::error::EntityKind::Class,
                key: name.to_string(),
            })
    }

    /// Resolve a session by name within a class.
    ///
    /// # Errors
    ///
    /// [`BookError::EntityNotFound`] for an unknown class or session name.
    pub fn find_session(&self, class: ClassId, name: &str) -> Result<SessionId, BookError> {
        self.require_class(class)?
            .find_session(name)
            .map(ClassSession::id)
            .ok_or_else(|| BookError::EntityNotFound {
                kind: crate::error::EntityKind::Session,
                key: name.to_string(),
            })
    }

    #[must_use]
    pub fn person_count(&self) -> usize {
        self.persons.len()
    }

    #[must_use]
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    // -----------------------------------------------------------------------
    // Validation helpers (read-only)
    // -----------------------------------------------------------------------

    pub(crate) fn require_person(&self, id: PersonId) -> Result<&Person, BookError> {
        self.persons
            .get(&id)
            .ok_or_else(|| BookError::person_not_found(id))
    }

    pub(crate) fn require_role(&self, id: PersonId, expected: Role) -> Result<&Person, BookError> {
        let person = self.require_person(id)?;
        if person.role() == expected {
            Ok(person)
        } else {
            Err(BookError::InvalidRelationship {
                person: id,
                expected,
                actual: person.role(),
            })
        }
    }

    pub(crate) fn require_class(&self, id: ClassId) -> Result<&TuitionClass, BookError> {
        self.classes
            .get(&id)
            .ok_or_else(|| BookError::class_not_found(id))
    }

    pub(crate) fn require_session(
        &self,
        class: ClassId,
        session: SessionId,
    ) -> Result<&ClassSession, BookError> {
        self.require_class(class)?
            .session(session)
            .ok_or_else(|| BookError::session_not_found(session))
    }

    // -----------------------------------------------------------------------
    // Two-sided primitives (commit phase only)
    // -----------------------------------------------------------------------

    /// Record `edge` on both endpoints. Callers have validated both exist
    /// with the right roles.
    pub(crate) fn connect(&mut self, edge: Edge) {
        match edge {
            Edge::ParentChild { parent, child } => {
                if let Some(links) = self.persons.get_mut(&parent).and_then(Person::parent_mut) {
                    links.children_mut().insert(child);
                }
                if let Some(links) = self.persons.get_mut(&child).and_then(Person::student_mut) {
                    links.parents_mut().insert(parent);
                }
            }
            Edge::Enrollment { class, student } => {
                if let Some(c) = self.classes.get_mut(&class) {
                    c.roster_mut().insert(student);
                }
                if let Some(links) = self.persons.get_mut(&student).and_then(Person::student_mut) {
                    links.classes_mut().insert(class);
                }
            }
            Edge::Assignment { class, tutor } => {
                if let Some(c) = self.classes.get_mut(&class) {
                    c.set_tutor(Some(tutor));
                }
                if let Some(links) = self.persons.get_mut(&tutor).and_then(Person::tutor_mut) {
                    links.classes_mut().insert(class);
                }
            }
        }
        tracing::debug!(%edge, "linked");
    }

    /// Remove `edge` from both endpoints. Missing endpoints are skipped.
    pub(crate) fn disconnect(&mut self, edge: Edge) {
        match edge {
            Edge::ParentChild { parent, child } => {
                if let Some(links) = self.persons.get_mut(&parent).and_then(Person::parent_mut) {
                    links.children_mut().remove(&child);
                }
                if let Some(links) = self.persons.get_mut(&child).and_then(Person::student_mut) {
                    links.parents_mut().remove(&parent);
                }
            }
            Edge::Enrollment { class, student } => {
                if let Some(c) = self.classes.get_mut(&class) {
                    c.roster_mut().remove(&student);
                }
                if let Some(links) = self.persons.get_mut(&student).and_then(Person::student_mut) {
                    links.classes_mut().remove(&class);
                }
            }
            Edge::Assignment { class, tutor } => {
                if let Some(c) = self.classes.get_mut(&class) {
                    if c.tutor() == Some(tutor) {
                        c.set_tutor(None);
                    }
                }
                if let Some(links) = self.persons.get_mut(&tutor).and_then(Person::tutor_mut) {
                    links.classes_mut().remove(&class);
                }
            }
        }
        tracing::debug!(%edge, "unlinked");
    }
}
