//! Tuition classes: roster, optional tutor, and sessions.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::error::{BookError, EntityKind};
use crate::model::id::{ClassId, PersonId, SessionId};
use crate::model::session::{ClassSession, SessionName};

/// Class name; unique across the book ignoring case and surrounding space.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClassName(String);

impl ClassName {
    /// # Errors
    ///
    /// Returns [`BookError::InvalidField`] for a blank name.
    pub fn new(raw: &str) -> Result<Self, BookError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(BookError::InvalidField {
                field: "class name",
                value: raw.to_string(),
                reason: "must not be blank",
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-folded form used for uniqueness and lookup.
    #[must_use]
    pub fn key(&self) -> String {
        self.0.to_lowercase()
    }
}

impl fmt::Display for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ClassName {
    type Error = BookError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<ClassName> for String {
    fn from(value: ClassName) -> Self {
        value.0
    }
}

/// A tuition class.
///
/// The roster and tutor mirror edges stored on the persons involved; they are
/// read-only here and changed only through the address book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TuitionClass {
    id: ClassId,
    name: ClassName,
    tutor: Option<PersonId>,
    roster: BTreeSet<PersonId>,
    sessions: Vec<ClassSession>,
}

impl TuitionClass {
    pub(crate) const fn new(id: ClassId, name: ClassName) -> Self {
        Self {
            id,
            name,
            tutor: None,
            roster: BTreeSet::new(),
            sessions: Vec::new(),
        }
    }

    #[must_use]
    pub const fn id(&self) -> ClassId {
        self.id
    }

    #[must_use]
    pub const fn name(&self) -> &ClassName {
        &self.name
    }

    #[must_use]
    pub const fn tutor(&self) -> Option<PersonId> {
        self.tutor
    }

    #[must_use]
    pub const fn roster(&self) -> &BTreeSet<PersonId> {
        &self.roster
    }

    #[must_use]
    pub fn has_student(&self, student: PersonId) -> bool {
        self.roster.contains(&student)
    }

    /// Sessions in creation order.
    #[must_use]
    pub fn sessions(&self) -> &[ClassSession] {
        &self.sessions
    }

    #[must_use]
    pub fn session(&self, id: SessionId) -> Option<&ClassSession> {
        self.sessions.iter().find(|s| s.id() == id)
    }

    /// Find a session by name, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn find_session(&self, name: &str) -> Option<&ClassSession> {
        let key = name.trim().to_lowercase();
        self.sessions.iter().find(|s| s.name().key() == key)
    }

    /// Sessions strictly after `now`, soonest first.
    #[must_use]
    pub fn upcoming_sessions(&self, now: NaiveDateTime) -> Vec<&ClassSession> {
        let mut upcoming: Vec<_> = self.sessions.iter().filter(|s| s.is_upcoming(now)).collect();
        upcoming.sort_by_key(|s| s.at());
        upcoming
    }

    /// Sessions at or before `now`, most recent first.
    #[must_use]
    pub fn past_sessions(&self, now: NaiveDateTime) -> Vec<&ClassSession> {
        let mut past: Vec<_> = self.sessions.iter().filter(|s| !s.is_upcoming(now)).collect();
        past.sort_by_key(|s| std::cmp::Reverse(s.at()));
        past
    }

    /// Check that a session named `name` at `at` may exist in this class.
    ///
    /// `except` excludes one session from both checks, for edits.
    ///
    /// # Errors
    ///
    /// [`BookError::DuplicateEntity`] when another session has the same
    /// normalized name, [`BookError::ScheduleConflict`] when another session
    /// has the exact same date-time.
    pub fn check_session_slot(
        &self,
        name: &SessionName,
        at: NaiveDateTime,
        except: Option<SessionId>,
    ) -> Result<(), BookError> {
        let key = name.key();
        let others = || {
            self.sessions
                .iter()
                .filter(move |s| Some(s.id()) != except)
        };

        if others().any(|s| s.name().key() == key) {
            return Err(BookError::DuplicateEntity {
                kind: EntityKind::Session,
                name: format!("{} in {}", name, self.name),
            });
        }
        if others().any(|s| s.at() == at) {
            return Err(BookError::ScheduleConflict {
                class: self.id,
                at,
            });
        }
        Ok(())
    }

    pub(crate) fn rename(&mut self, name: ClassName) {
        self.name = name;
    }

    pub(crate) fn roster_mut(&mut self) -> &mut BTreeSet<PersonId> {
        &mut self.roster
    }

    pub(crate) fn set_tutor(&mut self, tutor: Option<PersonId>) {
        self.tutor = tutor;
    }

    pub(crate) fn push_session(&mut self, session: ClassSession) {
        self.sessions.push(session);
    }

    /// Mutable session plus a read-only view of the roster, for attendance sync.
    pub(crate) fn session_and_roster_mut(
        &mut self,
        id: SessionId,
    ) -> Option<(&mut ClassSession, &BTreeSet<PersonId>)> {
        let session = self.sessions.iter_mut().find(|s| s.id() == id)?;
        Some((session, &self.roster))
    }

    /// Drop `person` from every session's attendance map; returns entries removed.
    pub(crate) fn forget_attendee(&mut self, person: PersonId) -> usize {
        self.sessions
            .iter_mut()
            .map(|s| s.forget(person))
            .filter(|removed| *removed)
            .count()
    }

    pub(crate) fn take_session(&mut self, id: SessionId) -> Option<ClassSession> {
        let idx = self.sessions.iter().position(|s| s.id() == id)?;
        Some(self.sessions.remove(idx))
    }
}
