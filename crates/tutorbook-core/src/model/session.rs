//! Class sessions and their attendance maps.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::BookError;
use crate::model::attendance::Attendance;
use crate::model::id::{ClassId, PersonId, SessionId};

/// Session name, unique within its class after trim + case folding.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionName(String);

impl SessionName {
    /// # Errors
    ///
    /// Returns [`BookError::InvalidField`] for a blank name.
    pub fn new(raw: &str) -> Result<Self, BookError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(BookError::InvalidField {
                field: "session name",
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

    /// Normalized form used for uniqueness checks.
    #[must_use]
    pub fn key(&self) -> String {
        self.0.to_lowercase()
    }
}

impl fmt::Display for SessionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SessionName {
    type Error = BookError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<SessionName> for String {
    fn from(value: SessionName) -> Self {
        value.0
    }
}

/// Replacement values for a session edit. Start from
/// [`SessionEdit::from_session`] and overwrite what changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEdit {
    pub name: SessionName,
    pub at: NaiveDateTime,
    pub location: Option<String>,
    pub remark: Option<String>,
}

impl SessionEdit {
    #[must_use]
    pub fn from_session(session: &ClassSession) -> Self {
        Self {
            name: session.name.clone(),
            at: session.at,
            location: session.location.clone(),
            remark: session.remark.clone(),
        }
    }
}

/// Counts reported by an attendance synchronization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttendanceSync {
    /// Placeholder entries added for roster students.
    pub inserted: usize,
    /// Entries removed for students no longer on the roster.
    pub purged: usize,
    /// Entries kept for students no longer on the roster.
    pub stale: usize,
}

/// One scheduled occurrence of a tuition class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSession {
    id: SessionId,
    class: ClassId,
    name: SessionName,
    at: NaiveDateTime,
    location: Option<String>,
    remark: Option<String>,
    attendance: BTreeMap<PersonId, Attendance>,
}

impl ClassSession {
    pub(crate) fn new(
        id: SessionId,
        class: ClassId,
        name: SessionName,
        at: NaiveDateTime,
        location: Option<String>,
    ) -> Self {
        Self {
            id,
            class,
            name,
            at,
            location: location.and_then(non_blank),
            remark: None,
            attendance: BTreeMap::new(),
        }
    }

    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// The owning class. Fixed at creation.
    #[must_use]
    pub const fn class(&self) -> ClassId {
        self.class
    }

    #[must_use]
    pub const fn name(&self) -> &SessionName {
        &self.name
    }

    #[must_use]
    pub const fn at(&self) -> NaiveDateTime {
        self.at
    }

    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    #[must_use]
    pub fn remark(&self) -> Option<&str> {
        self.remark.as_deref()
    }

    #[must_use]
    pub const fn attendance(&self) -> &BTreeMap<PersonId, Attendance> {
        &self.attendance
    }

    #[must_use]
    pub fn attendance_of(&self, student: PersonId) -> Option<Attendance> {
        self.attendance.get(&student).copied()
    }

    #[must_use]
    pub fn present_count(&self) -> usize {
        self.attendance.values().filter(|a| a.is_present()).count()
    }

    /// Strictly after `now`.
    #[must_use]
    pub fn is_upcoming(&self, now: NaiveDateTime) -> bool {
        self.at > now
    }

    /// Add an unset entry for each roster student missing from the map.
    /// Existing entries are never overwritten.
    pub(crate) fn sync_attendance(
        &mut self,
        roster: &BTreeSet<PersonId>,
        purge_stale: bool,
    ) -> AttendanceSync {
        let mut outcome = AttendanceSync::default();
        for student in roster {
            if !self.attendance.contains_key(student) {
                self.attendance.insert(*student, Attendance::UNSET);
                outcome.inserted += 1;
            }
        }

        let before = self.attendance.len();
        if purge_stale {
            self.attendance.retain(|student, _| roster.contains(student));
            outcome.purged = before - self.attendance.len();
        } else {
            outcome.stale = before - roster.len();
        }
        outcome
    }

    pub(crate) fn mark(&mut self, student: PersonId, present: bool, now: NaiveDateTime) {
        let entry = if present {
            Attendance::present_at(now)
        } else {
            Attendance::absent_at(now)
        };
        self.attendance.insert(student, entry);
    }

    pub(crate) fn forget(&mut self, student: PersonId) -> bool {
        self.attendance.remove(&student).is_some()
    }

    pub(crate) fn apply(&mut self, edit: SessionEdit) {
        self.name = edit.name;
        self.at = edit.at;
        self.location = edit.location.and_then(non_blank);
        self.remark = edit.remark.and_then(non_blank);
    }
}

fn non_blank(text: String) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == text.len() {
        Some(text)
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .and_then(|d| d.and_hms_opt(h, 0, 0))
            .expect("valid timestamp")
    }

    fn session() -> ClassSession {
        ClassSession::new(
            SessionId::new(1),
            ClassId::new(2),
            SessionName::new("Week1").expect("name"),
            at(15, 14),
            Some("  Room 3 ".to_string()),
        )
    }

    fn roster(ids: &[u64]) -> BTreeSet<PersonId> {
        ids.iter().copied().map(PersonId::new).collect()
    }

    #[test]
    fn session_name_key_folds_case_and_whitespace() {
        let a = SessionName::new("Week1").expect("name");
        let b = SessionName::new(" week1 ").expect("name");
        assert_eq!(a.key(), b.key());
        assert!(SessionName::new("  ").is_err());
    }

    #[test]
    fn location_is_trimmed_and_blank_is_none() {
        assert_eq!(session().location(), Some("Room 3"));
        let mut s = session();
        let mut edit = SessionEdit::from_session(&s);
        edit.location = Some("   ".to_string());
        s.apply(edit);
        assert_eq!(s.location(), None);
    }

    #[test]
    fn sync_inserts_unset_for_missing_students() {
        let mut s = session();
        let outcome = s.sync_attendance(&roster(&[1, 2]), false);
        assert_eq!(outcome.inserted, 2);
        assert_eq!(s.attendance().len(), 2);
        assert!(s.attendance().values().all(Attendance::is_unset));
    }

    #[test]
    fn sync_never_overwrites_existing_entries() {
        let mut s = session();
        s.mark(PersonId::new(1), true, at(15, 15));
        let outcome = s.sync_attendance(&roster(&[1, 2]), false);
        assert_eq!(outcome.inserted, 1);
        assert_eq!(
            s.attendance_of(PersonId::new(1)),
            Some(Attendance::present_at(at(15, 15)))
        );
    }

    #[test]
    fn stale_entries_kept_unless_purging() {
        let mut s = session();
        s.sync_attendance(&roster(&[1, 2]), false);

        let kept = s.sync_attendance(&roster(&[2]), false);
        assert_eq!(kept.stale, 1);
        assert!(s.attendance_of(PersonId::new(1)).is_some());

        let purged = s.sync_attendance(&roster(&[2]), true);
        assert_eq!(purged.purged, 1);
        assert!(s.attendance_of(PersonId::new(1)).is_none());
    }

    #[test]
    fn upcoming_is_strictly_after_now() {
        let s = session();
        assert!(s.is_upcoming(at(15, 13)));
        assert!(!s.is_upcoming(at(15, 14)));
    }

    #[test]
    fn mark_inserts_or_replaces() {
        let mut s = session();
        s.mark(PersonId::new(4), false, at(15, 16));
        assert_eq!(s.present_count(), 0);
        s.mark(PersonId::new(4), true, at(15, 17));
        assert_eq!(s.present_count(), 1);
    }
}
