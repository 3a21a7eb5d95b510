//! Session lifecycle and attendance.

use chrono::NaiveDateTime;

use crate::book::AddressBook;
use crate::error::BookError;
use crate::model::attendance::Attendance;
use crate::model::id::{ClassId, PersonId, SessionId};
use crate::model::person::Role;
use crate::model::session::{AttendanceSync, ClassSession, SessionEdit, SessionName};

impl AddressBook {
    /// Schedule a session and seed its attendance from the current roster.
    ///
    /// # Errors
    ///
    /// - [`BookError::EntityNotFound`] for an unknown class.
    /// - [`BookError::DuplicateEntity`] if the class already has a session
    ///   with the same name (ignoring case and surrounding whitespace).
    /// - [`BookError::ScheduleConflict`] if the class already has a session
    ///   at exactly `at`.
    pub fn add_session(
        &mut self,
        class: ClassId,
        name: SessionName,
        at: NaiveDateTime,
        location: Option<String>,
    ) -> Result<SessionId, BookError> {
        self.require_class(class)?.check_session_slot(&name, at, None)?;

        let purge = self.config.attendance.purge_stale;
        let Some(owner) = self.classes.get_mut(&class) else {
            return Err(BookError::class_not_found(class));
        };
        let id = self.ids.session();
        let mut session = ClassSession::new(id, class, name, at, location);
        let seeded = session.sync_attendance(owner.roster(), purge);
        tracing::debug!(
            class = %class,
            session = %id,
            name = %session.name(),
            %at,
            seeded = seeded.inserted,
            "session added"
        );
        owner.push_session(session);
        Ok(id)
    }

    /// Edit a session's name, time, location and remark.
    ///
    /// # Errors
    ///
    /// [`BookError::EntityNotFound`] for unknown ids, and the same uniqueness
    /// errors as [`Self::add_session`] (ignoring the session being edited).
    pub fn update_session(
        &mut self,
        class: ClassId,
        session: SessionId,
        edit: SessionEdit,
    ) -> Result<(), BookError> {
        self.require_session(class, session)?;
        self.require_class(class)?
            .check_session_slot(&edit.name, edit.at, Some(session))?;

        if let Some((target, _)) = self
            .classes
            .get_mut(&class)
            .and_then(|c| c.session_and_roster_mut(session))
        {
            target.apply(edit);
            tracing::debug!(class = %class, session = %session, "session updated");
        }
        Ok(())
    }

    /// Remove a session from its class.
    ///
    /// # Errors
    ///
    /// [`BookError::EntityNotFound`] for unknown ids.
    pub fn remove_session(
        &mut self,
        class: ClassId,
        session: SessionId,
    ) -> Result<ClassSession, BookError> {
        self.require_session(class, session)?;
        let removed = self
            .classes
            .get_mut(&class)
            .and_then(|c| c.take_session(session))
            .ok_or_else(|| BookError::session_not_found(session))?;
        tracing::debug!(class = %class, session = %session, "session removed");
        Ok(removed)
    }

    /// Give every roster student without an entry an unmarked one.
    ///
    /// Existing entries are never overwritten. Entries for students who
    /// left the roster are kept unless `attendance.purge_stale` is set.
    ///
    /// # Errors
    ///
    /// [`BookError::EntityNotFound`] for unknown ids.
    pub fn initialize_attendance(
        &mut self,
        class: ClassId,
        session: SessionId,
    ) -> Result<AttendanceSync, BookError> {
        self.require_session(class, session)?;
        let purge = self.config.attendance.purge_stale;
        let outcome = self
            .classes
            .get_mut(&class)
            .and_then(|c| c.session_and_roster_mut(session))
            .map(|(target, roster)| target.sync_attendance(roster, purge))
            .ok_or_else(|| BookError::session_not_found(session))?;
        tracing::debug!(
            class = %class,
            session = %session,
            inserted = outcome.inserted,
            purged = outcome.purged,
            stale = outcome.stale,
            "attendance synchronized"
        );
        Ok(outcome)
    }

    /// Mark a student present at a session, timestamped now.
    ///
    /// # Errors
    ///
    /// See [`Self::mark_attendance`].
    pub fn mark_present(
        &mut self,
        class: ClassId,
        session: SessionId,
        student: PersonId,
    ) -> Result<Attendance, BookError> {
        self.mark_attendance(class, session, student, true)
    }

    /// Mark a student absent at a session, timestamped now.
    ///
    /// # Errors
    ///
    /// See [`Self::mark_attendance`].
    pub fn mark_absent(
        &mut self,
        class: ClassId,
        session: SessionId,
        student: PersonId,
    ) -> Result<Attendance, BookError> {
        self.mark_attendance(class, session, student, false)
    }

    /// Record presence for a student at a session, timestamped now.
    ///
    /// The student must be on the class roster or already have an entry in
    /// the session (a student who left the class can still be corrected).
    ///
    /// # Errors
    ///
    /// - [`BookError::EntityNotFound`] for unknown ids.
    /// - [`BookError::InvalidRelationship`] if `student` is not a student,
    ///   including a former student whose entry survives as history.
    /// - [`BookError::NotEnrolled`] if the student is neither on the roster
    ///   nor in the session's attendance.
    pub fn mark_attendance(
        &mut self,
        class: ClassId,
        session: SessionId,
        student: PersonId,
        present: bool,
    ) -> Result<Attendance, BookError> {
        self.require_role(student, Role::Student)?;
        let on_roster = self.require_class(class)?.has_student(student);
        let has_entry = self
            .require_session(class, session)?
            .attendance_of(student)
            .is_some();
        if !on_roster && !has_entry {
            return Err(BookError::NotEnrolled { student, class });
        }

        let now = self.now();
        let entry = self
            .classes
            .get_mut(&class)
            .and_then(|c| c.session_and_roster_mut(session))
            .map(|(target, _)| {
                target.mark(student, present, now);
                target.attendance_of(student)
            })
            .ok_or_else(|| BookError::session_not_found(session))?
            .unwrap_or(Attendance::UNSET);
        tracing::debug!(
            class = %class,
            session = %session,
            student = %student,
            present,
            "attendance marked"
        );
        Ok(entry)
    }
}
