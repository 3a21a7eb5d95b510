//! Class lifecycle, roster and tutor assignment.

use crate::book::AddressBook;
use crate::error::{BookError, EntityKind};
use crate::graph::edge::Edge;
use crate::model::class::{ClassName, TuitionClass};
use crate::model::id::{ClassId, PersonId};
use crate::model::person::Role;

impl AddressBook {
    /// Create an empty class.
    ///
    /// # Errors
    ///
    /// [`BookError::DuplicateEntity`] if a class with the same name (ignoring
    /// case) exists.
    pub fn add_class(&mut self, name: ClassName) -> Result<ClassId, BookError> {
        self.reject_duplicate_class(&name, None)?;
        let id = self.ids.class();
        tracing::debug!(class = %id, %name, "class added");
        self.classes.insert(id, TuitionClass::new(id, name));
        Ok(id)
    }

    /// Rename a class, keeping names unique.
    ///
    /// # Errors
    ///
    /// [`BookError::EntityNotFound`] for an unknown class,
    /// [`BookError::DuplicateEntity`] if another class already uses the name.
    pub fn rename_class(&mut self, id: ClassId, name: ClassName) -> Result<(), BookError> {
        self.require_class(id)?;
        self.reject_duplicate_class(&name, Some(id))?;
        if let Some(class) = self.classes.get_mut(&id) {
            tracing::debug!(class = %id, from = %class.name(), to = %name, "class renamed");
            class.rename(name);
        }
        Ok(())
    }

    /// Delete a class after unenrolling every student and unassigning its tutor.
    ///
    /// # Errors
    ///
    /// [`BookError::EntityNotFound`] if the class does not exist, including
    /// when it was already deleted.
    pub fn remove_class(&mut self, id: ClassId) -> Result<TuitionClass, BookError> {
        let class = self.require_class(id)?;
        let edges: Vec<Edge> = class
            .roster()
            .iter()
            .map(|student| Edge::Enrollment {
                class: id,
                student: *student,
            })
            .chain(class.tutor().map(|tutor| Edge::Assignment { class: id, tutor }))
            .collect();

        for edge in &edges {
            self.disconnect(*edge);
        }
        let removed = self
            .classes
            .remove(&id)
            .ok_or_else(|| BookError::class_not_found(id))?;
        tracing::info!(
            class = %id,
            name = %removed.name(),
            edges = edges.len(),
            sessions = removed.sessions().len(),
            "class removed"
        );
        Ok(removed)
    }

    /// Enroll a student in a class, on both sides.
    ///
    /// Existing sessions are not touched; call
    /// [`Self::initialize_attendance`] to give the new student entries.
    ///
    /// # Errors
    ///
    /// - [`BookError::EntityNotFound`] for unknown ids.
    /// - [`BookError::InvalidRelationship`] if `student` is not a student.
    /// - [`BookError::AlreadyEnrolled`] if already on the roster.
    pub fn enroll_student(&mut self, class: ClassId, student: PersonId) -> Result<(), BookError> {
        let roster_has = self.require_class(class)?.has_student(student);
        self.require_role(student, Role::Student)?;
        if roster_has {
            return Err(BookError::AlreadyEnrolled { student, class });
        }
        self.connect(Edge::Enrollment { class, student });
        Ok(())
    }

    /// Remove a student from a class, on both sides. Attendance history in
    /// the class's sessions is kept.
    ///
    /// # Errors
    ///
    /// As [`Self::enroll_student`], with [`BookError::NotEnrolled`] when the
    /// student is not on the roster.
    pub fn unenroll_student(&mut self, class: ClassId, student: PersonId) -> Result<(), BookError> {
        let roster_has = self.require_class(class)?.has_student(student);
        self.require_role(student, Role::Student)?;
        if !roster_has {
            return Err(BookError::NotEnrolled { student, class });
        }
        self.disconnect(Edge::Enrollment { class, student });
        Ok(())
    }

    /// Set or clear a class's tutor, on both sides.
    ///
    /// `Some(tutor)` replaces any different current tutor (who loses the
    /// class). `None` unassigns the current tutor, or does nothing if there is
    /// none. Returns the tutor that was unassigned, if any.
    ///
    /// # Errors
    ///
    /// - [`BookError::EntityNotFound`] for unknown ids.
    /// - [`BookError::InvalidRelationship`] if `tutor` is not a tutor.
    /// - [`BookError::AlreadyLinked`] if `tutor` already teaches the class.
    pub fn assign_tutor(
        &mut self,
        class: ClassId,
        tutor: Option<PersonId>,
    ) -> Result<Option<PersonId>, BookError> {
        let current = self.require_class(class)?.tutor();
        if let Some(tutor) = tutor {
            self.require_role(tutor, Role::Tutor)?;
            if current == Some(tutor) {
                return Err(BookError::AlreadyLinked(Edge::Assignment { class, tutor }));
            }
        }

        if let Some(previous) = current {
            self.disconnect(Edge::Assignment {
                class,
                tutor: previous,
            });
        }
        if let Some(tutor) = tutor {
            self.connect(Edge::Assignment { class, tutor });
        }
        Ok(current)
    }

    /// Unassign a specific tutor from a class, on both sides.
    ///
    /// # Errors
    ///
    /// - [`BookError::EntityNotFound`] for unknown ids.
    /// - [`BookError::InvalidRelationship`] if `tutor` is not a tutor.
    /// - [`BookError::NotLinked`] if `tutor` does not teach the class.
    pub fn unassign_tutor(&mut self, class: ClassId, tutor: PersonId) -> Result<(), BookError> {
        let current = self.require_class(class)?.tutor();
        self.require_role(tutor, Role::Tutor)?;
        let edge = Edge::Assignment { class, tutor };
        if current != Some(tutor) {
            return Err(BookError::NotLinked(edge));
        }
        self.disconnect(edge);
        Ok(())
    }

    fn reject_duplicate_class(
        &self,
        name: &ClassName,
        except: Option<ClassId>,
    ) -> Result<(), BookError> {
        let key = name.key();
        let clash = self
            .classes
            .values()
            .any(|c| Some(c.id()) != except && c.name().key() == key);
        if clash {
            return Err(BookError::DuplicateEntity {
                kind: EntityKind::Class,
                name: name.to_string(),
            });
        }
        Ok(())
    }
}
