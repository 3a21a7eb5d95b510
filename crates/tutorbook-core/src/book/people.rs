//! Person lifecycle: create, edit (with role-change cascade), delete, and
//! parent/child links.

use crate::book::AddressBook;
use crate::error::{BookError, EntityKind};
use crate::graph::edge::Edge;
use crate::graph::role_change::{RoleChangePlan, describe_losses, held_edges, plan_role_change};
use crate::model::id::PersonId;
use crate::model::person::{Person, PersonDetails, PersonEdit, PersonKey, Role};

impl AddressBook {
    /// Create a person with no relationships.
    ///
    /// # Errors
    ///
    /// [`BookError::DuplicateEntity`] if a person with the same name and
    /// phone already exists.
    pub fn add_person(&mut self, details: PersonDetails, role: Role) -> Result<PersonId, BookError> {
        let key = details.key();
        self.reject_duplicate_person(&key, None)?;

        let id = self.ids.person();
        tracing::debug!(person = %id, %role, name = %details.name, "person added");
        self.persons.insert(id, Person::new(id, details, role));
        Ok(id)
    }

    /// Replace a person's details and possibly their role.
    ///
    /// When the role changes, every edge held under the old role is unwound
    /// on the linked entities first and the person starts the new role with
    /// no edges. A role change that would drop edges is refused unless
    /// `force` is set; the error lists what would be lost. Same-role edits
    /// keep all edges.
    ///
    /// Returns the executed plan (empty for same-role edits).
    ///
    /// # Errors
    ///
    /// - [`BookError::EntityNotFound`] if `target` does not exist.
    /// - [`BookError::DuplicateEntity`] if the new name + phone belong to
    ///   another person.
    /// - [`BookError::DestructiveEditRejected`] for a lossy role change
    ///   without `force`.
    pub fn set_person(
        &mut self,
        target: PersonId,
        edit: PersonEdit,
        force: bool,
    ) -> Result<RoleChangePlan, BookError> {
        let person = self.require_person(target)?;
        self.reject_duplicate_person(&edit.details.key(), Some(target))?;

        let plan = plan_role_change(target, person.links(), edit.role);
        if !plan.is_lossless() && !force {
            let losses = plan.losses();
            tracing::warn!(
                person = %target,
                from = %plan.from,
                to = %plan.to,
                losses = %describe_losses(&losses),
                "role change rejected without force"
            );
            return Err(BookError::DestructiveEditRejected {
                person: target,
                from: plan.from,
                to: plan.to,
                losses,
            });
        }

        for edge in &plan.drops {
            self.disconnect(*edge);
        }
        if let Some(person) = self.persons.get_mut(&target) {
            if plan.is_role_change() {
                person.reset_links(plan.to);
            }
            person.set_details(edit.details);
        }

        if plan.is_role_change() {
            tracing::info!(
                person = %target,
                from = %plan.from,
                to = %plan.to,
                dropped = plan.drops.len(),
                "role changed"
            );
        }
        Ok(plan)
    }

    /// Delete a person after unlinking them from every parent, child and class,
    /// and dropping their attendance records.
    ///
    /// # Errors
    ///
    /// [`BookError::EntityNotFound`] if the person does not exist, including
    /// when it was already deleted.
    pub fn remove_person(&mut self, id: PersonId) -> Result<Person, BookError> {
        let person = self.require_person(id)?;
        let edges = held_edges(id, person.links());

        for edge in &edges {
            self.disconnect(*edge);
        }
        let mut purged = 0_usize;
        for class in self.classes.values_mut() {
            purged += class.forget_attendee(id);
        }

        let removed = self
            .persons
            .remove(&id)
            .ok_or_else(|| BookError::person_not_found(id))?;
        tracing::info!(
            person = %id,
            edges = edges.len(),
            attendance_purged = purged,
            "person removed"
        );
        Ok(removed)
    }

    /// Link `parent` to `child` on both sides.
    ///
    /// # Errors
    ///
    /// - [`BookError::EntityNotFound`] for unknown ids.
    /// - [`BookError::InvalidRelationship`] unless `parent` is a parent and
    ///   `child` is a student.
    /// - [`BookError::AlreadyLinked`] if the link exists.
    pub fn link_parent(&mut self, parent: PersonId, child: PersonId) -> Result<(), BookError> {
        let edge = self.parent_edge(parent, child)?;
        if self.require_person(parent)?.children().contains(&child) {
            return Err(BookError::AlreadyLinked(edge));
        }
        self.connect(edge);
        Ok(())
    }

    /// Remove the link between `parent` and `child` on both sides.
    ///
    /// # Errors
    ///
    /// As [`Self::link_parent`], with [`BookError::NotLinked`] when the link
    /// does not exist.
    pub fn unlink_parent(&mut self, parent: PersonId, child: PersonId) -> Result<(), BookError> {
        let edge = self.parent_edge(parent, child)?;
        if !self.require_person(parent)?.children().contains(&child) {
            return Err(BookError::NotLinked(edge));
        }
        self.disconnect(edge);
        Ok(())
    }

    fn parent_edge(&self, parent: PersonId, child: PersonId) -> Result<Edge, BookError> {
        self.require_role(parent, Role::Parent)?;
        self.require_role(child, Role::Student)?;
        Ok(Edge::ParentChild { parent, child })
    }

    fn reject_duplicate_person(
        &self,
        key: &PersonKey,
        except: Option<PersonId>,
    ) -> Result<(), BookError> {
        let clash = self
            .persons
            .values()
            .any(|p| Some(p.id()) != except && p.key() == *key);
        if clash {
            return Err(BookError::DuplicateEntity {
                kind: EntityKind::Person,
                name: key.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::person::{Address, Email, Name, Phone};

    fn details(name: &str, phone: &str) -> PersonDetails {
        PersonDetails::new(
            Name::new(name).expect("name"),
            Phone::new(phone).expect("phone"),
            Email::new("x@example.com").expect("email"),
            Address::new("Blk 1").expect("address"),
        )
    }

    #[test]
    fn duplicate_person_rejected_by_identity() {
        let mut book = AddressBook::default();
        book.add_person(details("Alice", "111"), Role::Student)
            .expect("first add");
        let err = book
            .add_person(details("ALICE", "111"), Role::Parent)
            .expect_err("same person");
        assert!(matches!(err, BookError::DuplicateEntity { kind: EntityKind::Person, .. }));
        assert!(book.add_person(details("Alice", "222"), Role::Student).is_ok());
    }

    #[test]
    fn link_parent_requires_roles() {
        let mut book = AddressBook::default();
        let tutor = book.add_person(details("Tom", "333"), Role::Tutor).expect("add");
        let kid = book.add_person(details("Kid", "444"), Role::Student).expect("add");
        let err = book.link_parent(tutor, kid).expect_err("tutor is not a parent");
        assert_eq!(
            err,
            BookError::InvalidRelationship {
                person: tutor,
                expected: Role::Parent,
                actual: Role::Tutor,
            }
        );
    }

    #[test]
    fn link_twice_is_already_linked_and_unlink_twice_not_linked() {
        let mut book = AddressBook::default();
        let mum = book.add_person(details("Mum", "555"), Role::Parent).expect("add");
        let kid = book.add_person(details("Kid", "444"), Role::Student).expect("add");

        book.link_parent(mum, kid).expect("link");
        assert!(matches!(book.link_parent(mum, kid), Err(BookError::AlreadyLinked(_))));

        book.unlink_parent(mum, kid).expect("unlink");
        assert!(matches!(book.unlink_parent(mum, kid), Err(BookError::NotLinked(_))));
        assert!(book.person(mum).expect("mum").children().is_empty());
        assert!(book.person(kid).expect("kid").parents().is_empty());
    }

    #[test]
    fn edit_cannot_steal_another_identity() {
        let mut book = AddressBook::default();
        let a = book.add_person(details("Ann", "100"), Role::Student).expect("add");
        book.add_person(details("Ben", "200"), Role::Student).expect("add");
        let err = book
            .set_person(
                a,
                PersonEdit {
                    details: details("ben", "200"),
                    role: Role::Student,
                },
                false,
            )
            .expect_err("clash");
        assert!(matches!(err, BookError::DuplicateEntity { .. }));
    }

    #[test]
    fn same_role_edit_keeps_edges() {
        let mut book = AddressBook::default();
        let mum = book.add_person(details("Mum", "555"), Role::Parent).expect("add");
        let kid = book.add_person(details("Kid", "444"), Role::Student).expect("add");
        book.link_parent(mum, kid).expect("link");

        let plan = book
            .set_person(
                kid,
                PersonEdit {
                    details: details("Kiddo", "444"),
                    role: Role::Student,
                },
                false,
            )
            .expect("rename");
        assert!(plan.is_lossless());
        let kid_now = book.person(kid).expect("kid");
        assert_eq!(kid_now.name().as_str(), "Kiddo");
        assert!(kid_now.parents().contains(&mum));
    }

    #[test]
    fn remove_twice_is_not_found() {
        let mut book = AddressBook::default();
        let a = book.add_person(details("Ann", "100"), Role::Tutor).expect("add");
        book.remove_person(a).expect("first delete");
        assert!(matches!(
            book.remove_person(a),
            Err(BookError::EntityNotFound { kind: EntityKind::Person, .. })
        ));
    }
}
