//! Read-only views over the address book.
//!
//! Views hand out shared references only. Filtering is predicate-based so an
//! outer layer can compose its own search without reaching into collections.

use crate::book::AddressBook;
use crate::error::BookError;
use crate::model::class::TuitionClass;
use crate::model::id::{ClassId, PersonId};
use crate::model::person::{Person, Role, Tag};
use crate::model::session::ClassSession;

/// Ready-made person predicates.
pub mod predicate {
    use super::{Person, Role, Tag};

    /// Matches persons whose name contains any keyword as a whole word,
    /// ignoring case. No keywords matches nobody.
    pub fn name_has_any_word(keywords: &[&str]) -> impl Fn(&Person) -> bool {
        let wanted: Vec<String> = keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        move |person| {
            person
                .name()
                .as_str()
                .split_whitespace()
                .any(|word| wanted.iter().any(|k| word.to_lowercase() == *k))
        }
    }

    pub fn has_role(role: Role) -> impl Fn(&Person) -> bool {
        move |person| person.role() == role
    }

    pub fn has_tag(tag: Tag) -> impl Fn(&Person) -> bool {
        move |person| person.details().tags.contains(&tag)
    }
}

impl AddressBook {
    /// All persons, in id (creation) order.
    pub fn persons(&self) -> impl Iterator<Item = &Person> {
        self.persons.values()
    }

    /// All classes, in id (creation) order.
    pub fn classes(&self) -> impl Iterator<Item = &TuitionClass> {
        self.classes.values()
    }

    pub fn filtered_persons<P>(&self, predicate: P) -> Vec<&Person>
    where
        P: Fn(&Person) -> bool,
    {
        self.persons.values().filter(|p| predicate(*p)).collect()
    }

    pub fn filtered_classes<P>(&self, predicate: P) -> Vec<&TuitionClass>
    where
        P: Fn(&TuitionClass) -> bool,
    {
        self.classes.values().filter(|c| predicate(*c)).collect()
    }

    /// Sessions of `class` matching `predicate`, in creation order.
    ///
    /// # Errors
    ///
    /// [`BookError::EntityNotFound`] for an unknown class.
    pub fn filtered_sessions<P>(
        &self,
        class: ClassId,
        predicate: P,
    ) -> Result<Vec<&ClassSession>, BookError>
    where
        P: Fn(&ClassSession) -> bool,
    {
        Ok(self
            .require_class(class)?
            .sessions()
            .iter()
            .filter(|s| predicate(*s))
            .collect())
    }

    /// Sessions after the book's current time, soonest first, capped by
    /// `sessions.upcoming_limit` when configured.
    ///
    /// # Errors
    ///
    /// [`BookError::EntityNotFound`] for an unknown class.
    pub fn upcoming_sessions(&self, class: ClassId) -> Result<Vec<&ClassSession>, BookError> {
        let mut upcoming = self.require_class(class)?.upcoming_sessions(self.now());
        if let Some(limit) = self.config.sessions.upcoming_limit {
            upcoming.truncate(limit);
        }
        Ok(upcoming)
    }

    /// Sessions at or before the book's current time, most recent first.
    ///
    /// # Errors
    ///
    /// [`BookError::EntityNotFound`] for an unknown class.
    pub fn past_sessions(&self, class: ClassId) -> Result<Vec<&ClassSession>, BookError> {
        Ok(self.require_class(class)?.past_sessions(self.now()))
    }

    /// The children of a parent.
    ///
    /// # Errors
    ///
    /// [`BookError::EntityNotFound`] or [`BookError::InvalidRelationship`]
    /// if `parent` is not a parent.
    pub fn children_of(&self, parent: PersonId) -> Result<Vec<&Person>, BookError> {
        let parent = self.require_role(parent, Role::Parent)?;
        Ok(self.resolve_persons(parent.children().iter().copied()))
    }

    /// The parents of a student.
    ///
    /// # Errors
    ///
    /// [`BookError::EntityNotFound`] or [`BookError::InvalidRelationship`]
    /// if `student` is not a student.
    pub fn parents_of(&self, student: PersonId) -> Result<Vec<&Person>, BookError> {
        let student = self.require_role(student, Role::Student)?;
        Ok(self.resolve_persons(student.parents().iter().copied()))
    }

    /// Classes a student attends or a tutor teaches; empty for parents.
    ///
    /// # Errors
    ///
    /// [`BookError::EntityNotFound`] for an unknown person.
    pub fn classes_of(&self, person: PersonId) -> Result<Vec<&TuitionClass>, BookError> {
        Ok(self
            .require_person(person)?
            .classes()
            .iter()
            .filter_map(|id| self.classes.get(id))
            .collect())
    }

    /// Students enrolled in a class.
    ///
    /// # Errors
    ///
    /// [`BookError::EntityNotFound`] for an unknown class.
    pub fn roster_of(&self, class: ClassId) -> Result<Vec<&Person>, BookError> {
        let class = self.require_class(class)?;
        Ok(self.resolve_persons(class.roster().iter().copied()))
    }

    /// The tutor of a class, if assigned.
    ///
    /// # Errors
    ///
    /// [`BookError::EntityNotFound`] for an unknown class.
    pub fn tutor_of(&self, class: ClassId) -> Result<Option<&Person>, BookError> {
        Ok(self
            .require_class(class)?
            .tutor()
            .and_then(|id| self.persons.get(&id)))
    }

    fn resolve_persons(&self, ids: impl Iterator<Item = PersonId>) -> Vec<&Person> {
        ids.filter_map(|id| self.persons.get(&id)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::predicate::*;
    use super::*;
    use crate::model::class::ClassName;
    use crate::model::person::{Address, Email, Name, PersonDetails, Phone};

    fn add(book: &mut AddressBook, name: &str, phone: &str, role: Role, tags: &[&str]) -> PersonId {
        let details = PersonDetails::new(
            Name::new(name).expect("name"),
            Phone::new(phone).expect("phone"),
            Email::new("x@example.com").expect("email"),
            Address::new("Blk 1").expect("address"),
        )
        .with_tags(tags.iter().map(|t| Tag::new(t).expect("tag")));
        book.add_person(details, role).expect("add")
    }

    #[test]
    fn name_predicate_matches_whole_words_case_insensitively() {
        let mut book = AddressBook::default();
        add(&mut book, "Alice Tan", "111", Role::Student, &[]);
        add(&mut book, "Alicia Lim", "222", Role::Student, &[]);
        let found = book.filtered_persons(name_has_any_word(&["alice", "LIM"]));
        assert_eq!(found.len(), 2);
        let found = book.filtered_persons(name_has_any_word(&["ali"]));
        assert!(found.is_empty());
        assert!(book.filtered_persons(name_has_any_word(&[])).is_empty());
    }

    #[test]
    fn role_and_tag_predicates() {
        let mut book = AddressBook::default();
        add(&mut book, "Alice", "111", Role::Student, &["sec3"]);
        add(&mut book, "Tom", "222", Role::Tutor, &["sec3"]);
        add(&mut book, "Mum", "333", Role::Parent, &[]);
        assert_eq!(book.filtered_persons(has_role(Role::Tutor)).len(), 1);
        let tagged = book.filtered_persons(has_tag(Tag::new("sec3").expect("tag")));
        assert_eq!(tagged.len(), 2);
    }

    #[test]
    fn relationship_views_resolve_ids() {
        let mut book = AddressBook::default();
        let mum = add(&mut book, "Mum", "333", Role::Parent, &[]);
        let kid = add(&mut book, "Kid", "444", Role::Student, &[]);
        let tom = add(&mut book, "Tom", "222", Role::Tutor, &[]);
        let c = book
            .add_class(ClassName::new("Math101").expect("name"))
            .expect("class");
        book.link_parent(mum, kid).expect("link");
        book.enroll_student(c, kid).expect("enroll");
        book.assign_tutor(c, Some(tom)).expect("assign");

        let children: Vec<_> = book.children_of(mum).expect("children").iter().map(|p| p.id()).collect();
        assert_eq!(children, vec![kid]);
        assert_eq!(book.parents_of(kid).expect("parents").len(), 1);
        assert_eq!(book.classes_of(tom).expect("classes").len(), 1);
        assert_eq!(book.roster_of(c).expect("roster").len(), 1);
        assert_eq!(book.tutor_of(c).expect("tutor").map(Person::id), Some(tom));
        assert!(matches!(
            book.children_of(kid),
            Err(BookError::InvalidRelationship { .. })
        ));
    }
}
