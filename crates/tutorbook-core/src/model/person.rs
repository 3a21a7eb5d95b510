//! Persons: validated identity fields plus a role-tagged set of edges.
//!
//! A [`Person`] is one of three variants (student, tutor, parent). The
//! variant is not a field that can be flipped in place: each variant owns a
//! different kind of edge set in [`Links`], and changing role means building
//! fresh, empty links for the new variant (see
//! [`crate::graph::role_change`]).
//!
//! Edge sets are exposed read-only. Only the address book mutates them, and
//! it always updates the other endpoint in the same call.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::{fmt, str::FromStr};

use crate::error::BookError;
use crate::graph::edge::EdgeKind;
use crate::model::id::{ClassId, PersonId};

static NO_PERSONS: BTreeSet<PersonId> = BTreeSet::new();
static NO_CLASSES: BTreeSet<ClassId> = BTreeSet::new();

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// The three person variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Tutor,
    Parent,
}

impl Role {
    pub const ALL: [Self; 3] = [Self::Student, Self::Tutor, Self::Parent];

    const fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Tutor => "tutor",
            Self::Parent => "parent",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a role from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid role: '{0}' (expected student, tutor or parent)")]
pub struct ParseRoleError(pub String);

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Self::Student),
            "tutor" => Ok(Self::Tutor),
            "parent" => Ok(Self::Parent),
            _ => Err(ParseRoleError(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Identity fields
// ---------------------------------------------------------------------------

fn invalid(field: &'static str, value: &str, reason: &'static str) -> BookError {
    BookError::InvalidField {
        field,
        value: value.to_string(),
        reason,
    }
}

/// A person's full name: one or more alphanumeric words.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Name(String);

impl Name {
    /// Validate and build a name. Surrounding whitespace is trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`BookError::InvalidField`] for blank names or names with
    /// characters other than letters, digits and spaces.
    pub fn new(raw: &str) -> Result<Self, BookError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(invalid("name", raw, "must not be blank"));
        }
        if !trimmed
            .chars()
            .all(|c| c.is_alphanumeric() || c.is_whitespace())
        {
            return Err(invalid("name", raw, "only letters, digits and spaces"));
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case- and spacing-insensitive form used for identity comparison.
    #[must_use]
    pub fn identity_key(&self) -> String {
        self.0
            .split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A phone number: at least three digits, nothing else.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Phone(String);

impl Phone {
    /// # Errors
    ///
    /// Returns [`BookError::InvalidField`] unless the value is 3+ ASCII digits.
    pub fn new(raw: &str) -> Result<Self, BookError> {
        let trimmed = raw.trim();
        if trimmed.len() < 3 {
            return Err(invalid("phone", raw, "at least 3 digits"));
        }
        if !trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("phone", raw, "digits only"));
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// An email address of the form `local@domain`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// # Errors
    ///
    /// Returns [`BookError::InvalidField`] if the local part is empty or the
    /// domain is not dot-separated labels of letters, digits and hyphens.
    pub fn new(raw: &str) -> Result<Self, BookError> {
        let trimmed = raw.trim();
        let Some((local, domain)) = trimmed.split_once('@') else {
            return Err(invalid("email", raw, "missing '@'"));
        };
        if local.is_empty() || local.chars().any(char::is_whitespace) {
            return Err(invalid("email", raw, "bad local part"));
        }
        let labels_ok = domain.split('.').all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        });
        if domain.is_empty() || !labels_ok {
            return Err(invalid("email", raw, "bad domain"));
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A free-form postal address; only blank values are rejected.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// # Errors
    ///
    /// Returns [`BookError::InvalidField`] for a blank address.
    pub fn new(raw: &str) -> Result<Self, BookError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(invalid("address", raw, "must not be blank"));
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A single alphanumeric label.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Tag(String);

impl Tag {
    /// # Errors
    ///
    /// Returns [`BookError::InvalidField`] unless the tag is one alphanumeric word.
    pub fn new(raw: &str) -> Result<Self, BookError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || !trimmed.chars().all(char::is_alphanumeric) {
            return Err(invalid("tag", raw, "one alphanumeric word"));
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

macro_rules! string_field_impls {
    ($($ty:ident),*) => {$(
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl TryFrom<String> for $ty {
            type Error = BookError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(&value)
            }
        }

        impl From<$ty> for String {
            fn from(value: $ty) -> Self {
                value.0
            }
        }
    )*};
}

string_field_impls!(Name, Phone, Email, Address, Tag);

/// Identity fields shared by every variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonDetails {
    pub name: Name,
    pub phone: Phone,
    pub email: Email,
    pub address: Address,
    #[serde(default)]
    pub tags: BTreeSet<Tag>,
}

impl PersonDetails {
    #[must_use]
    pub fn new(name: Name, phone: Phone, email: Email, address: Address) -> Self {
        Self {
            name,
            phone,
            email,
            address,
            tags: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = Tag>) -> Self {
        self.tags.extend(tags);
        self
    }

    /// The identity key of these details (name + phone).
    #[must_use]
    pub fn key(&self) -> PersonKey {
        PersonKey::new(&self.name, &self.phone)
    }
}

/// Name + phone: what makes two records "the same person".
///
/// Callers that hold copies of a person (or only its name and phone) use this
/// to look the live record up; the comparison ignores name case and spacing.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PersonKey {
    name: String,
    phone: String,
}

impl PersonKey {
    #[must_use]
    pub fn new(name: &Name, phone: &Phone) -> Self {
        Self {
            name: name.identity_key(),
            phone: phone.as_str().to_string(),
        }
    }
}

impl fmt::Display for PersonKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.phone)
    }
}

// ---------------------------------------------------------------------------
// Links
// ---------------------------------------------------------------------------

/// Edges held by a student.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentLinks {
    parents: BTreeSet<PersonId>,
    classes: BTreeSet<ClassId>,
}

impl StudentLinks {
    #[must_use]
    pub const fn parents(&self) -> &BTreeSet<PersonId> {
        &self.parents
    }

    #[must_use]
    pub const fn classes(&self) -> &BTreeSet<ClassId> {
        &self.classes
    }

    pub(crate) fn parents_mut(&mut self) -> &mut BTreeSet<PersonId> {
        &mut self.parents
    }

    pub(crate) fn classes_mut(&mut self) -> &mut BTreeSet<ClassId> {
        &mut self.classes
    }
}

/// Edges held by a tutor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TutorLinks {
    classes: BTreeSet<ClassId>,
}

impl TutorLinks {
    #[must_use]
    pub const fn classes(&self) -> &BTreeSet<ClassId> {
        &self.classes
    }

    pub(crate) fn classes_mut(&mut self) -> &mut BTreeSet<ClassId> {
        &mut self.classes
    }
}

/// Edges held by a parent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParentLinks {
    children: BTreeSet<PersonId>,
}

impl ParentLinks {
    #[must_use]
    pub const fn children(&self) -> &BTreeSet<PersonId> {
        &self.children
    }

    pub(crate) fn children_mut(&mut self) -> &mut BTreeSet<PersonId> {
        &mut self.children
    }
}

/// The role-tagged edge sets of a person. The variant *is* the role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Links {
    Student(StudentLinks),
    Tutor(TutorLinks),
    Parent(ParentLinks),
}

impl Links {
    /// Fresh links for `role` with no edges.
    #[must_use]
    pub fn empty(role: Role) -> Self {
        match role {
            Role::Student => Self::Student(StudentLinks::default()),
            Role::Tutor => Self::Tutor(TutorLinks::default()),
            Role::Parent => Self::Parent(ParentLinks::default()),
        }
    }

    #[must_use]
    pub const fn role(&self) -> Role {
        match self {
            Self::Student(_) => Role::Student,
            Self::Tutor(_) => Role::Tutor,
            Self::Parent(_) => Role::Parent,
        }
    }

    /// Number of edges of `kind`; zero when `kind` is not legal for this role.
    #[must_use]
    pub fn count(&self, kind: EdgeKind) -> usize {
        match (self, kind) {
            (Self::Student(s), EdgeKind::Parent) => s.parents.len(),
            (Self::Student(s), EdgeKind::Enrollment) => s.classes.len(),
            (Self::Tutor(t), EdgeKind::Assignment) => t.classes.len(),
            (Self::Parent(p), EdgeKind::Child) => p.children.len(),
            _ => 0,
        }
    }

    /// Total number of edges regardless of kind.
    #[must_use]
    pub fn total(&self) -> usize {
        EdgeKind::ALL.iter().map(|kind| self.count(*kind)).sum()
    }
}

// ---------------------------------------------------------------------------
// Person
// ---------------------------------------------------------------------------

/// A student, tutor or parent in the address book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    id: PersonId,
    details: PersonDetails,
    links: Links,
}

impl Person {
    pub(crate) fn new(id: PersonId, details: PersonDetails, role: Role) -> Self {
        Self {
            id,
            details,
            links: Links::empty(role),
        }
    }

    #[must_use]
    pub const fn id(&self) -> PersonId {
        self.id
    }

    #[must_use]
    pub const fn details(&self) -> &PersonDetails {
        &self.details
    }

    #[must_use]
    pub const fn name(&self) -> &Name {
        &self.details.name
    }

    #[must_use]
    pub const fn phone(&self) -> &Phone {
        &self.details.phone
    }

    #[must_use]
    pub const fn role(&self) -> Role {
        self.links.role()
    }

    #[must_use]
    pub const fn links(&self) -> &Links {
        &self.links
    }

    #[must_use]
    pub fn key(&self) -> PersonKey {
        self.details.key()
    }

    /// Identity comparison (name + phone), as opposed to `==`, which also
    /// compares id, every field and every edge.
    #[must_use]
    pub fn is_same_person(&self, other: &Self) -> bool {
        self.key() == other.key()
    }

    /// Parents of a student; empty for other roles.
    #[must_use]
    pub fn parents(&self) -> &BTreeSet<PersonId> {
        match &self.links {
            Links::Student(s) => s.parents(),
            _ => &NO_PERSONS,
        }
    }

    /// Children of a parent; empty for other roles.
    #[must_use]
    pub fn children(&self) -> &BTreeSet<PersonId> {
        match &self.links {
            Links::Parent(p) => p.children(),
            _ => &NO_PERSONS,
        }
    }

    /// Classes a student is enrolled in or a tutor is assigned to.
    #[must_use]
    pub fn classes(&self) -> &BTreeSet<ClassId> {
        match &self.links {
            Links::Student(s) => s.classes(),
            Links::Tutor(t) => t.classes(),
            Links::Parent(_) => &NO_CLASSES,
        }
    }

    pub(crate) fn set_details(&mut self, details: PersonDetails) {
        self.details = details;
    }

    /// Re-tag this person. Callers must already have unwound every edge.
    pub(crate) fn reset_links(&mut self, role: Role) {
        self.links = Links::empty(role);
    }

    pub(crate) fn student_mut(&mut self) -> Option<&mut StudentLinks> {
        match &mut self.links {
            Links::Student(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn tutor_mut(&mut self) -> Option<&mut TutorLinks> {
        match &mut self.links {
            Links::Tutor(t) => Some(t),
            _ => None,
        }
    }

    pub(crate) fn parent_mut(&mut self) -> Option<&mut ParentLinks> {
        match &mut self.links {
            Links::Parent(p) => Some(p),
            _ => None,
        }
    }
}

/// Replacement values for [`crate::book::AddressBook::set_person`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonEdit {
    pub details: PersonDetails,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(name: &str, phone: &str) -> PersonDetails {
        PersonDetails::new(
            Name::new(name).expect("name"),
            Phone::new(phone).expect("phone"),
            Email::new("someone@example.com").expect("email"),
            Address::new("1 Main St").expect("address"),
        )
    }

    #[test]
    fn role_round_trips_through_text() {
        for role in Role::ALL {
            assert_eq!(role.to_string().parse::<Role>(), Ok(role));
        }
        assert_eq!(" Tutor ".parse::<Role>(), Ok(Role::Tutor));
        assert!("instructor".parse::<Role>().is_err());
    }

    #[test]
    fn name_rejects_blank_and_symbols() {
        assert!(Name::new("   ").is_err());
        assert!(Name::new("Alice*").is_err());
        assert_eq!(Name::new("  Alice Tan ").expect("valid").as_str(), "Alice Tan");
    }

    #[test]
    fn phone_requires_three_digits() {
        assert!(Phone::new("12").is_err());
        assert!(Phone::new("12a4").is_err());
        assert!(Phone::new("911").is_ok());
    }

    #[test]
    fn email_checks_local_and_domain() {
        assert!(Email::new("alice@example.com").is_ok());
        assert!(Email::new("alice@localhost").is_ok());
        assert!(Email::new("alice.example.com").is_err());
        assert!(Email::new("@example.com").is_err());
        assert!(Email::new("alice@-bad.com").is_err());
        assert!(Email::new("alice@example..com").is_err());
    }

    #[test]
    fn tag_is_single_word() {
        assert!(Tag::new("friends").is_ok());
        assert!(Tag::new("best friends").is_err());
        assert!(Tag::new("").is_err());
    }

    #[test]
    fn identity_ignores_name_case_and_spacing() {
        let a = Person::new(PersonId::new(1), details("Alice  Tan", "91234567"), Role::Student);
        let b = Person::new(PersonId::new(2), details("alice tan", "91234567"), Role::Parent);
        let c = Person::new(PersonId::new(3), details("Alice Tan", "81234567"), Role::Student);
        assert!(a.is_same_person(&b));
        assert_ne!(a, b);
        assert!(!a.is_same_person(&c));
    }

    #[test]
    fn role_specific_accessors_are_empty_for_other_roles() {
        let tutor = Person::new(PersonId::new(1), details("Tom", "999"), Role::Tutor);
        assert!(tutor.parents().is_empty());
        assert!(tutor.children().is_empty());
        assert!(tutor.classes().is_empty());
        assert_eq!(tutor.links().total(), 0);
    }

    #[test]
    fn links_count_only_kinds_legal_for_role() {
        let mut links = Links::empty(Role::Student);
        if let Links::Student(s) = &mut links {
            s.parents_mut().insert(PersonId::new(7));
            s.classes_mut().insert(ClassId::new(8));
        }
        assert_eq!(links.count(EdgeKind::Parent), 1);
        assert_eq!(links.count(EdgeKind::Enrollment), 1);
        assert_eq!(links.count(EdgeKind::Child), 0);
        assert_eq!(links.total(), 2);
    }

    #[test]
    fn details_deserialize_through_validation() {
        let err = toml::from_str::<PersonDetails>(
            "name = \"Bad*\"\nphone = \"123\"\nemail = \"a@b.c\"\naddress = \"x\"\n",
        );
        assert!(err.is_err());
    }
}
