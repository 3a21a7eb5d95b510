//! End-to-end scenarios for the address book: deletion cascades, session
//! uniqueness with attendance seeding, and forced role changes.

use chrono::{NaiveDate, NaiveDateTime};
use tutorbook_core::AddressBook;
use tutorbook_core::error::{BookError, EntityKind, ErrorCode};
use tutorbook_core::model::attendance::Attendance;
use tutorbook_core::model::class::ClassName;
use tutorbook_core::model::id::{ClassId, PersonId};
use tutorbook_core::model::person::{
    Address, Email, Name, PersonDetails, PersonEdit, PersonKey, Phone, Role,
};
use tutorbook_core::model::session::SessionName;
use tutorbook_core::verify::{check_attendance_synced, check_consistency};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn details(name: &str, phone: &str) -> PersonDetails {
    PersonDetails::new(
        Name::new(name).expect("name"),
        Phone::new(phone).expect("phone"),
        Email::new(&format!("{}@example.com", name.to_lowercase())).expect("email"),
        Address::new("10 Kent Ridge").expect("address"),
    )
}

fn add(book: &mut AddressBook, name: &str, phone: &str, role: Role) -> PersonId {
    book.add_person(details(name, phone), role)
        .expect("add person")
}

fn class(book: &mut AddressBook, name: &str) -> ClassId {
    book.add_class(ClassName::new(name).expect("class name"))
        .expect("add class")
}

fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, day)
        .and_then(|d| d.and_hms_opt(hour, minute, 0))
        .expect("valid timestamp")
}

fn assert_consistent(book: &AddressBook) {
    let report = check_consistency(book);
    assert!(report.is_consistent(), "{report}");
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn deleting_a_parent_unlinks_the_child() {
    let mut book = AddressBook::default();
    let alice = add(&mut book, "Alice", "91234567", Role::Student);
    let bob = add(&mut book, "Bob", "98765432", Role::Parent);

    book.link_parent(bob, alice).expect("link");
    assert!(book.person(alice).expect("alice").parents().contains(&bob));
    assert!(book.person(bob).expect("bob").children().contains(&alice));
    assert_consistent(&book);

    let removed = book.remove_person(bob).expect("remove bob");
    assert_eq!(removed.id(), bob);
    assert!(book.person(alice).expect("alice").parents().is_empty());
    assert!(book.person(bob).is_none());
    assert_consistent(&book);

    let key = PersonKey::new(
        &Name::new("Bob").expect("name"),
        &Phone::new("98765432").expect("phone"),
    );
    assert!(matches!(
        book.find_person(&key),
        Err(BookError::EntityNotFound {
            kind: EntityKind::Person,
            ..
        })
    ));
}

#[test]
fn deleting_a_class_clears_roster_and_tutor_links() {
    let mut book = AddressBook::default();
    let alice = add(&mut book, "Alice", "91234567", Role::Student);
    let tom = add(&mut book, "Tom", "93334444", Role::Tutor);
    let math = class(&mut book, "Math101");

    book.enroll_student(math, alice).expect("enroll");
    book.assign_tutor(math, Some(tom)).expect("assign");
    assert_consistent(&book);

    book.remove_class(math).expect("remove class");
    assert!(book.person(alice).expect("alice").classes().is_empty());
    assert!(book.person(tom).expect("tom").classes().is_empty());
    assert!(book.find_class("Math101").is_err());
    assert_consistent(&book);
}

#[test]
fn session_names_are_unique_after_normalization() {
    let mut book = AddressBook::default();
    let math = class(&mut book, "Math101");
    let alice = add(&mut book, "Alice", "91234567", Role::Student);
    let ben = add(&mut book, "Ben", "95556666", Role::Student);
    book.enroll_student(math, alice).expect("enroll alice");
    book.enroll_student(math, ben).expect("enroll ben");

    let week1 = book
        .add_session(
            math,
            SessionName::new("Week1").expect("name"),
            at(15, 14, 30),
            Some("Room 3".into()),
        )
        .expect("week1");

    let err = book
        .add_session(
            math,
            SessionName::new("week1 ").expect("name"),
            at(22, 14, 30),
            None,
        )
        .expect_err("duplicate session name");
    assert_eq!(err.code(), ErrorCode::DuplicateEntity);

    let class = book.class(math).expect("class");
    assert_eq!(class.sessions().len(), 1);
    let session = class.session(week1).expect("week1");
    assert_eq!(session.attendance().len(), 2);
    assert!(session.attendance().values().all(Attendance::is_unset));
    assert_eq!(session.attendance_of(alice), Some(Attendance::UNSET));
    assert!(check_attendance_synced(&book).is_consistent());
}

#[test]
fn role_change_is_rejected_without_force_then_cascades_with_it() {
    let mut book = AddressBook::default();
    let alice = add(&mut book, "Alice", "91234567", Role::Student);
    let bob = add(&mut book, "Bob", "98765432", Role::Parent);
    let math = class(&mut book, "Math101");
    book.link_parent(bob, alice).expect("link");
    book.enroll_student(math, alice).expect("enroll");

    let before = book.clone();
    let edit = PersonEdit {
        details: details("Alice", "91234567"),
        role: Role::Tutor,
    };

    let err = book
        .set_person(alice, edit.clone(), false)
        .expect_err("lossy change needs force");
    assert_eq!(err.code(), ErrorCode::DestructiveEditRejected);
    assert_eq!(
        err.to_string(),
        format!("changing {alice} from student to tutor would drop 1 parent relationship, 1 class enrollment")
    );
    assert_eq!(book, before);

    let plan = book.set_person(alice, edit, true).expect("forced change");
    assert_eq!(plan.drops.len(), 2);
    assert_eq!(book.person(alice).expect("alice").role(), Role::Tutor);
    assert!(book.person(alice).expect("alice").classes().is_empty());
    assert!(book.person(bob).expect("bob").children().is_empty());
    assert!(book.class(math).expect("math").roster().is_empty());
    assert_consistent(&book);
}

#[test]
fn tutor_turned_student_leaves_their_class_without_a_tutor() {
    let mut book = AddressBook::default();
    let tom = add(&mut book, "Tom", "93334444", Role::Tutor);
    let math = class(&mut book, "Math101");
    book.assign_tutor(math, Some(tom)).expect("assign");

    let edit = PersonEdit {
        details: details("Tom", "93334444"),
        role: Role::Student,
    };
    book.set_person(tom, edit, true).expect("forced change");
    assert_eq!(book.class(math).expect("math").tutor(), None);
    assert_consistent(&book);
}

#[test]
fn attendance_is_marked_with_the_book_clock() {
    use std::rc::Rc;
    use tutorbook_core::clock::FixedClock;
    use tutorbook_core::config::BookConfig;

    let clock = Rc::new(FixedClock::new(at(15, 15, 0)));
    let mut book = AddressBook::with_clock(BookConfig::default(), clock.clone());
    let math = class(&mut book, "Math101");
    let alice = add(&mut book, "Alice", "91234567", Role::Student);
    book.enroll_student(math, alice).expect("enroll");
    let week1 = book
        .add_session(
            math,
            SessionName::new("Week1").expect("name"),
            at(15, 14, 30),
            None,
        )
        .expect("week1");

    let marked = book.mark_present(math, week1, alice).expect("mark");
    assert_eq!(marked, Attendance::present_at(at(15, 15, 0)));
    assert_eq!(marked.to_string(), "present (2024-03-15 15:00)");

    clock.set(at(16, 9, 0));
    let corrected = book.mark_absent(math, week1, alice).expect("correct");
    assert_eq!(corrected.marked_at(), Some(at(16, 9, 0)));
    assert!(!corrected.is_present());
}
