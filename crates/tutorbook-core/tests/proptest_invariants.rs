use proptest::prelude::*;
use tutorbook_core::AddressBook;
use tutorbook_core::model::person::Role;
use tutorbook_core::verify::check_consistency;

use generators::*;

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(512))]

    /// Any sequence of operations keeps every edge two-sided, every
    /// reference live and every uniqueness rule intact.
    #[test]
    fn operations_preserve_consistency(ops in arb_ops(60)) {
        let mut book = AddressBook::default();
        for op in &ops {
            let _ = apply(&mut book, op);
            let report = check_consistency(&book);
            prop_assert!(report.is_consistent(), "after {:?}: {}", op, report);
        }
    }

    /// A rejected operation leaves the book exactly as it was.
    #[test]
    fn failed_operations_are_atomic(ops in arb_ops(60)) {
        let mut book = AddressBook::default();
        for op in &ops {
            let before = book.clone();
            if apply(&mut book, op).is_err() {
                prop_assert_eq!(&book, &before, "{:?} failed but changed the book", op);
            }
        }
    }

    /// Deleted persons are referenced nowhere: no id-set, tutor slot or
    /// attendance map mentions them.
    #[test]
    fn removed_persons_leave_no_trace(ops in arb_ops(40), victim in 0usize..8) {
        let mut book = AddressBook::default();
        for op in &ops {
            let _ = apply(&mut book, op);
        }
        let Some(id) = book.persons().nth(victim).map(|p| p.id()) else {
            return Ok(());
        };
        book.remove_person(id).expect("live person");

        for person in book.persons() {
            prop_assert!(!person.parents().contains(&id));
            prop_assert!(!person.children().contains(&id));
        }
        for class in book.classes() {
            prop_assert!(!class.roster().contains(&id));
            prop_assert_ne!(class.tutor(), Some(id));
            for session in class.sessions() {
                prop_assert!(session.attendance_of(id).is_none());
            }
        }
    }

    /// After a forced role change the person holds no edges and nothing
    /// points back at them.
    #[test]
    fn forced_role_change_unwinds_every_edge(ops in arb_ops(40), victim in 0usize..8, to in arb_role()) {
        let mut book = AddressBook::default();
        for op in &ops {
            let _ = apply(&mut book, op);
        }
        let Some(person) = book.persons().nth(victim).cloned() else {
            return Ok(());
        };
        if person.role() == to {
            return Ok(());
        }
        let edit = tutorbook_core::model::person::PersonEdit {
            details: person.details().clone(),
            role: to,
        };
        let plan = book.set_person(person.id(), edit, true).expect("forced change");
        prop_assert_eq!(plan.drops.len(), person.links().total());

        let changed = book.person(person.id()).expect("still present");
        prop_assert_eq!(changed.role(), to);
        prop_assert_eq!(changed.links().total(), 0);
        prop_assert!(check_consistency(&book).is_consistent());
        if person.role() == Role::Tutor {
            for class in book.classes() {
                prop_assert_ne!(class.tutor(), Some(person.id()));
            }
        }
    }
}
