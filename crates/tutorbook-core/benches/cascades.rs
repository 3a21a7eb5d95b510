use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use tutorbook_core::AddressBook;
use tutorbook_core::model::class::ClassName;
use tutorbook_core::model::id::{ClassId, PersonId};
use tutorbook_core::model::person::{
    Address, Email, Name, PersonDetails, PersonEdit, Phone, Role,
};
use tutorbook_core::model::session::SessionName;
use tutorbook_core::verify::check_consistency;

/// Book size tiers: (label, students, classes, sessions per class).
const TIERS: [(&str, usize, usize, usize); 3] = [
    ("small", 50, 5, 4),
    ("medium", 500, 25, 12),
    ("large", 2_000, 80, 24),
];

struct Corpus {
    book: AddressBook,
    student: PersonId,
    parent: PersonId,
    class: ClassId,
}

fn details(name: &str, phone: usize) -> PersonDetails {
    PersonDetails::new(
        Name::new(name).expect("name"),
        Phone::new(&format!("8{phone:07}")).expect("phone"),
        Email::new("bench@example.com").expect("email"),
        Address::new("Blk 1").expect("address"),
    )
}

fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 8)
        .and_then(|d| d.and_hms_opt(16, 0, 0))
        .expect("valid timestamp")
}

/// Every student is enrolled in two classes and has one parent; every class
/// has a tutor and a run of weekly sessions.
fn build_corpus(students: usize, classes: usize, sessions: usize) -> Corpus {
    let mut book = AddressBook::default();
    let class_ids: Vec<ClassId> = (0..classes)
        .map(|i| {
            book.add_class(ClassName::new(&format!("Class {i}")).expect("name"))
                .expect("class")
        })
        .collect();
    for (i, class) in class_ids.iter().enumerate() {
        let tutor = book
            .add_person(details(&format!("Tutor {i}"), 900_000 + i), Role::Tutor)
            .expect("tutor");
        book.assign_tutor(*class, Some(tutor)).expect("assign");
    }

    let mut first_student = None;
    let mut first_parent = None;
    for i in 0..students {
        let student = book
            .add_person(details(&format!("Student {i}"), i), Role::Student)
            .expect("student");
        let parent = book
            .add_person(details(&format!("Parent {i}"), 500_000 + i), Role::Parent)
            .expect("parent");
        book.link_parent(parent, student).expect("link");
        book.enroll_student(class_ids[i % classes], student)
            .expect("enroll");
        book.enroll_student(class_ids[(i + 1) % classes], student)
            .expect("enroll");
        first_student.get_or_insert(student);
        first_parent.get_or_insert(parent);
    }

    for class in &class_ids {
        for week in 0..sessions {
            let at = start() + TimeDelta::weeks(i64::try_from(week).expect("week count fits"));
            book.add_session(
                *class,
                SessionName::new(&format!("Week{week}")).expect("name"),
                at,
                None,
            )
            .expect("session");
        }
    }

    Corpus {
        book,
        student: first_student.expect("at least one student"),
        parent: first_parent.expect("at least one parent"),
        class: class_ids[0],
    }
}

fn bench_cascades(c: &mut Criterion) {
    let mut group = c.benchmark_group("cascades.tiered");

    for (name, students, classes, sessions) in TIERS {
        let corpus = build_corpus(students, classes, sessions);
        group.throughput(Throughput::Elements(corpus.book.person_count() as u64));

        group.bench_with_input(
            BenchmarkId::new("remove_student", name),
            &corpus,
            |b, corpus| {
                b.iter_batched(
                    || corpus.book.clone(),
                    |mut book| black_box(book.remove_person(corpus.student)),
                    criterion::BatchSize::LargeInput,
                );
            },
        );

        group.bench_with_input(
            BenchmarkId::new("remove_class", name),
            &corpus,
            |b, corpus| {
                b.iter_batched(
                    || corpus.book.clone(),
                    |mut book| black_box(book.remove_class(corpus.class)),
                    criterion::BatchSize::LargeInput,
                );
            },
        );

        group.bench_with_input(
            BenchmarkId::new("force_role_change", name),
            &corpus,
            |b, corpus| {
                let details = corpus
                    .book
                    .person(corpus.parent)
                    .map(|p| p.details().clone())
                    .expect("parent");
                b.iter_batched(
                    || corpus.book.clone(),
                    |mut book| {
                        let edit = PersonEdit {
                            details: details.clone(),
                            role: Role::Tutor,
                        };
                        black_box(book.set_person(corpus.parent, edit, true))
                    },
                    criterion::BatchSize::LargeInput,
                );
            },
        );

        group.bench_with_input(
            BenchmarkId::new("check_consistency", name),
            &corpus,
            |b, corpus| b.iter(|| black_box(check_consistency(&corpus.book))),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_cascades);
criterion_main!(benches);
