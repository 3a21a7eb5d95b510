//! Entity types: persons, classes, sessions and attendance.

pub mod attendance;
pub mod class;
pub mod id;
pub mod person;
pub mod session;
