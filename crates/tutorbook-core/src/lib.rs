//! tutorbook-core: the relationship-consistency engine behind the tutorbook
//! contact book.
//!
//! Persons (students, tutors, parents), tuition classes and class sessions
//! live in an [`AddressBook`]. Every relationship is two-sided and every
//! mutation either fully succeeds or leaves the book untouched.
//!
//! # Conventions
//!
//! - **Errors**: Domain operations return [`BookError`]; configuration
//!   loading uses `anyhow::Result` with context.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `debug!`) with
//!   structured fields. Subscribers are installed by binaries, never here.
//! - **Time**: The book reads "now" from an injected [`clock::Clock`].

pub mod book;
pub mod clock;
pub mod config;
pub mod error;
pub mod graph;
pub mod model;
pub mod verify;
pub mod view;

pub use book::AddressBook;
pub use error::{BookError, ErrorCode};
