//! Relationship edges between persons and classes.
//!
//! ## Submodules
//!
//! - [`edge`]: edge kinds and concrete two-endpoint edges.
//! - [`role_change`]: pure planning of what a role change drops.
//!
//! Edges are stored as id-sets on both endpoints ([`crate::model::person::Links`]
//! on persons, roster/tutor on [`crate::model::class::TuitionClass`]). Only
//! [`crate::book::AddressBook`] mutates them.

pub mod edge;
pub mod role_change;
