//! Driver-free core of the firemongo project.
//!
//! This crate holds everything that does not touch the MongoDB driver:
//!
//! - **Expression grammar** ([`expr`]) - The nested-list filter DSL, its typed AST,
//!   and the visitor used to compile it into concrete query representations
//! - **Error handling** ([`error`]) - Error and result types shared across the project
//!
//! The driver-facing handles (service, database, collection, document reference,
//! change streams) live in the `firemongo` crate.

pub mod error;
pub mod expr;
