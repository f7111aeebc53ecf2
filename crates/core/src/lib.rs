//! Domain types and pure logic for the ticket warehouse migration.
//!
//! Nothing in this crate performs I/O. The relational source and the
//! document store are reached through the traits in [`store`], which the
//! `citsm-db` and `citsm-docstore` crates implement.

pub mod dates;
pub mod error;
pub mod fields;
pub mod store;
pub mod table;
pub mod transform;
pub mod types;
pub mod value;
