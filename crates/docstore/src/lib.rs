//! Document store access over MongoDB.
//!
//! [`MongoConnector`] opens a client per run and pings the deployment so
//! connection problems surface before any rows are read. [`MongoStore`]
//! writes migrated documents in batches, provisions the ticket text index
//! and serves the read-side queries in [`reports`].

pub mod convert;
pub mod reports;
pub mod store;

pub use store::{MongoConnector, MongoStore};
