//! Relational source access over PostgreSQL.
//!
//! [`PgSourceConnector`] opens one dedicated [`sqlx::PgConnection`] per
//! migration run. The resulting [`PgSource`] describes tables from
//! `information_schema` and scans them through a server-side cursor so a
//! run never holds more than one chunk of rows in memory.

pub mod catalog;
pub mod decode;
pub mod source;
pub mod sql;

pub use source::{PgSource, PgSourceConnector};
