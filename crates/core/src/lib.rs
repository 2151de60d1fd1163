//! Pure domain logic for the dumpster workspace.
//!
//! Nothing in this crate performs I/O. The database crate produces a
//! [`snapshot::DatabaseSnapshot`], [`render`] turns it into a SQL script,
//! and the storage crate relies on [`naming`] and [`retention`] to lay out
//! and age stored dumps.

pub mod error;
pub mod naming;
pub mod render;
pub mod retention;
pub mod snapshot;
pub mod types;
