//! viewsweep - find and drop leftover pipeline views
//!
//! Pipeline runs leave SQL views behind. viewsweep lists them through a
//! named connection and, on request, drops them without knowing the order
//! their dependencies require: refused drops are retried pass after pass
//! until everything is gone or a pass makes no progress.

pub mod config;
pub mod connections;
pub mod error;
pub mod report;
pub mod store;
pub mod sweep;

pub use error::{Result, SweepError};
