//! Backing-store access for the sweep.
//!
//! Two capabilities are kept apart:
//! - **Dialect**: the SQL text to list leftover views and drop one of them
//! - **Session**: a live connection that runs that text and delimits transactions
//!
//! # Example
//!
//! ```ignore
//! use viewsweep::store::{Dialect, Session, SqliteDialect, SqliteSession};
//! use std::path::Path;
//!
//! let dialect = SqliteDialect::default();
//! let mut session = SqliteSession::open(Path::new("/data/warehouse.db"), false)?;
//! let views = session.query_objects(&dialect.leftover_views_query(None))?;
//! ```

mod dialect;
mod records;
mod session;
mod sqlite;

pub use dialect::{DEFAULT_VIEW_PREFIX, Dialect, SqliteDialect, quote_identifier, quote_literal};
pub use records::{RemovableObject, StoreError};
pub use session::Session;
pub use sqlite::{MEMORY_PATH, SqliteSession};
