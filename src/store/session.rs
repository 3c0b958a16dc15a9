//! Session capability: one exclusive connection that can run the dialect's
//! statements and delimit transactions.

use super::records::{RemovableObject, StoreError};

/// A live connection owned by one sweep for its whole duration.
///
/// Implementations report every failure as a `StoreError`; interpreting
/// the failure (retry, stall, abort) is the caller's business.
pub trait Session {
    /// Run a listing query; rows are `(schema, name[, catalog])`.
    fn query_objects(&mut self, sql: &str) -> Result<Vec<RemovableObject>, StoreError>;

    /// Run a statement that returns no rows.
    fn execute(&mut self, sql: &str) -> Result<(), StoreError>;

    fn begin(&mut self) -> Result<(), StoreError>;

    fn commit(&mut self) -> Result<(), StoreError>;

    fn rollback(&mut self) -> Result<(), StoreError>;
}
