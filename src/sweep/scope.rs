//! Transaction scope guard.
//!
//! Opens a transaction on creation when the backend supports one and rolls
//! it back on drop unless `commit` succeeded first. Non-transactional
//! backends get a pass-through scope that never calls begin/commit/rollback.

use log::warn;

use crate::store::{RemovableObject, Session, StoreError};

pub(crate) struct TransactionScope<'s, S: Session + ?Sized> {
    session: &'s mut S,
    open: bool,
}

impl<'s, S: Session + ?Sized> TransactionScope<'s, S> {
    /// Enter a scope. Fails only if `BEGIN` itself fails.
    pub(crate) fn begin(session: &'s mut S, transactional: bool) -> Result<Self, StoreError> {
        if transactional {
            session.begin()?;
        }
        Ok(Self {
            session,
            open: transactional,
        })
    }

    pub(crate) fn execute(&mut self, sql: &str) -> Result<(), StoreError> {
        self.session.execute(sql)
    }

    pub(crate) fn query_objects(&mut self, sql: &str) -> Result<Vec<RemovableObject>, StoreError> {
        self.session.query_objects(sql)
    }

    /// Commit the scope. On failure the guard still rolls back when dropped.
    pub(crate) fn commit(mut self) -> Result<(), StoreError> {
        if self.open {
            self.session.commit()?;
            self.open = false;
        }
        Ok(())
    }

    /// Roll back explicitly, surfacing the rollback error to the caller.
    pub(crate) fn rollback(mut self) -> Result<(), StoreError> {
        if self.open {
            self.open = false;
            self.session.rollback()?;
        }
        Ok(())
    }
}

impl<S: Session + ?Sized> Drop for TransactionScope<'_, S> {
    fn drop(&mut self) {
        if self.open {
            if let Err(e) = self.session.rollback() {
                warn!("Failed to roll back transaction scope: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sweep::mock::MockStore;

    #[test]
    fn test_commit_closes_scope() {
        let mut store = MockStore::new(["a"]);
        let scope = TransactionScope::begin(&mut store, true).unwrap();
        scope.commit().unwrap();

        assert_eq!(store.begins, 1);
        assert_eq!(store.commits, 1);
        assert_eq!(store.rollbacks, 0);
    }

    #[test]
    fn test_drop_without_commit_rolls_back() {
        let mut store = MockStore::new(["a"]);
        {
            let mut scope = TransactionScope::begin(&mut store, true).unwrap();
            scope.execute("DROP VIEW a").unwrap();
        }

        assert_eq!(store.commits, 0);
        assert_eq!(store.rollbacks, 1);
        assert!(store.exists("a"));
    }

    #[test]
    fn test_failed_commit_rolls_back_on_drop() {
        let mut store = MockStore::new(["a"]);
        store.fail_commits = true;

        let mut scope = TransactionScope::begin(&mut store, true).unwrap();
        scope.execute("DROP VIEW a").unwrap();
        assert!(scope.commit().is_err());

        assert_eq!(store.rollbacks, 1);
        assert!(store.exists("a"));
    }

    #[test]
    fn test_explicit_rollback_happens_once() {
        let mut store = MockStore::new(["a"]);
        let scope = TransactionScope::begin(&mut store, true).unwrap();
        scope.rollback().unwrap();

        assert_eq!(store.rollbacks, 1);
    }

    #[test]
    fn test_non_transactional_scope_never_touches_transactions() {
        let mut store = MockStore::new(["a"]);
        {
            let mut scope = TransactionScope::begin(&mut store, false).unwrap();
            scope.execute("DROP VIEW a").unwrap();
        }
        let scope = TransactionScope::begin(&mut store, false).unwrap();
        scope.commit().unwrap();

        assert_eq!(store.begins, 0);
        assert_eq!(store.commits, 0);
        assert_eq!(store.rollbacks, 0);
        assert!(!store.exists("a"));
    }
}
