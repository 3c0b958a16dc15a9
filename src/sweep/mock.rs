//! In-memory store for engine tests.
//!
//! Models the one rule that matters to the sweep: a view cannot be dropped
//! while any view built on top of it still exists. Drops inside a
//! transaction are undone by rollback.

use std::collections::{HashMap, HashSet};

use crate::store::{Dialect, RemovableObject, Session, StoreError};

pub(crate) struct MockDialect {
    pub(crate) transactional: bool,
}

impl MockDialect {
    pub(crate) fn transactional() -> Self {
        Self { transactional: true }
    }

    pub(crate) fn autocommit() -> Self {
        Self { transactional: false }
    }
}

impl Dialect for MockDialect {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn leftover_views_query(&self, schema: Option<&str>) -> String {
        format!("LIST {}", schema.unwrap_or(""))
    }

    fn drop_view_instruction(&self, view: &RemovableObject) -> String {
        format!("DROP VIEW {}", view.name)
    }

    fn supports_commit_and_rollback(&self) -> bool {
        self.transactional
    }
}

#[derive(Default)]
pub(crate) struct MockStore {
    views: Vec<String>,
    /// view -> views that reference it
    dependents: HashMap<String, Vec<String>>,
    saved: Option<Vec<String>>,
    pub(crate) denied: HashSet<String>,
    pub(crate) fail_query: bool,
    pub(crate) fail_begin: bool,
    pub(crate) fail_commits: bool,
    pub(crate) begins: usize,
    pub(crate) commits: usize,
    pub(crate) rollbacks: usize,
    pub(crate) drops_issued: usize,
}

impl MockStore {
    pub(crate) fn new<I, N>(views: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        Self {
            views: views.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// `dependent` selects from `base`, so `base` cannot go first.
    pub(crate) fn depends_on(mut self, dependent: &str, base: &str) -> Self {
        self.dependents
            .entry(base.to_string())
            .or_default()
            .push(dependent.to_string());
        self
    }

    /// Every drop of `name` fails as if permission were missing.
    pub(crate) fn deny(mut self, name: &str) -> Self {
        self.denied.insert(name.to_string());
        self
    }

    pub(crate) fn exists(&self, name: &str) -> bool {
        self.views.iter().any(|v| v == name)
    }

    /// Simulate another actor dropping a view behind the sweep's back.
    pub(crate) fn remove_externally(&mut self, name: &str) {
        self.views.retain(|v| v != name);
    }

    pub(crate) fn remaining(&self) -> &[String] {
        &self.views
    }

    fn drop_view(&mut self, name: &str) -> Result<(), StoreError> {
        if !self.exists(name) {
            return Err(StoreError::new(format!("no such view: {}", name)));
        }
        if self.denied.contains(name) {
            return Err(StoreError::new(format!("permission denied for view {}", name)));
        }
        if let Some(blocker) = self
            .dependents
            .get(name)
            .and_then(|deps| deps.iter().find(|d| self.exists(d)))
        {
            return Err(StoreError::new(format!(
                "cannot drop view {} because view {} depends on it",
                name, blocker
            )));
        }
        self.views.retain(|v| v != name);
        Ok(())
    }
}

impl Session for MockStore {
    fn query_objects(&mut self, sql: &str) -> Result<Vec<RemovableObject>, StoreError> {
        if self.fail_query {
            return Err(StoreError::new("relation \"information_schema.views\" does not exist"));
        }
        let schema = sql.strip_prefix("LIST ").unwrap_or("");
        Ok(self
            .views
            .iter()
            .map(|v| RemovableObject::new(schema, v.clone()))
            .collect())
    }

    fn execute(&mut self, sql: &str) -> Result<(), StoreError> {
        match sql.strip_prefix("DROP VIEW ") {
            Some(name) => {
                self.drops_issued += 1;
                self.drop_view(name)
            }
            None => Err(StoreError::new(format!("syntax error near '{}'", sql))),
        }
    }

    fn begin(&mut self) -> Result<(), StoreError> {
        if self.fail_begin {
            return Err(StoreError::new("connection is closed"));
        }
        self.begins += 1;
        self.saved = Some(self.views.clone());
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        if self.fail_commits {
            return Err(StoreError::new("could not serialize access"));
        }
        self.commits += 1;
        self.saved = None;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        self.rollbacks += 1;
        if let Some(saved) = self.saved.take() {
            self.views = saved;
        }
        Ok(())
    }
}
