//! Object descriptors and store-level errors.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// One backing-store object eligible for removal.
///
/// Created by discovery for the duration of one run; never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RemovableObject {
    /// Catalog, only reported by backends with a three-level namespace
    pub catalog: Option<String>,

    /// Schema, empty for schema-less backends
    pub schema: String,

    /// Object name, unique within one discovery run
    pub name: String,
}

impl RemovableObject {
    /// Create an object without a catalog.
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            catalog: None,
            schema: schema.into(),
            name: name.into(),
        }
    }

    /// Attach a catalog.
    pub fn with_catalog(mut self, catalog: impl Into<String>) -> Self {
        self.catalog = Some(catalog.into());
        self
    }
}

impl fmt::Display for RemovableObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(catalog) = &self.catalog {
            write!(f, "{}.", catalog)?;
        }
        if !self.schema.is_empty() {
            write!(f, "{}.", self.schema)?;
        }
        write!(f, "{}", self.name)
    }
}

/// Failure reported by a session, carrying the backend's own message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct StoreError {
    message: String,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Human-readable detail, as shown in the report.
    pub fn detail(&self) -> &str {
        &self.message
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        Self::new(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_schema_and_name() {
        let view = RemovableObject::new("main", "pipeline_view_orders");
        assert_eq!(view.to_string(), "main.pipeline_view_orders");
    }

    #[test]
    fn test_display_schema_less() {
        let view = RemovableObject::new("", "pipeline_view_orders");
        assert_eq!(view.to_string(), "pipeline_view_orders");
    }

    #[test]
    fn test_display_with_catalog() {
        let view = RemovableObject::new("public", "v1").with_catalog("dwh");
        assert_eq!(view.to_string(), "dwh.public.v1");
    }

    #[test]
    fn test_serializes_as_plain_fields() {
        let view = RemovableObject::new("main", "pipeline_view_orders");
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"catalog": null, "schema": "main", "name": "pipeline_view_orders"})
        );
    }

    #[test]
    fn test_store_error_from_rusqlite() {
        let err: StoreError = rusqlite::Error::InvalidQuery.into();
        assert!(!err.detail().is_empty());
        assert_eq!(err.to_string(), err.detail());
    }
}
