//! Backend-specific SQL text for listing and dropping leftover views.
//!
//! A `Dialect` only produces statements; it never touches a connection.
//! One implementation exists per supported backend and is picked from the
//! connection's `kind` in configuration.

use super::records::RemovableObject;

/// Default name prefix identifying views left behind by pipeline runs.
pub const DEFAULT_VIEW_PREFIX: &str = "pipeline_view_";

/// Capability interface a backend exposes to the sweep.
pub trait Dialect: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// Query returning `(schema, name[, catalog])` rows for every leftover view.
    fn leftover_views_query(&self, schema: Option<&str>) -> String;

    /// Statement removing one view.
    fn drop_view_instruction(&self, view: &RemovableObject) -> String;

    /// Whether commit/rollback around an attempt means anything.
    fn supports_commit_and_rollback(&self) -> bool;
}

/// SQLite: schemas are the `main`/`temp` databases plus anything attached.
#[derive(Debug, Clone)]
pub struct SqliteDialect {
    view_prefix: String,
}

impl SqliteDialect {
    pub fn new(view_prefix: impl Into<String>) -> Self {
        Self {
            view_prefix: view_prefix.into(),
        }
    }

    pub fn view_prefix(&self) -> &str {
        &self.view_prefix
    }
}

impl Default for SqliteDialect {
    fn default() -> Self {
        Self::new(DEFAULT_VIEW_PREFIX)
    }
}

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn leftover_views_query(&self, schema: Option<&str>) -> String {
        let schema = schema.unwrap_or("main");
        let master = if schema.eq_ignore_ascii_case("temp") {
            "sqlite_temp_master"
        } else {
            "sqlite_master"
        };
        format!(
            "SELECT {} AS schema_name, name FROM {}.{} WHERE type = 'view' AND name LIKE {} ESCAPE '\\' ORDER BY name",
            quote_literal(schema),
            quote_identifier(schema),
            master,
            quote_literal(&format!("{}%", escape_like(&self.view_prefix))),
        )
    }

    fn drop_view_instruction(&self, view: &RemovableObject) -> String {
        if view.schema.is_empty() {
            format!("DROP VIEW {}", quote_identifier(&view.name))
        } else {
            format!(
                "DROP VIEW {}.{}",
                quote_identifier(&view.schema),
                quote_identifier(&view.name)
            )
        }
    }

    fn supports_commit_and_rollback(&self) -> bool {
        true
    }
}

/// Quote an identifier with double quotes, doubling embedded quotes.
pub fn quote_identifier(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote a string literal with single quotes, doubling embedded quotes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Escape LIKE wildcards so a prefix matches literally under `ESCAPE '\'`.
fn escape_like(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
