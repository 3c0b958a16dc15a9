//! Result table built from a sweep.
//!
//! The table has three columns, `Schema`, `Name`, `Removed`, and is rendered
//! either as aligned text for the terminal or as JSON in the usual
//! `{title, columns, data}` result-table shape.

use chrono::{DateTime, Utc};
use serde::ser::Serializer;
use serde::Serialize;

use crate::error::Result;
use crate::store::RemovableObject;
use crate::sweep::{EngineResult, EngineStatus};

/// Title shown above every report.
pub const REPORT_TITLE: &str = "Leftover Views";

/// Column headers, in display order.
pub const COLUMNS: [&str; 3] = ["Schema", "Name", "Removed"];

/// Per-view cell for the `Removed` column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalStatus {
    Removed,
    /// Deletion was not requested
    NotAttempted,
    /// Deletion was requested but the view is still there
    Failed(String),
}

impl RemovalStatus {
    /// Text shown in the `Removed` column.
    pub fn label(&self) -> &str {
        match self {
            RemovalStatus::Removed => "Yes",
            RemovalStatus::NotAttempted => "No",
            RemovalStatus::Failed(detail) => detail,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub schema: String,
    pub name: String,
    pub status: RemovalStatus,
}

impl ReportRow {
    fn cells(&self) -> [&str; 3] {
        [&self.schema, &self.name, self.status.label()]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultTable {
    title: String,
    rows: Vec<ReportRow>,
}

impl ResultTable {
    /// One row per outcome, in the order views reached their final state.
    pub fn from_engine_result(result: &EngineResult) -> Self {
        let rows = result
            .outcomes
            .iter()
            .map(|outcome| {
                let status = match (outcome.succeeded, &outcome.error_detail) {
                    (true, _) => RemovalStatus::Removed,
                    (false, Some(detail)) => RemovalStatus::Failed(detail.clone()),
                    (false, None) => RemovalStatus::Failed(String::new()),
                };
                ReportRow {
                    schema: outcome.object.schema.clone(),
                    name: outcome.object.name.clone(),
                    status,
                }
            })
            .collect();

        Self {
            title: REPORT_TITLE.to_string(),
            rows,
        }
    }

    /// One "No" row per discovered view, in discovery order.
    pub fn from_discovery(views: &[RemovableObject]) -> Self {
        let rows = views
            .iter()
            .map(|view| ReportRow {
                schema: view.schema.clone(),
                name: view.name.clone(),
                status: RemovalStatus::NotAttempted,
            })
            .collect();

        Self {
            title: REPORT_TITLE.to_string(),
            rows,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn rows(&self) -> &[ReportRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell values, row by row.
    pub fn data(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| row.cells().iter().map(|c| c.to_string()).collect())
            .collect()
    }

    /// Render as an aligned plain-text table.
    pub fn render_text(&self) -> String {
        let rows: Vec<[String; 3]> = self
            .rows
            .iter()
            .map(|row| row.cells().map(single_line))
            .collect();

        let mut widths = COLUMNS.map(|c| c.chars().count());
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let mut out = String::new();
        push_line(&mut out, &COLUMNS.map(String::from), &widths);
        let rule = widths.map(|w| "-".repeat(w));
        push_line(&mut out, &rule, &widths);
        for row in &rows {
            push_line(&mut out, row, &widths);
        }
        out
    }
}

fn single_line(cell: &str) -> String {
    cell.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn push_line(out: &mut String, cells: &[String; 3], widths: &[usize; 3]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect();
    out.push_str(padded.join("  ").trim_end());
    out.push('\n');
}

#[derive(Serialize)]
struct ColumnDto {
    name: &'static str,
    #[serde(rename = "type")]
    column_type: &'static str,
}

#[derive(Serialize)]
struct TableDto<'a> {
    title: &'a str,
    columns: Vec<ColumnDto>,
    data: Vec<Vec<String>>,
}

impl Serialize for ResultTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        TableDto {
            title: &self.title,
            columns: COLUMNS
                .iter()
                .map(|&name| ColumnDto {
                    name,
                    column_type: "STRING",
                })
                .collect(),
            data: self.data(),
        }
        .serialize(serializer)
    }
}

/// JSON document written by `--format json`.
#[derive(Debug, Serialize)]
pub struct ReportDocument<'a> {
    pub generated_at: DateTime<Utc>,
    pub connection: &'a str,
    pub schema: Option<&'a str>,
    pub perform_deletion: bool,
    /// Engine status; absent for report-only runs
    pub status: Option<&'a EngineStatus>,
    pub passes: Option<usize>,
    pub table: &'a ResultTable,
}

impl ReportDocument<'_> {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
