//! Leftover view sweep: discovery, the fixpoint engine, and the glue that
//! turns a connection name into a report.

mod cancel;
mod discovery;
mod engine;
mod scope;

#[cfg(test)]
pub(crate) mod mock;

use log::info;

use crate::connections::ConnectionRegistry;
use crate::error::Result;
use crate::report::ResultTable;
use crate::store::{Dialect, Session};

pub use cancel::CancelToken;
pub use discovery::discover;
pub use engine::{AttemptOutcome, CANCELLED_DETAIL, EngineResult, EngineStatus, Sweeper};

/// What the caller asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepOptions {
    /// Logical connection name, resolved through configuration
    pub connection_name: String,
    /// Restrict discovery to one schema
    pub schema_filter: Option<String>,
    /// Drop the views instead of only listing them
    pub perform_deletion: bool,
}

impl SweepOptions {
    /// Report-only options for a connection.
    pub fn new(connection_name: impl Into<String>) -> Self {
        Self {
            connection_name: connection_name.into(),
            schema_filter: None,
            perform_deletion: false,
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema_filter = Some(schema.into());
        self
    }

    pub fn with_deletion(mut self, perform_deletion: bool) -> Self {
        self.perform_deletion = perform_deletion;
        self
    }
}

/// Everything one sweep produced.
#[derive(Debug, Clone)]
pub struct SweepOutcome {
    /// Number of leftover views discovered
    pub discovered: usize,
    /// Engine result; `None` when deletion was not requested
    pub engine: Option<EngineResult>,
    pub table: ResultTable,
}

impl SweepOutcome {
    pub fn status(&self) -> Option<&EngineStatus> {
        self.engine.as_ref().map(|r| &r.status)
    }

    /// True unless the engine ran and ended anywhere but `AllRemoved`.
    pub fn is_success(&self) -> bool {
        self.status().is_none_or(EngineStatus::is_success)
    }
}

/// Resolve the connection, then sweep it.
///
/// Configuration and discovery errors abort with no report. Everything after
/// discovery, including a stall, still yields a full report.
pub fn run_sweep(registry: &ConnectionRegistry, options: &SweepOptions, cancel: &CancelToken) -> Result<SweepOutcome> {
    let mut connection = registry.open(&options.connection_name, options.perform_deletion)?;
    info!(
        "Sweeping connection '{}' ({}), schema: {:?}, perform deletion: {}",
        options.connection_name,
        connection.dialect.name(),
        options.schema_filter,
        options.perform_deletion
    );
    sweep_session(&mut *connection.session, &*connection.dialect, options, cancel)
}

/// Sweep an already open session.
pub fn sweep_session<S>(
    session: &mut S,
    dialect: &dyn Dialect,
    options: &SweepOptions,
    cancel: &CancelToken,
) -> Result<SweepOutcome>
where
    S: Session + ?Sized,
{
    let views = discover(session, dialect, options.schema_filter.as_deref())?;
    let discovered = views.len();

    if !options.perform_deletion {
        info!("Deletion not requested, reporting {} view(s)", discovered);
        return Ok(SweepOutcome {
            discovered,
            engine: None,
            table: ResultTable::from_discovery(&views),
        });
    }

    let result = Sweeper::new(session, dialect)
        .with_cancel_token(cancel.clone())
        .remove_all(views);
    let table = ResultTable::from_engine_result(&result);

    Ok(SweepOutcome {
        discovered,
        engine: Some(result),
        table,
    })
}
