//! Resolves logical connection names from configuration into a dialect and
//! an open session.

use std::collections::BTreeMap;

use log::info;

use crate::config::{Config, ConnectionConfig};
use crate::error::{Result, SweepError};
use crate::store::{Dialect, Session, SqliteDialect, SqliteSession};

/// A resolved connection, owned by one sweep.
pub struct OpenConnection {
    pub name: String,
    pub dialect: Box<dyn Dialect>,
    pub session: Box<dyn Session + Send>,
}

impl std::fmt::Debug for OpenConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenConnection")
            .field("name", &self.name)
            .field("dialect", &self.dialect.name())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct ConnectionRegistry {
    connections: BTreeMap<String, ConnectionConfig>,
    view_prefix: String,
}

impl ConnectionRegistry {
    pub fn new(config: &Config) -> Self {
        Self {
            connections: config.connections.clone(),
            view_prefix: config.sweep.view_prefix.clone(),
        }
    }

    /// Configured connections, sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConnectionConfig)> {
        self.connections.iter().map(|(name, conn)| (name.as_str(), conn))
    }

    pub fn get(&self, name: &str) -> Result<&ConnectionConfig> {
        self.connections
            .get(name)
            .ok_or_else(|| SweepError::Configuration(format!("Unable to find connection named '{}'", name)))
    }

    /// Open `name` for a sweep.
    ///
    /// `require_write` rejects read-only connections up front rather than
    /// letting every drop fail.
    pub fn open(&self, name: &str, require_write: bool) -> Result<OpenConnection> {
        match self.get(name)? {
            ConnectionConfig::Sqlite {
                path,
                read_only,
                attach,
            } => {
                if *read_only && require_write {
                    return Err(SweepError::Configuration(format!(
                        "Connection '{}' is read-only and cannot drop views",
                        name
                    )));
                }

                let mut session = SqliteSession::open(path, *read_only).map_err(SweepError::Connection)?;
                for (schema, attached) in attach {
                    session.attach(schema, attached).map_err(SweepError::Connection)?;
                }
                info!("Opened connection '{}' at {}", name, path.display());

                Ok(OpenConnection {
                    name: name.to_string(),
                    dialect: Box::new(SqliteDialect::new(self.view_prefix.clone())),
                    session: Box::new(session),
                })
            }
            other => Err(SweepError::Configuration(format!(
                "Connection '{}' is not a SQL connection (kind: {})",
                name,
                other.kind()
            ))),
        }
    }
}
