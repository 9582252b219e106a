/// Connection Management Module
///
/// This module owns the single live link a `Database` instance holds to one
/// SQLite database, and resolves host/login/password/port/name parameters
/// onto database files.
///
/// ## Parameter mapping
///
/// - `host` is the directory holding the database files, or `:memory:` for
///   named shared in-memory databases.
/// - `database` resolves to `<host>/<database>.sqlite`.
/// - `login`, `password` and `port` are kept with the connection but SQLite
///   does not authenticate.

use crate::core::{PanelDbError, Result};
use rusqlite::{Connection, OpenFlags};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Host value selecting named in-memory databases
pub const MEMORY_HOST: &str = ":memory:";

/// File extension of database files under a host directory
pub const DATABASE_EXTENSION: &str = "sqlite";

/// Parameters identifying one database instance
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct ConnectionParams {
    /// Directory holding the database files, or `:memory:`
    pub host: String,
    /// Account name presented to the server
    #[serde(default)]
    pub login: String,
    /// Password presented to the server
    #[serde(default)]
    pub password: String,
    /// Server port
    #[serde(default)]
    pub port: u16,
    /// Database (schema) name
    #[serde(rename = "name")]
    pub database: String,
}

impl ConnectionParams {
    /// Creates connection parameters from their parts
    pub fn new(
        host: impl Into<String>,
        login: impl Into<String>,
        password: impl Into<String>,
        port: u16,
        database: impl Into<String>,
    ) -> Self {
        ConnectionParams {
            host: host.into(),
            login: login.into(),
            password: password.into(),
            port,
            database: database.into(),
        }
    }

    /// Returns true when the parameters target in-memory databases
    pub fn is_memory(&self) -> bool {
        self.host == MEMORY_HOST
    }

    /// Returns a copy of these parameters pointing at another database on
    /// the same host
    pub fn with_database(&self, database: &str) -> Self {
        ConnectionParams {
            database: database.to_string(),
            ..self.clone()
        }
    }

    /// Resolves the on-disk path of the database (None for in-memory hosts)
    pub fn database_path(&self) -> Option<PathBuf> {
        if self.is_memory() {
            None
        } else {
            Some(
                Path::new(&self.host)
                    .join(&self.database)
                    .with_extension(DATABASE_EXTENSION),
            )
        }
    }
}

// The password never appears in logs or debug output.
impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("host", &self.host)
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .field("port", &self.port)
            .field("database", &self.database)
            .finish()
    }
}

/// Connection manager owning at most one live database handle
#[derive(Debug, Default)]
pub struct ConnectionManager {
    /// Active database connection (None if disconnected)
    connection: Option<Connection>,
    /// Parameters of the active connection
    params: Option<ConnectionParams>,
}

impl ConnectionManager {
    /// Creates a disconnected connection manager
    pub fn new() -> Self {
        ConnectionManager::default()
    }

    /// Connects to the database described by `params`
    ///
    /// An open connection is closed first. On failure the manager is left
    /// disconnected and can be retried with other parameters.
    ///
    /// # Returns
    ///
    /// `Ok(())` on successful connection, `PanelDbError::Connect` or
    /// `PanelDbError::Database` on failure.
    pub fn connect(&mut self, params: ConnectionParams) -> Result<()> {
        if self.is_connected() {
            self.disconnect();
        }

        debug!(
            host = %params.host,
            login = %params.login,
            port = params.port,
            database = %params.database,
            "Connecting to database"
        );

        let conn = open_database(&params).map_err(|e| {
            warn!(database = %params.database, error = %e, "Connection failed");
            e
        })?;

        self.connection = Some(conn);
        self.params = Some(params);
        Ok(())
    }

    /// Switches the active database to another one on the same host
    ///
    /// Credentials are kept. If the target cannot be opened the current
    /// database stays selected.
    ///
    /// SQLite has no schema switch on an open handle, so the target is opened
    /// as a fresh handle that replaces the old one. State bound to the handle
    /// (TEMP tables, PRAGMA settings, open transactions) does not carry over;
    /// selecting the previous database again does not bring it back.
    pub fn select_database(&mut self, name: &str) -> Result<()> {
        let params = match (&self.connection, &self.params) {
            (Some(_), Some(params)) => params.with_database(name),
            _ => return Err(PanelDbError::NotConnected),
        };

        debug!(database = %name, "Selecting database");
        let conn = open_database(&params).map_err(|e| {
            warn!(database = %name, error = %e, "Database selection failed");
            e
        })?;

        self.connection = Some(conn);
        self.params = Some(params);
        Ok(())
    }

    /// Disconnects from the current database
    ///
    /// Calling this while disconnected is a no-op.
    pub fn disconnect(&mut self) {
        if let Some(conn) = self.connection.take() {
            if let Err((_, e)) = conn.close() {
                warn!(error = %e, "Error while closing connection");
            }
            debug!("Disconnected");
        }
        self.params = None;
    }

    /// Checks if there's an active database connection
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Parameters of the active connection
    pub fn params(&self) -> Option<&ConnectionParams> {
        self.params.as_ref()
    }

    /// Name of the currently selected database
    pub fn current_database(&self) -> Option<&str> {
        self.params.as_ref().map(|p| p.database.as_str())
    }

    /// Returns the live handle, or `NotConnected`
    pub(crate) fn handle(&self) -> Result<&Connection> {
        self.connection.as_ref().ok_or(PanelDbError::NotConnected)
    }
}

/// Opens the database named by `params` without creating it
fn open_database(params: &ConnectionParams) -> Result<Connection> {
    validate_database_name(&params.database)?;

    if params.is_memory() {
        let uri = format!("file:{}?mode=memory&cache=shared", params.database);
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        return Ok(Connection::open_with_flags(uri, flags)?);
    }

    if !Path::new(&params.host).is_dir() {
        return Err(PanelDbError::Connect(format!(
            "Unknown host '{}'",
            params.host
        )));
    }

    let path = params
        .database_path()
        .ok_or_else(|| PanelDbError::Connect("Unresolvable database path".to_string()))?;
    if !path.is_file() {
        return Err(PanelDbError::Connect(format!(
            "Unknown database '{}'",
            params.database
        )));
    }

    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    Ok(Connection::open_with_flags(path, flags)?)
}

/// Database names are plain identifiers, never paths
fn validate_database_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(PanelDbError::Connect(format!(
            "Invalid database name '{}'",
            name
        )))
    }
}
