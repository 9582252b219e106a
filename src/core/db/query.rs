/// Query Execution Module
///
/// `Database` is the per-page entry point of the layer: it owns one
/// connection, the pending query, the buffered result of the last execute
/// and the last error. Executing never raises; callers branch on the
/// returned `QueryOutcome`.

use super::connection::{ConnectionManager, ConnectionParams};
use super::escape::escape_literal;
use super::field::Field;
use super::format::{QueryArg, QueryFormatter};
use super::result::{ResultSet, Row};
use crate::core::{PanelDbError, Result};
use rusqlite::{types::ValueRef, Batch, Connection};
use tracing::{debug, warn};

/// Sentinel for a successful query that matched nothing
pub const SENTINEL_EMPTY: i64 = 0;
/// Sentinel for a failed query
pub const SENTINEL_ERROR: i64 = -1;
/// Sentinel for a formatted query that did not fit the buffer
pub const SENTINEL_OVERFLOW: i64 = -2;

/// Outcome of executing one query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOutcome {
    /// The query returned this many rows (at least one)
    Rows(usize),
    /// The query ran and returned no rows, or was not a row-returning statement
    Empty,
    /// The query failed; see `Database::last_error`
    Error,
    /// Formatting overflowed the query buffer; nothing was sent
    Overflow,
}

impl QueryOutcome {
    /// Integer form: the row count, `SENTINEL_EMPTY`, `SENTINEL_ERROR` or
    /// `SENTINEL_OVERFLOW`
    pub fn sentinel(self) -> i64 {
        match self {
            QueryOutcome::Rows(n) => n as i64,
            QueryOutcome::Empty => SENTINEL_EMPTY,
            QueryOutcome::Error => SENTINEL_ERROR,
            QueryOutcome::Overflow => SENTINEL_OVERFLOW,
        }
    }

    /// True for `Rows` and `Empty`
    pub fn is_success(self) -> bool {
        matches!(self, QueryOutcome::Rows(_) | QueryOutcome::Empty)
    }

    /// True for `Error` and `Overflow`
    pub fn is_error(self) -> bool {
        !self.is_success()
    }

    /// Rows buffered by this outcome
    pub fn row_count(self) -> usize {
        match self {
            QueryOutcome::Rows(n) => n,
            _ => 0,
        }
    }
}

/// Executor state of a `Database`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorState {
    /// No query has completed since construction or the last reset
    Idle,
    /// The last execute succeeded and its result is buffered
    Populated,
    /// The last execute failed
    Failed,
}

/// Snapshot of the most recent failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastError {
    pub code: i32,
    pub message: String,
}

impl From<&PanelDbError> for LastError {
    fn from(err: &PanelDbError) -> Self {
        LastError {
            code: err.code(),
            message: err.to_string(),
        }
    }
}

/// Leading keyword classification of a SQL statement, for log records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StatementType {
    Select,
    Insert,
    Update,
    Delete,
    Replace,
    Create,
    Drop,
    Alter,
    Pragma,
    Transaction,
    Other,
}

impl StatementType {
    /// Classifies `sql` by its first keyword
    pub(crate) fn from_sql(sql: &str) -> Self {
        let keyword = sql
            .split_whitespace()
            .next()
            .unwrap_or("")
            .trim_end_matches(';')
            .to_ascii_uppercase();

        match keyword.as_str() {
            "SELECT" | "WITH" | "VALUES" => StatementType::Select,
            "INSERT" => StatementType::Insert,
            "UPDATE" => StatementType::Update,
            "DELETE" => StatementType::Delete,
            "REPLACE" => StatementType::Replace,
            "CREATE" => StatementType::Create,
            "DROP" => StatementType::Drop,
            "ALTER" => StatementType::Alter,
            "PRAGMA" => StatementType::Pragma,
            "BEGIN" | "COMMIT" | "END" | "ROLLBACK" | "SAVEPOINT" | "RELEASE" => {
                StatementType::Transaction
            }
            _ => StatementType::Other,
        }
    }
}

/// One database-layer instance: connection, query, result buffer, last error
///
/// Not meant to be shared between threads; create one per page action and
/// let it drop when done.
///
/// # Examples
///
/// ```no_run
/// use panel_db::core::db::{Database, QueryOutcome};
/// use panel_db::query_args;
///
/// let mut db = Database::new();
/// db.connect("/var/lib/panel", "panel", "secret", 3306, "accounts")?;
/// let name = db.escape("alice")?;
/// match db.execute_formatted(
///     "SELECT username, id FROM account WHERE username = '%s'",
///     &query_args![name],
/// ) {
///     QueryOutcome::Rows(_) => {
///         let id = db.first_row().and_then(|r| r.field(1)).map(|f| f.as_unsigned());
///         println!("id = {:?}", id);
///     }
///     QueryOutcome::Empty => println!("not found"),
///     _ => eprintln!("query failed: {}", db.last_error()),
/// }
/// # Ok::<(), panel_db::core::PanelDbError>(())
/// ```
#[derive(Debug)]
pub struct Database {
    connection: ConnectionManager,
    formatter: QueryFormatter,
    query: Option<String>,
    result: ResultSet,
    state: ExecutorState,
    last_error: Option<LastError>,
}

impl Default for Database {
    fn default() -> Self {
        Database::with_formatter(QueryFormatter::default())
    }
}

impl Database {
    /// Creates a disconnected instance with the default query buffer
    pub fn new() -> Self {
        Database::default()
    }

    /// Creates a disconnected instance with a query buffer of `capacity` bytes
    pub fn with_capacity(capacity: usize) -> Self {
        Database::with_formatter(QueryFormatter::new(capacity))
    }

    /// Creates a disconnected instance using `formatter`
    pub fn with_formatter(formatter: QueryFormatter) -> Self {
        Database {
            connection: ConnectionManager::new(),
            formatter,
            query: None,
            result: ResultSet::default(),
            state: ExecutorState::Idle,
            last_error: None,
        }
    }

    /// Connects to `database` on `host`
    ///
    /// Any open connection and buffered result are discarded first.
    pub fn connect(
        &mut self,
        host: &str,
        login: &str,
        password: &str,
        port: u16,
        database: &str,
    ) -> Result<()> {
        self.connect_with(ConnectionParams::new(host, login, password, port, database))
    }

    /// Connects using a configured profile
    pub fn connect_profile(&mut self, profile: &ConnectionParams) -> Result<()> {
        self.connect_with(profile.clone())
    }

    /// Connects using explicit parameters
    pub fn connect_with(&mut self, params: ConnectionParams) -> Result<()> {
        self.reset_result();
        let result = self.connection.connect(params);
        self.track(result)
    }

    /// Switches to another database on the same host
    ///
    /// Buffered rows are kept. The link is reopened on the target, so TEMP
    /// tables and PRAGMA settings of the previous database are lost.
    pub fn select_database(&mut self, name: &str) -> Result<()> {
        let result = self.connection.select_database(name);
        self.track(result)
    }

    /// Closes the connection; buffered rows stay readable
    pub fn disconnect(&mut self) {
        self.connection.disconnect();
    }

    /// Checks if there's an active database connection
    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    /// The underlying connection manager
    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    /// The query formatter of this instance
    pub fn formatter(&self) -> &QueryFormatter {
        &self.formatter
    }

    /// Escapes untrusted text for use inside a quoted literal
    ///
    /// Requires a live connection. Does not touch the pending query, the
    /// result buffer or the last error.
    pub fn escape(&self, raw: &str) -> Result<String> {
        self.connection.handle()?;
        Ok(escape_literal(raw))
    }

    /// Stores a literal query verbatim for `run`
    pub fn set_query(&mut self, sql: impl Into<String>) {
        self.query = Some(sql.into());
    }

    /// Formats a query into the buffer and stores it for `run`
    ///
    /// On failure the pending query is cleared so `run` cannot execute a
    /// stale statement.
    pub fn format_query(&mut self, template: &str, args: &[QueryArg]) -> Result<&str> {
        match self.formatter.format(template, args) {
            Ok(sql) => Ok(self.query.insert(sql).as_str()),
            Err(e) => {
                self.query = None;
                Err(e)
            }
        }
    }

    /// The query `run` would execute
    pub fn pending_query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Executes the pending query
    pub fn run(&mut self) -> QueryOutcome {
        match self.query.clone() {
            Some(sql) => self.execute(&sql),
            None => {
                self.reset_result();
                self.fail(PanelDbError::EmptyQuery)
            }
        }
    }

    /// Executes `sql` and buffers its complete result
    ///
    /// The previous result is discarded before anything else happens.
    pub fn execute(&mut self, sql: &str) -> QueryOutcome {
        self.reset_result();
        self.query = Some(sql.to_string());

        let statement = StatementType::from_sql(sql);
        debug!(?statement, sql, "Executing query");

        let buffered = self
            .connection
            .handle()
            .and_then(|conn| buffer_query(conn, sql));

        match buffered {
            Ok(result) => {
                self.result = result;
                self.state = ExecutorState::Populated;
                self.last_error = None;
                let rows = self.result.row_count();
                debug!(?statement, rows, "Query succeeded");
                if rows == 0 {
                    QueryOutcome::Empty
                } else {
                    QueryOutcome::Rows(rows)
                }
            }
            Err(e) => self.fail(e),
        }
    }

    /// Formats `template` with `args` and executes the result
    ///
    /// Formatting failures never reach the connection: overflow yields
    /// `QueryOutcome::Overflow`, other template errors `QueryOutcome::Error`.
    pub fn execute_formatted(&mut self, template: &str, args: &[QueryArg]) -> QueryOutcome {
        match self.formatter.format(template, args) {
            Ok(sql) => self.execute(&sql),
            Err(e) => {
                self.reset_result();
                self.query = None;
                let overflow = e.is_overflow();
                self.fail(e);
                if overflow {
                    QueryOutcome::Overflow
                } else {
                    QueryOutcome::Error
                }
            }
        }
    }

    /// Number of buffered rows
    pub fn row_count(&self) -> usize {
        self.result.row_count()
    }

    /// Buffered row at `index`; out-of-range yields None
    pub fn row(&self, index: usize) -> Option<&Row> {
        self.result.row(index)
    }

    /// First buffered row
    pub fn first_row(&self) -> Option<&Row> {
        self.result.first_row()
    }

    /// All buffered rows
    pub fn rows(&self) -> &[Row] {
        self.result.rows()
    }

    /// Column names of the buffered result
    pub fn columns(&self) -> &[String] {
        self.result.columns()
    }

    /// The buffered result set
    pub fn result(&self) -> &ResultSet {
        &self.result
    }

    /// Current executor state
    pub fn state(&self) -> ExecutorState {
        self.state
    }

    /// Message of the last failure, empty if the last operation succeeded
    pub fn last_error(&self) -> &str {
        self.last_error
            .as_ref()
            .map(|e| e.message.as_str())
            .unwrap_or("")
    }

    /// Code of the last failure, 0 if the last operation succeeded
    pub fn last_error_code(&self) -> i32 {
        self.last_error.as_ref().map(|e| e.code).unwrap_or(0)
    }

    /// The last failure, if any
    pub fn last_error_info(&self) -> Option<&LastError> {
        self.last_error.as_ref()
    }

    /// Forgets the last failure
    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    fn reset_result(&mut self) {
        self.result.clear();
        self.state = ExecutorState::Idle;
    }

    fn fail(&mut self, err: PanelDbError) -> QueryOutcome {
        warn!(code = err.code(), error = %err, "Query failed");
        self.last_error = Some(LastError::from(&err));
        self.state = ExecutorState::Failed;
        QueryOutcome::Error
    }

    fn track(&mut self, result: Result<()>) -> Result<()> {
        match &result {
            Ok(()) => self.last_error = None,
            Err(e) => self.last_error = Some(LastError::from(e)),
        }
        result
    }
}

/// Runs `sql` and copies every row out of the connection
///
/// `sql` must hold exactly one statement. Text with no statement in it
/// (blank or comments only) is an empty query; a second statement rejects
/// the whole string before anything runs.
fn buffer_query(conn: &Connection, sql: &str) -> Result<ResultSet> {
    let mut batch = Batch::new(conn, sql);
    let mut stmt = batch.next()?.ok_or(PanelDbError::EmptyQuery)?;
    // Any further text that compiles, or fails to, is a second statement
    if !matches!(batch.next(), Ok(None)) {
        return Err(PanelDbError::MultipleStatements);
    }

    let column_count = stmt.column_count();
    if column_count == 0 {
        stmt.execute([])?;
        return Ok(ResultSet::default());
    }

    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let mut rows = stmt.query([])?;
    let mut buffered = Vec::new();
    while let Some(row) = rows.next()? {
        let mut fields = Vec::with_capacity(column_count);
        for i in 0..column_count {
            fields.push(capture_field(row.get_ref(i)?));
        }
        buffered.push(Row::new(fields));
    }

    Ok(ResultSet::new(columns, buffered))
}

fn capture_field(value: ValueRef<'_>) -> Field {
    match value {
        ValueRef::Null => Field::null(),
        ValueRef::Integer(i) => Field::text(i.to_string()),
        ValueRef::Real(f) => Field::text(f.to_string()),
        ValueRef::Text(t) => Field::text(String::from_utf8_lossy(t)),
        ValueRef::Blob(b) => Field::binary(b),
    }
}
