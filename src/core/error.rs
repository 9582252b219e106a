/// Panel DB Error Module
///
/// This module defines the error type shared by the whole database access
/// layer. Connection and formatting operations return it directly; the query
/// executor stores it as the instance's last error and reports a sentinel
/// outcome instead.
use thiserror::Error;

/// Error code for operations attempted without an open connection.
pub const CODE_NOT_CONNECTED: i32 = -1;
/// Error code for an empty query string.
pub const CODE_EMPTY_QUERY: i32 = -2;
/// Error code for a formatted query that exceeds the buffer capacity.
pub const CODE_OVERFLOW: i32 = -3;
/// Error code for template/argument mismatches.
pub const CODE_FORMAT: i32 = -4;
/// Error code for connection failures not raised by SQLite itself.
pub const CODE_CONNECT: i32 = -5;
/// Error code for configuration problems.
pub const CODE_CONFIG: i32 = -6;
/// Error code for file system failures.
pub const CODE_IO: i32 = -7;
/// Error code for backend errors that carry no SQLite result code.
pub const CODE_BACKEND: i32 = -8;
/// Error code for a query string holding more than one statement.
pub const CODE_MULTIPLE_STATEMENTS: i32 = -9;

/// Error type for the database access layer.
///
/// Covers the failure taxonomy of the layer:
/// - Connection failures (unknown database, unreachable host directory)
/// - Query errors reported by the backend
/// - Query overflow while formatting into the bounded buffer
/// - Template/argument mismatches
/// - Configuration and I/O problems
#[derive(Error, Debug)]
pub enum PanelDbError {
    /// Errors reported by SQLite
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// An operation needed a live connection and none was open
    #[error("Not connected to a database")]
    NotConnected,

    /// The query string was empty or whitespace only
    #[error("Query was empty")]
    EmptyQuery,

    /// The query string held more than one statement
    #[error("Query holds more than one statement")]
    MultipleStatements,

    /// The expanded query does not fit the query buffer
    #[error("Query overflow: {required} bytes required, buffer holds {capacity}")]
    Overflow { required: usize, capacity: usize },

    /// Template and argument list do not agree
    #[error("Format error: {0}")]
    Format(String),

    /// Connection parameters could not be resolved to a database
    #[error("Connection error: {0}")]
    Connect(String),

    /// Configuration loading and validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system and I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PanelDbError {
    /// Returns the numeric code reported through `last_error_code()`.
    ///
    /// SQLite failures expose their extended result code (always positive);
    /// errors raised by this layer use the negative `CODE_*` constants.
    pub fn code(&self) -> i32 {
        match self {
            PanelDbError::Database(rusqlite::Error::SqliteFailure(err, _)) => err.extended_code,
            // Rejected SQL text (syntax errors, unknown tables) from prepare
            PanelDbError::Database(rusqlite::Error::SqlInputError { error, .. }) => {
                error.extended_code
            }
            PanelDbError::Database(_) => CODE_BACKEND,
            PanelDbError::NotConnected => CODE_NOT_CONNECTED,
            PanelDbError::EmptyQuery => CODE_EMPTY_QUERY,
            PanelDbError::MultipleStatements => CODE_MULTIPLE_STATEMENTS,
            PanelDbError::Overflow { .. } => CODE_OVERFLOW,
            PanelDbError::Format(_) => CODE_FORMAT,
            PanelDbError::Connect(_) => CODE_CONNECT,
            PanelDbError::Config(_) => CODE_CONFIG,
            PanelDbError::Io(_) => CODE_IO,
        }
    }

    /// Returns true for the overflow failure of the query formatter.
    pub fn is_overflow(&self) -> bool {
        matches!(self, PanelDbError::Overflow { .. })
    }
}

/// Type alias for Result to use PanelDbError as the error type.
pub type Result<T> = std::result::Result<T, PanelDbError>;
