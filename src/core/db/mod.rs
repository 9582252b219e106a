/// Database Module
///
/// The database access layer every page uses to talk to the panel, account
/// and per-realm character databases.
///
/// ## Architecture
///
/// - **Connection Management** (`connection.rs`): one live handle per instance, connect/select/disconnect
/// - **Query Formatting** (`format.rs`): printf-style templates expanded into a bounded buffer
/// - **Escaping** (`escape.rs`): making untrusted text safe to splice into a template
/// - **Query Execution** (`query.rs`): the `Database` instance and its sentinel outcomes
/// - **Result Buffer** (`result.rs`) and **Typed Fields** (`field.rs`): eagerly copied rows and on-demand decoders
///
/// ## Error Handling
///
/// Connection and formatting operations return `PanelDbError`. Query
/// execution reports a `QueryOutcome` and keeps the error as the instance's
/// last error.
pub mod connection;
pub mod escape;
pub mod field;
pub mod format;
pub mod query;
pub mod result;

pub use connection::*;
pub use escape::*;
pub use field::*;
pub use format::*;
pub use query::*;
pub use result::*;
