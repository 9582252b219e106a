/// Core Module for panel-db
///
/// This module contains the database access layer and the error type it
/// reports through.

pub mod db;
pub mod error;

// Re-export commonly used types for convenience
pub use error::{PanelDbError, Result};
