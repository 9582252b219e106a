// Core infrastructure modules
pub mod core;

// Configuration of the logical databases
pub mod config;

#[cfg(test)]
pub mod test_utils;

pub use crate::core::db::{Database, QueryOutcome};
pub use crate::core::{PanelDbError, Result};
