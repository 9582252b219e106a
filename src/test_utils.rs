/// # Test Utilities Module
///
/// Fixtures that lay out a disposable database host on disk, seeded the way
/// the panel's databases look, so tests can connect with ordinary
/// connection parameters.

use crate::core::db::{ConnectionParams, DATABASE_EXTENSION};
use crate::core::Result;
use rusqlite::Connection;
use tempfile::TempDir;

/// Name of the seeded account database
pub const ACCOUNTS_DB: &str = "realmd";
/// Name of the seeded character database
pub const CHARACTERS_DB: &str = "characters1";

/// Seeded accounts: (id, username, sha_pass_hash, gmlevel, email)
pub const ACCOUNTS: [(i64, &str, &str, i64, &str); 3] = [
    (7, "alice", "ABCD", 0, "alice@example.com"),
    (8, "bob", "EF01", 3, "bob@example.com"),
    (9, "carol", "2345", 1, "carol@example.com"),
];

/// A temporary host directory holding seeded database files
pub struct HostFixture {
    pub dir: TempDir,
}

impl HostFixture {
    /// Creates an empty host directory
    pub fn new() -> Result<Self> {
        Ok(HostFixture {
            dir: TempDir::new()?,
        })
    }

    /// Creates a host with the account and character databases seeded
    pub fn with_sample_data() -> Result<Self> {
        let fixture = Self::new()?;
        fixture.seed_accounts()?;
        fixture.seed_characters()?;
        Ok(fixture)
    }

    /// Host value for connection parameters
    pub fn host(&self) -> String {
        self.dir.path().to_string_lossy().into_owned()
    }

    /// Connection parameters for `database` on this host
    pub fn params(&self, database: &str) -> ConnectionParams {
        ConnectionParams::new(self.host(), "panel", "panel-secret", 3306, database)
    }

    /// Opens (creating if needed) a database file directly, bypassing the layer
    pub fn raw_connection(&self, database: &str) -> Result<Connection> {
        let path = self
            .dir
            .path()
            .join(database)
            .with_extension(DATABASE_EXTENSION);
        Ok(Connection::open(path)?)
    }

    fn seed_accounts(&self) -> Result<()> {
        let conn = self.raw_connection(ACCOUNTS_DB)?;
        conn.execute_batch(
            "
            CREATE TABLE account (
                id INTEGER PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                sha_pass_hash TEXT NOT NULL,
                gmlevel INTEGER NOT NULL DEFAULT 0,
                email TEXT,
                locked INTEGER NOT NULL DEFAULT 0,
                last_ip TEXT
            );
            ",
        )?;

        for (id, username, hash, gmlevel, email) in ACCOUNTS {
            conn.execute(
                "INSERT INTO account (id, username, sha_pass_hash, gmlevel, email) VALUES (?, ?, ?, ?, ?)",
                rusqlite::params![id, username, hash, gmlevel, email],
            )?;
        }
        Ok(())
    }

    fn seed_characters(&self) -> Result<()> {
        let conn = self.raw_connection(CHARACTERS_DB)?;
        conn.execute_batch(
            "
            CREATE TABLE characters (
                guid INTEGER PRIMARY KEY,
                account INTEGER NOT NULL,
                name TEXT NOT NULL,
                level INTEGER NOT NULL DEFAULT 1,
                online INTEGER NOT NULL DEFAULT 0
            );
            INSERT INTO characters VALUES (1, 7, 'Aliceth', 80, 1);
            INSERT INTO characters VALUES (2, 7, 'Alicebank', 1, 0);
            INSERT INTO characters VALUES (3, 8, 'Bobbin', 42, 0);
            ",
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_data_fixture() {
        let fixture = HostFixture::with_sample_data().unwrap();
        let conn = fixture.raw_connection(ACCOUNTS_DB).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM account", [], |row| row.get(0))
            .expect("Failed to count accounts");
        assert_eq!(count, ACCOUNTS.len() as i64);
    }

    #[test]
    fn test_params_point_into_fixture() {
        let fixture = HostFixture::new().unwrap();
        let params = fixture.params(ACCOUNTS_DB);
        assert_eq!(params.host, fixture.host());
        assert!(params
            .database_path()
            .unwrap()
            .starts_with(fixture.dir.path()));
    }
}
