use crate::core::db::{ConnectionParams, Database, QueryFormatter, DEFAULT_QUERY_CAPACITY};
use crate::core::{PanelDbError, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Connection parameters of one logical database, as written in the config file.
pub type DatabaseProfile = ConnectionParams;

/// Top-level configuration structure parsed from a TOML file.
///
/// The configuration is loaded once by the caller and handed to whatever
/// needs it; nothing here is global.
#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub query: QueryConfig,
    pub databases: DatabasesConfig,
    #[serde(default)]
    pub realms: Vec<RealmConfig>,
}

/// Query buffer configuration.
#[derive(Debug, Deserialize)]
pub struct QueryConfig {
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        QueryConfig {
            buffer_capacity: default_buffer_capacity(),
        }
    }
}

fn default_buffer_capacity() -> usize {
    DEFAULT_QUERY_CAPACITY
}

/// The panel's own database and the shared account database.
#[derive(Debug, Deserialize)]
pub struct DatabasesConfig {
    pub panel: DatabaseProfile,
    pub accounts: DatabaseProfile,
}

/// A game realm and its character database.
#[derive(Debug, Deserialize)]
pub struct RealmConfig {
    pub id: u32,
    pub name: String,
    pub characters: DatabaseProfile,
}

impl Config {
    /// Parses and validates configuration text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| PanelDbError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Default location: `<platform config dir>/panel-db/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("panel-db").join("config.toml"))
    }

    /// Character database profile of realm `id`.
    pub fn realm(&self, id: u32) -> Option<&RealmConfig> {
        self.realms.iter().find(|realm| realm.id == id)
    }

    /// Every configured database with a display label, panel and accounts first.
    pub fn profiles(&self) -> Vec<(String, &DatabaseProfile)> {
        let mut profiles = vec![
            ("panel".to_string(), &self.databases.panel),
            ("accounts".to_string(), &self.databases.accounts),
        ];
        profiles.extend(
            self.realms
                .iter()
                .map(|realm| (format!("characters[{}:{}]", realm.id, realm.name), &realm.characters)),
        );
        profiles
    }

    /// Formatter sized by `[query] buffer_capacity`.
    pub fn formatter(&self) -> QueryFormatter {
        QueryFormatter::new(self.query.buffer_capacity)
    }

    /// Creates a `Database` with this configuration's formatter and connects it to `profile`.
    pub fn open(&self, profile: &DatabaseProfile) -> Result<Database> {
        let mut db = Database::with_formatter(self.formatter());
        db.connect_profile(profile)?;
        Ok(db)
    }

    fn validate(&self) -> Result<()> {
        if self.query.buffer_capacity == 0 {
            return Err(PanelDbError::Config(
                "query.buffer_capacity must be greater than zero".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for realm in &self.realms {
            if !seen.insert(realm.id) {
                return Err(PanelDbError::Config(format!(
                    "duplicate realm id {}",
                    realm.id
                )));
            }
        }
        Ok(())
    }
}

/// Loads configuration from a TOML file at the given path.
///
/// # Arguments
///
/// * `path` - The file path to the TOML configuration file.
///
/// # Example
///
/// ```no_run
/// let config = panel_db::config::load_config("config.toml").expect("Failed to load config");
/// println!("{:?}", config.databases.accounts);
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    debug!("Loading configuration from {:?}", path.as_ref());
    let content = fs::read_to_string(path)?;
    Config::from_toml_str(&content)
}
