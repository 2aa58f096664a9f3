/// Optional database sink.
///
/// Appends bike-station records to `stations(name, available_bikes)` in one
/// transaction. Nothing is ever read back.
///
/// Connection parameters, in order of precedence:
///   1. `DATABASE_URL` (environment or `.env`)
///   2. the file named by `STATION_FEED_DB_CONFIG`, else `config/database.json`
///
/// The file is JSON; a `.toml` file with the same keys is accepted too:
///
/// ```json
/// { "host": "localhost", "port": 5432, "user": "feed", "password": "…", "dbname": "bikes" }
/// ```
///
/// or `{ "url": "jdbc:postgresql://localhost:5432/bikes", "user": "feed" }`.

use postgres::{Client, NoTls};
use serde::Deserialize;
use std::fmt;
use std::path::Path;

use crate::logging::{self, DataSource};
use crate::model::{ConfigError, StationRecord};

pub const DB_CONFIG_PATH: &str = "config/database.json";
pub const DB_CONFIG_PATH_ENV: &str = "STATION_FEED_DB_CONFIG";
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

pub const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS stations (
    id              SERIAL PRIMARY KEY,
    name            TEXT NOT NULL,
    available_bikes INTEGER NOT NULL
)";

const INSERT_SQL: &str = "INSERT INTO stations (name, available_bikes) VALUES ($1, $2)";

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub enum SinkError {
    Config(ConfigError),
    Database(postgres::Error),
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkError::Config(e) => e.fmt(f),
            SinkError::Database(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for SinkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SinkError::Config(e) => Some(e),
            SinkError::Database(e) => Some(e),
        }
    }
}

impl From<ConfigError> for SinkError {
    fn from(e: ConfigError) -> Self {
        SinkError::Config(e)
    }
}

impl From<postgres::Error> for SinkError {
    fn from(e: postgres::Error) -> Self {
        SinkError::Database(e)
    }
}

// ============================================================================
// Connection configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DbConfig {
    /// `postgresql://…` or JDBC-style `jdbc:postgresql://…`.
    pub url: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub dbname: Option<String>,
}

/// Quotes a libpq key/value parameter when it contains spaces or quotes.
fn quote_param(value: &str) -> String {
    if !value.is_empty() && !value.contains([' ', '\'', '\\']) {
        return value.to_string();
    }
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{}'", escaped)
}

impl DbConfig {
    pub fn from_json_str(text: &str, origin: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|e| ConfigError::Malformed {
            path: origin.to_string(),
            message: e.to_string(),
        })
    }

    pub fn from_toml_str(text: &str, origin: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Malformed {
            path: origin.to_string(),
            message: e.to_string(),
        })
    }

    /// Reads a JSON (or, by extension, TOML) connection file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let origin = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: origin.clone(),
            message: e.to_string(),
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&text, &origin),
            _ => Self::from_json_str(&text, &origin),
        }
    }

    /// A connection string `postgres::Client::connect` accepts.
    ///
    /// With `url` set, the URL is used minus any `jdbc:` prefix, and `user`
    /// and `password` are merged into it.
    pub fn connection_string(&self) -> Result<String, ConfigError> {
        if let Some(url) = &self.url {
            let url = url.strip_prefix("jdbc:").unwrap_or(url);
            if self.user.is_none() && self.password.is_none() {
                return Ok(url.to_string());
            }
            return self.merge_credentials(url);
        }

        let dbname = self.dbname.as_deref().ok_or(ConfigError::MissingDatabase)?;
        let mut parts = vec![
            format!("host={}", quote_param(self.host.as_deref().unwrap_or("localhost"))),
            format!("port={}", self.port.unwrap_or(5432)),
            format!("dbname={}", quote_param(dbname)),
        ];
        if let Some(user) = &self.user {
            parts.push(format!("user={}", quote_param(user)));
        }
        if let Some(password) = &self.password {
            parts.push(format!("password={}", quote_param(password)));
        }
        Ok(parts.join(" "))
    }

    /// Puts `user`/`password` into the authority part of `url`.
    fn merge_credentials(&self, url: &str) -> Result<String, ConfigError> {
        let mut parsed = reqwest::Url::parse(url).map_err(|e| ConfigError::Malformed {
            path: "url".to_string(),
            message: e.to_string(),
        })?;
        let rejected = |_| ConfigError::Malformed {
            path: "url".to_string(),
            message: "URL cannot carry credentials".to_string(),
        };
        if let Some(user) = &self.user {
            parsed.set_username(user).map_err(rejected)?;
        }
        if let Some(password) = &self.password {
            parsed.set_password(Some(password)).map_err(rejected)?;
        }
        Ok(parsed.to_string())
    }
}

/// Finds connection parameters from the environment or the config file.
pub fn resolve_connection_string<F>(env: F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = env(DATABASE_URL_ENV).filter(|u| !u.trim().is_empty()) {
        return Ok(url);
    }
    // An explicitly named file must exist; only the default path is optional.
    if let Some(path) = env(DB_CONFIG_PATH_ENV) {
        return DbConfig::load(Path::new(&path))?.connection_string();
    }
    let path = Path::new(DB_CONFIG_PATH);
    if !path.exists() {
        return Err(ConfigError::MissingDatabase);
    }
    DbConfig::load(path)?.connection_string()
}

// ============================================================================
// Insert
// ============================================================================

/// The `(name, available_bikes)` rows a record list contributes. Weather
/// records and counts outside the column's range are left out.
pub fn bike_rows(records: &[StationRecord]) -> Vec<(&str, i32)> {
    records
        .iter()
        .filter_map(|r| {
            let count = r.available_bikes()?;
            let count = i32::try_from(count).ok()?;
            Some((r.name.as_str(), count))
        })
        .collect()
}

pub fn connect(connection_string: &str) -> Result<Client, SinkError> {
    let client = Client::connect(connection_string, NoTls)?;
    logging::debug(DataSource::Database, None, "Connected");
    Ok(client)
}

pub fn ensure_table(client: &mut Client) -> Result<(), SinkError> {
    client.batch_execute(CREATE_TABLE_SQL)?;
    Ok(())
}

/// Inserts every bike row in one transaction. Returns the number of rows
/// written; either all rows land or none do.
pub fn insert_stations(client: &mut Client, records: &[StationRecord]) -> Result<u64, SinkError> {
    let rows = bike_rows(records);
    let dropped = records.len() - rows.len();
    if dropped > 0 {
        logging::warn(
            DataSource::Database,
            None,
            &format!("{} records have no storable bike count and were not inserted", dropped),
        );
    }
    if rows.is_empty() {
        return Ok(0);
    }

    let mut tx = client.transaction()?;
    let statement = tx.prepare(INSERT_SQL)?;
    let mut inserted = 0;
    for (name, count) in &rows {
        inserted += tx.execute(&statement, &[name, count])?;
    }
    tx.commit()?;

    logging::info(
        DataSource::Database,
        None,
        &format!("Inserted {} rows into stations", inserted),
    );
    Ok(inserted)
}

// ============================================================================
// Tests
// ============================================================================
