//! Database module for the Horde preferences table
//!
//! Provides the single lookup the converter needs: the serialized Ingo
//! `rules` preference of one user, read from MySQL or SQLite.

use mysql::prelude::Queryable;
use mysql::{Conn, OptsBuilder};
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::path::Path;
use thiserror::Error;

/// Lookup of one preference value; parameters are uid, scope and name
pub const PREFS_QUERY: &str = "SELECT pref_uid AS mailbox_id, pref_value AS rules \
     FROM horde_prefs \
     WHERE pref_uid = ? \
     AND pref_scope = ? \
     AND pref_name = ?";

/// Preference scope written by Ingo
pub const INGO_SCOPE: &str = "ingo";

/// Preference holding the serialized rule list
pub const RULES_PREF: &str = "rules";

/// Database error types
#[derive(Error, Debug)]
pub enum DbError {
    #[error("MySQL error: {0}")]
    Mysql(#[from] mysql::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Unexpected value type for preference of {0}")]
    InvalidValue(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// MySQL connection settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3306,
            name: "horde".to_string(),
            user: None,
            password: None,
        }
    }
}

/// Source of stored Ingo rule lists
pub trait PrefsStore {
    /// Raw `rules` preference of `uid`, `None` when the user has none stored
    fn fetch_rules(&mut self, uid: &str) -> DbResult<Option<Vec<u8>>>;
}

/// Horde preferences in a MySQL database
pub struct MysqlStore {
    conn: Conn,
}

impl MysqlStore {
    pub fn connect(config: &DatabaseConfig) -> DbResult<Self> {
        log::info!(
            "Connecting to MySQL database '{}' at {}:{}",
            config.name,
            config.host,
            config.port
        );

        let opts = OptsBuilder::new()
            .ip_or_hostname(Some(config.host.clone()))
            .tcp_port(config.port)
            .db_name(Some(config.name.clone()))
            .user(config.user.clone())
            .pass(config.password.clone());

        Ok(Self {
            conn: Conn::new(opts)?,
        })
    }
}

impl PrefsStore for MysqlStore {
    fn fetch_rules(&mut self, uid: &str) -> DbResult<Option<Vec<u8>>> {
        let row: Option<(String, Option<Vec<u8>>)> = self
            .conn
            .exec_first(PREFS_QUERY, (uid, INGO_SCOPE, RULES_PREF))?;
        row.map(|(_, rules)| stored_value(uid, rules)).transpose()
    }
}

/// Horde preferences in a SQLite database
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open an existing Horde database read-only
    pub fn open(path: &Path) -> DbResult<Self> {
        log::info!("Opening SQLite database {:?}", path);
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        Ok(Self { conn })
    }

    /// Wrap an already opened connection
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }
}

impl PrefsStore for SqliteStore {
    fn fetch_rules(&mut self, uid: &str) -> DbResult<Option<Vec<u8>>> {
        self.conn
            .query_row(PREFS_QUERY, params![uid, INGO_SCOPE, RULES_PREF], |row| {
                Ok(match row.get_ref(1)? {
                    ValueRef::Text(bytes) | ValueRef::Blob(bytes) => Some(bytes.to_vec()),
                    ValueRef::Null => None,
                    ValueRef::Integer(_) | ValueRef::Real(_) => None,
                })
            })
            .optional()?
            .map(|value| stored_value(uid, value))
            .transpose()
    }
}

/// A found row must carry text or bytes
fn stored_value(uid: &str, value: Option<Vec<u8>>) -> DbResult<Vec<u8>> {
    value.ok_or_else(|| DbError::InvalidValue(uid.to_string()))
}
