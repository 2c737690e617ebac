//! Command line configuration

use crate::db::DatabaseConfig;
use crate::prefs::UnicodeForm;
use clap::Parser;
use std::path::PathBuf;

/// Read Horde / Ingo rules from the preferences database and write a script
/// which can be piped to Zimbra's zmprov command.
#[derive(Debug, Clone, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Mailbox whose rules are converted
    #[arg(value_name = "mailbox")]
    pub mailbox: String,

    /// Database host (default localhost)
    #[arg(short = 'H', long, value_name = "host", env = "HORDE_DB_HOST", default_value = "localhost")]
    pub database_host: String,

    /// Database port (default 3306)
    #[arg(short = 'P', long, value_name = "port", env = "HORDE_DB_PORT", default_value_t = 3306)]
    pub database_port: u16,

    /// Database name (default horde)
    #[arg(short = 'd', long = "database", value_name = "database", env = "HORDE_DB_NAME", default_value = "horde")]
    pub database_name: String,

    /// Database user name
    #[arg(short = 'u', long, value_name = "user", env = "HORDE_DB_USER")]
    pub database_user: Option<String>,

    /// Database password
    #[arg(short = 'p', long, value_name = "password", env = "HORDE_DB_PASSWORD", hide_env_values = true)]
    pub database_password: Option<String>,

    /// Read preferences from a SQLite Horde database instead of MySQL
    #[arg(long, value_name = "path", env = "HORDE_DB_SQLITE")]
    pub sqlite: Option<PathBuf>,

    /// Unicode normalization applied to the stored rules
    #[arg(long, value_enum, default_value_t = UnicodeForm::Nfc)]
    pub unicode_form: UnicodeForm,

    /// Write warnings when skipping invalid or unwanted rules
    #[arg(short = 'D', long)]
    pub debug: bool,
}

impl Config {
    pub fn database(&self) -> DatabaseConfig {
        DatabaseConfig {
            host: self.database_host.clone(),
            port: self.database_port,
            name: self.database_name.clone(),
            user: self.database_user.clone(),
            password: self.database_password.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if mailbox_uid(&self.mailbox).is_empty() {
            errors.push(format!("Invalid mailbox '{}'", self.mailbox));
        }
        if self.database_host.is_empty() && self.sqlite.is_none() {
            errors.push("Database host is required".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Horde preference uid of a mailbox: its local part
pub fn mailbox_uid(mailbox: &str) -> &str {
    let mailbox = mailbox.trim();
    match mailbox.split_once('@') {
        Some((local, _)) => local,
        None => mailbox,
    }
}
