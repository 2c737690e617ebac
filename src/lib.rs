//! # Ingo to Zimbra
//!
//! Reads Horde / Ingo filter rules from the Horde preferences database and
//! writes a script which can be piped to Zimbra's `zmprov` command.

pub mod config;
pub mod convert;
pub mod db;
pub mod filters;
pub mod prefs;

use config::Config;
use convert::{convert_mailbox, ConvertOptions, ConvertResult, ConvertSummary};
use db::{MysqlStore, PrefsStore, SqliteStore};

// ============================================================================
// Application Entry Point
// ============================================================================

/// Convert the rules of the configured mailbox, writing the script to stdout
/// and diagnostics to stderr
pub fn run(config: &Config) -> ConvertResult<ConvertSummary> {
    let mut store: Box<dyn PrefsStore> = match &config.sqlite {
        Some(path) => Box::new(SqliteStore::open(path)?),
        None => Box::new(MysqlStore::connect(&config.database())?),
    };

    let options = ConvertOptions {
        debug: config.debug,
        unicode_form: config.unicode_form,
    };

    let stdout = std::io::stdout();
    let stderr = std::io::stderr();
    convert_mailbox(
        store.as_mut(),
        &config.mailbox,
        options,
        &mut stdout.lock(),
        &mut stderr.lock(),
    )
}
