//! Converter - writes the zmprov script for one mailbox

use crate::config::mailbox_uid;
use crate::db::{DbError, PrefsStore};
use crate::filters::{translate, Translation};
use crate::prefs::{decode_rules, PrefsError, UnicodeForm};
use std::io::Write;

/// Result type alias for conversions
pub type ConvertResult<T> = Result<T, ConvertError>;

/// Unified error type for a conversion run
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("Invalid mailbox: {0}")]
    InvalidMailbox(String),

    #[error("Database error: {0}")]
    Db(#[from] DbError),

    #[error("Could not decode stored rules: {0}")]
    Prefs(#[from] PrefsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Options that shape a conversion
#[derive(Debug, Clone, Copy, Default)]
pub struct ConvertOptions {
    /// Write skip reasons and missing rule lists to the diagnostic stream
    pub debug: bool,
    pub unicode_form: UnicodeForm,
}

/// What a conversion produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertSummary {
    pub converted: usize,
    pub skipped: usize,
}

/// Look up the rules of `mailbox` and write its zmprov script to `out`.
///
/// Nothing is written to `out` when the mailbox has no stored rules.
pub fn convert_mailbox<S, W, E>(
    store: &mut S,
    mailbox: &str,
    options: ConvertOptions,
    out: &mut W,
    diagnostics: &mut E,
) -> ConvertResult<ConvertSummary>
where
    S: PrefsStore + ?Sized,
    W: Write,
    E: Write,
{
    let mailbox = mailbox.trim();
    let uid = mailbox_uid(mailbox);
    if uid.is_empty() {
        return Err(ConvertError::InvalidMailbox(mailbox.to_string()));
    }

    let rules = match store.fetch_rules(uid)? {
        Some(raw) => decode_rules(&raw, options.unicode_form)?,
        None => Vec::new(),
    };

    if rules.is_empty() {
        log::info!("No rules stored for {}", mailbox);
        if options.debug {
            writeln!(diagnostics, "# No rules found for {}", mailbox)?;
        }
        return Ok(ConvertSummary::default());
    }

    log::info!("Converting {} rules for {}", rules.len(), mailbox);

    let mut summary = ConvertSummary::default();
    write!(out, "sm {} \n", mailbox)?;

    for rule in &rules {
        match translate(rule) {
            Translation::Statement(statement) => {
                out.write_all(statement.as_bytes())?;
                summary.converted += 1;
            }
            Translation::Skip(reason) => {
                log::debug!("{}", reason);
                if options.debug {
                    writeln!(diagnostics, "# {}", reason)?;
                }
                summary.skipped += 1;
            }
        }
    }

    out.write_all(b"exit\nexit\n")?;
    out.flush()?;

    log::info!(
        "Converted {} rules for {} ({} skipped)",
        summary.converted,
        mailbox,
        summary.skipped
    );

    Ok(summary)
}
