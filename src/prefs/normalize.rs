//! Unicode normalization of serialized preference values
//!
//! Normalizing changes the byte length of non-ASCII strings, which breaks the
//! `s:<len>:"..."` prefixes PHP wrote. Those prefixes are recomputed afterwards.

use lazy_static::lazy_static;
use regex_lite::{Captures, Regex};
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref SERIALIZED_STRING: Regex = Regex::new(r#"(?s)s:(\d+):"(.*?)";"#).unwrap();
}

/// Unicode normalization form applied before unserializing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum UnicodeForm {
    /// Canonical decomposition followed by canonical composition
    #[default]
    Nfc,
    /// Compatibility decomposition
    Nfkd,
}

/// Normalize a raw preference value and repair its string length prefixes
pub fn normalize(raw: &[u8], form: UnicodeForm) -> String {
    let text = String::from_utf8_lossy(raw);
    let normalized: String = match form {
        UnicodeForm::Nfc => text.nfc().collect(),
        UnicodeForm::Nfkd => text.nfkd().collect(),
    };

    if normalized.as_bytes() == raw {
        normalized
    } else {
        fix_string_lengths(&normalized)
    }
}

/// Rewrite every `s:<len>:"<text>";` with the byte length of `<text>`
pub fn fix_string_lengths(serialized: &str) -> String {
    SERIALIZED_STRING
        .replace_all(serialized, |caps: &Captures| {
            format!("s:{}:\"{}\";", caps[2].len(), &caps[2])
        })
        .into_owned()
}
