//! Horde preference decoding
//!
//! Turns the raw `rules` preference value stored by Ingo into ordered
//! `IngoRule` records.

pub mod normalize;
pub mod php;

pub use normalize::UnicodeForm;

use crate::filters::IngoRule;
use serde_json::Value;

/// Result type alias for preference decoding
pub type PrefsResult<T> = Result<T, PrefsError>;

/// Errors while decoding a stored preference value
#[derive(Debug, thiserror::Error)]
pub enum PrefsError {
    #[error("Malformed serialized data at byte {offset}: {message}")]
    Syntax { offset: usize, message: String },

    #[error("Unsupported serialized data: {0}")]
    Unsupported(String),

    #[error("Rules preference is not a list")]
    NotAList,

    #[error("Invalid rule at position {index}: {source}")]
    Rule {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Decode the Ingo `rules` preference into rules in stored order
pub fn decode_rules(raw: &[u8], form: UnicodeForm) -> PrefsResult<Vec<IngoRule>> {
    if raw.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(Vec::new());
    }

    let normalized = normalize::normalize(raw, form);
    let items = match php::unserialize(normalized.as_bytes())? {
        Value::Array(items) => items,
        Value::Object(map) => map.into_iter().map(|(_, rule)| rule).collect(),
        Value::Null | Value::Bool(false) => Vec::new(),
        _ => return Err(PrefsError::NotAList),
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item).map_err(|source| PrefsError::Rule { index, source })
        })
        .collect()
}
