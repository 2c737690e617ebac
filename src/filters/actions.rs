//! Ingo actions and their zmprov clauses

use super::quote;

/// Ingo action codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterActionType {
    /// 1: deliver to the inbox
    Keep,
    /// 2: move into a folder
    Move,
    /// 3: delete the message
    Discard,
    /// 4: redirect to another address
    Redirect,
    /// 5: redirect and keep a copy
    RedirectKeep,
    /// 6: reject with a message
    Reject,
    /// 11: copy into a folder
    MoveKeep,
    /// 12: set a flag
    Flag,
    /// Codes without a Zimbra counterpart (blacklist, vacation, notify, ...)
    Other(String),
}

impl FilterActionType {
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "1" => FilterActionType::Keep,
            "2" => FilterActionType::Move,
            "3" => FilterActionType::Discard,
            "4" => FilterActionType::Redirect,
            "5" => FilterActionType::RedirectKeep,
            "6" => FilterActionType::Reject,
            "11" => FilterActionType::MoveKeep,
            "12" => FilterActionType::Flag,
            other => FilterActionType::Other(other.to_string()),
        }
    }

    /// Whether the rule is useless without an action value
    pub fn requires_value(&self) -> bool {
        matches!(self, FilterActionType::Move)
    }

    /// Zimbra action keyword and its argument token (empty when unused)
    pub fn clause(&self, action_value: &str) -> [String; 2] {
        let (keyword, takes_value) = match self {
            FilterActionType::Keep => ("keep", false),
            FilterActionType::Move => ("fileinto", true),
            FilterActionType::Redirect => ("redirect", true),
            FilterActionType::RedirectKeep => ("keep redirect", true),
            FilterActionType::MoveKeep => ("keep fileinto", true),
            FilterActionType::Flag => ("flag", true),
            FilterActionType::Discard
            | FilterActionType::Reject
            | FilterActionType::Other(_) => ("discard", false),
        };

        let argument = if takes_value {
            quote(action_value)
        } else {
            String::new()
        };

        [keyword.to_string(), argument]
    }
}
