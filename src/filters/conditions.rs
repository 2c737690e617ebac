//! Filter condition validation and clause rendering

use super::{optional_string, quote};
use lazy_static::lazy_static;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    /// Leading number and the first unit letter of a size value
    static ref SIZE_VALUE: Regex = Regex::new(r"^\s*(\d+)\s*([A-Za-z]?)").unwrap();
}

/// Address headers tested with `address` instead of `header`
const ADDRESS_FIELDS: &[&str] = &["From", "To", "Cc"];

/// Single Ingo rule condition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCondition {
    #[serde(default)]
    pub field: String,
    #[serde(rename = "match", default)]
    pub operator: String,
    #[serde(default, deserialize_with = "empty_if_missing")]
    pub value: String,
}

/// Kind of test a condition field turns into
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionField<'a> {
    Size,
    Address(&'a str),
    Header(String),
}

impl<'a> ConditionField<'a> {
    pub fn classify(field: &'a str) -> Self {
        if field.eq_ignore_ascii_case("size") {
            ConditionField::Size
        } else if ADDRESS_FIELDS.iter().any(|f| f.eq_ignore_ascii_case(field)) {
            ConditionField::Address(field)
        } else {
            ConditionField::Header(field.to_lowercase())
        }
    }
}

/// Ingo match operators that have a Zimbra counterpart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionOperator {
    Is,
    Contains,
    BeginsWith,
    EndsWith,
    Equal,
    NotContain,
    Exists,
    NotExists,
    GreaterThan,
    LessThan,
}

impl ConditionOperator {
    /// Parse an Ingo `match` value, `None` for unsupported operators
    /// such as `regex`, `less` and `greater`
    pub fn from_ingo(operator: &str) -> Option<Self> {
        match operator {
            "is" => Some(ConditionOperator::Is),
            "contains" => Some(ConditionOperator::Contains),
            "begins with" => Some(ConditionOperator::BeginsWith),
            "ends with" => Some(ConditionOperator::EndsWith),
            "equal" => Some(ConditionOperator::Equal),
            "not contain" => Some(ConditionOperator::NotContain),
            "exists" => Some(ConditionOperator::Exists),
            "not exists" => Some(ConditionOperator::NotExists),
            "greater than" => Some(ConditionOperator::GreaterThan),
            "less than" => Some(ConditionOperator::LessThan),
            _ => None,
        }
    }

    /// Zimbra comparison keyword
    pub fn zimbra_keyword(&self) -> &'static str {
        match self {
            ConditionOperator::Is | ConditionOperator::Equal => "is",
            ConditionOperator::Contains
            | ConditionOperator::BeginsWith
            | ConditionOperator::EndsWith
            | ConditionOperator::Exists => "contains",
            ConditionOperator::NotContain | ConditionOperator::NotExists => "not_contains",
            ConditionOperator::GreaterThan => "over",
            ConditionOperator::LessThan => "under",
        }
    }
}

impl FilterCondition {
    pub fn operator(&self) -> Option<ConditionOperator> {
        ConditionOperator::from_ingo(&self.operator)
    }

    /// A condition can be translated only with a value and a supported operator
    pub fn is_valid(&self) -> bool {
        !self.value.is_empty() && self.operator().is_some()
    }

    /// Zimbra clause tokens, `None` for invalid conditions
    pub fn clause(&self) -> Option<Vec<String>> {
        if !self.is_valid() {
            return None;
        }
        let keyword = self.operator()?.zimbra_keyword();

        let tokens = match ConditionField::classify(&self.field) {
            ConditionField::Size => vec![
                "size".to_string(),
                keyword.to_string(),
                quote(&normalize_size(&self.value)),
            ],
            ConditionField::Address(field) => vec![
                "address".to_string(),
                quote(field),
                "all".to_string(),
                keyword.to_string(),
                quote(&self.value),
            ],
            ConditionField::Header(field) => vec![
                "header".to_string(),
                quote(&field),
                String::new(),
                keyword.to_string(),
                quote(&self.value),
            ],
        };

        Some(tokens)
    }
}

/// Reduce an Ingo size such as `500KB` to Zimbra's `500K`
pub fn normalize_size(value: &str) -> String {
    match SIZE_VALUE.captures(value) {
        Some(caps) => format!("{}{}", &caps[1], caps[2].to_uppercase()),
        None => value.trim().to_string(),
    }
}

fn empty_if_missing<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(optional_string(deserializer)?.unwrap_or_default())
}
