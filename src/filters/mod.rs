//! Ingo filter rules and their translation into zmprov statements
//!
//! Provides the decoded rule records plus the stateless translator that
//! turns each rule into one `afrl` statement or a skip reason.

pub mod actions;
pub mod conditions;
pub mod engine;

pub use actions::FilterActionType;
pub use conditions::{ConditionField, ConditionOperator, FilterCondition};
pub use engine::{translate, SkipReason, Translation};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Filter rule as stored in the Ingo `rules` preference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngoRule {
    pub name: String,
    #[serde(default, deserialize_with = "scalar_string")]
    pub action: String,
    #[serde(
        rename = "action-value",
        default,
        deserialize_with = "optional_string"
    )]
    pub action_value: Option<String>,
    #[serde(default)]
    pub combine: MatchLogic,
    #[serde(default, deserialize_with = "condition_list")]
    pub conditions: Vec<FilterCondition>,
    #[serde(default, deserialize_with = "truthy")]
    pub stop: bool,
}

impl IngoRule {
    /// Action to perform when the rule matches
    pub fn action_type(&self) -> FilterActionType {
        FilterActionType::from_code(&self.action)
    }

    /// Action value, treating a missing value as empty
    pub fn action_value(&self) -> &str {
        self.action_value.as_deref().unwrap_or("")
    }
}

/// Match logic for multiple conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MatchLogic {
    All, // combine "1"
    #[default]
    Any, // anything else
}

impl MatchLogic {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchLogic::All => "all",
            MatchLogic::Any => "any",
        }
    }

    /// Ingo stores the combine mode as "1" (all) or "2" (any)
    pub fn from_ingo(code: &str) -> Self {
        match code.trim() {
            "1" => MatchLogic::All,
            _ => MatchLogic::Any,
        }
    }
}

impl<'de> Deserialize<'de> for MatchLogic {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::String(ref s) if s == "all" => MatchLogic::All,
            other => MatchLogic::from_ingo(&value_to_string(&other).unwrap_or_default()),
        })
    }
}

/// Double-quote a zmprov argument
pub(crate) fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Render a PHP scalar the way PHP would cast it to a string
pub(crate) fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("1".to_string()),
        Value::Bool(false) => Some(String::new()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// PHP truthiness
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn scalar_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_string(&value).unwrap_or_default())
}

pub(crate) fn optional_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_string(&value))
}

fn truthy<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(is_truthy(&value))
}

/// PHP arrays with non-sequential keys decode as objects; keep their order
fn condition_list<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<FilterCondition>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let items: Vec<Value> = match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items,
        Value::Object(map) => map.into_iter().map(|(_, v)| v).collect(),
        _ => return Err(serde::de::Error::custom("conditions must be an array")),
    };

    items
        .into_iter()
        .map(|item| serde_json::from_value(item).map_err(serde::de::Error::custom))
        .collect()
}
