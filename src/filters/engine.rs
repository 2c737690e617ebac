//! Rule translator - turns Ingo rules into zmprov `afrl` statements

use super::{quote, FilterCondition, IngoRule};
use std::fmt;

/// Rules Ingo creates on its own for its built-in features
const DEFAULT_RULES: &[&str] = &["Whitelist", "Vacation", "Blacklist", "Forward"];

/// Rule shapes generated by the source installation that Zimbra already covers
struct SuperfluousRule {
    action: &'static str,
    field: &'static str,
    reason: fn(String) -> SkipReason,
}

const SUPERFLUOUS_RULES: &[SuperfluousRule] = &[
    SuperfluousRule {
        action: "2",
        field: "X-Spam-Flag",
        reason: SkipReason::RedundantSpam,
    },
    SuperfluousRule {
        action: "14",
        field: "X-Spam-Flag",
        reason: SkipReason::SmsNotification,
    },
];

/// Outcome of translating a single rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Translation {
    /// Newline-terminated statement for the zmprov script
    Statement(String),
    /// Nothing to write
    Skip(SkipReason),
}

/// Why a rule produced no statement. Each variant carries the rule name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    DefaultRule(String),
    RedundantSpam(String),
    SmsNotification(String),
    NoValidConditions(String),
    MissingActionValue(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::DefaultRule(name) => write!(f, "Skipping Ingo default rule \"{}\"", name),
            SkipReason::RedundantSpam(name) => {
                write!(f, "Skipping redundant spam rule \"{}\"", name)
            }
            SkipReason::SmsNotification(name) => {
                write!(f, "Skipping SMS notification rule \"{}\"", name)
            }
            SkipReason::NoValidConditions(name) => write!(
                f,
                "Skipping rule \"{}\" because it has no valid conditions",
                name
            ),
            SkipReason::MissingActionValue(name) => write!(
                f,
                "Skipping rule \"{}\" because it requires an action value but provided none",
                name
            ),
        }
    }
}

/// Translate one rule into a zmprov `afrl` statement
pub fn translate(rule: &IngoRule) -> Translation {
    if let Some(reason) = skip_reason(rule) {
        return Translation::Skip(reason);
    }

    let clauses: Vec<Vec<String>> = rule
        .conditions
        .iter()
        .filter_map(FilterCondition::clause)
        .collect();
    if clauses.is_empty() {
        return Translation::Skip(SkipReason::NoValidConditions(rule.name.clone()));
    }

    let action = rule.action_type();
    if action.requires_value() && rule.action_value().is_empty() {
        return Translation::Skip(SkipReason::MissingActionValue(rule.name.clone()));
    }

    let mut tokens = vec![
        "afrl".to_string(),
        quote(&rule.name),
        "active".to_string(),
        rule.combine.as_str().to_string(),
    ];
    tokens.extend(clauses.into_iter().flatten());
    tokens.push(String::new());
    tokens.extend(action.clause(rule.action_value()));
    tokens.push(if rule.stop { "stop" } else { "" }.to_string());

    let mut statement = tokens.join(" ");
    statement.push('\n');
    Translation::Statement(statement)
}

/// Skips decided by the rule name and shape alone
fn skip_reason(rule: &IngoRule) -> Option<SkipReason> {
    if DEFAULT_RULES.contains(&rule.name.as_str()) {
        return Some(SkipReason::DefaultRule(rule.name.clone()));
    }

    SUPERFLUOUS_RULES
        .iter()
        .find(|pattern| {
            rule.action.trim() == pattern.action
                && rule
                    .conditions
                    .iter()
                    .any(|c| c.field.eq_ignore_ascii_case(pattern.field))
        })
        .map(|pattern| (pattern.reason)(rule.name.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::MatchLogic;

    fn condition(field: &str, operator: &str, value: &str) -> FilterCondition {
        FilterCondition {
            field: field.to_string(),
            operator: operator.to_string(),
            value: value.to_string(),
        }
    }

    fn rule(
        name: &str,
        action: &str,
        action_value: Option<&str>,
        combine: MatchLogic,
        conditions: Vec<FilterCondition>,
        stop: bool,
    ) -> IngoRule {
        IngoRule {
            name: name.to_string(),
            action: action.to_string(),
            action_value: action_value.map(str::to_string),
            combine,
            conditions,
            stop,
        }
    }

    fn statement(rule: &IngoRule) -> String {
        match translate(rule) {
            Translation::Statement(line) => line,
            Translation::Skip(reason) => panic!("rule was skipped: {}", reason),
        }
    }

    fn skipped(rule: &IngoRule) -> String {
        match translate(rule) {
            Translation::Skip(reason) => reason.to_string(),
            Translation::Statement(line) => panic!("rule was translated: {}", line),
        }
    }

    fn subject_contains() -> Vec<FilterCondition> {
        vec![condition("Subject", "contains", "SOMETHING")]
    }

    fn from_and_subject() -> Vec<FilterCondition> {
        vec![
            condition("From", "contains", "baz@baz.com"),
            condition("Subject", "contains", "SOMETHING"),
        ]
    }

    #[test]
    fn test_keep_rule() {
        let rule = rule(
            "The Rule",
            "1",
            None,
            MatchLogic::All,
            vec![condition("From", "is", "bar@baz.com")],
            false,
        );
        assert_eq!(
            statement(&rule),
            "afrl \"The Rule\" active all address \"From\" all is \"bar@baz.com\"  keep  \n"
        );
    }

    #[test]
    fn test_keep_rule_with_stop() {
        let rule = rule(
            "Another Rule",
            "1",
            None,
            MatchLogic::Any,
            vec![condition("From", "contains", "baz@baz.com")],
            true,
        );
        assert_eq!(
            statement(&rule),
            "afrl \"Another Rule\" active any address \"From\" all contains \"baz@baz.com\"  keep  stop\n"
        );
    }

    #[test]
    fn test_fileinto_rule() {
        let rule = rule(
            "A Rule",
            "2",
            Some("Some/Folder"),
            MatchLogic::Any,
            from_and_subject(),
            false,
        );
        assert_eq!(
            statement(&rule),
            "afrl \"A Rule\" active any address \"From\" all contains \"baz@baz.com\" header \"subject\"  contains \"SOMETHING\"  fileinto \"Some/Folder\" \n"
        );
    }

    #[test]
    fn test_discard_rule() {
        let rule = rule("A Rule", "3", None, MatchLogic::Any, from_and_subject(), true);
        assert_eq!(
            statement(&rule),
            "afrl \"A Rule\" active any address \"From\" all contains \"baz@baz.com\" header \"subject\"  contains \"SOMETHING\"  discard  stop\n"
        );
    }

    #[test]
    fn test_redirect_rule() {
        let rule = rule(
            "A Rule",
            "4",
            Some("foo@foo.com"),
            MatchLogic::All,
            subject_contains(),
            true,
        );
        assert_eq!(
            statement(&rule),
            "afrl \"A Rule\" active all header \"subject\"  contains \"SOMETHING\"  redirect \"foo@foo.com\" stop\n"
        );
    }

    #[test]
    fn test_keep_redirect_rule() {
        let rule = rule(
            "A Rule",
            "5",
            Some("foo@foo.com"),
            MatchLogic::All,
            subject_contains(),
            true,
        );
        assert_eq!(
            statement(&rule),
            "afrl \"A Rule\" active all header \"subject\"  contains \"SOMETHING\"  keep redirect \"foo@foo.com\" stop\n"
        );
    }

    #[test]
    fn test_reject_rule_becomes_discard() {
        let rule = rule(
            "A Rule",
            "6",
            Some("foo@foo.com"),
            MatchLogic::All,
            subject_contains(),
            true,
        );
        assert_eq!(
            statement(&rule),
            "afrl \"A Rule\" active all header \"subject\"  contains \"SOMETHING\"  discard  stop\n"
        );
    }

    #[test]
    fn test_keep_fileinto_rule() {
        let rule = rule(
            "A Rule",
            "11",
            Some("Another/Folder"),
            MatchLogic::All,
            subject_contains(),
            true,
        );
        assert_eq!(
            statement(&rule),
            "afrl \"A Rule\" active all header \"subject\"  contains \"SOMETHING\"  keep fileinto \"Another/Folder\" stop\n"
        );
    }

    #[test]
    fn test_flag_rule() {
        let rule = rule(
            "A Rule",
            "12",
            Some("SomeFlag"),
            MatchLogic::All,
            subject_contains(),
            true,
        );
        assert_eq!(
            statement(&rule),
            "afrl \"A Rule\" active all header \"subject\"  contains \"SOMETHING\"  flag \"SomeFlag\" stop\n"
        );
    }

    #[test]
    fn test_unknown_action_falls_back_to_discard() {
        let rule = rule("A Rule", "13", Some("x"), MatchLogic::All, subject_contains(), false);
        assert_eq!(
            statement(&rule),
            "afrl \"A Rule\" active all header \"subject\"  contains \"SOMETHING\"  discard  \n"
        );
    }

    #[test]
    fn test_incomplete_conditions_are_dropped() {
        let rule = rule(
            "The Rule",
            "1",
            None,
            MatchLogic::Any,
            vec![
                condition("From", "contains", ""),
                condition("From", "is", "bar@baz.com"),
            ],
            false,
        );
        assert_eq!(
            statement(&rule),
            "afrl \"The Rule\" active any address \"From\" all is \"bar@baz.com\"  keep  \n"
        );
    }

    #[test]
    fn test_unsupported_operators_are_dropped() {
        for operator in ["regex", "less", "greater"] {
            let rule = rule(
                "The Rule",
                "1",
                None,
                MatchLogic::Any,
                vec![
                    condition("From", operator, "foo@foo.com"),
                    condition("From", "is", "bar@bar.com"),
                ],
                false,
            );
            assert_eq!(
                statement(&rule),
                "afrl \"The Rule\" active any address \"From\" all is \"bar@bar.com\"  keep  \n"
            );
        }
    }

    #[test]
    fn test_condition_order_is_preserved() {
        let rule = rule(
            "Ordered",
            "3",
            None,
            MatchLogic::All,
            vec![
                condition("To", "is", "a@example.com"),
                condition("Subject", "regex", "^x"),
                condition("List-Id", "exists", "dev"),
                condition("Cc", "not contain", "b@example.com"),
            ],
            false,
        );
        assert_eq!(
            statement(&rule),
            "afrl \"Ordered\" active all address \"To\" all is \"a@example.com\" header \"list-id\"  contains \"dev\" address \"Cc\" all not_contains \"b@example.com\"  discard  \n"
        );
    }

    #[test]
    fn test_remapped_operators() {
        let cases = [
            ("begins with", "contains"),
            ("ends with", "contains"),
            ("equal", "is"),
            ("not contain", "not_contains"),
            ("exists", "contains"),
        ];
        for (operator, keyword) in cases {
            let rule = rule(
                "A Rule",
                "3",
                None,
                MatchLogic::All,
                vec![condition("Subject", operator, "SOMETHING")],
                false,
            );
            assert_eq!(
                statement(&rule),
                format!(
                    "afrl \"A Rule\" active all header \"subject\"  {} \"SOMETHING\"  discard  \n",
                    keyword
                )
            );
        }
    }

    #[test]
    fn test_size_rule() {
        let rule = rule(
            "A Size Greater Than Rule",
            "3",
            None,
            MatchLogic::All,
            vec![condition("size", "greater than", "500KB")],
            false,
        );
        assert_eq!(
            statement(&rule),
            "afrl \"A Size Greater Than Rule\" active all size over \"500K\"  discard  \n"
        );
    }

    #[test]
    fn test_default_rules_are_skipped() {
        for (name, action) in [
            ("Whitelist", "9"),
            ("Vacation", "8"),
            ("Blacklist", "7"),
            ("Forward", "10"),
        ] {
            // Even a fully valid default rule is skipped
            let rule = rule(name, action, Some("x"), MatchLogic::All, subject_contains(), true);
            assert_eq!(
                skipped(&rule),
                format!("Skipping Ingo default rule \"{}\"", name)
            );
        }
    }

    #[test]
    fn test_redundant_spam_rule() {
        let rule = rule(
            "spam",
            "2",
            Some("INBOX.spam"),
            MatchLogic::All,
            vec![condition("X-Spam-Flag", "contains", "YES")],
            false,
        );
        assert_eq!(skipped(&rule), "Skipping redundant spam rule \"spam\"");
    }

    #[test]
    fn test_sms_notification_rule() {
        let rule = rule(
            "sms-notify",
            "14",
            Some(""),
            MatchLogic::All,
            vec![condition("X-Spam-Flag", "not exists", "")],
            false,
        );
        assert_eq!(skipped(&rule), "Skipping SMS notification rule \"sms-notify\"");
    }

    #[test]
    fn test_spam_header_with_other_action_is_translated() {
        let rule = rule(
            "Flag spam",
            "12",
            Some("Junk"),
            MatchLogic::All,
            vec![condition("X-Spam-Flag", "contains", "YES")],
            false,
        );
        assert_eq!(
            statement(&rule),
            "afrl \"Flag spam\" active all header \"x-spam-flag\"  contains \"YES\"  flag \"Junk\" \n"
        );
    }

    #[test]
    fn test_rule_without_conditions() {
        let rule = rule("Some Rule", "3", Some(""), MatchLogic::All, vec![], false);
        assert_eq!(
            skipped(&rule),
            "Skipping rule \"Some Rule\" because it has no valid conditions"
        );
    }

    #[test]
    fn test_only_unsupported_conditions_behave_like_none() {
        let rule = rule(
            "Some Rule",
            "3",
            None,
            MatchLogic::All,
            vec![
                condition("From", "regex", ".*"),
                condition("Subject", "greater", "x"),
            ],
            false,
        );
        assert_eq!(
            skipped(&rule),
            "Skipping rule \"Some Rule\" because it has no valid conditions"
        );
    }

    #[test]
    fn test_move_without_action_value() {
        for action_value in [None, Some("")] {
            let rule = rule(
                "Some Copy To Path Rule",
                "2",
                action_value,
                MatchLogic::All,
                vec![condition("subject", "contains", "Something")],
                false,
            );
            assert_eq!(
                skipped(&rule),
                "Skipping rule \"Some Copy To Path Rule\" because it requires an action value but provided none"
            );
        }
    }

    #[test]
    fn test_quotes_are_escaped() {
        let rule = rule(
            "Say \"hi\"",
            "1",
            None,
            MatchLogic::All,
            vec![condition("Subject", "is", r"a\b")],
            false,
        );
        assert_eq!(
            statement(&rule),
            "afrl \"Say \\\"hi\\\"\" active all header \"subject\"  is \"a\\\\b\"  keep  \n"
        );
    }

    #[test]
    fn test_translation_is_repeatable() {
        let rule = rule(
            "A Rule",
            "2",
            Some("Some/Folder"),
            MatchLogic::Any,
            from_and_subject(),
            true,
        );
        assert_eq!(translate(&rule), translate(&rule));
    }
}
