//! Rule document model.
//!
//! The operator-facing configuration is a JSON document:
//!
//! ```json
//! {
//!   "rules": [
//!     {
//!       "name": "active_game",
//!       "priority": 100,
//!       "conditions": [
//!         {"field": "game_time", "operator": "gt", "value": 0},
//!         {"field": "break_time", "operator": "eq", "value": 0}
//!       ],
//!       "actions": [{"type": "switch_scene", "scene": "game"}]
//!     }
//!   ]
//! }
//! ```
//!
//! Conditions and actions are closed tagged sets: malformed documents
//! fail to parse instead of producing an evaluator that guesses.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

/// Errors from loading or validating a rule document.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("failed to read rules file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse rules document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid rules document: {0}")]
    Invalid(String),

    #[error("failed to watch rules file: {0}")]
    Watch(#[from] notify::Error),
}

/// Condition operator. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Lt,
    /// Field differs from the previous evaluation cycle.
    Changed,
    /// Field has held its value for at least `value` consecutive cycles.
    StableFor,
}

/// One condition; all conditions of a rule must hold (logical AND).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub operator: Operator,
    #[serde(default)]
    pub value: serde_json::Value,
}

/// One action. Closed tagged set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    SwitchScene { scene: String },
    Delay { seconds: f64 },
    Sequence { actions: Vec<Action> },
    Parallel { actions: Vec<Action> },
    /// Named built-in handler (e.g. the breakout sequence). Unknown
    /// names are logged and skipped at execution time.
    Custom { handler: String },
}

/// One scene-switching rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    #[serde(default = "default_priority")]
    pub priority: i32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

fn default_priority() -> i32 {
    50
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct RuleDocument {
    rules: Vec<Rule>,
}

/// A validated, priority-ordered ruleset. Immutable after load.
#[derive(Debug, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Parses and validates a JSON rule document.
    pub fn parse(json: &str) -> Result<Self, RuleError> {
        let doc: RuleDocument = serde_json::from_str(json)?;
        Self::from_rules(doc.rules)
    }

    /// Validates rules and orders them for evaluation: priority
    /// descending, definition order within equal priority (stable sort).
    pub fn from_rules(mut rules: Vec<Rule>) -> Result<Self, RuleError> {
        for rule in &rules {
            if rule.name.trim().is_empty() {
                return Err(RuleError::Invalid("rule with empty name".into()));
            }
        }
        for (i, rule) in rules.iter().enumerate() {
            if rules[..i].iter().any(|r| r.name == rule.name) {
                return Err(RuleError::Invalid(format!(
                    "duplicate rule name: {}",
                    rule.name
                )));
            }
        }

        rules.sort_by_key(|r| std::cmp::Reverse(r.priority));
        Ok(Self { rules })
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Shared handle to the active ruleset.
///
/// Readers take an `Arc` snapshot and evaluate against it; a reload
/// swaps the whole `Arc`, so concurrent readers never observe a
/// partially updated document.
#[derive(Clone, Default)]
pub struct ActiveRuleset {
    inner: Arc<RwLock<Arc<RuleSet>>>,
}

impl ActiveRuleset {
    pub fn new(ruleset: RuleSet) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(ruleset))),
        }
    }

    /// Consistent snapshot for one evaluation cycle.
    pub fn snapshot(&self) -> Arc<RuleSet> {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Atomically replaces the active ruleset.
    pub fn swap(&self, ruleset: RuleSet) {
        *self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Arc::new(ruleset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_document_with_defaults() {
        let json = r#"{
            "rules": [
                {"name": "bare", "actions": [{"type": "switch_scene", "scene": "game"}]}
            ]
        }"#;
        let set = RuleSet::parse(json).unwrap();
        let rule = &set.rules()[0];
        assert_eq!(rule.priority, 50);
        assert!(rule.enabled);
        assert!(rule.conditions.is_empty());
    }

    #[test]
    fn orders_by_priority_then_definition() {
        let json = r#"{
            "rules": [
                {"name": "low", "priority": 10},
                {"name": "tie_a", "priority": 100},
                {"name": "tie_b", "priority": 100},
                {"name": "high", "priority": 200}
            ]
        }"#;
        let set = RuleSet::parse(json).unwrap();
        let names: Vec<_> = set.rules().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["high", "tie_a", "tie_b", "low"]);
    }

    #[test]
    fn rejects_duplicate_names() {
        let json = r#"{"rules": [{"name": "a"}, {"name": "a"}]}"#;
        assert!(matches!(
            RuleSet::parse(json),
            Err(RuleError::Invalid(msg)) if msg.contains("duplicate")
        ));
    }

    #[test]
    fn rejects_unknown_operator() {
        let json = r#"{
            "rules": [{
                "name": "bad",
                "conditions": [{"field": "game_time", "operator": "regex", "value": ".*"}]
            }]
        }"#;
        assert!(matches!(RuleSet::parse(json), Err(RuleError::Parse(_))));
    }

    #[test]
    fn rejects_unknown_action_type() {
        let json = r#"{
            "rules": [{
                "name": "bad",
                "actions": [{"type": "custom_script", "script": "exec()"}]
            }]
        }"#;
        assert!(matches!(RuleSet::parse(json), Err(RuleError::Parse(_))));
    }

    #[test]
    fn nested_actions_parse() {
        let json = r#"{
            "rules": [{
                "name": "breakout",
                "actions": [{
                    "type": "sequence",
                    "actions": [
                        {"type": "switch_scene", "scene": "breakout"},
                        {"type": "delay", "seconds": 1.5},
                        {"type": "parallel", "actions": [
                            {"type": "switch_scene", "scene": "game"},
                            {"type": "custom", "handler": "breakout"}
                        ]}
                    ]
                }]
            }]
        }"#;
        let set = RuleSet::parse(json).unwrap();
        match &set.rules()[0].actions[0] {
            Action::Sequence { actions } => {
                assert_eq!(actions.len(), 3);
                assert!(matches!(&actions[2], Action::Parallel { actions } if actions.len() == 2));
            }
            other => panic!("expected sequence, got {other:?}"),
        }
    }

    #[test]
    fn active_ruleset_snapshot_is_stable_across_swap() {
        let active = ActiveRuleset::new(
            RuleSet::parse(r#"{"rules": [{"name": "first"}]}"#).unwrap(),
        );
        let snapshot = active.snapshot();
        active.swap(RuleSet::parse(r#"{"rules": [{"name": "second"}]}"#).unwrap());

        // The held snapshot still sees the old document.
        assert_eq!(snapshot.rules()[0].name, "first");
        assert_eq!(active.snapshot().rules()[0].name, "second");
    }
}
