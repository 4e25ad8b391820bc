//! Rule evaluation.
//!
//! One evaluation cycle: update per-field history (for `changed` and
//! `stable_for`), then walk the priority-ordered rules and return the
//! first enabled rule whose conditions all hold. At most one rule wins
//! per cycle.

use std::collections::HashMap;

use tracing::debug;

use crate::facts::{FactValue, Facts};
use crate::model::{Action, ActiveRuleset, Condition, Operator};

/// The winning rule's actions for one cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionPlan {
    pub rule_name: String,
    pub actions: Vec<Action>,
}

#[derive(Debug)]
struct FieldHistory {
    previous: FactValue,
    changed: bool,
    stable_cycles: u64,
}

/// Stateful evaluator over the active ruleset.
///
/// History (change detection, stability counters) lives here, not in
/// the ruleset, so a hot reload does not reset `stable_for` counters.
pub struct Engine {
    ruleset: ActiveRuleset,
    history: HashMap<String, FieldHistory>,
}

impl Engine {
    pub fn new(ruleset: ActiveRuleset) -> Self {
        Self {
            ruleset,
            history: HashMap::new(),
        }
    }

    /// Evaluates one cycle of facts. Returns the winning rule's plan,
    /// or `None` when no rule matches.
    pub fn evaluate(&mut self, facts: &Facts) -> Option<ActionPlan> {
        self.update_history(facts);

        let ruleset = self.ruleset.snapshot();
        for rule in ruleset.rules() {
            if !rule.enabled {
                continue;
            }
            if rule
                .conditions
                .iter()
                .all(|c| self.condition_holds(c, facts))
            {
                debug!(rule = %rule.name, priority = rule.priority, "rule matched");
                return Some(ActionPlan {
                    rule_name: rule.name.clone(),
                    actions: rule.actions.clone(),
                });
            }
        }
        None
    }

    fn update_history(&mut self, facts: &Facts) {
        for (field, value) in facts.iter() {
            match self.history.get_mut(field) {
                Some(entry) => {
                    if entry.previous.loose_eq(value) {
                        entry.changed = false;
                        entry.stable_cycles += 1;
                    } else {
                        entry.previous = value.clone();
                        entry.changed = true;
                        entry.stable_cycles = 0;
                    }
                }
                None => {
                    self.history.insert(
                        field.to_owned(),
                        FieldHistory {
                            previous: value.clone(),
                            changed: false,
                            stable_cycles: 0,
                        },
                    );
                }
            }
        }
    }

    /// A condition over a missing field never holds.
    fn condition_holds(&self, condition: &Condition, facts: &Facts) -> bool {
        let Some(actual) = facts.get(&condition.field) else {
            return false;
        };
        let expected = FactValue::from_json(&condition.value);

        match condition.operator {
            Operator::Eq => actual.loose_eq(&expected),
            Operator::Ne => !actual.loose_eq(&expected),
            Operator::Gt => match (actual.as_f64(), expected.as_f64()) {
                (Some(a), Some(b)) => a > b,
                _ => false,
            },
            Operator::Lt => match (actual.as_f64(), expected.as_f64()) {
                (Some(a), Some(b)) => a < b,
                _ => false,
            },
            Operator::Changed => self
                .history
                .get(&condition.field)
                .is_some_and(|h| h.changed),
            Operator::StableFor => {
                let Some(required) = expected.as_f64() else {
                    return false;
                };
                self.history
                    .get(&condition.field)
                    .is_some_and(|h| h.stable_cycles as f64 >= required)
            }
        }
    }
}
