//! Declarative condition→action rules for scene switching.
//!
//! Operators load a JSON rule document; the engine evaluates it against
//! the facts of the current control cycle and picks the winning rule's
//! action plan. The active ruleset is an atomically swapped snapshot,
//! so a hot reload never interleaves with an in-flight evaluation, and
//! an invalid document never displaces a working one.

pub mod engine;
pub mod facts;
pub mod model;
pub mod reload;

pub use engine::{ActionPlan, Engine};
pub use facts::{FactValue, Facts};
pub use model::{Action, ActiveRuleset, Condition, Operator, Rule, RuleError, RuleSet};
pub use reload::{RuleWatcher, load_rules};
