//! Policy layer (action rules).
//!
//! Compiles the configured forwarding rules into a lookup structure and
//! exposes it to the pipeline as an ordinary request filter.

pub mod engine;
pub mod rules;

pub use engine::ActionRuleFilter;
pub use rules::{compile_rules, ActionRules};
