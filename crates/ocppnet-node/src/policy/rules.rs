//! Action rule compilation and matching.
//!
//! Rules have the form `Action:result` (`Reset:reject`) or `*:result` for a
//! wildcard covering every action without a rule of its own.

use std::collections::HashMap;
use std::str::FromStr;

use ocppnet_core::error::{OcppNetError, Result};
use ocppnet_core::protocol::Action;

use crate::forwarding::ForwardingResult;

/// Compiled rule set.
#[derive(Debug, Clone, Default)]
pub struct ActionRules {
    exact: HashMap<Action, ForwardingResult>,
    wildcard: Option<ForwardingResult>,
}

impl ActionRules {
    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.wildcard.is_none()
    }

    /// Actions with a rule of their own.
    pub fn exact_actions(&self) -> impl Iterator<Item = Action> + '_ {
        self.exact.keys().copied()
    }

    /// Exact rule first, then the wildcard. `None` means "no opinion".
    pub fn rule_for(&self, action: Action) -> Option<ForwardingResult> {
        self.exact.get(&action).copied().or(self.wildcard)
    }
}

pub fn compile_rules(raw: &[String]) -> Result<ActionRules> {
    let mut rules = ActionRules::default();
    for s in raw {
        // format: "Action:result" or "*:result"
        let (action_s, result_s) = s.split_once(':').ok_or_else(|| {
            OcppNetError::BadConfig(format!("invalid forwarding rule: {s} (expected Action:result)"))
        })?;
        let result = ForwardingResult::from_str(result_s.trim())?;

        let action_s = action_s.trim();
        let slot = if action_s == "*" {
            &mut rules.wildcard
        } else {
            let action = Action::from_str(action_s).map_err(|_| {
                OcppNetError::BadConfig(format!("invalid forwarding rule action: {action_s}"))
            })?;
            match rules.exact.get(&action) {
                Some(prev) if *prev != result => {
                    return Err(OcppNetError::BadConfig(format!(
                        "conflicting forwarding rules for {action}: {prev} vs {result}"
                    )));
                }
                _ => {}
            }
            rules.exact.insert(action, result);
            continue;
        };

        match slot {
            Some(prev) if *prev != result => {
                return Err(OcppNetError::BadConfig(format!(
                    "conflicting wildcard forwarding rules: {prev} vs {result}"
                )));
            }
            _ => *slot = Some(result),
        }
    }
    Ok(rules)
}
