use std::sync::Arc;

use async_trait::async_trait;

use ocppnet_core::message::OcppRequest;

use super::rules::ActionRules;
use crate::forwarding::{
    BoxError, CancelSignal, ForwardingDecision, ForwardingResult, RequestEvent, RequestFilter,
};

/// Filter voting according to the configured action rules.
///
/// Construct once at startup, then share via Arc. Installed as the first
/// filter of every registered message type.
pub struct ActionRuleFilter {
    rules: Arc<ActionRules>,
}

impl ActionRuleFilter {
    pub fn new(rules: Arc<ActionRules>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &ActionRules {
        &self.rules
    }
}

#[async_trait]
impl<Req: OcppRequest> RequestFilter<Req> for ActionRuleFilter {
    async fn filter(
        &self,
        _event: &RequestEvent<Req>,
        _cancel: &CancelSignal,
    ) -> Result<Option<ForwardingDecision<Req>>, BoxError> {
        let decision = self.rules.rule_for(Req::ACTION).map(|result| match result {
            ForwardingResult::Forward => ForwardingDecision::forward(),
            ForwardingResult::Reject => {
                ForwardingDecision::reject(format!("{} rejected by forwarding rule", Req::ACTION))
            }
            ForwardingResult::Drop => {
                ForwardingDecision::discard(format!("{} dropped by forwarding rule", Req::ACTION))
            }
        });
        Ok(decision)
    }
}
