use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use ocppnet_core::error::{OcppNetError, Result};
use ocppnet_core::message::OcppRequest;
use ocppnet_core::protocol::{Action, RequestEnvelope};

use crate::context::ConnectionInfo;
use crate::forwarding::{CancelSignal, ForwardingCore, RoutedDecision};

/// Type-erased entry point for one message type.
#[async_trait]
pub trait MessageForwarder: Send + Sync {
    fn action(&self) -> Action;
    async fn forward(
        &self,
        core: &ForwardingCore,
        envelope: &RequestEnvelope,
        connection: &ConnectionInfo,
        cancel: &CancelSignal,
    ) -> RoutedDecision;
}

/// Runs the generic pipeline for `Req`.
pub struct TypedForwarder<Req>(PhantomData<fn() -> Req>);

impl<Req> Default for TypedForwarder<Req> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

#[async_trait]
impl<Req: OcppRequest> MessageForwarder for TypedForwarder<Req> {
    fn action(&self) -> Action {
        Req::ACTION
    }

    async fn forward(
        &self,
        core: &ForwardingCore,
        envelope: &RequestEnvelope,
        connection: &ConnectionInfo,
        cancel: &CancelSignal,
    ) -> RoutedDecision {
        let decision = core.forward::<Req>(envelope, connection, cancel).await;
        decision.route(&envelope.meta, core.id())
    }
}

/// Registry and dispatcher keyed by action tag.
#[derive(Default)]
pub struct Dispatcher {
    table: DashMap<Action, Arc<dyn MessageForwarder>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            table: DashMap::new(),
        }
    }

    /// Register the pipeline for `Req`. Re-registering is a no-op.
    pub fn register<Req: OcppRequest>(&self) {
        self.table
            .entry(Req::ACTION)
            .or_insert_with(|| Arc::new(TypedForwarder::<Req>::default()) as Arc<dyn MessageForwarder>);
    }

    pub fn is_registered(&self, action: Action) -> bool {
        self.table.contains_key(&action)
    }

    pub fn registered_actions(&self) -> Vec<Action> {
        let mut actions: Vec<Action> = self.table.iter().map(|e| *e.key()).collect();
        actions.sort_by_key(|a| a.as_str());
        actions
    }

    /// Route a raw envelope to the pipeline of `action`.
    pub async fn dispatch(
        &self,
        core: &ForwardingCore,
        action: &str,
        envelope: &RequestEnvelope,
        connection: &ConnectionInfo,
        cancel: &CancelSignal,
    ) -> Result<RoutedDecision> {
        let action = Action::from_str(action)?;
        let handler = self
            .table
            .get(&action)
            .ok_or_else(|| OcppNetError::NotImplemented(action.to_string()))?
            .value()
            .clone();
        Ok(handler.forward(core, envelope, connection, cancel).await)
    }
}
