//! The generic forwarding pipeline.
//!
//! `Decode -> Received -> Filter -> default policy -> reject materialization
//! -> Filtered -> Sent (FORWARD only) -> Serialize`. Stages run one after the
//! other; subscribers inside a stage run concurrently (see [`super::fanout`]).
//! A decode failure short-circuits with a REJECT that never exposes a request.

use std::any::{Any, TypeId};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

use chrono::Utc;
use dashmap::DashMap;

use ocppnet_core::message::{CustomParsers, CustomSerializers, OcppRequest};
use ocppnet_core::protocol::{Action, NetworkingNodeId, RequestEnvelope};

use super::cancel::CancelSignal;
use super::decision::{ForwardingDecision, ForwardingResult};
use super::events::{MessageEvents, RequestEvent, Stage};
use super::fanout::{fan_out, ErrorSink, FaultContext, SubscriberFault, TracingErrorSink};
use crate::context::ConnectionInfo;
use crate::obs::NodeMetrics;

/// Node-wide forwarding state shared by all message types.
pub struct ForwardingCore {
    id: NetworkingNodeId,
    default_forwarding: AtomicU8,
    serializers: RwLock<Arc<CustomSerializers>>,
    parsers: RwLock<Arc<CustomParsers>>,
    /// `TypeId::of::<Req>()` -> `Arc<MessageEvents<Req>>`
    events: DashMap<TypeId, Arc<dyn Any + Send + Sync>>,
    error_sink: Arc<dyn ErrorSink>,
    metrics: Arc<NodeMetrics>,
}

impl ForwardingCore {
    pub fn new(id: NetworkingNodeId, default_forwarding: ForwardingResult) -> Self {
        Self {
            id,
            default_forwarding: AtomicU8::new(default_forwarding.to_u8()),
            serializers: RwLock::new(Arc::new(CustomSerializers::new())),
            parsers: RwLock::new(Arc::new(CustomParsers::new())),
            events: DashMap::new(),
            error_sink: Arc::new(TracingErrorSink),
            metrics: Arc::new(NodeMetrics::default()),
        }
    }

    /// Replace the default (tracing) error sink.
    pub fn with_error_sink(mut self, sink: Arc<dyn ErrorSink>) -> Self {
        self.error_sink = sink;
        self
    }

    pub fn id(&self) -> &NetworkingNodeId {
        &self.id
    }

    pub fn metrics(&self) -> &Arc<NodeMetrics> {
        &self.metrics
    }

    pub fn default_forwarding(&self) -> ForwardingResult {
        ForwardingResult::from_u8(self.default_forwarding.load(Ordering::Acquire))
    }

    /// Applies to pipeline runs that start after the call.
    pub fn set_default_forwarding(&self, result: ForwardingResult) {
        self.default_forwarding.store(result.to_u8(), Ordering::Release);
        tracing::info!(node = %self.id, default_forwarding = %result, "default forwarding changed");
    }

    /// Snapshot of the serializer registry.
    pub fn serializers(&self) -> Arc<CustomSerializers> {
        Arc::clone(&self.serializers.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn set_serializers(&self, serializers: CustomSerializers) {
        *self.serializers.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(serializers);
    }

    /// Snapshot of the parser registry.
    pub fn parsers(&self) -> Arc<CustomParsers> {
        Arc::clone(&self.parsers.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn set_parsers(&self, parsers: CustomParsers) {
        *self.parsers.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(parsers);
    }

    /// Subscription points for `Req`, created on first use.
    pub fn events<Req: OcppRequest>(&self) -> Arc<MessageEvents<Req>> {
        let entry = self
            .events
            .entry(TypeId::of::<Req>())
            .or_insert_with(|| Arc::new(MessageEvents::<Req>::new()) as Arc<dyn Any + Send + Sync>)
            .clone();
        // Keyed by TypeId, so the downcast cannot miss.
        entry
            .downcast::<MessageEvents<Req>>()
            .unwrap_or_else(|_| Arc::new(MessageEvents::new()))
    }

    /// Run the pipeline for one envelope. Always yields a decision.
    pub async fn forward<Req: OcppRequest>(
        &self,
        envelope: &RequestEnvelope,
        connection: &ConnectionInfo,
        cancel: &CancelSignal,
    ) -> ForwardingDecision<Req> {
        let started = Instant::now();
        let action = Req::ACTION;
        let meta = &envelope.meta;
        let sink = MeteredSink {
            inner: self.error_sink.as_ref(),
            metrics: &self.metrics,
        };

        let request = match Req::try_parse(envelope, &self.parsers()) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(
                    action = %action,
                    request_id = %meta.request_id,
                    event_tracking_id = %meta.event_tracking_id,
                    error = %e,
                    "request decode failed"
                );
                self.metrics.decode_errors.inc(&[("action", action.as_str())]);
                let decision =
                    ForwardingDecision::rejected_at_decode(meta, e.to_string(), &self.serializers());
                self.record(action, decision.result, started);
                return decision;
            }
        };

        let events = self.events::<Req>();
        let event = RequestEvent {
            timestamp: Utc::now(),
            sender: self.id.clone(),
            connection: connection.clone(),
            request,
        };

        let received = events.received.snapshot();
        fan_out(&received, Stage::Received, action, meta, &sink, |h| h.on_request(&event)).await;

        let filters = events.filter.snapshot();
        let votes = fan_out(&filters, Stage::Filter, action, meta, &sink, |h| {
            h.filter(&event, cancel)
        })
        .await;

        let mut decision = select_decision(votes.into_iter().flatten().flatten())
            .unwrap_or_else(|| self.default_decision::<Req>());
        decision.request = Some(event.request.clone());

        match decision.result {
            ForwardingResult::Forward => {
                decision.reject_response = None;
                decision.reject_json = None;
                decision.settle_forward(meta);
            }
            ForwardingResult::Reject => decision.materialize_reject(meta, &self.serializers()),
            ForwardingResult::Drop => decision.clear_outputs(),
        }

        let filtered = events.filtered.snapshot();
        fan_out(&filtered, Stage::Filtered, action, meta, &sink, |h| {
            h.on_decision(&event, &decision)
        })
        .await;

        if decision.is_forward() {
            if let Some(relayed) = decision.effective_request().cloned() {
                let sent_event = RequestEvent {
                    timestamp: Utc::now(),
                    sender: self.id.clone(),
                    connection: connection.clone(),
                    request: relayed,
                };
                let sent = events.sent.snapshot();
                fan_out(&sent, Stage::Sent, action, meta, &sink, |h| h.on_request(&sent_event)).await;
            }
            decision.serialize_forward(&self.serializers());
        }

        tracing::debug!(
            action = %action,
            request_id = %meta.request_id,
            event_tracking_id = %meta.event_tracking_id,
            result = %decision.result,
            reason = decision.reject_message.as_deref().unwrap_or(""),
            "forwarding decision"
        );
        self.record(action, decision.result, started);
        decision
    }

    /// Decision used when no filter voted. DROP as a default degrades to REJECT.
    fn default_decision<Req: OcppRequest>(&self) -> ForwardingDecision<Req> {
        match self.default_forwarding() {
            ForwardingResult::Forward => ForwardingDecision::forward(),
            ForwardingResult::Reject | ForwardingResult::Drop => ForwardingDecision::reject(format!(
                "{} rejected by default forwarding policy",
                Req::ACTION
            )),
        }
    }

    fn record(&self, action: Action, result: ForwardingResult, started: Instant) {
        let action = action.as_str();
        self.metrics
            .decisions
            .inc(&[("action", action), ("result", result.as_str())]);
        self.metrics
            .pipeline_duration
            .observe(&[("action", action)], started.elapsed());
    }
}

/// Most restrictive vote wins; on a tie the earliest registered filter wins.
fn select_decision<Req: OcppRequest>(
    votes: impl IntoIterator<Item = ForwardingDecision<Req>>,
) -> Option<ForwardingDecision<Req>> {
    votes.into_iter().fold(None, |best, vote| match best {
        Some(best) if best.result.restrictiveness() >= vote.result.restrictiveness() => Some(best),
        _ => Some(vote),
    })
}

/// Counts faults before handing them to the configured sink.
struct MeteredSink<'a> {
    inner: &'a dyn ErrorSink,
    metrics: &'a NodeMetrics,
}

impl ErrorSink for MeteredSink<'_> {
    fn handle_error(&self, ctx: &FaultContext, stage: Stage, fault: &SubscriberFault) {
        self.metrics.subscriber_faults.inc(&[("stage", stage.as_str())]);
        self.inner.handle_error(ctx, stage, fault);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ocppnet_core::message::ResetRequest;

    #[test]
    fn select_prefers_restrictive_then_first() {
        let votes = vec![
            ForwardingDecision::<ResetRequest>::forward(),
            ForwardingDecision::reject("first"),
            ForwardingDecision::reject("second"),
        ];
        let winner = select_decision(votes).unwrap();
        assert_eq!(winner.result, ForwardingResult::Reject);
        assert_eq!(winner.reject_message.as_deref(), Some("first"));

        let votes = vec![
            ForwardingDecision::<ResetRequest>::reject("r"),
            ForwardingDecision::discard("d"),
        ];
        assert_eq!(select_decision(votes).unwrap().result, ForwardingResult::Drop);
        assert!(select_decision(Vec::<ForwardingDecision<ResetRequest>>::new()).is_none());
    }

    #[test]
    fn events_registry_is_per_type() {
        let core = ForwardingCore::new(NetworkingNodeId::new("NN-1"), ForwardingResult::Forward);
        let a = core.events::<ResetRequest>();
        let b = core.events::<ResetRequest>();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn default_forwarding_is_swappable() {
        let core = ForwardingCore::new(NetworkingNodeId::new("NN-1"), ForwardingResult::Forward);
        core.set_default_forwarding(ForwardingResult::Drop);
        assert_eq!(core.default_forwarding(), ForwardingResult::Drop);
    }
}
