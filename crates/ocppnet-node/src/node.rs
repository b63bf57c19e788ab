//! The networking node: forwarding core + dispatch table + frame handling.
//!
//! Built once from a validated [`NodeConfig`]; wiring errors surface here so
//! the pipeline itself never fails.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashSet;

use ocppnet_core::error::{OcppNetError, Result};
use ocppnet_core::message::{
    BootNotificationRequest, CertificateSignedRequest, ChangeAvailabilityRequest,
    ClearCacheRequest, CustomParsers, CustomSerializers, DataTransferRequest, OcppRequest,
    ResetRequest, SignCertificateRequest,
};
use ocppnet_core::protocol::{Action, NetworkingNodeId, OcppFrame, RequestEnvelope};

use crate::config::NodeConfig;
use crate::context::ConnectionInfo;
use crate::dispatch::Dispatcher;
use crate::forwarding::{
    CancelSignal, ErrorSink, ForwardingCore, ForwardingDecision, ForwardingResult, MessageEvents,
    TracingErrorSink,
};
use crate::obs::NodeMetrics;
use crate::policy::{compile_rules, ActionRuleFilter};
use crate::transport::codec::{self, Outbound};

const FAIL_FAST_ON_MISMATCH: bool = false; // if changed to true, rules for unregistered messages fail boot.

#[derive(Clone)]
pub struct NetworkingNode {
    inner: Arc<NodeInner>,
}

struct NodeInner {
    cfg: NodeConfig,
    core: ForwardingCore,
    dispatcher: Dispatcher,
    upstream: NetworkingNodeId,
    request_timeout: Duration,
    /// (connection id, message id) of CALLs currently in the pipeline.
    in_flight: DashSet<(String, String)>,
}

/// Removes an in-flight entry when the pipeline run ends (or is abandoned).
struct InFlightGuard<'a> {
    set: &'a DashSet<(String, String)>,
    key: (String, String),
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.set.remove(&self.key);
    }
}

impl NetworkingNode {
    /// Build a node that reports subscriber faults through `tracing`.
    pub fn new(cfg: NodeConfig) -> Result<Self> {
        Self::with_error_sink(cfg, Arc::new(TracingErrorSink))
    }

    /// Build a node with a custom error sink.
    /// Returns Result so callers can handle bad config gracefully (no panic).
    pub fn with_error_sink(cfg: NodeConfig, sink: Arc<dyn ErrorSink>) -> Result<Self> {
        cfg.validate()?;

        // 1) Compile action rules
        let rules = Arc::new(compile_rules(&cfg.forwarding.rules)?);

        // 2) Create core components
        let core = ForwardingCore::new(NetworkingNodeId::new(&cfg.node.id), cfg.node.default_forwarding)
            .with_error_sink(sink);
        let dispatcher = Dispatcher::new();

        // 3) Register message types, rule filter first
        let rule_filter = (!rules.is_empty()).then(|| Arc::new(ActionRuleFilter::new(rules.clone())));
        let actions = cfg.forwarding.actions()?;
        for action in &actions {
            let f = rule_filter.as_ref();
            match action {
                Action::BootNotification => install::<BootNotificationRequest>(&core, &dispatcher, f),
                Action::SignCertificate => install::<SignCertificateRequest>(&core, &dispatcher, f),
                Action::CertificateSigned => install::<CertificateSignedRequest>(&core, &dispatcher, f),
                Action::Reset => install::<ResetRequest>(&core, &dispatcher, f),
                Action::ChangeAvailability => install::<ChangeAvailabilityRequest>(&core, &dispatcher, f),
                Action::ClearCache => install::<ClearCacheRequest>(&core, &dispatcher, f),
                Action::DataTransfer => install::<DataTransferRequest>(&core, &dispatcher, f),
            }
        }

        // rules <-> dispatcher sanity check
        for action in rules.exact_actions() {
            if dispatcher.is_registered(action) {
                continue;
            }
            if FAIL_FAST_ON_MISMATCH {
                return Err(OcppNetError::BadConfig(format!(
                    "forwarding rule for unregistered message type: {action}"
                )));
            }
            tracing::warn!(action = %action, "forwarding rule for unregistered message type");
        }

        tracing::info!(
            node = %core.id(),
            messages = actions.len(),
            rules = cfg.forwarding.rules.len(),
            default_forwarding = %cfg.node.default_forwarding,
            "networking node ready"
        );

        Ok(Self {
            inner: Arc::new(NodeInner {
                upstream: NetworkingNodeId::new(&cfg.node.upstream),
                request_timeout: cfg.node.request_timeout(),
                cfg,
                core,
                dispatcher,
                in_flight: DashSet::new(),
            }),
        })
    }

    pub fn cfg(&self) -> &NodeConfig {
        &self.inner.cfg
    }

    pub fn id(&self) -> &NetworkingNodeId {
        self.inner.core.id()
    }

    pub fn core(&self) -> &ForwardingCore {
        &self.inner.core
    }

    pub fn metrics(&self) -> &Arc<NodeMetrics> {
        self.inner.core.metrics()
    }

    pub fn request_timeout(&self) -> Duration {
        self.inner.request_timeout
    }

    pub fn registered_actions(&self) -> Vec<Action> {
        self.inner.dispatcher.registered_actions()
    }

    /// Connection context for a peer whose requests go upstream.
    ///
    /// Every CALL from this connection is addressed to `node.upstream`. For a
    /// CSMS-side connection build the [`ConnectionInfo`] directly with the
    /// downstream destination instead.
    pub fn connection(&self, connection_id: impl Into<String>, remote: NetworkingNodeId) -> ConnectionInfo {
        ConnectionInfo::new(connection_id, remote, self.inner.upstream.clone())
    }

    /// Subscription points for `Req`.
    pub fn events<Req: OcppRequest>(&self) -> Arc<MessageEvents<Req>> {
        self.inner.core.events::<Req>()
    }

    pub fn set_default_forwarding(&self, result: ForwardingResult) {
        self.inner.core.set_default_forwarding(result);
    }

    pub fn set_serializers(&self, serializers: CustomSerializers) {
        self.inner.core.set_serializers(serializers);
    }

    pub fn set_parsers(&self, parsers: CustomParsers) {
        self.inner.core.set_parsers(parsers);
    }

    /// Typed entry point, bypassing the dispatch table.
    pub async fn forward<Req: OcppRequest>(
        &self,
        envelope: &RequestEnvelope,
        connection: &ConnectionInfo,
        cancel: &CancelSignal,
    ) -> ForwardingDecision<Req> {
        self.inner.core.forward::<Req>(envelope, connection, cancel).await
    }

    /// Handle one inbound OCPP-J text frame from `connection`.
    pub async fn handle_frame(
        &self,
        text: &str,
        connection: &ConnectionInfo,
        cancel: &CancelSignal,
    ) -> Outbound {
        let frame = match OcppFrame::parse(text) {
            Ok(frame) => frame,
            Err(e) => {
                self.metrics().frame_errors.inc(&[("reason", "frame")]);
                tracing::warn!(connection = %connection, error = %e, "unreadable frame");
                return match &e {
                    OcppNetError::Frame { message_id: Some(id), .. } => codec::error_reply(id, &e),
                    // No message id to answer to.
                    _ => Outbound::Discard,
                };
            }
        };

        match frame {
            OcppFrame::Call { message_id, action, payload } => {
                self.handle_call(&message_id, &action, payload, connection, cancel).await
            }
            response => Outbound::Passthrough(response),
        }
    }

    async fn handle_call(
        &self,
        message_id: &str,
        action: &str,
        payload: serde_json::Value,
        connection: &ConnectionInfo,
        cancel: &CancelSignal,
    ) -> Outbound {
        let key = (connection.connection_id.clone(), message_id.to_string());
        if !self.inner.in_flight.insert(key.clone()) {
            self.metrics().frame_errors.inc(&[("reason", "duplicate")]);
            tracing::warn!(connection = %connection, message_id, "duplicate in-flight request id");
            return codec::error_reply(message_id, &OcppNetError::DuplicateRequestId(message_id.to_string()));
        }
        let _guard = InFlightGuard {
            set: &self.inner.in_flight,
            key,
        };

        let envelope = codec::envelope_from_call(message_id, payload, connection, self.inner.request_timeout);
        let routed = self
            .inner
            .dispatcher
            .dispatch(&self.inner.core, action, &envelope, connection, cancel)
            .await;

        match routed {
            Ok(routed) => {
                let out = codec::outbound(routed);
                tracing::debug!(connection = %connection, message_id, action, outbound = out.kind(), "call handled");
                out
            }
            Err(e) => {
                self.metrics().frame_errors.inc(&[("reason", "unknown_action")]);
                tracing::warn!(connection = %connection, message_id, action, error = %e, "call not dispatched");
                codec::error_reply(message_id, &e)
            }
        }
    }
}

fn install<Req: OcppRequest>(
    core: &ForwardingCore,
    dispatcher: &Dispatcher,
    rule_filter: Option<&Arc<ActionRuleFilter>>,
) {
    dispatcher.register::<Req>();
    if let Some(filter) = rule_filter {
        core.events::<Req>().on_request_filter(filter.clone());
    }
}
