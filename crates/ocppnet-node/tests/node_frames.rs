#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Notify;

use ocppnet_core::error::ErrorCode;
use ocppnet_core::message::ClearCacheRequest;
use ocppnet_core::protocol::{Action, NetworkingNodeId, OcppFrame};
use ocppnet_node::config;
use ocppnet_node::context::ConnectionInfo;
use ocppnet_node::forwarding::{
    BoxError, CancelSignal, ForwardingDecision, ForwardingResult, RequestEvent, RequestFilter,
};
use ocppnet_node::transport::Outbound;
use ocppnet_node::NetworkingNode;

fn node(yaml_tail: &str) -> NetworkingNode {
    let yaml = format!("version: 1\nnode:\n  id: \"NN-1\"\n{yaml_tail}");
    NetworkingNode::new(config::load_from_str(&yaml).unwrap()).unwrap()
}

fn station(node: &NetworkingNode) -> ConnectionInfo {
    node.connection("conn-1", NetworkingNodeId::new("CS-1"))
}

async fn send(node: &NetworkingNode, text: &str) -> Outbound {
    node.handle_frame(text, &station(node), &CancelSignal::never()).await
}

fn expect_call_error(out: Outbound) -> (String, ErrorCode) {
    match out {
        Outbound::Reply(OcppFrame::CallError { message_id, code, .. }) => (message_id, code),
        other => panic!("expected CALLERROR, got {other:?}"),
    }
}

#[tokio::test]
async fn boot_notification_is_relayed_upstream() {
    let node = node("");
    let out = send(
        &node,
        r#"[2,"b-1","BootNotification",{"chargingStation":{"model":"EK-300","vendorName":"Elektro"},"reason":"PowerUp"}]"#,
    )
    .await;

    let Outbound::Relay { destination, network_path, frame, deadline } = out else {
        panic!("expected relay, got {out:?}");
    };
    assert_eq!(destination.as_str(), "CSMS");
    assert_eq!(network_path.to_string(), "CS-1 -> NN-1");
    assert!(deadline > chrono::Utc::now());
    assert_eq!(frame.message_id(), "b-1");
    assert_eq!(
        frame.to_value(),
        json!([2, "b-1", "BootNotification", {
            "chargingStation": { "model": "EK-300", "vendorName": "Elektro" },
            "reason": "PowerUp"
        }])
    );
}

#[tokio::test]
async fn reject_rule_answers_locally() {
    let node = node("forwarding:\n  rules: [\"Reset:reject\"]\n");
    let out = send(&node, r#"[2,"r-1","Reset",{"type":"Immediate"}]"#).await;

    match out {
        Outbound::Reply(OcppFrame::CallResult { message_id, payload }) => {
            assert_eq!(message_id, "r-1");
            assert_eq!(payload["status"], "Rejected");
            assert_eq!(payload["statusInfo"]["reasonCode"], "Filtered");
        }
        other => panic!("expected CALLRESULT, got {other:?}"),
    }

    // Other actions are untouched by the rule.
    let out = send(&node, r#"[2,"c-1","ClearCache",{}]"#).await;
    assert!(matches!(out, Outbound::Relay { .. }));
}

#[tokio::test]
async fn drop_rule_discards() {
    let node = node("forwarding:\n  rules: [\"DataTransfer:drop\"]\n");
    let out = send(&node, r#"[2,"d-1","DataTransfer",{"vendorId":"elektro"}]"#).await;
    assert_eq!(out, Outbound::Discard);
    assert_eq!(
        node.metrics().decisions.get(&[("action", "DataTransfer"), ("result", "DROP")]),
        1
    );
}

#[tokio::test]
async fn malformed_payload_is_a_format_violation() {
    let node = node("");
    let out = send(&node, r#"[2,"s-1","SignCertificate",{}]"#).await;
    let (id, code) = expect_call_error(out);
    assert_eq!(id, "s-1");
    assert_eq!(code, ErrorCode::FormatViolation);
}

#[tokio::test]
async fn unknown_and_unregistered_actions_are_not_implemented() {
    let node = node("forwarding:\n  messages: [BootNotification]\n");
    assert_eq!(node.registered_actions(), vec![Action::BootNotification]);

    let (_, code) = expect_call_error(send(&node, r#"[2,"h-1","Heartbeat",{}]"#).await);
    assert_eq!(code, ErrorCode::NotImplemented);

    let (_, code) = expect_call_error(send(&node, r#"[2,"r-1","Reset",{"type":"Immediate"}]"#).await);
    assert_eq!(code, ErrorCode::NotImplemented);
}

#[tokio::test]
async fn responses_pass_through() {
    let node = node("");
    let text = r#"[3,"x-1",{"status":"Accepted"}]"#;
    match send(&node, text).await {
        Outbound::Passthrough(frame) => assert_eq!(frame.to_text(), text),
        other => panic!("expected passthrough, got {other:?}"),
    }
}

#[tokio::test]
async fn broken_frames() {
    let node = node("");
    let (id, code) = expect_call_error(send(&node, r#"[2,"x-1","Reset"]"#).await);
    assert_eq!(id, "x-1");
    assert_eq!(code, ErrorCode::RpcFrameworkError);

    assert_eq!(send(&node, "not json").await, Outbound::Discard);
}

#[tokio::test]
async fn default_forwarding_can_be_changed_at_runtime() {
    let node = node("");
    node.set_default_forwarding(ForwardingResult::Reject);
    let out = send(&node, r#"[2,"c-1","ClearCache",{}]"#).await;
    assert!(matches!(out, Outbound::Reply(OcppFrame::CallResult { .. })));
}

struct Gate(Arc<Notify>);

#[async_trait]
impl RequestFilter<ClearCacheRequest> for Gate {
    async fn filter(
        &self,
        _event: &RequestEvent<ClearCacheRequest>,
        _cancel: &CancelSignal,
    ) -> Result<Option<ForwardingDecision<ClearCacheRequest>>, BoxError> {
        self.0.notified().await;
        Ok(None)
    }
}

#[tokio::test]
async fn duplicate_in_flight_request_id_is_refused() {
    let node = node("");
    let gate = Arc::new(Notify::new());
    node.events::<ClearCacheRequest>()
        .on_request_filter(Arc::new(Gate(gate.clone())));

    let call = r#"[2,"dup","ClearCache",{}]"#;
    let (first, second) = tokio::join!(send(&node, call), async {
        let second = send(&node, call).await;
        gate.notify_one();
        second
    });

    assert!(matches!(first, Outbound::Relay { .. }));
    let (id, code) = expect_call_error(second);
    assert_eq!(id, "dup");
    assert_eq!(code, ErrorCode::RpcFrameworkError);

    // Released once the first run completed.
    gate.notify_one();
    assert!(matches!(send(&node, call).await, Outbound::Relay { .. }));
}
