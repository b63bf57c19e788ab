//! Codec between OCPP-J frames and the forwarding pipeline.
//!
//! - inbound CALL => `RequestEnvelope` (payload decoded lazily by the pipeline)
//! - `RoutedDecision` => `Outbound` (relay, local reply, or nothing)
//! - CALLRESULT / CALLERROR are surfaced untouched; response routing belongs
//!   to the connection layer.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;

use ocppnet_core::error::{ErrorCode, OcppNetError};
use ocppnet_core::protocol::{
    NetworkPath, NetworkingNodeId, OcppFrame, RequestEnvelope, RequestId, RequestMeta,
};

use crate::context::ConnectionInfo;
use crate::forwarding::{ForwardingResult, RoutedDecision};

/// OCPP-J caps CALLERROR descriptions at 255 characters.
const MAX_ERROR_DESCRIPTION: usize = 255;

/// What the connection layer should do with an inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// Send `frame` (a CALL) towards `destination`.
    Relay {
        destination: NetworkingNodeId,
        network_path: NetworkPath,
        deadline: DateTime<Utc>,
        frame: OcppFrame,
    },
    /// Answer the originator on the same connection.
    Reply(OcppFrame),
    /// Neither relay nor answer.
    Discard,
    /// A response frame; route it back along the request's path.
    Passthrough(OcppFrame),
}

impl Outbound {
    pub fn frame(&self) -> Option<&OcppFrame> {
        match self {
            Outbound::Relay { frame, .. } | Outbound::Reply(frame) | Outbound::Passthrough(frame) => {
                Some(frame)
            }
            Outbound::Discard => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Outbound::Relay { .. } => "relay",
            Outbound::Reply(_) => "reply",
            Outbound::Discard => "discard",
            Outbound::Passthrough(_) => "passthrough",
        }
    }
}

/// Envelope for a CALL received from `connection`, addressed to
/// `connection.default_destination` whatever the action's direction.
pub fn envelope_from_call(
    message_id: &str,
    payload: Value,
    connection: &ConnectionInfo,
    request_timeout: Duration,
) -> RequestEnvelope {
    let meta = RequestMeta::received(
        RequestId::new(message_id),
        connection.default_destination.clone(),
        NetworkPath::from_source(connection.remote.clone()),
        request_timeout,
    );
    RequestEnvelope::new(meta, payload)
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// CALLERROR with a description clipped to the OCPP-J limit.
pub fn call_error(message_id: &str, code: ErrorCode, description: &str) -> OcppFrame {
    OcppFrame::call_error(message_id, code, truncate(description, MAX_ERROR_DESCRIPTION))
}

/// Reply for an error raised before or outside the pipeline.
pub fn error_reply(message_id: &str, err: &OcppNetError) -> Outbound {
    Outbound::Reply(call_error(message_id, err.error_code(), &err.to_string()))
}

pub fn outbound(decision: RoutedDecision) -> Outbound {
    let id = decision.request_id.as_str();
    match decision.result {
        ForwardingResult::Forward => match decision.forward_json {
            Some(payload) => Outbound::Relay {
                frame: OcppFrame::Call {
                    message_id: id.to_string(),
                    action: decision.action.as_str().to_string(),
                    payload,
                },
                destination: decision.destination,
                network_path: decision.network_path,
                deadline: decision.deadline,
            },
            None => Outbound::Reply(call_error(
                id,
                ErrorCode::InternalError,
                "forward decision without a request to relay",
            )),
        },
        ForwardingResult::Reject if decision.decode_failed => {
            let reason = decision.reject_message.as_deref().unwrap_or("malformed payload");
            Outbound::Reply(call_error(id, ErrorCode::FormatViolation, reason))
        }
        ForwardingResult::Reject => match decision.reject_json {
            Some(payload) => Outbound::Reply(OcppFrame::CallResult {
                message_id: id.to_string(),
                payload,
            }),
            None => Outbound::Reply(call_error(
                id,
                ErrorCode::InternalError,
                "reject decision without a response",
            )),
        },
        ForwardingResult::Drop => Outbound::Discard,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ocppnet_core::protocol::Action;
    use serde_json::json;

    fn routed(result: ForwardingResult) -> RoutedDecision {
        RoutedDecision {
            action: Action::Reset,
            request_id: RequestId::new("m-1"),
            result,
            destination: NetworkingNodeId::new("CS-1"),
            network_path: NetworkPath::from_hops(vec![
                NetworkingNodeId::new("CSMS"),
                NetworkingNodeId::new("NN-1"),
            ]),
            deadline: Utc::now(),
            forward_json: None,
            reject_json: None,
            reject_message: None,
            decode_failed: false,
        }
    }

    #[test]
    fn forward_becomes_relay_call() {
        let mut d = routed(ForwardingResult::Forward);
        d.forward_json = Some(json!({"type": "Immediate"}));
        let out = outbound(d);
        let Outbound::Relay { destination, network_path, frame, .. } = out else {
            panic!("expected relay, got {out:?}");
        };
        assert_eq!(destination.as_str(), "CS-1");
        assert_eq!(network_path.len(), 2);
        assert_eq!(frame.to_text(), r#"[2,"m-1","Reset",{"type":"Immediate"}]"#);
    }

    #[test]
    fn decode_failure_becomes_format_violation() {
        let mut d = routed(ForwardingResult::Reject);
        d.decode_failed = true;
        d.reject_message = Some("missing field `type`".into());
        d.reject_json = Some(json!({"status": "Rejected"}));
        match outbound(d) {
            Outbound::Reply(OcppFrame::CallError { code, description, .. }) => {
                assert_eq!(code, ErrorCode::FormatViolation);
                assert!(description.contains("type"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn reject_replies_with_call_result_and_drop_discards() {
        let mut d = routed(ForwardingResult::Reject);
        d.reject_json = Some(json!({"status": "Rejected"}));
        assert!(matches!(outbound(d), Outbound::Reply(OcppFrame::CallResult { .. })));
        assert_eq!(outbound(routed(ForwardingResult::Drop)), Outbound::Discard);
    }

    #[test]
    fn error_description_is_clipped() {
        let long = "x".repeat(400);
        let err = OcppNetError::Internal(long);
        let Outbound::Reply(OcppFrame::CallError { description, .. }) = error_reply("m", &err) else {
            panic!("expected call error");
        };
        assert_eq!(description.chars().count(), MAX_ERROR_DESCRIPTION);
    }
}
