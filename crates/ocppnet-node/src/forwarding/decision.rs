//! Forwarding decisions.
//!
//! A filter votes with a [`ForwardingDecision`]; the pipeline completes the
//! winning vote (attaches the decoded request, synthesizes and serializes a
//! rejection, serializes the request to relay) before handing it back.
//! [`RoutedDecision`] is the type-erased view the transport consumes.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use ocppnet_core::error::{OcppNetError, Result};
use ocppnet_core::message::{CustomSerializers, OcppRequest, OcppResponse, ResponseResult, ToJson};
use ocppnet_core::protocol::{Action, NetworkPath, NetworkingNodeId, RequestId, RequestMeta};

/// Outcome of a forwarding run, also used as the node's default policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForwardingResult {
    /// Relay the (possibly rewritten) request.
    Forward,
    /// Answer the originator locally with a rejection.
    Reject,
    /// Neither relay nor answer.
    Drop,
}

impl ForwardingResult {
    pub fn as_str(self) -> &'static str {
        match self {
            ForwardingResult::Forward => "FORWARD",
            ForwardingResult::Reject => "REJECT",
            ForwardingResult::Drop => "DROP",
        }
    }

    /// Rank used to pick one decision out of several filter votes.
    pub fn restrictiveness(self) -> u8 {
        match self {
            ForwardingResult::Forward => 0,
            ForwardingResult::Reject => 1,
            ForwardingResult::Drop => 2,
        }
    }

    pub(crate) fn to_u8(self) -> u8 {
        self.restrictiveness()
    }

    pub(crate) fn from_u8(v: u8) -> Self {
        match v {
            0 => ForwardingResult::Forward,
            2 => ForwardingResult::Drop,
            _ => ForwardingResult::Reject,
        }
    }
}

impl fmt::Display for ForwardingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ForwardingResult {
    type Err = OcppNetError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "forward" => Ok(ForwardingResult::Forward),
            "reject" => Ok(ForwardingResult::Reject),
            "drop" => Ok(ForwardingResult::Drop),
            _ => Err(OcppNetError::BadConfig(format!(
                "unknown forwarding result: {s} (expected forward|reject|drop)"
            ))),
        }
    }
}

/// Result of forwarding one request of type `Req`.
#[derive(Debug, Clone)]
pub struct ForwardingDecision<Req: OcppRequest> {
    pub result: ForwardingResult,
    /// The decoded request. `None` only when decoding failed.
    pub request: Option<Req>,
    /// Request to relay (the original unless a filter rewrote it).
    pub new_request: Option<Req>,
    /// Serialized `new_request`, ready to send.
    pub new_json_request: Option<Value>,
    pub reject_response: Option<Req::Response>,
    /// Serialized `reject_response`, ready to send.
    pub reject_json: Option<Value>,
    /// Human readable reason (decode error, filter or policy explanation).
    pub reject_message: Option<String>,
}

impl<Req: OcppRequest> ForwardingDecision<Req> {
    fn with_result(result: ForwardingResult) -> Self {
        Self {
            result,
            request: None,
            new_request: None,
            new_json_request: None,
            reject_response: None,
            reject_json: None,
            reject_message: None,
        }
    }

    /// Relay the request unchanged.
    pub fn forward() -> Self {
        Self::with_result(ForwardingResult::Forward)
    }

    /// Relay `new_request` instead of the original.
    ///
    /// The pipeline keeps the original request id on the rewritten request so
    /// the eventual response still correlates.
    pub fn rewrite(new_request: Req) -> Self {
        let mut d = Self::with_result(ForwardingResult::Forward);
        d.new_request = Some(new_request);
        d
    }

    /// Reject with the canonical "filtered" response.
    pub fn reject(reason: impl Into<String>) -> Self {
        let mut d = Self::with_result(ForwardingResult::Reject);
        d.reject_message = Some(reason.into());
        d
    }

    /// Reject with a response built by the filter.
    pub fn reject_with(response: Req::Response) -> Self {
        let mut d = Self::with_result(ForwardingResult::Reject);
        d.reject_message = response.result().description.clone();
        d.reject_response = Some(response);
        d
    }

    /// Discard the request without answering.
    pub fn discard(reason: impl Into<String>) -> Self {
        let mut d = Self::with_result(ForwardingResult::Drop);
        d.reject_message = Some(reason.into());
        d
    }

    /// Decision for a payload that could not be decoded.
    pub(crate) fn rejected_at_decode(
        meta: &RequestMeta,
        error: String,
        serializers: &CustomSerializers,
    ) -> Self {
        let response = Req::Response::rejected(meta, ResponseResult::format_violation(error.clone()));
        let mut d = Self::with_result(ForwardingResult::Reject);
        d.reject_json = Some(response.to_json(serializers));
        d.reject_response = Some(response);
        d.reject_message = Some(error);
        d
    }

    pub fn is_forward(&self) -> bool {
        self.result == ForwardingResult::Forward
    }

    /// `true` when the request never got past decoding.
    pub fn rejected_at_decode_stage(&self) -> bool {
        self.request.is_none()
    }

    /// Request that will actually be relayed.
    pub fn effective_request(&self) -> Option<&Req> {
        self.new_request.as_ref().or(self.request.as_ref())
    }

    /// Ensure a REJECT carries a response and its JSON.
    pub(crate) fn materialize_reject(&mut self, meta: &RequestMeta, serializers: &CustomSerializers) {
        if self.result != ForwardingResult::Reject {
            return;
        }
        self.new_request = None;
        self.new_json_request = None;

        if self.reject_response.is_none() {
            let reason = self
                .reject_message
                .clone()
                .unwrap_or_else(|| format!("{} filtered by networking node", Req::ACTION));
            self.reject_response = Some(Req::Response::rejected(meta, ResponseResult::filtered(reason)));
        }
        if let Some(response) = &self.reject_response {
            self.reject_json = Some(response.to_json(serializers));
        }
    }

    /// Pin the request to relay.
    ///
    /// A rewritten request inherits the original envelope metadata (correlation
    /// id, path, timing, tracking id); only a destination set by the filter is kept.
    pub(crate) fn settle_forward(&mut self, original: &RequestMeta) {
        match &mut self.new_request {
            Some(rewritten) => {
                let meta = rewritten.meta_mut();
                let destination = if meta.destination.as_str().is_empty() {
                    original.destination.clone()
                } else {
                    meta.destination.clone()
                };
                *meta = RequestMeta {
                    destination,
                    ..original.clone()
                };
            }
            None => self.new_request = self.request.clone(),
        }
    }

    /// Serialize the request to relay.
    pub(crate) fn serialize_forward(&mut self, serializers: &CustomSerializers) {
        self.new_json_request = self.new_request.as_ref().map(|r| r.to_json(serializers));
    }

    pub(crate) fn clear_outputs(&mut self) {
        self.new_request = None;
        self.new_json_request = None;
        self.reject_response = None;
        self.reject_json = None;
    }

    /// Type-erased view for the transport.
    pub fn route(&self, envelope: &RequestMeta, via: &NetworkingNodeId) -> RoutedDecision {
        let routed_meta = match (self.result, self.effective_request()) {
            (ForwardingResult::Forward, Some(req)) => req.meta(),
            _ => envelope,
        };
        RoutedDecision {
            action: Req::ACTION,
            request_id: envelope.request_id.clone(),
            result: self.result,
            destination: routed_meta.destination.clone(),
            network_path: routed_meta.network_path.append(via.clone()),
            deadline: routed_meta.deadline(),
            forward_json: self.new_json_request.clone(),
            reject_json: self.reject_json.clone(),
            reject_message: self.reject_message.clone(),
            decode_failed: self.rejected_at_decode_stage(),
        }
    }
}

/// Decision as seen by the transport, independent of the message type.
#[derive(Debug, Clone)]
pub struct RoutedDecision {
    pub action: Action,
    pub request_id: RequestId,
    pub result: ForwardingResult,
    pub destination: NetworkingNodeId,
    /// Path to attach when relaying (this node appended).
    pub network_path: NetworkPath,
    pub deadline: DateTime<Utc>,
    pub forward_json: Option<Value>,
    pub reject_json: Option<Value>,
    pub reject_message: Option<String>,
    pub decode_failed: bool,
}
