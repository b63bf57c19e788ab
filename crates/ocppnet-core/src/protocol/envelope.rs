//! Request envelope and the identifiers it carries.
//!
//! The transport builds one `RequestEnvelope` per inbound CALL. The envelope is
//! consumed by exactly one forwarding run and never mutated afterwards; decoded
//! requests copy its metadata so responses can be correlated.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;

/// OCPP-J message id (unique per in-flight request on a connection).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(String);

impl RequestId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random id for locally originated requests.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of a charging station, CSMS or networking node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NetworkingNodeId(String);

impl NetworkingNodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NetworkingNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered list of hops a request has travelled, source first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkPath(Vec<NetworkingNodeId>);

impl NetworkPath {
    /// Path of a request that entered the network at `source`.
    pub fn from_source(source: NetworkingNodeId) -> Self {
        Self(vec![source])
    }

    pub fn from_hops(hops: Vec<NetworkingNodeId>) -> Self {
        Self(hops)
    }

    /// Copy of this path with `hop` appended (a node relaying the request).
    pub fn append(&self, hop: NetworkingNodeId) -> Self {
        let mut hops = self.0.clone();
        hops.push(hop);
        Self(hops)
    }

    pub fn hops(&self) -> &[NetworkingNodeId] {
        &self.0
    }

    pub fn source(&self) -> Option<&NetworkingNodeId> {
        self.0.first()
    }

    pub fn last(&self) -> Option<&NetworkingNodeId> {
        self.0.last()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for NetworkPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for hop in &self.0 {
            if !first {
                f.write_str(" -> ")?;
            }
            f.write_str(hop.as_str())?;
            first = false;
        }
        Ok(())
    }
}

/// Correlates log lines and events belonging to one inbound request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct EventTrackingId(String);

impl EventTrackingId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventTrackingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Envelope metadata that travels with a decoded request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestMeta {
    pub request_id: RequestId,
    pub destination: NetworkingNodeId,
    pub network_path: NetworkPath,
    pub request_timestamp: DateTime<Utc>,
    pub request_timeout: Duration,
    pub event_tracking_id: EventTrackingId,
}

impl RequestMeta {
    /// Metadata for a request received now, with a fresh event-tracking id.
    pub fn received(
        request_id: RequestId,
        destination: NetworkingNodeId,
        network_path: NetworkPath,
        request_timeout: Duration,
    ) -> Self {
        Self {
            request_id,
            destination,
            network_path,
            request_timestamp: Utc::now(),
            request_timeout,
            event_tracking_id: EventTrackingId::generate(),
        }
    }

    /// Timestamp plus timeout; the timestamp itself if the sum overflows.
    pub fn deadline(&self) -> DateTime<Utc> {
        chrono::Duration::from_std(self.request_timeout)
            .ok()
            .and_then(|t| self.request_timestamp.checked_add_signed(t))
            .unwrap_or(self.request_timestamp)
    }
}

/// Generic inbound request wrapper: raw payload plus routing metadata.
#[derive(Debug, Clone)]
pub struct RequestEnvelope {
    pub meta: RequestMeta,
    /// Raw JSON payload of the CALL (decoded lazily by the pipeline).
    pub payload: Value,
}

impl RequestEnvelope {
    pub fn new(meta: RequestMeta, payload: Value) -> Self {
        Self { meta, payload }
    }

    pub fn request_id(&self) -> &RequestId {
        &self.meta.request_id
    }

    /// Deadline after which the originator stops waiting for an answer.
    pub fn deadline(&self) -> DateTime<Utc> {
        self.meta.deadline()
    }
}
