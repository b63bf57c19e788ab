use std::fmt;

use ocppnet_core::protocol::NetworkingNodeId;

/// Immutable metadata for a connected peer (charging station or child node).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    /// Connection identifier (per-connection).
    pub connection_id: String,
    /// Identity of the directly connected peer.
    pub remote: NetworkingNodeId,
    /// Where requests from this peer go unless a filter rewrites them.
    ///
    /// The node does not route by direction: for a CSMS-side peer sending
    /// CSMS-originated actions (Reset, ClearCache, ...) the caller must set
    /// the downstream charging station here.
    pub default_destination: NetworkingNodeId,
}

impl ConnectionInfo {
    pub fn new(
        connection_id: impl Into<String>,
        remote: NetworkingNodeId,
        default_destination: NetworkingNodeId,
    ) -> Self {
        Self {
            connection_id: connection_id.into(),
            remote,
            default_destination,
        }
    }

    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }
    pub fn remote(&self) -> &NetworkingNodeId {
        &self.remote
    }
}

impl fmt::Display for ConnectionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.remote, self.connection_id)
    }
}
