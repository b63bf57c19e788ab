//! Subscription points of the forwarding pipeline.
//!
//! Each message type gets its own [`MessageEvents`] with four independent
//! subscriber lists: RequestReceived, RequestFilter, RequestFiltered and
//! RequestSent. Lists are copy-on-write: a pipeline run takes a snapshot at
//! the start of each stage, so subscribing or unsubscribing while requests
//! are in flight never disturbs a running fan-out.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use ocppnet_core::message::OcppRequest;
use ocppnet_core::protocol::NetworkingNodeId;

use super::cancel::CancelSignal;
use super::decision::ForwardingDecision;
use crate::context::ConnectionInfo;

/// Error type subscribers report failures with.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Pipeline stage a subscriber is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Received,
    Filter,
    Filtered,
    Sent,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Received => "RequestReceived",
            Stage::Filter => "RequestFilter",
            Stage::Filtered => "RequestFiltered",
            Stage::Sent => "RequestSent",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle returned by every subscribe call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// What every subscriber gets told about a request.
#[derive(Debug, Clone)]
pub struct RequestEvent<Req> {
    pub timestamp: DateTime<Utc>,
    /// The node running the pipeline.
    pub sender: NetworkingNodeId,
    /// Connection the request arrived on.
    pub connection: ConnectionInfo,
    pub request: Req,
}

/// RequestReceived / RequestSent subscriber.
#[async_trait]
pub trait RequestObserver<Req: OcppRequest>: Send + Sync {
    async fn on_request(&self, event: &RequestEvent<Req>) -> Result<(), BoxError>;
}

/// RequestFilter subscriber. `Ok(None)` abstains.
#[async_trait]
pub trait RequestFilter<Req: OcppRequest>: Send + Sync {
    async fn filter(
        &self,
        event: &RequestEvent<Req>,
        cancel: &CancelSignal,
    ) -> Result<Option<ForwardingDecision<Req>>, BoxError>;
}

/// RequestFiltered subscriber: sees the final decision.
#[async_trait]
pub trait DecisionObserver<Req: OcppRequest>: Send + Sync {
    async fn on_decision(
        &self,
        event: &RequestEvent<Req>,
        decision: &ForwardingDecision<Req>,
    ) -> Result<(), BoxError>;
}

/// Synchronous filter built from a closure.
pub struct FnFilter<F>(F);

/// Wrap a closure as a [`RequestFilter`].
pub fn filter_fn<Req, F>(f: F) -> Arc<FnFilter<F>>
where
    Req: OcppRequest,
    F: Fn(&RequestEvent<Req>) -> Result<Option<ForwardingDecision<Req>>, BoxError> + Send + Sync,
{
    Arc::new(FnFilter(f))
}

#[async_trait]
impl<Req, F> RequestFilter<Req> for FnFilter<F>
where
    Req: OcppRequest,
    F: Fn(&RequestEvent<Req>) -> Result<Option<ForwardingDecision<Req>>, BoxError> + Send + Sync,
{
    async fn filter(
        &self,
        event: &RequestEvent<Req>,
        _cancel: &CancelSignal,
    ) -> Result<Option<ForwardingDecision<Req>>, BoxError> {
        (self.0)(event)
    }
}

/// Synchronous observer built from a closure.
pub struct FnObserver<F>(F);

/// Wrap a closure as a [`RequestObserver`].
pub fn observer_fn<Req, F>(f: F) -> Arc<FnObserver<F>>
where
    Req: OcppRequest,
    F: Fn(&RequestEvent<Req>) -> Result<(), BoxError> + Send + Sync,
{
    Arc::new(FnObserver(f))
}

#[async_trait]
impl<Req, F> RequestObserver<Req> for FnObserver<F>
where
    Req: OcppRequest,
    F: Fn(&RequestEvent<Req>) -> Result<(), BoxError> + Send + Sync,
{
    async fn on_request(&self, event: &RequestEvent<Req>) -> Result<(), BoxError> {
        (self.0)(event)
    }
}

pub(crate) struct Subscriber<H: ?Sized> {
    pub id: SubscriptionId,
    pub handler: Arc<H>,
}

impl<H: ?Sized> Clone for Subscriber<H> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            handler: Arc::clone(&self.handler),
        }
    }
}

/// Ordered subscriber list (registration order is preserved).
pub(crate) struct Subscribers<H: ?Sized> {
    list: RwLock<Arc<Vec<Subscriber<H>>>>,
}

impl<H: ?Sized> Subscribers<H> {
    fn new() -> Self {
        Self {
            list: RwLock::new(Arc::new(Vec::new())),
        }
    }

    fn add(&self, id: SubscriptionId, handler: Arc<H>) {
        let mut guard = self.list.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = Vec::with_capacity(guard.len() + 1);
        next.extend(guard.iter().cloned());
        next.push(Subscriber { id, handler });
        *guard = Arc::new(next);
    }

    fn remove(&self, id: SubscriptionId) -> bool {
        let mut guard = self.list.write().unwrap_or_else(PoisonError::into_inner);
        if !guard.iter().any(|s| s.id == id) {
            return false;
        }
        let next: Vec<_> = guard.iter().filter(|s| s.id != id).cloned().collect();
        *guard = Arc::new(next);
        true
    }

    /// Current list; later changes do not affect the returned snapshot.
    pub(crate) fn snapshot(&self) -> Arc<Vec<Subscriber<H>>> {
        Arc::clone(&self.list.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn len(&self) -> usize {
        self.list.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Subscriber registry for one message type.
pub struct MessageEvents<Req: OcppRequest> {
    next_id: AtomicU64,
    pub(crate) received: Subscribers<dyn RequestObserver<Req>>,
    pub(crate) filter: Subscribers<dyn RequestFilter<Req>>,
    pub(crate) filtered: Subscribers<dyn DecisionObserver<Req>>,
    pub(crate) sent: Subscribers<dyn RequestObserver<Req>>,
}

impl<Req: OcppRequest> Default for MessageEvents<Req> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Req: OcppRequest> MessageEvents<Req> {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            received: Subscribers::new(),
            filter: Subscribers::new(),
            filtered: Subscribers::new(),
            sent: Subscribers::new(),
        }
    }

    fn next_id(&self) -> SubscriptionId {
        SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Called for every successfully decoded request.
    pub fn on_request_received(&self, handler: Arc<dyn RequestObserver<Req>>) -> SubscriptionId {
        let id = self.next_id();
        self.received.add(id, handler);
        id
    }

    /// Called to vote on the forwarding decision.
    pub fn on_request_filter(&self, handler: Arc<dyn RequestFilter<Req>>) -> SubscriptionId {
        let id = self.next_id();
        self.filter.add(id, handler);
        id
    }

    /// Called with the final decision.
    pub fn on_request_filtered(&self, handler: Arc<dyn DecisionObserver<Req>>) -> SubscriptionId {
        let id = self.next_id();
        self.filtered.add(id, handler);
        id
    }

    /// Called with the request about to be relayed (FORWARD only).
    pub fn on_request_sent(&self, handler: Arc<dyn RequestObserver<Req>>) -> SubscriptionId {
        let id = self.next_id();
        self.sent.add(id, handler);
        id
    }

    /// Remove a subscription from whichever stage it belongs to.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.received.remove(id)
            || self.filter.remove(id)
            || self.filtered.remove(id)
            || self.sent.remove(id)
    }

    pub fn subscriber_count(&self, stage: Stage) -> usize {
        match stage {
            Stage::Received => self.received.len(),
            Stage::Filter => self.filter.len(),
            Stage::Filtered => self.filtered.len(),
            Stage::Sent => self.sent.len(),
        }
    }
}
