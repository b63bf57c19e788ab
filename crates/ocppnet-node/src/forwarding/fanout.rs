//! Concurrent subscriber fan-out with per-subscriber fault isolation.
//!
//! All subscribers of a stage run concurrently and are joined before the
//! stage completes. A subscriber that returns an error or panics is reported
//! to the [`ErrorSink`] and counts as "no result"; its siblings and the
//! pipeline are unaffected.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use futures_util::future::{join_all, BoxFuture};
use futures_util::FutureExt;
use thiserror::Error;

use ocppnet_core::protocol::{Action, EventTrackingId, RequestId, RequestMeta};

use super::events::{BoxError, Stage, Subscriber, SubscriptionId};

/// Why a subscriber did not deliver a result.
#[derive(Debug, Error)]
pub enum SubscriberFault {
    #[error("subscriber failed: {0}")]
    Failed(BoxError),
    #[error("subscriber panicked: {0}")]
    Panicked(String),
}

/// Where a fault happened.
#[derive(Debug, Clone)]
pub struct FaultContext {
    pub action: Action,
    pub request_id: RequestId,
    pub event_tracking_id: EventTrackingId,
    pub subscription: SubscriptionId,
}

/// Single reporting point for subscriber faults. Implementations must not fail.
pub trait ErrorSink: Send + Sync {
    fn handle_error(&self, ctx: &FaultContext, stage: Stage, fault: &SubscriberFault);
}

/// Default sink: one structured warning per fault.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingErrorSink;

impl ErrorSink for TracingErrorSink {
    fn handle_error(&self, ctx: &FaultContext, stage: Stage, fault: &SubscriberFault) {
        tracing::warn!(
            action = %ctx.action,
            request_id = %ctx.request_id,
            event_tracking_id = %ctx.event_tracking_id,
            subscription = %ctx.subscription,
            stage = %stage,
            error = %fault,
            "subscriber fault"
        );
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Run `call` for every subscriber concurrently.
///
/// Results come back in registration order; faulted subscribers yield `None`.
pub(crate) async fn fan_out<'a, H, T, F>(
    subscribers: &'a [Subscriber<H>],
    stage: Stage,
    action: Action,
    meta: &RequestMeta,
    sink: &dyn ErrorSink,
    call: F,
) -> Vec<Option<T>>
where
    H: ?Sized + 'a,
    F: Fn(&'a H) -> BoxFuture<'a, Result<T, BoxError>>,
{
    if subscribers.is_empty() {
        return Vec::new();
    }

    let calls = subscribers.iter().map(|s| {
        let id = s.id;
        let fut = AssertUnwindSafe(call(s.handler.as_ref())).catch_unwind();
        async move { (id, fut.await) }
    });

    join_all(calls)
        .await
        .into_iter()
        .map(|(id, outcome)| {
            let fault = match outcome {
                Ok(Ok(value)) => return Some(value),
                Ok(Err(e)) => SubscriberFault::Failed(e),
                Err(payload) => SubscriberFault::Panicked(panic_message(payload)),
            };
            let ctx = FaultContext {
                action,
                request_id: meta.request_id.clone(),
                event_tracking_id: meta.event_tracking_id.clone(),
                subscription: id,
            };
            // Sink panics are swallowed.
            let _ = catch_unwind(AssertUnwindSafe(|| sink.handle_error(&ctx, stage, &fault)));
            None
        })
        .collect()
}
