//! Request forwarding pipeline.
//!
//! Decoding, the four subscription stages, decision selection and the
//! default policy live here; the transport only sees [`RoutedDecision`].

pub mod cancel;
pub mod decision;
pub mod events;
pub mod fanout;
pub mod pipeline;

pub use cancel::{cancel_pair, CancelHandle, CancelSignal};
pub use decision::{ForwardingDecision, ForwardingResult, RoutedDecision};
pub use events::{
    filter_fn, observer_fn, BoxError, DecisionObserver, MessageEvents, RequestEvent,
    RequestFilter, RequestObserver, Stage, SubscriptionId,
};
pub use fanout::{ErrorSink, FaultContext, SubscriberFault, TracingErrorSink};
pub use pipeline::ForwardingCore;
