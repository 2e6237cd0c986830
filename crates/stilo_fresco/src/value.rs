//! Capture values and their reactive wrappers.
//!
//! Captures arriving from the host framework are polymorphic: plain data,
//! signals carrying a current sample, or resources carrying a state and an
//! eventual payload. They are modelled as tagged variants with explicit
//! predicates. The predicate order is load-bearing: a resource also
//! exposes a current sample, so it satisfies the signal shape structurally
//! and must always be tested for first.

use std::fmt;
use std::future::Future;

use futures::future::BoxFuture;
use serde_json::Value;

use crate::errors::RenderError;

/// Future of a resource payload.
pub type PayloadFuture = BoxFuture<'static, Result<Value, RenderError>>;

/// Lifecycle state of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceState {
    Pending,
    Resolved,
    Rejected,
}

/// A reactive value whose current sample is read through `value`.
#[derive(Debug, Clone)]
pub struct SignalRef {
    value: Value,
}

impl SignalRef {
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    /// The current sample.
    pub fn value(&self) -> &Value {
        &self.value
    }

    pub(crate) fn into_value(self) -> Value {
        self.value
    }
}

/// A reactive asynchronous value: a state, an authoritative payload once
/// resolved, and a future of the payload otherwise.
pub struct ResourceRef {
    state: ResourceState,
    value: Option<Value>,
    promise: Option<PayloadFuture>,
}

impl ResourceRef {
    /// A resource that has already settled; its payload is authoritative.
    pub fn resolved(value: Value) -> Self {
        Self {
            state: ResourceState::Resolved,
            value: Some(value),
            promise: None,
        }
    }

    /// A still-loading resource; the future must be awaited before
    /// serialisation.
    pub fn pending<F>(promise: F) -> Self
    where
        F: Future<Output = Result<Value, RenderError>> + Send + 'static,
    {
        Self {
            state: ResourceState::Pending,
            value: None,
            promise: Some(Box::pin(promise)),
        }
    }

    /// A resource that settled with an error; awaiting it rejects.
    pub fn rejected(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            state: ResourceState::Rejected,
            value: None,
            promise: Some(Box::pin(futures::future::ready(Err(
                RenderError::ResourceRejected(reason),
            )))),
        }
    }

    pub fn state(&self) -> ResourceState {
        self.state
    }

    /// The current sample, present once resolved. This is what makes a
    /// resource look like a signal structurally.
    pub fn sample(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub(crate) fn into_parts(self) -> (ResourceState, Option<Value>, Option<PayloadFuture>) {
        (self.state, self.value, self.promise)
    }
}

impl fmt::Debug for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceRef")
            .field("state", &self.state)
            .field("value", &self.value)
            .field("promise", &self.promise.as_ref().map(|_| ".."))
            .finish()
    }
}

/// One capture handed to the runtime.
#[derive(Debug)]
pub enum CaptureValue {
    /// Any ordinary JSON-serialisable value.
    Plain(Value),
    /// A signal; its current sample is captured.
    Signal(SignalRef),
    /// A resource; resolved payloads are captured, pending ones awaited.
    Resource(ResourceRef),
    /// The host language's `undefined`; vanishes under JSON serialisation.
    Undefined,
}

impl CaptureValue {
    /// Resource detection strictly precedes signal detection.
    pub fn is_resource(&self) -> bool {
        matches!(self, CaptureValue::Resource(_))
    }

    /// Whether the value exposes a current sample. Resources do as well,
    /// which is why [`CaptureValue::is_resource`] must be tested first.
    pub fn is_signal(&self) -> bool {
        match self {
            CaptureValue::Signal(_) => true,
            CaptureValue::Resource(res) => res.sample().is_some(),
            _ => false,
        }
    }
}

impl From<Value> for CaptureValue {
    fn from(value: Value) -> Self {
        CaptureValue::Plain(value)
    }
}

impl From<SignalRef> for CaptureValue {
    fn from(signal: SignalRef) -> Self {
        CaptureValue::Signal(signal)
    }
}

impl From<ResourceRef> for CaptureValue {
    fn from(resource: ResourceRef) -> Self {
        CaptureValue::Resource(resource)
    }
}
