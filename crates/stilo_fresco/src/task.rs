//! The inline-task runtime surface.
//!
//! Resolution is synchronous whenever every capture already has a value;
//! the element is assembled and returned directly. When at least one
//! resource is still pending, the returned future suspends exactly once,
//! at the join across all pending payloads, then performs the same
//! assembly. Both paths produce byte-identical script content for the
//! same settled values.

use futures::future::{join_all, BoxFuture};
use serde_json::Value;
use stilo_carton::CompactString;

use crate::captures::{Captures, ResolvedCaptures};
use crate::element::ScriptElement;
use crate::errors::RenderError;
use crate::escape::escape_script_content;
use crate::value::{CaptureValue, PayloadFuture, ResourceState};

/// What an inline-task call produces at render time.
pub enum TaskOutput {
    /// Every capture was available synchronously.
    Ready(ScriptElement),
    /// At least one resource was pending; the element arrives later.
    Pending(BoxFuture<'static, Result<ScriptElement, RenderError>>),
}

impl TaskOutput {
    pub fn is_ready(&self) -> bool {
        matches!(self, TaskOutput::Ready(_))
    }

    /// The element, when it was produced synchronously.
    pub fn ready(self) -> Option<ScriptElement> {
        match self {
            TaskOutput::Ready(element) => Some(element),
            TaskOutput::Pending(_) => None,
        }
    }

    /// Wait for the element on either path.
    pub async fn resolve(self) -> Result<ScriptElement, RenderError> {
        match self {
            TaskOutput::Ready(element) => Ok(element),
            TaskOutput::Pending(future) => future.await,
        }
    }
}

impl std::fmt::Debug for TaskOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskOutput::Ready(element) => f.debug_tuple("Ready").field(element).finish(),
            TaskOutput::Pending(_) => f.debug_tuple("Pending").field(&"..").finish(),
        }
    }
}

/// Per-capture resolution slot.
enum Slot {
    Done(Value),
    /// `undefined` vanishes under JSON serialisation.
    Omitted,
    /// Filled in by the pending-resource join.
    Awaiting,
}

/// Emit the script element for a capture-free callback. The one-argument
/// form never suspends.
pub fn use_inline_task(callable: impl Into<String>) -> ScriptElement {
    let callable = callable.into();
    ScriptElement::new(escape_script_content(&format!("({callable})()")))
}

/// Emit the script element for a callback with captures.
///
/// Returns [`TaskOutput::Ready`] when no capture needs awaiting, and
/// [`TaskOutput::Pending`] when at least one resource is unresolved.
/// Synchronous serialisation failures are returned directly; rejected
/// resources reject the pending future.
pub fn use_inline_task_with(
    callable: impl Into<String>,
    captures: Captures,
) -> Result<TaskOutput, RenderError> {
    let callable = callable.into();
    let mut names: Vec<CompactString> = Vec::with_capacity(captures.len());
    let mut slots: Vec<Slot> = Vec::with_capacity(captures.len());
    let mut pending: Vec<(usize, PayloadFuture)> = Vec::new();

    for (idx, (name, value)) in captures.into_iter().enumerate() {
        names.push(name);
        let slot = match value {
            // Resources are tested before signals: a resolved payload is
            // authoritative, anything else awaits the promise
            CaptureValue::Resource(resource) => match resource.into_parts() {
                (ResourceState::Resolved, Some(payload), _) => Slot::Done(payload),
                (ResourceState::Resolved, None, _) => Slot::Done(Value::Null),
                (_, _, Some(promise)) => {
                    pending.push((idx, promise));
                    Slot::Awaiting
                }
                (_, _, None) => Slot::Done(Value::Null),
            },
            CaptureValue::Signal(signal) => Slot::Done(signal.into_value()),
            CaptureValue::Plain(value) => Slot::Done(value),
            CaptureValue::Undefined => Slot::Omitted,
        };
        slots.push(slot);
    }

    if pending.is_empty() {
        return Ok(TaskOutput::Ready(assemble(&callable, names, slots)?));
    }

    Ok(TaskOutput::Pending(Box::pin(async move {
        let (indices, futures): (Vec<usize>, Vec<PayloadFuture>) = pending.into_iter().unzip();
        // The single suspension point: all pending payloads settle together
        let settled = join_all(futures).await;
        for (idx, result) in indices.into_iter().zip(settled) {
            slots[idx] = Slot::Done(result?);
        }
        assemble(&callable, names, slots)
    })))
}

fn assemble(
    callable: &str,
    names: Vec<CompactString>,
    slots: Vec<Slot>,
) -> Result<ScriptElement, RenderError> {
    let mut resolved = ResolvedCaptures::default();
    for (name, slot) in names.into_iter().zip(slots) {
        match slot {
            Slot::Done(value) => resolved.push(name, value),
            Slot::Omitted => {}
            Slot::Awaiting => debug_assert!(false, "pending capture was never settled"),
        }
    }
    let json = serde_json::to_string(&resolved)?;
    let source = format!("({callable})({json})");
    Ok(ScriptElement::new(escape_script_content(&source)))
}
