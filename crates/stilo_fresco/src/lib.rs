//! Fresco - Render-time inline-script emission for Stilo.
//!
//! The companion runtime of the capture transformer: it resolves each
//! capture (unwrapping signals, awaiting pending resources), serialises
//! the resolved values to JSON, escapes the assembled source against
//! HTML-parser breakout and returns a `<script>` element whose content is
//! a self-invoking application of the user callback to the captures.
//!
//! ## Name Origin
//!
//! A **fresco** is painted directly onto wet plaster and sets with the
//! wall itself. The runtime works the same way: the script is written
//! straight into the HTML as it is rendered, not attached afterwards.
//!
//! ## Module Structure
//!
//! - [`value`] - Capture values, signals and resources
//! - [`captures`] - Ordered capture maps
//! - [`task`] - The `useInlineTask` runtime surface
//! - [`escape`] - Script-data escaping
//! - [`element`] - The produced `<script>` element
//! - [`errors`] - Render-time errors

pub mod captures;
pub mod element;
pub mod errors;
pub mod escape;
pub mod task;
pub mod value;

pub use captures::{Captures, ResolvedCaptures};
pub use element::ScriptElement;
pub use errors::RenderError;
pub use escape::escape_script_content;
pub use task::{use_inline_task, use_inline_task_with, TaskOutput};
pub use value::{CaptureValue, PayloadFuture, ResourceRef, ResourceState, SignalRef};
