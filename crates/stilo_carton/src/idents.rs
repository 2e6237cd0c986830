//! Reserved identifiers for the capture rewriter.
//!
//! The rewriter introduces two names into user code: the scope parameter
//! injected into each captured callback and the fresh bindings that hold
//! the produced script elements. Both carry a double-underscore prefix so
//! they stay distinct from ordinary user identifiers, and names matching
//! the prefix are refused for auto-capture so the rewritten source remains
//! valid even when user code uses the same convention.

use compact_str::CompactString;

/// Prefix shared by every identifier the rewriter introduces.
pub const RESERVED_PREFIX: &str = "__";

/// The scope parameter written into captured callbacks.
pub const SCOPE_PARAM: &str = "__scope";

/// Prefix of the fresh bindings that hold produced script elements.
pub const TASK_BINDING_PREFIX: &str = "__task_";

/// The runtime hook the transformer looks for.
pub const HOOK_NAME: &str = "useInlineTask";

/// Build the fresh binding name for the `n`-th rewritten call in a file.
#[inline]
pub fn task_binding_name(n: u32) -> CompactString {
    CompactString::from(format!("{TASK_BINDING_PREFIX}{n}"))
}

/// Whether a name collides with the rewriter's reserved namespace.
#[inline]
pub fn is_reserved(name: &str) -> bool {
    name.starts_with(RESERVED_PREFIX)
}
