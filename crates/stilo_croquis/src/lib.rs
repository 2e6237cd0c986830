//! Croquis - Lexical analysis for Stilo.
//!
//! Quick sketches of meaning from inline-task callbacks: which identifiers
//! are free, which are shadowed, and which outer declarations are visible
//! at a given call site.
//!
//! ## Name Origin
//!
//! A **croquis** (/kroʊˈkiː/) is a quick sketch an artist makes to capture
//! the essentials of a subject. This crate sketches the lexical structure
//! of a callback just thoroughly enough to decide what must be captured.
//!
//! ## Module Structure
//!
//! - [`scope`] - Parent-linked scope chain with shadowing-aware lookup
//! - [`patterns`] - Binding-pattern name flattening
//! - [`enclosing`] - Visible-prefix collection for the enclosing function
//! - [`free_vars`] - Free-variable discovery over the callback body

pub mod enclosing;
pub mod free_vars;
pub mod patterns;
pub mod scope;

pub use enclosing::EnclosingScope;
pub use free_vars::{free_variables, Callable, FreeVariable};
pub use patterns::{flatten_binding_pattern, function_param_names};
pub use scope::{Scope, ScopeChain, ScopeId, ScopeKind};
