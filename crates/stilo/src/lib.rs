//! # Stilo
//!
//! Inline-script task toolchain for server-rendered JSX, written in Rust.
//!
//! Stilo rewrites `useInlineTask` call sites at build time so their
//! callbacks capture outer-scope values explicitly, and emits the
//! captured values into an embeddable `<script>` element at render time.
//!
//! This crate re-exports all Stilo sub-crates for unified documentation.
//!
//! ## Crates
//!
//! - [`carton`] - Shared toolbox and reserved identifiers
//! - [`croquis`] - Lexical analysis of inline-task callbacks
//! - [`atelier`] - Source rewriting and source-map emission
//! - [`fresco`] - Render-time script-element emission
//! - [`vitrine`] - Bundler-facing plugin surface

/// Shared toolbox and reserved identifiers.
pub use stilo_carton as carton;

/// Lexical analysis of inline-task callbacks.
pub use stilo_croquis as croquis;

/// Source rewriting and source-map emission.
pub use stilo_atelier as atelier;

/// Render-time script-element emission.
pub use stilo_fresco as fresco;

/// Bundler-facing plugin surface.
pub use stilo_vitrine as vitrine;

pub use stilo_atelier::{rewrite_source, RewriteError, RewriteOutput, SourceMap, SourceType};
pub use stilo_fresco::{use_inline_task, use_inline_task_with, Captures, ScriptElement, TaskOutput};
pub use stilo_vitrine::{InlineTaskPlugin, PluginOptions, TransformOutput};
