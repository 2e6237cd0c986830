//! Carton - The shared toolbox for Stilo.
//!
//! This crate provides the foundational utilities and data structures shared
//! across the Stilo toolchain, much like a carton (artist's portfolio case)
//! holds the essential tools and materials an artist needs for their work.
//!
//! # Modules
//!
//! - **Idents**: the reserved-identifier scheme used by the capture rewriter

pub mod idents;

// Re-export compact_str::CompactString for convenience
pub use compact_str::CompactString;

// Re-export rustc-hash for fast hash maps/sets
pub use rustc_hash::{FxHashMap, FxHashSet};

// Re-export smallvec for stack-optimized collections
pub use smallvec::{smallvec, SmallVec};

pub use idents::*;
