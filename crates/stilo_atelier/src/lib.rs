//! Atelier - The rewrite workshop for Stilo.
//!
//! Rewrites `useInlineTask` call sites so their callbacks read outer-scope
//! values through an explicit capture object, and splices the produced
//! script-element bindings into every return expression of the enclosing
//! function.
//!
//! ## Name Origin
//!
//! **Atelier** (/ˌætəlˈjeɪ/) is an artist's workshop or studio. This
//! workshop takes a parsed source file and reworks each inline-task call
//! in place, emitting localised edits and a source map rather than
//! re-printing the tree.
//!
//! ## Module Structure
//!
//! - [`edit`] - Localised edits over a single mutable buffer
//! - [`rewrite`] - Call detection, capture rewriting, return splicing
//! - [`source_map`] - v3 source-map emission from the edit list
//! - [`errors`] - Parse-failure reporting

pub mod edit;
pub mod errors;
mod rewrite;
pub mod source_map;

pub use errors::RewriteError;
pub use source_map::SourceMap;

// Re-exported so surface crates can pick the parse dialect without
// depending on oxc directly
pub use oxc_span::SourceType;

use oxc_allocator::Allocator;
use oxc_parser::Parser;

/// Result of rewriting one file that actually changed.
#[derive(Debug)]
pub struct RewriteOutput {
    pub code: String,
    pub map: SourceMap,
}

/// Parse `source` and rewrite every inline-task call site.
///
/// Returns `Ok(None)` when no edit was produced, so downstream passes see
/// the original text. Recognisable ineligibility (calls outside functions,
/// parameterised callables, missing captures) never fails; the only error
/// is a parse failure, which leaves the file untransformed.
pub fn rewrite_source(
    source: &str,
    source_type: SourceType,
    file: &str,
) -> Result<Option<RewriteOutput>, RewriteError> {
    let allocator = Allocator::default();
    let parsed = Parser::new(&allocator, source, source_type).parse();
    if !parsed.errors.is_empty() {
        return Err(RewriteError::Parse {
            file: file.to_string(),
            message: format!("{:?}", parsed.errors),
        });
    }

    let mut rewriter = rewrite::Rewriter::new(source);
    for stmt in parsed.program.body.iter() {
        rewriter.walk_statement(stmt);
    }
    rewriter.splice_returns();

    let edits = rewriter.edits.into_sorted();
    if edits.is_empty() {
        return Ok(None);
    }

    let code = edit::apply(source, &edits);
    let map = source_map::build_source_map(file, source, &edits);
    Ok(Some(RewriteOutput { code, map }))
}
