//! Visible-prefix collection for the enclosing function.
//!
//! A callback handed to the inline-task hook may only capture what the
//! enclosing function has already declared at the call site: its
//! parameters, plus every top-level variable statement or function
//! declaration that textually precedes the call. Host-language hoisting is
//! deliberately ignored; a declaration after the call is not capturable.
//! Collection never crosses into outer functions.

use oxc_ast::ast::{ArrowFunctionExpression, Function, Statement};
use stilo_carton::CompactString;

use crate::patterns::{flatten_binding_pattern, function_param_names, NameList};

/// Names an inline-task callback may capture from its enclosing function.
#[derive(Debug, Default)]
pub struct EnclosingScope {
    /// Parameter names (always visible).
    params: NameList,
    /// Top-level declarations with the start position of their statement.
    decls: Vec<(CompactString, u32)>,
}

impl EnclosingScope {
    /// Collect from a function declaration or function expression.
    pub fn of_function(func: &Function<'_>) -> Self {
        let mut scope = Self {
            params: function_param_names(&func.params),
            decls: Vec::new(),
        };
        if let Some(body) = &func.body {
            for stmt in body.statements.iter() {
                scope.collect_statement(stmt);
            }
        }
        scope
    }

    /// Collect from an arrow function. An expression body has no top-level
    /// declarations, so only parameters contribute.
    pub fn of_arrow(arrow: &ArrowFunctionExpression<'_>) -> Self {
        let mut scope = Self {
            params: function_param_names(&arrow.params),
            decls: Vec::new(),
        };
        if !arrow.expression {
            for stmt in arrow.body.statements.iter() {
                scope.collect_statement(stmt);
            }
        }
        scope
    }

    fn collect_statement(&mut self, stmt: &Statement<'_>) {
        match stmt {
            Statement::VariableDeclaration(var_decl) => {
                let start = var_decl.span.start;
                let mut names = NameList::new();
                for decl in var_decl.declarations.iter() {
                    flatten_binding_pattern(&decl.id, &mut names);
                }
                for name in names {
                    self.decls.push((name, start));
                }
            }
            Statement::FunctionDeclaration(func) => {
                if let Some(id) = &func.id {
                    self.decls
                        .push((CompactString::new(id.name.as_str()), func.span.start));
                }
            }
            _ => {}
        }
    }

    /// Whether `name` is capturable from a call at source position `pos`:
    /// a parameter, or a top-level declaration starting before `pos`.
    #[inline]
    pub fn is_visible(&self, name: &str, pos: u32) -> bool {
        if self.params.iter().any(|p| p == name) {
            return true;
        }
        self.decls
            .iter()
            .any(|(decl, start)| *start < pos && decl == name)
    }

    /// Whether the function has anything a callback could capture at all.
    #[inline]
    pub fn is_vacant(&self) -> bool {
        self.params.is_empty() && self.decls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxc_allocator::Allocator;
    use oxc_parser::Parser;
    use oxc_span::SourceType;

    fn with_first_function(source: &str, f: impl FnOnce(EnclosingScope, &str)) {
        let allocator = Allocator::default();
        let parsed = Parser::new(&allocator, source, SourceType::ts()).parse();
        let Some(Statement::FunctionDeclaration(func)) = parsed.program.body.first() else {
            panic!("expected a function declaration");
        };
        f(EnclosingScope::of_function(func), source);
    }

    #[test]
    fn test_params_always_visible() {
        with_first_function("function C(props, { id }) { return null; }", |scope, _| {
            assert!(scope.is_visible("props", 0));
            assert!(scope.is_visible("id", 0));
            assert!(!scope.is_visible("other", u32::MAX));
        });
    }

    #[test]
    fn test_declarations_visible_only_before_position() {
        let source = "function C() { const a = 1; call(); const b = 2; }";
        with_first_function(source, |scope, src| {
            let call_pos = src.find("call()").unwrap() as u32;
            assert!(scope.is_visible("a", call_pos));
            // Declared after the call, even though the host language hoists it
            assert!(!scope.is_visible("b", call_pos));
            assert!(scope.is_visible("b", src.len() as u32));
        });
    }

    #[test]
    fn test_function_declarations_count() {
        let source = "function C() { function helper() {} call(); }";
        with_first_function(source, |scope, src| {
            let call_pos = src.find("call()").unwrap() as u32;
            assert!(scope.is_visible("helper", call_pos));
        });
    }

    #[test]
    fn test_destructured_declarations() {
        let source = "function C() { const { x, y: z } = point(); call(); }";
        with_first_function(source, |scope, src| {
            let call_pos = src.find("call()").unwrap() as u32;
            assert!(scope.is_visible("x", call_pos));
            assert!(scope.is_visible("z", call_pos));
            assert!(!scope.is_visible("y", call_pos));
        });
    }

    #[test]
    fn test_nested_declarations_ignored() {
        // Only the top level of the block body is collected
        let source = "function C() { { const hidden = 1; } call(); }";
        with_first_function(source, |scope, src| {
            let call_pos = src.find("call()").unwrap() as u32;
            assert!(!scope.is_visible("hidden", call_pos));
            assert!(scope.is_vacant());
        });
    }

    #[test]
    fn test_vacant_function() {
        with_first_function("function C() { call(); }", |scope, _| {
            assert!(scope.is_vacant());
        });
    }
}
