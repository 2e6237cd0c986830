//! Binding-pattern name flattening.
//!
//! Parameters and destructuring declarations introduce names through
//! arbitrarily nested object/array patterns; both the enclosing-scope
//! collector and the free-variable walker need the flat name list.

use oxc_ast::ast::{BindingPattern, BindingPatternKind, FormalParameters};
use stilo_carton::{CompactString, SmallVec};

/// Flat list of names, stack-allocated for the common small case.
pub type NameList = SmallVec<[CompactString; 4]>;

/// Extract every name a function's parameter list introduces, including
/// the rest parameter.
#[inline]
pub fn function_param_names(params: &FormalParameters<'_>) -> NameList {
    let mut names = NameList::new();

    for param in params.items.iter() {
        flatten_binding_pattern(&param.pattern, &mut names);
    }

    if let Some(rest) = &params.rest {
        flatten_binding_pattern(&rest.argument, &mut names);
    }

    names
}

/// Append every name a binding pattern introduces to `names`.
#[inline]
pub fn flatten_binding_pattern(pattern: &BindingPattern<'_>, names: &mut NameList) {
    match &pattern.kind {
        BindingPatternKind::BindingIdentifier(id) => {
            names.push(CompactString::new(id.name.as_str()));
        }
        BindingPatternKind::ObjectPattern(obj) => {
            for prop in obj.properties.iter() {
                flatten_binding_pattern(&prop.value, names);
            }
            if let Some(rest) = &obj.rest {
                flatten_binding_pattern(&rest.argument, names);
            }
        }
        BindingPatternKind::ArrayPattern(arr) => {
            for elem in arr.elements.iter().flatten() {
                flatten_binding_pattern(elem, names);
            }
            if let Some(rest) = &arr.rest {
                flatten_binding_pattern(&rest.argument, names);
            }
        }
        BindingPatternKind::AssignmentPattern(assign) => {
            flatten_binding_pattern(&assign.left, names);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxc_allocator::Allocator;
    use oxc_ast::ast::{Expression, Statement};
    use oxc_parser::Parser;
    use oxc_span::SourceType;

    fn first_arrow_param_names(source: &str) -> Vec<String> {
        let allocator = Allocator::default();
        let parsed = Parser::new(&allocator, source, SourceType::ts()).parse();
        let Some(Statement::ExpressionStatement(stmt)) = parsed.program.body.first() else {
            panic!("expected an expression statement");
        };
        let Expression::ArrowFunctionExpression(arrow) = &stmt.expression else {
            panic!("expected an arrow function");
        };
        function_param_names(&arrow.params)
            .iter()
            .map(|n| n.to_string())
            .collect()
    }

    #[test]
    fn test_plain_params() {
        assert_eq!(first_arrow_param_names("(a, b) => a;"), ["a", "b"]);
    }

    #[test]
    fn test_object_pattern() {
        assert_eq!(
            first_arrow_param_names("({ title, count: n }) => n;"),
            ["title", "n"]
        );
    }

    #[test]
    fn test_array_pattern_with_holes_and_rest() {
        assert_eq!(
            first_arrow_param_names("([first, , third], ...rest) => first;"),
            ["first", "third", "rest"]
        );
    }

    #[test]
    fn test_defaults_and_nested_patterns() {
        assert_eq!(
            first_arrow_param_names("({ a = 1, b: { c } }, d = 2) => c;"),
            ["a", "c", "d"]
        );
    }
}
