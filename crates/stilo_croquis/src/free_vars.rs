//! Free-variable discovery over an inline-task callback.
//!
//! The walk recursively visits the callback body while maintaining a
//! [`ScopeChain`], and emits every identifier occurrence that is a value
//! reference, unbound inside the callback, and visible in the enclosing
//! function at the call site. Occurrences are emitted in encounter order,
//! duplicates included: the first occurrence of a name fixes its position
//! in the capture list, later occurrences are still rewritten.
//!
//! Value-reference classification leans on the AST's node partitioning:
//! member-access property names, declaration names, labels and type-level
//! positions are distinct node kinds and are simply never visited. The two
//! positions that do share the reference node kind are handled explicitly:
//! the value of a shorthand object property (`{ name }`) is skipped, since
//! rewriting it to `{ __scope.name }` would not parse, and assignment or
//! update targets (`name = v`, `name++`) are visited, since they read and
//! write the binding at run time.

use oxc_ast::ast::{
    Argument, ArrayExpressionElement, ArrowFunctionExpression, AssignmentTarget, CallExpression,
    ChainElement, ClassElement, Expression, Function, IdentifierReference, ObjectPropertyKind,
    SimpleAssignmentTarget, Statement,
};
use oxc_span::Span;
use stilo_carton::{idents, CompactString};

use crate::enclosing::EnclosingScope;
use crate::patterns::{flatten_binding_pattern, function_param_names, NameList};
use crate::scope::{ScopeChain, ScopeKind};

/// The callable argument of an inline-task call.
#[derive(Clone, Copy)]
pub enum Callable<'b, 'a> {
    Arrow(&'b ArrowFunctionExpression<'a>),
    Function(&'b Function<'a>),
}

/// One value-position occurrence of a capturable outer identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreeVariable {
    pub name: CompactString,
    pub span: Span,
}

/// Walk `callable` and return every capturable occurrence in encounter
/// order. `call_pos` is the start of the inline-task call, used to limit
/// the enclosing scope to its visible prefix.
pub fn free_variables(
    callable: Callable<'_, '_>,
    enclosing: &EnclosingScope,
    call_pos: u32,
) -> Vec<FreeVariable> {
    let mut finder = Finder {
        enclosing,
        call_pos,
        scopes: ScopeChain::new(),
        out: Vec::new(),
    };

    match callable {
        Callable::Arrow(arrow) => {
            for name in function_param_names(&arrow.params) {
                finder.scopes.add_name(name);
            }
            if arrow.expression {
                // Concise arrow: () => expr
                if let Some(Statement::ExpressionStatement(stmt)) = arrow.body.statements.first() {
                    finder.walk_expression(&stmt.expression);
                }
            } else {
                for stmt in arrow.body.statements.iter() {
                    finder.walk_statement(stmt);
                }
            }
        }
        Callable::Function(func) => {
            for name in function_param_names(&func.params) {
                finder.scopes.add_name(name);
            }
            if let Some(body) = &func.body {
                for stmt in body.statements.iter() {
                    finder.walk_statement(stmt);
                }
            }
        }
    }

    finder.out
}

struct Finder<'s> {
    enclosing: &'s EnclosingScope,
    call_pos: u32,
    scopes: ScopeChain,
    out: Vec<FreeVariable>,
}

impl Finder<'_> {
    fn visit_reference(&mut self, ident: &IdentifierReference<'_>) {
        let name = ident.name.as_str();
        // Names in the rewriter's reserved namespace are refused for capture
        if idents::is_reserved(name) {
            return;
        }
        if self.scopes.has(name) {
            return;
        }
        if !self.enclosing.is_visible(name, self.call_pos) {
            return;
        }
        self.out.push(FreeVariable {
            name: CompactString::new(name),
            span: ident.span,
        });
    }

    fn add_pattern_names(&mut self, pattern: &oxc_ast::ast::BindingPattern<'_>) {
        let mut names = NameList::new();
        flatten_binding_pattern(pattern, &mut names);
        for name in names {
            self.scopes.add_name(name);
        }
    }

    fn enter_function_scope(&mut self, params: &oxc_ast::ast::FormalParameters<'_>) {
        self.scopes.enter_scope(ScopeKind::Closure);
        for name in function_param_names(params) {
            self.scopes.add_name(name);
        }
    }

    fn walk_expression(&mut self, expr: &Expression<'_>) {
        match expr {
            Expression::Identifier(ident) => {
                self.visit_reference(ident);
            }

            // Nested arrow functions shadow through their parameters
            Expression::ArrowFunctionExpression(arrow) => {
                self.enter_function_scope(&arrow.params);
                if arrow.expression {
                    if let Some(Statement::ExpressionStatement(stmt)) =
                        arrow.body.statements.first()
                    {
                        self.walk_expression(&stmt.expression);
                    }
                } else {
                    for stmt in arrow.body.statements.iter() {
                        self.walk_statement(stmt);
                    }
                }
                self.scopes.exit_scope();
            }
            Expression::FunctionExpression(func) => {
                self.enter_function_scope(&func.params);
                if let Some(body) = &func.body {
                    for stmt in body.statements.iter() {
                        self.walk_statement(stmt);
                    }
                }
                self.scopes.exit_scope();
            }

            Expression::CallExpression(call) => {
                self.walk_call(call);
            }
            Expression::NewExpression(new_expr) => {
                self.walk_expression(&new_expr.callee);
                self.walk_arguments(&new_expr.arguments);
            }

            // Member expressions: the property side of `obj.prop` is a
            // property name, only the object is a reference
            Expression::StaticMemberExpression(member) => {
                self.walk_expression(&member.object);
            }
            Expression::ComputedMemberExpression(member) => {
                self.walk_expression(&member.object);
                self.walk_expression(&member.expression);
            }
            Expression::PrivateFieldExpression(field) => {
                self.walk_expression(&field.object);
            }

            Expression::ChainExpression(chain) => match &chain.expression {
                ChainElement::CallExpression(call) => {
                    self.walk_call(call);
                }
                ChainElement::TSNonNullExpression(expr) => {
                    self.walk_expression(&expr.expression);
                }
                ChainElement::StaticMemberExpression(member) => {
                    self.walk_expression(&member.object);
                }
                ChainElement::ComputedMemberExpression(member) => {
                    self.walk_expression(&member.object);
                    self.walk_expression(&member.expression);
                }
                ChainElement::PrivateFieldExpression(field) => {
                    self.walk_expression(&field.object);
                }
            },

            Expression::ConditionalExpression(cond) => {
                self.walk_expression(&cond.test);
                self.walk_expression(&cond.consequent);
                self.walk_expression(&cond.alternate);
            }
            Expression::LogicalExpression(logical) => {
                self.walk_expression(&logical.left);
                self.walk_expression(&logical.right);
            }
            Expression::BinaryExpression(binary) => {
                self.walk_expression(&binary.left);
                self.walk_expression(&binary.right);
            }

            Expression::ArrayExpression(arr) => {
                for elem in arr.elements.iter() {
                    match elem {
                        ArrayExpressionElement::SpreadElement(spread) => {
                            self.walk_expression(&spread.argument);
                        }
                        ArrayExpressionElement::Elision(_) => {}
                        _ => {
                            if let Some(expr) = elem.as_expression() {
                                self.walk_expression(expr);
                            }
                        }
                    }
                }
            }
            Expression::ObjectExpression(obj) => {
                for prop in obj.properties.iter() {
                    match prop {
                        ObjectPropertyKind::ObjectProperty(p) => {
                            if p.computed {
                                if let Some(key) = p.key.as_expression() {
                                    self.walk_expression(key);
                                }
                            }
                            // Shorthand values share their node with the
                            // property name; rewriting them would not parse
                            if !p.shorthand {
                                self.walk_expression(&p.value);
                            }
                        }
                        ObjectPropertyKind::SpreadProperty(spread) => {
                            self.walk_expression(&spread.argument);
                        }
                    }
                }
            }

            Expression::TemplateLiteral(tpl) => {
                for expr in tpl.expressions.iter() {
                    self.walk_expression(expr);
                }
            }
            Expression::TaggedTemplateExpression(tagged) => {
                self.walk_expression(&tagged.tag);
                for expr in tagged.quasi.expressions.iter() {
                    self.walk_expression(expr);
                }
            }

            Expression::AwaitExpression(await_expr) => {
                self.walk_expression(&await_expr.argument);
            }
            Expression::UnaryExpression(unary) => {
                self.walk_expression(&unary.argument);
            }
            Expression::UpdateExpression(update) => {
                self.walk_simple_target(&update.argument);
            }
            Expression::YieldExpression(yield_expr) => {
                if let Some(arg) = &yield_expr.argument {
                    self.walk_expression(arg);
                }
            }

            Expression::SequenceExpression(seq) => {
                for expr in seq.expressions.iter() {
                    self.walk_expression(expr);
                }
            }
            Expression::ParenthesizedExpression(paren) => {
                self.walk_expression(&paren.expression);
            }

            Expression::AssignmentExpression(assign) => {
                self.walk_assignment_target(&assign.left);
                self.walk_expression(&assign.right);
            }

            // TypeScript type assertions (as, satisfies, !)
            Expression::TSAsExpression(ts_as) => {
                self.walk_expression(&ts_as.expression);
            }
            Expression::TSSatisfiesExpression(ts_satisfies) => {
                self.walk_expression(&ts_satisfies.expression);
            }
            Expression::TSNonNullExpression(ts_non_null) => {
                self.walk_expression(&ts_non_null.expression);
            }

            // Literals, JSX, class expressions and the rest carry no
            // capturable references worth walking
            _ => {}
        }
    }

    fn walk_call(&mut self, call: &CallExpression<'_>) {
        self.walk_expression(&call.callee);
        self.walk_arguments(&call.arguments);
    }

    fn walk_arguments(&mut self, arguments: &[Argument<'_>]) {
        for arg in arguments.iter() {
            match arg {
                Argument::SpreadElement(spread) => {
                    self.walk_expression(&spread.argument);
                }
                _ => {
                    if let Some(expr) = arg.as_expression() {
                        self.walk_expression(expr);
                    }
                }
            }
        }
    }

    fn walk_assignment_target(&mut self, target: &AssignmentTarget<'_>) {
        match target {
            AssignmentTarget::AssignmentTargetIdentifier(id) => {
                self.visit_reference(id);
            }
            AssignmentTarget::StaticMemberExpression(member) => {
                self.walk_expression(&member.object);
            }
            AssignmentTarget::ComputedMemberExpression(member) => {
                self.walk_expression(&member.object);
                self.walk_expression(&member.expression);
            }
            _ => {}
        }
    }

    fn walk_simple_target(&mut self, target: &SimpleAssignmentTarget<'_>) {
        match target {
            SimpleAssignmentTarget::AssignmentTargetIdentifier(id) => {
                self.visit_reference(id);
            }
            SimpleAssignmentTarget::StaticMemberExpression(member) => {
                self.walk_expression(&member.object);
            }
            SimpleAssignmentTarget::ComputedMemberExpression(member) => {
                self.walk_expression(&member.object);
                self.walk_expression(&member.expression);
            }
            _ => {}
        }
    }

    fn walk_statement(&mut self, stmt: &Statement<'_>) {
        match stmt {
            Statement::ExpressionStatement(expr_stmt) => {
                self.walk_expression(&expr_stmt.expression);
            }
            Statement::VariableDeclaration(var_decl) => {
                for decl in var_decl.declarations.iter() {
                    self.add_pattern_names(&decl.id);
                    if let Some(init) = &decl.init {
                        self.walk_expression(init);
                    }
                }
            }
            // A named nested function declaration binds its name in the
            // scope the declaration appears in
            Statement::FunctionDeclaration(func) => {
                if let Some(id) = &func.id {
                    self.scopes.add_name(CompactString::new(id.name.as_str()));
                }
                self.enter_function_scope(&func.params);
                if let Some(body) = &func.body {
                    for stmt in body.statements.iter() {
                        self.walk_statement(stmt);
                    }
                }
                self.scopes.exit_scope();
            }
            Statement::ClassDeclaration(class) => {
                if let Some(id) = &class.id {
                    self.scopes.add_name(CompactString::new(id.name.as_str()));
                }
                for element in class.body.body.iter() {
                    if let ClassElement::MethodDefinition(method) = element {
                        if let Some(body) = &method.value.body {
                            self.enter_function_scope(&method.value.params);
                            for stmt in body.statements.iter() {
                                self.walk_statement(stmt);
                            }
                            self.scopes.exit_scope();
                        }
                    }
                }
            }
            Statement::ReturnStatement(ret) => {
                if let Some(arg) = &ret.argument {
                    self.walk_expression(arg);
                }
            }
            Statement::BlockStatement(block) => {
                self.scopes.enter_scope(ScopeKind::Block);
                for stmt in block.body.iter() {
                    self.walk_statement(stmt);
                }
                self.scopes.exit_scope();
            }
            Statement::IfStatement(if_stmt) => {
                self.walk_expression(&if_stmt.test);
                self.walk_statement(&if_stmt.consequent);
                if let Some(alt) = &if_stmt.alternate {
                    self.walk_statement(alt);
                }
            }
            // Loop scopes cover the header and the body, so loop variables
            // shadow for both
            Statement::ForStatement(for_stmt) => {
                self.scopes.enter_scope(ScopeKind::Loop);
                if let Some(init) = &for_stmt.init {
                    match init {
                        oxc_ast::ast::ForStatementInit::VariableDeclaration(var_decl) => {
                            for decl in var_decl.declarations.iter() {
                                self.add_pattern_names(&decl.id);
                                if let Some(init_expr) = &decl.init {
                                    self.walk_expression(init_expr);
                                }
                            }
                        }
                        _ => {
                            if let Some(expr) = init.as_expression() {
                                self.walk_expression(expr);
                            }
                        }
                    }
                }
                if let Some(test) = &for_stmt.test {
                    self.walk_expression(test);
                }
                if let Some(update) = &for_stmt.update {
                    self.walk_expression(update);
                }
                self.walk_statement(&for_stmt.body);
                self.scopes.exit_scope();
            }
            Statement::ForInStatement(for_in) => {
                self.scopes.enter_scope(ScopeKind::Loop);
                if let oxc_ast::ast::ForStatementLeft::VariableDeclaration(var_decl) = &for_in.left
                {
                    for decl in var_decl.declarations.iter() {
                        self.add_pattern_names(&decl.id);
                    }
                }
                self.walk_expression(&for_in.right);
                self.walk_statement(&for_in.body);
                self.scopes.exit_scope();
            }
            Statement::ForOfStatement(for_of) => {
                self.scopes.enter_scope(ScopeKind::Loop);
                if let oxc_ast::ast::ForStatementLeft::VariableDeclaration(var_decl) = &for_of.left
                {
                    for decl in var_decl.declarations.iter() {
                        self.add_pattern_names(&decl.id);
                    }
                }
                self.walk_expression(&for_of.right);
                self.walk_statement(&for_of.body);
                self.scopes.exit_scope();
            }
            Statement::WhileStatement(while_stmt) => {
                self.walk_expression(&while_stmt.test);
                self.walk_statement(&while_stmt.body);
            }
            Statement::DoWhileStatement(do_while) => {
                self.walk_statement(&do_while.body);
                self.walk_expression(&do_while.test);
            }
            Statement::SwitchStatement(switch_stmt) => {
                self.walk_expression(&switch_stmt.discriminant);
                self.scopes.enter_scope(ScopeKind::Block);
                for case in switch_stmt.cases.iter() {
                    if let Some(test) = &case.test {
                        self.walk_expression(test);
                    }
                    for stmt in case.consequent.iter() {
                        self.walk_statement(stmt);
                    }
                }
                self.scopes.exit_scope();
            }
            Statement::TryStatement(try_stmt) => {
                self.scopes.enter_scope(ScopeKind::Block);
                for stmt in try_stmt.block.body.iter() {
                    self.walk_statement(stmt);
                }
                self.scopes.exit_scope();

                // The catch scope holds the exception binding
                if let Some(handler) = &try_stmt.handler {
                    self.scopes.enter_scope(ScopeKind::Catch);
                    if let Some(param) = &handler.param {
                        self.add_pattern_names(&param.pattern);
                    }
                    for stmt in handler.body.body.iter() {
                        self.walk_statement(stmt);
                    }
                    self.scopes.exit_scope();
                }

                if let Some(finalizer) = &try_stmt.finalizer {
                    self.scopes.enter_scope(ScopeKind::Block);
                    for stmt in finalizer.body.iter() {
                        self.walk_statement(stmt);
                    }
                    self.scopes.exit_scope();
                }
            }
            Statement::LabeledStatement(labeled) => {
                self.walk_statement(&labeled.body);
            }
            Statement::ThrowStatement(throw) => {
                self.walk_expression(&throw.argument);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enclosing::EnclosingScope;
    use oxc_allocator::Allocator;
    use oxc_parser::Parser;
    use oxc_span::SourceType;

    /// Parse a function declaration whose body contains exactly one
    /// `useInlineTask(...)` expression statement, and return the capturable
    /// occurrences of its callback in encounter order.
    fn find_free(source: &str) -> Vec<String> {
        let allocator = Allocator::default();
        let parsed = Parser::new(&allocator, source, SourceType::tsx()).parse();
        assert!(
            parsed.errors.is_empty(),
            "test source failed to parse: {:?}",
            parsed.errors
        );

        let Some(Statement::FunctionDeclaration(func)) = parsed.program.body.first() else {
            panic!("expected a function declaration");
        };
        let enclosing = EnclosingScope::of_function(func);

        let body = func.body.as_ref().expect("function body");
        for stmt in body.statements.iter() {
            let Statement::ExpressionStatement(expr_stmt) = stmt else {
                continue;
            };
            let Expression::CallExpression(call) = &expr_stmt.expression else {
                continue;
            };
            let Expression::Identifier(callee) = &call.callee else {
                continue;
            };
            if callee.name != "useInlineTask" {
                continue;
            }

            let callable_expr = call
                .arguments
                .first()
                .and_then(|arg| arg.as_expression())
                .expect("callable argument");
            let callable = match callable_expr {
                Expression::ArrowFunctionExpression(arrow) => Callable::Arrow(arrow),
                Expression::FunctionExpression(func) => Callable::Function(func),
                _ => panic!("expected a function-like callable"),
            };

            return free_variables(callable, &enclosing, call.span.start)
                .into_iter()
                .map(|fv| fv.name.to_string())
                .collect();
        }
        panic!("no useInlineTask call found");
    }

    #[test]
    fn test_basic_capture() {
        let free = find_free(
            "function C() { const x = 1; useInlineTask(() => { console.log(x); }); return null; }",
        );
        assert_eq!(free, ["x"]);
    }

    #[test]
    fn test_parameter_capture() {
        let free = find_free(
            "function C(props) { useInlineTask(() => { console.log(props.title); }); return null; }",
        );
        assert_eq!(free, ["props"]);
    }

    #[test]
    fn test_block_shadowing() {
        // The inner block redeclares x; only the outer-referencing
        // occurrence is reported
        let free = find_free(
            "function C() { const x = 'outer'; useInlineTask(() => { { const x = 'inner'; use(x); } use(x); }); }",
        );
        assert_eq!(free, ["x"]);
    }

    #[test]
    fn test_loop_shadowing() {
        let free = find_free(
            "function C() { const i = 99; useInlineTask(() => { for (let i = 0; i < 10; i++) use(i); }); }",
        );
        assert!(free.is_empty());
    }

    #[test]
    fn test_catch_shadowing() {
        let free = find_free(
            "function C() { const e = 1; useInlineTask(() => { try { go(); } catch (e) { use(e); } }); }",
        );
        assert!(free.is_empty());
    }

    #[test]
    fn test_nested_function_params_shadow() {
        let free = find_free(
            "function C() { const v = 1; useInlineTask(() => { items.forEach((v) => use(v)); }); }",
        );
        assert!(free.is_empty());
    }

    #[test]
    fn test_duplicates_preserved_in_encounter_order() {
        let free = find_free(
            "function C() { const x = 1; const y = 2; useInlineTask(() => { use(x); use(y); use(x); }); }",
        );
        assert_eq!(free, ["x", "y", "x"]);
    }

    #[test]
    fn test_member_property_is_not_a_reference() {
        let free = find_free(
            "function C() { const obj = {}; const x = 1; useInlineTask(() => { use(obj.x); }); }",
        );
        assert_eq!(free, ["obj"]);
    }

    #[test]
    fn test_shorthand_property_is_not_rewritten() {
        let free = find_free(
            "function C() { const x = 1; useInlineTask(() => { use({ x }); use({ x: x }); }); }",
        );
        // Only the explicit `x: x` value position counts
        assert_eq!(free, ["x"]);
    }

    #[test]
    fn test_computed_key_is_a_reference() {
        let free = find_free(
            "function C() { const k = 'a'; useInlineTask(() => { use({ [k]: 1 }); }); }",
        );
        assert_eq!(free, ["k"]);
    }

    #[test]
    fn test_assignment_and_update_targets() {
        let free = find_free(
            "function C() { let n = 0; useInlineTask(() => { n = 5; n++; }); }",
        );
        assert_eq!(free, ["n", "n"]);
    }

    #[test]
    fn test_callback_locals_are_not_captured() {
        let free = find_free(
            "function C() { const y = 1; useInlineTask(() => { const y = 2; use(y); }); }",
        );
        assert!(free.is_empty());
    }

    #[test]
    fn test_declaration_after_call_is_not_captured() {
        let free = find_free(
            "function C() { useInlineTask(() => { use(late); }); const late = 1; }",
        );
        assert!(free.is_empty());
    }

    #[test]
    fn test_reserved_prefix_refused() {
        let free = find_free(
            "function C() { const __secret = 1; useInlineTask(() => { use(__secret); }); }",
        );
        assert!(free.is_empty());
    }

    #[test]
    fn test_function_expression_callable() {
        let free = find_free(
            "function C() { const x = 1; useInlineTask(function () { use(x); }); }",
        );
        assert_eq!(free, ["x"]);
    }

    #[test]
    fn test_concise_arrow_body() {
        let free = find_free("function C() { const x = 1; useInlineTask(() => use(x)); }");
        assert_eq!(free, ["x"]);
    }

    #[test]
    fn test_template_literal_and_spread() {
        let free = find_free(
            "function C() { const who = 'w'; const rest = []; useInlineTask(() => { use(`hi ${who}`, ...rest); }); }",
        );
        assert_eq!(free, ["who", "rest"]);
    }

    #[test]
    fn test_named_function_declaration_shadows_in_outer_scope() {
        let free = find_free(
            "function C() { const helper = 1; useInlineTask(() => { function helper() {} helper(); }); }",
        );
        assert!(free.is_empty());
    }
}
