//! The inline-task call rewriter.
//!
//! Walks a parsed program looking for `useInlineTask(...)` call sites. For
//! each auto-capture call (one argument, zero-parameter callable) it
//! injects the `__scope` parameter, rewrites every captured reference to a
//! `__scope.` member access and appends the capture object. Expression
//! statement calls are additionally bound to a fresh `__task_<n>` name,
//! and each return expression of the enclosing function receives the
//! bindings as child-expression slots.
//!
//! All changes are localised edits against the original text; the caller
//! applies them and derives the source map from the same edit list.

use oxc_ast::ast::{
    Argument, ArrayExpressionElement, ArrowFunctionExpression, AssignmentTarget, CallExpression,
    ChainElement, ClassElement, Declaration, ExportDefaultDeclarationKind, Expression, Function,
    JSXAttributeItem, JSXAttributeValue, JSXChild, JSXElement, JSXExpressionContainer,
    JSXFragment, ObjectPropertyKind, SimpleAssignmentTarget, Statement,
};
use oxc_span::GetSpan;
use stilo_carton::{idents, CompactString, FxHashMap, FxHashSet};
use stilo_croquis::{free_variables, Callable, EnclosingScope};

use crate::edit::EditBuffer;

/// Where an enclosing function's return expression can host the bindings.
#[derive(Debug, Clone, Copy)]
enum ReturnSite {
    /// A fragment return: insert before its closing `</>`.
    FragmentClose(u32),
    /// Any other expression: wrap it in a fresh fragment.
    Wrap { start: u32, end: u32 },
}

/// Fresh bindings produced inside one enclosing function, in call order.
#[derive(Debug)]
struct InjectionGroup {
    sites: Vec<ReturnSite>,
    bindings: Vec<CompactString>,
}

/// Per-function context while walking.
struct Frame {
    /// Start offset of the function, used as the injection-group key.
    fn_start: u32,
    enclosing: EnclosingScope,
    sites: Vec<ReturnSite>,
}

pub(crate) struct Rewriter<'s> {
    source: &'s str,
    pub(crate) edits: EditBuffer,
    counter: u32,
    frames: Vec<Frame>,
    groups: Vec<InjectionGroup>,
    group_index: FxHashMap<u32, usize>,
}

impl<'s> Rewriter<'s> {
    pub(crate) fn new(source: &'s str) -> Self {
        Self {
            source,
            edits: EditBuffer::new(),
            counter: 0,
            frames: Vec::new(),
            groups: Vec::new(),
            group_index: FxHashMap::default(),
        }
    }

    /// Splice the recorded bindings into every return site of their
    /// enclosing functions. Non-fragment returns are wrapped whole, even
    /// ternaries and non-element values; see the crate notes.
    pub(crate) fn splice_returns(&mut self) {
        for group in &self.groups {
            let mut refs = String::new();
            for binding in &group.bindings {
                refs.push('{');
                refs.push_str(binding);
                refs.push('}');
            }
            for site in &group.sites {
                match *site {
                    ReturnSite::FragmentClose(pos) => {
                        self.edits.insert(pos, refs.clone());
                    }
                    ReturnSite::Wrap { start, end } => {
                        self.edits.insert(start, "<>");
                        self.edits.insert(end, format!("{refs}</>"));
                    }
                }
            }
        }
    }

    fn push_function_frame(&mut self, func: &Function<'_>) {
        let mut sites = Vec::new();
        if let Some(body) = &func.body {
            collect_return_sites(&body.statements, &mut sites);
        }
        self.frames.push(Frame {
            fn_start: func.span.start,
            enclosing: EnclosingScope::of_function(func),
            sites,
        });
    }

    fn push_arrow_frame(&mut self, arrow: &ArrowFunctionExpression<'_>) {
        let mut sites = Vec::new();
        if arrow.expression {
            // Concise body: the body expression is the single return
            if let Some(Statement::ExpressionStatement(stmt)) = arrow.body.statements.first() {
                sites.push(site_for(&stmt.expression));
            }
        } else {
            collect_return_sites(&arrow.body.statements, &mut sites);
        }
        self.frames.push(Frame {
            fn_start: arrow.span.start,
            enclosing: EnclosingScope::of_arrow(arrow),
            sites,
        });
    }

    fn pop_frame(&mut self) {
        self.frames.pop();
    }

    /// Bind the call result to a fresh name and record it for injection.
    fn inject_binding(&mut self, stmt_start: u32) {
        let Some(frame) = self.frames.last() else {
            return;
        };
        let fn_start = frame.fn_start;
        let sites = frame.sites.clone();

        let name = idents::task_binding_name(self.counter);
        self.counter += 1;
        self.edits
            .insert(stmt_start, format!("const {name} = "));

        let idx = match self.group_index.get(&fn_start) {
            Some(&idx) => idx,
            None => {
                self.groups.push(InjectionGroup {
                    sites,
                    bindings: Vec::new(),
                });
                let idx = self.groups.len() - 1;
                self.group_index.insert(fn_start, idx);
                idx
            }
        };
        self.groups[idx].bindings.push(name);
    }

    /// Handle a call whose callee is the hook identifier. Returns false
    /// when the call is not a match (children must be walked normally).
    fn try_process_call(&mut self, call: &CallExpression<'_>, stmt_start: Option<u32>) -> bool {
        let Expression::Identifier(callee) = &call.callee else {
            return false;
        };
        if callee.name != idents::HOOK_NAME {
            return false;
        }
        let Some(first) = call.arguments.first() else {
            return false;
        };
        let callable = match first.as_expression() {
            Some(Expression::ArrowFunctionExpression(arrow)) => Callable::Arrow(arrow),
            Some(Expression::FunctionExpression(func)) => Callable::Function(func),
            _ => return false,
        };

        // Explicit captures: structurally untouched, but an expression
        // statement still produces an element worth injecting
        if call.arguments.len() >= 2 {
            if let Some(stmt_start) = stmt_start {
                self.inject_binding(stmt_start);
            }
            return true;
        }

        let (callable_start, no_params) = match callable {
            Callable::Arrow(arrow) => (
                arrow.span.start,
                arrow.params.items.is_empty() && arrow.params.rest.is_none(),
            ),
            Callable::Function(func) => (
                func.span.start,
                func.params.items.is_empty() && func.params.rest.is_none(),
            ),
        };

        // Auto-capture requires a zero-parameter callable; a parameterised
        // one is left as-is, its body still searched for nested calls
        if !no_params {
            if let Some(expr) = first.as_expression() {
                self.walk_expression(expr);
            }
            return true;
        }

        let free = match self.frames.last() {
            // Nothing declared before the call and no parameters: nothing
            // a callback could capture
            Some(frame) if frame.enclosing.is_vacant() => Vec::new(),
            Some(frame) => free_variables(callable, &frame.enclosing, call.span.start),
            None => {
                // Outside any function: leave the call intact but keep
                // nested calls discoverable
                if let Some(expr) = first.as_expression() {
                    self.walk_expression(expr);
                }
                return true;
            }
        };

        if !free.is_empty() {
            // De-duplicate into first-occurrence order
            let mut seen = FxHashSet::default();
            let mut captures: Vec<&str> = Vec::new();
            for fv in &free {
                if seen.insert(fv.name.as_str()) {
                    captures.push(fv.name.as_str());
                }
            }

            // The parameter list is empty by the gate above; write the
            // scope parameter between its parentheses
            debug_assert!(no_params);
            if let Some(offset) = self.source[callable_start as usize..].find('(') {
                self.edits
                    .insert(callable_start + offset as u32 + 1, idents::SCOPE_PARAM);
            }

            for fv in &free {
                self.edits.replace(
                    fv.span.start,
                    fv.span.end,
                    format!("{}.{}", idents::SCOPE_PARAM, fv.name),
                );
            }

            // Trailing captures object, original spellings, evaluated at
            // the call site in the enclosing scope
            let object = format!(", {{ {} }}", captures.join(", "));
            self.edits.insert(call.span.end - 1, object);
        }

        if let Some(stmt_start) = stmt_start {
            self.inject_binding(stmt_start);
        }
        true
    }

    pub(crate) fn walk_statement(&mut self, stmt: &Statement<'_>) {
        match stmt {
            Statement::ExpressionStatement(expr_stmt) => {
                if let Expression::CallExpression(call) = &expr_stmt.expression {
                    if self.try_process_call(call, Some(expr_stmt.span.start)) {
                        return;
                    }
                }
                self.walk_expression(&expr_stmt.expression);
            }
            Statement::VariableDeclaration(var_decl) => {
                for decl in var_decl.declarations.iter() {
                    if let Some(init) = &decl.init {
                        self.walk_expression(init);
                    }
                }
            }
            Statement::FunctionDeclaration(func) => {
                self.push_function_frame(func);
                if let Some(body) = &func.body {
                    for stmt in body.statements.iter() {
                        self.walk_statement(stmt);
                    }
                }
                self.pop_frame();
            }
            Statement::ClassDeclaration(class) => {
                self.walk_class_elements(&class.body.body);
            }
            Statement::ReturnStatement(ret) => {
                if let Some(arg) = &ret.argument {
                    self.walk_expression(arg);
                }
            }
            Statement::BlockStatement(block) => {
                for stmt in block.body.iter() {
                    self.walk_statement(stmt);
                }
            }
            Statement::IfStatement(if_stmt) => {
                self.walk_expression(&if_stmt.test);
                self.walk_statement(&if_stmt.consequent);
                if let Some(alt) = &if_stmt.alternate {
                    self.walk_statement(alt);
                }
            }
            Statement::ForStatement(for_stmt) => {
                if let Some(init) = &for_stmt.init {
                    match init {
                        oxc_ast::ast::ForStatementInit::VariableDeclaration(var_decl) => {
                            for decl in var_decl.declarations.iter() {
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
            }
            Statement::ForInStatement(for_in) => {
                self.walk_expression(&for_in.right);
                self.walk_statement(&for_in.body);
            }
            Statement::ForOfStatement(for_of) => {
                self.walk_expression(&for_of.right);
                self.walk_statement(&for_of.body);
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
                for case in switch_stmt.cases.iter() {
                    if let Some(test) = &case.test {
                        self.walk_expression(test);
                    }
                    for stmt in case.consequent.iter() {
                        self.walk_statement(stmt);
                    }
                }
            }
            Statement::TryStatement(try_stmt) => {
                for stmt in try_stmt.block.body.iter() {
                    self.walk_statement(stmt);
                }
                if let Some(handler) = &try_stmt.handler {
                    for stmt in handler.body.body.iter() {
                        self.walk_statement(stmt);
                    }
                }
                if let Some(finalizer) = &try_stmt.finalizer {
                    for stmt in finalizer.body.iter() {
                        self.walk_statement(stmt);
                    }
                }
            }
            Statement::LabeledStatement(labeled) => {
                self.walk_statement(&labeled.body);
            }
            Statement::ThrowStatement(throw) => {
                self.walk_expression(&throw.argument);
            }
            Statement::ExportNamedDeclaration(export) => {
                if let Some(decl) = &export.declaration {
                    self.walk_declaration(decl);
                }
            }
            Statement::ExportDefaultDeclaration(export) => match &export.declaration {
                ExportDefaultDeclarationKind::FunctionDeclaration(func) => {
                    self.push_function_frame(func);
                    if let Some(body) = &func.body {
                        for stmt in body.statements.iter() {
                            self.walk_statement(stmt);
                        }
                    }
                    self.pop_frame();
                }
                ExportDefaultDeclarationKind::ClassDeclaration(class) => {
                    self.walk_class_elements(&class.body.body);
                }
                other => {
                    if let Some(expr) = other.as_expression() {
                        self.walk_expression(expr);
                    }
                }
            },
            _ => {}
        }
    }

    fn walk_declaration(&mut self, decl: &Declaration<'_>) {
        match decl {
            Declaration::VariableDeclaration(var_decl) => {
                for decl in var_decl.declarations.iter() {
                    if let Some(init) = &decl.init {
                        self.walk_expression(init);
                    }
                }
            }
            Declaration::FunctionDeclaration(func) => {
                self.push_function_frame(func);
                if let Some(body) = &func.body {
                    for stmt in body.statements.iter() {
                        self.walk_statement(stmt);
                    }
                }
                self.pop_frame();
            }
            Declaration::ClassDeclaration(class) => {
                self.walk_class_elements(&class.body.body);
            }
            _ => {}
        }
    }

    /// Class methods are function-like enclosing scopes of their own.
    fn walk_class_elements(&mut self, elements: &[ClassElement<'_>]) {
        for element in elements.iter() {
            match element {
                ClassElement::MethodDefinition(method) => {
                    if method.value.body.is_some() {
                        self.push_function_frame(&method.value);
                        if let Some(body) = &method.value.body {
                            for stmt in body.statements.iter() {
                                self.walk_statement(stmt);
                            }
                        }
                        self.pop_frame();
                    }
                }
                ClassElement::PropertyDefinition(prop) => {
                    if let Some(value) = &prop.value {
                        self.walk_expression(value);
                    }
                }
                _ => {}
            }
        }
    }

    fn walk_expression(&mut self, expr: &Expression<'_>) {
        match expr {
            Expression::ArrowFunctionExpression(arrow) => {
                self.push_arrow_frame(arrow);
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
                self.pop_frame();
            }
            Expression::FunctionExpression(func) => {
                self.push_function_frame(func);
                if let Some(body) = &func.body {
                    for stmt in body.statements.iter() {
                        self.walk_statement(stmt);
                    }
                }
                self.pop_frame();
            }

            Expression::CallExpression(call) => {
                if self.try_process_call(call, None) {
                    return;
                }
                self.walk_expression(&call.callee);
                self.walk_arguments(&call.arguments);
            }
            Expression::NewExpression(new_expr) => {
                self.walk_expression(&new_expr.callee);
                self.walk_arguments(&new_expr.arguments);
            }

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
                    self.walk_expression(&call.callee);
                    self.walk_arguments(&call.arguments);
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
                            self.walk_expression(&p.value);
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
                match &assign.left {
                    AssignmentTarget::StaticMemberExpression(member) => {
                        self.walk_expression(&member.object);
                    }
                    AssignmentTarget::ComputedMemberExpression(member) => {
                        self.walk_expression(&member.object);
                        self.walk_expression(&member.expression);
                    }
                    _ => {}
                }
                self.walk_expression(&assign.right);
            }
            Expression::UpdateExpression(update) => match &update.argument {
                SimpleAssignmentTarget::StaticMemberExpression(member) => {
                    self.walk_expression(&member.object);
                }
                SimpleAssignmentTarget::ComputedMemberExpression(member) => {
                    self.walk_expression(&member.object);
                    self.walk_expression(&member.expression);
                }
                _ => {}
            },

            Expression::TSAsExpression(ts_as) => {
                self.walk_expression(&ts_as.expression);
            }
            Expression::TSSatisfiesExpression(ts_satisfies) => {
                self.walk_expression(&ts_satisfies.expression);
            }
            Expression::TSNonNullExpression(ts_non_null) => {
                self.walk_expression(&ts_non_null.expression);
            }

            Expression::JSXElement(el) => {
                self.walk_jsx_element(el);
            }
            Expression::JSXFragment(frag) => {
                self.walk_jsx_fragment(frag);
            }

            _ => {}
        }
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

    fn walk_jsx_element(&mut self, el: &JSXElement<'_>) {
        for attr in el.opening_element.attributes.iter() {
            match attr {
                JSXAttributeItem::Attribute(attr) => match &attr.value {
                    Some(JSXAttributeValue::ExpressionContainer(container)) => {
                        self.walk_jsx_container(container);
                    }
                    Some(JSXAttributeValue::Element(el)) => {
                        self.walk_jsx_element(el);
                    }
                    Some(JSXAttributeValue::Fragment(frag)) => {
                        self.walk_jsx_fragment(frag);
                    }
                    _ => {}
                },
                JSXAttributeItem::SpreadAttribute(spread) => {
                    self.walk_expression(&spread.argument);
                }
            }
        }
        for child in el.children.iter() {
            self.walk_jsx_child(child);
        }
    }

    fn walk_jsx_fragment(&mut self, frag: &JSXFragment<'_>) {
        for child in frag.children.iter() {
            self.walk_jsx_child(child);
        }
    }

    fn walk_jsx_child(&mut self, child: &JSXChild<'_>) {
        match child {
            JSXChild::Element(el) => self.walk_jsx_element(el),
            JSXChild::Fragment(frag) => self.walk_jsx_fragment(frag),
            JSXChild::ExpressionContainer(container) => self.walk_jsx_container(container),
            JSXChild::Spread(spread) => self.walk_expression(&spread.expression),
            JSXChild::Text(_) => {}
        }
    }

    fn walk_jsx_container(&mut self, container: &JSXExpressionContainer<'_>) {
        if let Some(expr) = container.expression.as_expression() {
            self.walk_expression(expr);
        }
    }
}

/// Collect every return expression reachable without crossing a nested
/// function boundary.
fn collect_return_sites(stmts: &[Statement<'_>], sites: &mut Vec<ReturnSite>) {
    for stmt in stmts.iter() {
        match stmt {
            Statement::ReturnStatement(ret) => {
                if let Some(arg) = &ret.argument {
                    sites.push(site_for(arg));
                }
            }
            Statement::BlockStatement(block) => {
                collect_return_sites(&block.body, sites);
            }
            Statement::IfStatement(if_stmt) => {
                collect_return_sites(std::slice::from_ref(&if_stmt.consequent), sites);
                if let Some(alt) = &if_stmt.alternate {
                    collect_return_sites(std::slice::from_ref(alt), sites);
                }
            }
            Statement::ForStatement(for_stmt) => {
                collect_return_sites(std::slice::from_ref(&for_stmt.body), sites);
            }
            Statement::ForInStatement(for_in) => {
                collect_return_sites(std::slice::from_ref(&for_in.body), sites);
            }
            Statement::ForOfStatement(for_of) => {
                collect_return_sites(std::slice::from_ref(&for_of.body), sites);
            }
            Statement::WhileStatement(while_stmt) => {
                collect_return_sites(std::slice::from_ref(&while_stmt.body), sites);
            }
            Statement::DoWhileStatement(do_while) => {
                collect_return_sites(std::slice::from_ref(&do_while.body), sites);
            }
            Statement::SwitchStatement(switch_stmt) => {
                for case in switch_stmt.cases.iter() {
                    collect_return_sites(&case.consequent, sites);
                }
            }
            Statement::TryStatement(try_stmt) => {
                collect_return_sites(&try_stmt.block.body, sites);
                if let Some(handler) = &try_stmt.handler {
                    collect_return_sites(&handler.body.body, sites);
                }
                if let Some(finalizer) = &try_stmt.finalizer {
                    collect_return_sites(&finalizer.body, sites);
                }
            }
            Statement::LabeledStatement(labeled) => {
                collect_return_sites(std::slice::from_ref(&labeled.body), sites);
            }
            _ => {}
        }
    }
}

/// Decide how a return expression hosts the binding references, looking
/// through any parenthesisation.
fn site_for(expr: &Expression<'_>) -> ReturnSite {
    let expr = strip_parens(expr);
    match expr {
        Expression::JSXFragment(frag) => ReturnSite::FragmentClose(frag.closing_fragment.span.start),
        _ => {
            let span = expr.span();
            ReturnSite::Wrap {
                start: span.start,
                end: span.end,
            }
        }
    }
}

fn strip_parens<'b, 'a>(mut expr: &'b Expression<'a>) -> &'b Expression<'a> {
    while let Expression::ParenthesizedExpression(paren) = expr {
        expr = &paren.expression;
    }
    expr
}
