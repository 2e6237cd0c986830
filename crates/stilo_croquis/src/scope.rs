//! Scope chain management for inline-task callbacks.
//!
//! The chain is a pure lookup abstraction: a parent-linked arena of scopes,
//! each holding the names it declares. Lookup walks from the current scope
//! to the root, so a name present in an inner scope shadows the same name
//! further out.

use stilo_carton::{CompactString, FxHashSet};

/// Unique identifier of a scope within a [`ScopeChain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(u32);

impl ScopeId {
    /// The root scope (the callback body itself).
    pub const ROOT: ScopeId = ScopeId(0);

    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

/// Kind of lexical environment a scope models.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// The callback body itself (root of the chain).
    Callback,
    /// A nested arrow function, function expression or function declaration.
    Closure,
    /// An ordinary block statement.
    Block,
    /// A `for` / `for-of` / `for-in` header and body.
    Loop,
    /// A catch clause with its exception binding.
    Catch,
}

/// A single scope in the chain.
#[derive(Debug)]
pub struct Scope {
    /// Unique identifier
    pub id: ScopeId,
    /// Lexical parent (`None` for the root)
    pub parent: Option<ScopeId>,
    /// Kind of scope
    pub kind: ScopeKind,
    /// Names declared in this scope
    names: FxHashSet<CompactString>,
}

impl Scope {
    #[inline]
    fn new(id: ScopeId, parent: Option<ScopeId>, kind: ScopeKind) -> Self {
        Self {
            id,
            parent,
            kind,
            names: FxHashSet::default(),
        }
    }

    /// Declare a name in this scope.
    #[inline]
    pub fn add_name(&mut self, name: CompactString) {
        self.names.insert(name);
    }

    /// Whether this scope itself declares `name` (parents not consulted).
    #[inline]
    pub fn declares(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Number of names declared in this scope.
    #[inline]
    pub fn name_count(&self) -> usize {
        self.names.len()
    }
}

/// Manages the scope chain during a callback walk.
#[derive(Debug)]
pub struct ScopeChain {
    /// All scopes (indexed by ScopeId)
    scopes: Vec<Scope>,
    /// Current scope ID
    current: ScopeId,
}

impl Default for ScopeChain {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeChain {
    /// Create a new chain whose root is the callback scope.
    #[inline]
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::new(ScopeId::ROOT, None, ScopeKind::Callback)],
            current: ScopeId::ROOT,
        }
    }

    /// Get the current scope.
    #[inline]
    pub fn current_scope(&self) -> &Scope {
        &self.scopes[self.current.as_u32() as usize]
    }

    /// Get the current scope mutably.
    #[inline]
    pub fn current_scope_mut(&mut self) -> &mut Scope {
        let idx = self.current.as_u32() as usize;
        &mut self.scopes[idx]
    }

    /// Get a scope by ID.
    #[inline]
    pub fn get_scope(&self, id: ScopeId) -> Option<&Scope> {
        self.scopes.get(id.as_u32() as usize)
    }

    /// Current scope ID.
    #[inline]
    pub const fn current_id(&self) -> ScopeId {
        self.current
    }

    /// Number of scopes created so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    /// Whether only the root scope exists.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.scopes.len() == 1
    }

    /// Iterate over all scopes in creation order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Scope> {
        self.scopes.iter()
    }

    /// Enter a new scope as a child of the current one.
    #[inline]
    pub fn enter_scope(&mut self, kind: ScopeKind) -> ScopeId {
        let id = ScopeId::new(self.scopes.len() as u32);
        let scope = Scope::new(id, Some(self.current), kind);
        self.scopes.push(scope);
        self.current = id;
        id
    }

    /// Exit the current scope and return to its parent.
    #[inline]
    pub fn exit_scope(&mut self) {
        if let Some(parent) = self.current_scope().parent {
            self.current = parent;
        }
    }

    /// Declare a name in the current scope.
    #[inline]
    pub fn add_name(&mut self, name: CompactString) {
        self.current_scope_mut().add_name(name);
    }

    /// Whether `name` is bound in the current scope or any ancestor.
    ///
    /// Returns true at the first scope whose name set contains `name`, so
    /// inner declarations shadow outer ones for the purpose of this test.
    #[inline]
    pub fn has(&self, name: &str) -> bool {
        let mut cursor = Some(self.current);
        while let Some(id) = cursor {
            let scope = &self.scopes[id.as_u32() as usize];
            if scope.declares(name) {
                return true;
            }
            cursor = scope.parent;
        }
        false
    }

    /// Distance of a scope from the root via the parent chain.
    #[inline]
    pub fn depth(&self, id: ScopeId) -> u32 {
        let mut depth = 0u32;
        let mut cursor = self.get_scope(id).and_then(|s| s.parent);
        while let Some(pid) = cursor {
            depth += 1;
            cursor = self.get_scope(pid).and_then(|s| s.parent);
        }
        depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_chain_basic() {
        let mut chain = ScopeChain::new();

        chain.add_name(CompactString::new("foo"));

        assert!(chain.has("foo"));
        assert!(!chain.has("bar"));

        chain.enter_scope(ScopeKind::Block);
        chain.add_name(CompactString::new("bar"));

        // Can see both foo and bar
        assert!(chain.has("foo"));
        assert!(chain.has("bar"));

        chain.exit_scope();

        // Can only see foo now
        assert!(chain.has("foo"));
        assert!(!chain.has("bar"));
    }

    #[test]
    fn test_scope_shadowing() {
        let mut chain = ScopeChain::new();

        chain.add_name(CompactString::new("x"));
        chain.enter_scope(ScopeKind::Block);
        chain.add_name(CompactString::new("x"));

        // Shadowed name is still bound
        assert!(chain.has("x"));
        chain.exit_scope();
        assert!(chain.has("x"));
    }

    #[test]
    fn test_loop_scope_covers_header_and_body() {
        let mut chain = ScopeChain::new();

        chain.enter_scope(ScopeKind::Loop);
        chain.add_name(CompactString::new("i"));
        assert!(chain.has("i"));

        // Body block nested inside the loop scope still sees the loop variable
        chain.enter_scope(ScopeKind::Block);
        assert!(chain.has("i"));
        chain.exit_scope();
        chain.exit_scope();

        assert!(!chain.has("i"));
    }

    #[test]
    fn test_catch_scope() {
        let mut chain = ScopeChain::new();

        chain.enter_scope(ScopeKind::Catch);
        chain.add_name(CompactString::new("err"));
        assert!(chain.has("err"));
        assert_eq!(chain.current_scope().kind, ScopeKind::Catch);

        chain.exit_scope();
        assert!(!chain.has("err"));
    }

    #[test]
    fn test_depth() {
        let mut chain = ScopeChain::new();
        assert_eq!(chain.depth(ScopeId::ROOT), 0);

        let closure = chain.enter_scope(ScopeKind::Closure);
        let block = chain.enter_scope(ScopeKind::Block);

        assert_eq!(chain.depth(closure), 1);
        assert_eq!(chain.depth(block), 2);
    }

    #[test]
    fn test_scope_chain_snapshot() {
        let mut chain = ScopeChain::new();
        chain.add_name(CompactString::new("props"));

        chain.enter_scope(ScopeKind::Closure);
        chain.add_name(CompactString::new("event"));

        chain.enter_scope(ScopeKind::Loop);
        chain.add_name(CompactString::new("i"));

        let mut output = String::new();
        for scope in chain.iter() {
            output.push_str(&format!(
                "Scope {} ({:?}): {} names\n",
                scope.id.as_u32(),
                scope.kind,
                scope.name_count()
            ));
        }

        insta::assert_snapshot!(output, @r"
        Scope 0 (Callback): 1 names
        Scope 1 (Closure): 1 names
        Scope 2 (Loop): 1 names
        ");
    }

    #[test]
    fn test_exit_at_root_is_a_noop() {
        let mut chain = ScopeChain::new();
        chain.exit_scope();
        assert_eq!(chain.current_id(), ScopeId::ROOT);
        assert!(chain.is_empty());
    }
}
