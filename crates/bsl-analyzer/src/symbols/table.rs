use std::collections::HashMap;

use bsl_common::Span;

/// Arena index of a scope node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub usize);

/// Arena index of a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolId(pub usize);

/// The kind of a declared symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolKind {
    /// Module-level variable.
    ModuleVariable,
    /// Method-local variable. `declared_at` is the preorder statement index
    /// (as produced by `ast::walk::each_statement`) of its declaration;
    /// `implicit` marks locals introduced by first assignment rather than
    /// a `Var` statement.
    Variable { declared_at: usize, implicit: bool },
    Parameter,
    Procedure,
    Function,
}

impl SymbolKind {
    pub fn is_method(&self) -> bool {
        matches!(self, SymbolKind::Procedure | SymbolKind::Function)
    }
}

/// A declared symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub export: bool,
    /// Enclosing region name; recorded for methods only. Regions are
    /// cosmetic groupings, never scopes.
    pub region: Option<String>,
    pub defined_at: Span,
    pub scope: ScopeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Module,
    Method { method_index: usize },
}

/// A node in the lexical scope tree. Scopes live in a flat arena and are
/// linked by parent indices.
#[derive(Debug)]
pub struct Scope {
    pub kind: ScopeKind,
    symbols: HashMap<String, SymbolId>,
    parent: Option<ScopeId>,
}

/// A duplicate declaration within one scope. The first declaration wins
/// for resolution; the duplicate is surfaced by a rule.
#[derive(Debug, Clone)]
pub struct DuplicateDecl {
    pub name: String,
    pub first: Span,
    pub second: Span,
}

/// Result of a name lookup. Unresolved accesses never abort the build;
/// the pseudo-symbol lets the dedicated rules report them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution<'a> {
    Found(&'a Symbol),
    Unresolved,
}

impl<'a> Resolution<'a> {
    pub fn found(self) -> Option<&'a Symbol> {
        match self {
            Resolution::Found(sym) => Some(sym),
            Resolution::Unresolved => None,
        }
    }
}

/// The symbol table for one module: a scope tree plus flat symbol index,
/// queryable by (scope, name) and by declaration span.
#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    symbols: Vec<Symbol>,
    method_scopes: Vec<ScopeId>,
    duplicates: Vec<DuplicateDecl>,
    by_decl: HashMap<Span, SymbolId>,
}

impl SymbolTable {
    pub(crate) fn new() -> Self {
        Self {
            scopes: vec![Scope {
                kind: ScopeKind::Module,
                symbols: HashMap::new(),
                parent: None,
            }],
            symbols: Vec::new(),
            method_scopes: Vec::new(),
            duplicates: Vec::new(),
            by_decl: HashMap::new(),
        }
    }

    pub fn module_scope(&self) -> ScopeId {
        ScopeId(0)
    }

    /// The scope of the `index`-th method of the module.
    pub fn method_scope(&self, method_index: usize) -> ScopeId {
        self.method_scopes[method_index]
    }

    pub(crate) fn push_method_scope(&mut self, method_index: usize) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            kind: ScopeKind::Method { method_index },
            symbols: HashMap::new(),
            parent: Some(self.module_scope()),
        });
        self.method_scopes.push(id);
        id
    }

    /// Define a symbol in `scope`. On a duplicate name the first
    /// declaration wins and the collision is recorded.
    pub(crate) fn define(&mut self, scope: ScopeId, symbol: Symbol) -> SymbolId {
        if let Some(&existing) = self.scopes[scope.0].symbols.get(&symbol.name) {
            self.duplicates.push(DuplicateDecl {
                name: symbol.name.clone(),
                first: self.symbols[existing.0].defined_at.clone(),
                second: symbol.defined_at.clone(),
            });
            return existing;
        }
        let id = SymbolId(self.symbols.len());
        self.by_decl.insert(symbol.defined_at.clone(), id);
        self.scopes[scope.0]
            .symbols
            .insert(symbol.name.clone(), id);
        self.symbols.push(symbol);
        id
    }

    /// Look up `name` starting at `scope` and walking outward. Resolution
    /// stops at the module boundary; there is no implicit cross-module
    /// fallback.
    pub fn resolve(&self, scope: ScopeId, name: &str) -> Resolution<'_> {
        let mut current = Some(scope);
        while let Some(id) = current {
            if let Some(&sym) = self.scopes[id.0].symbols.get(name) {
                return Resolution::Found(&self.symbols[sym.0]);
            }
            current = self.scopes[id.0].parent;
        }
        Resolution::Unresolved
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0]
    }

    /// The symbol introduced by the declaration at `span`, if any.
    pub fn symbol_at(&self, span: &Span) -> Option<&Symbol> {
        self.by_decl.get(span).map(|id| &self.symbols[id.0])
    }

    pub fn duplicates(&self) -> &[DuplicateDecl] {
        &self.duplicates
    }

    /// All symbols declared directly in `scope` (iteration order is
    /// unspecified).
    pub fn symbols_in(&self, scope: ScopeId) -> impl Iterator<Item = &Symbol> {
        self.scopes[scope.0]
            .symbols
            .values()
            .map(|id| &self.symbols[id.0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variable(name: &str, scope: ScopeId, span: Span) -> Symbol {
        Symbol {
            name: name.to_string(),
            kind: SymbolKind::Variable {
                declared_at: 0,
                implicit: false,
            },
            export: false,
            region: None,
            defined_at: span,
            scope,
        }
    }

    #[test]
    fn define_and_resolve() {
        let mut table = SymbolTable::new();
        let module = table.module_scope();
        table.define(module, variable("X", module, Span::dummy()));
        assert!(table.resolve(module, "X").found().is_some());
        assert_eq!(table.resolve(module, "Y"), Resolution::Unresolved);
    }

    #[test]
    fn method_scope_falls_back_to_module() {
        let mut table = SymbolTable::new();
        let module = table.module_scope();
        table.define(module, variable("ModuleVar", module, Span::dummy()));
        let method = table.push_method_scope(0);
        assert!(table.resolve(method, "ModuleVar").found().is_some());
    }

    #[test]
    fn lookup_is_case_sensitive() {
        let mut table = SymbolTable::new();
        let module = table.module_scope();
        table.define(module, variable("Value", module, Span::dummy()));
        assert_eq!(table.resolve(module, "value"), Resolution::Unresolved);
    }

    #[test]
    fn sibling_scopes_do_not_leak() {
        let mut table = SymbolTable::new();
        let first = table.push_method_scope(0);
        let second = table.push_method_scope(1);
        table.define(first, variable("Local", first, Span::dummy()));
        assert!(table.resolve(first, "Local").found().is_some());
        assert_eq!(table.resolve(second, "Local"), Resolution::Unresolved);
    }

    #[test]
    fn nearest_declaration_wins() {
        let mut table = SymbolTable::new();
        let module = table.module_scope();
        let method = table.push_method_scope(0);
        table.define(module, variable("X", module, Span::on_line("m.bsl", 1)));
        table.define(method, variable("X", method, Span::on_line("m.bsl", 5)));
        let sym = table.resolve(method, "X").found().unwrap();
        assert_eq!(sym.defined_at.start.line, 5);
    }

    #[test]
    fn duplicate_records_first_and_second_span() {
        let mut table = SymbolTable::new();
        let module = table.module_scope();
        table.define(module, variable("X", module, Span::on_line("m.bsl", 1)));
        table.define(module, variable("X", module, Span::on_line("m.bsl", 2)));
        assert_eq!(table.duplicates().len(), 1);
        let dup = &table.duplicates()[0];
        assert_eq!(dup.first.start.line, 1);
        assert_eq!(dup.second.start.line, 2);
        // first declaration still resolves
        let sym = table.resolve(module, "X").found().unwrap();
        assert_eq!(sym.defined_at.start.line, 1);
    }

    #[test]
    fn symbol_at_declaration_span() {
        let mut table = SymbolTable::new();
        let module = table.module_scope();
        let span = Span::on_line("m.bsl", 7);
        table.define(module, variable("X", module, span.clone()));
        assert_eq!(table.symbol_at(&span).unwrap().name, "X");
        assert!(table.symbol_at(&Span::on_line("m.bsl", 8)).is_none());
    }
}
