pub mod builder;
pub mod table;

pub use builder::build;
pub use table::{
    DuplicateDecl, Resolution, Scope, ScopeId, ScopeKind, Symbol, SymbolId, SymbolKind,
    SymbolTable,
};
