use crate::ast::walk;
use crate::ast::{Expr, Module, Statement};

use super::table::{ScopeId, Symbol, SymbolKind, SymbolTable};

/// Build the symbol table for one module: module scope, one method scope
/// per method, and all declared symbols.
///
/// The traversal is a single top-down pass. Regions never become scopes;
/// they are recorded as metadata on method symbols. Within a method,
/// parameters are registered before locals, and locals in encounter order
/// so that use-before-declaration can be derived later. Assignment to a
/// name that resolves nowhere introduces an implicit local, mirroring
/// source semantics.
pub fn build(module: &Module) -> SymbolTable {
    let mut table = SymbolTable::new();
    let module_scope = table.module_scope();

    for decl in &module.variables {
        for var in &decl.names {
            table.define(
                module_scope,
                Symbol {
                    name: var.name.clone(),
                    kind: SymbolKind::ModuleVariable,
                    export: var.export,
                    region: None,
                    defined_at: var.span.clone(),
                    scope: module_scope,
                },
            );
        }
    }

    for method in &module.methods {
        table.define(
            module_scope,
            Symbol {
                name: method.name.clone(),
                kind: if method.is_function {
                    SymbolKind::Function
                } else {
                    SymbolKind::Procedure
                },
                export: method.export,
                region: method.region.clone(),
                defined_at: method.span.clone(),
                scope: module_scope,
            },
        );
    }

    for (index, method) in module.methods.iter().enumerate() {
        let scope = table.push_method_scope(index);

        // Parameters first: a default-value expression can only see
        // parameters already registered.
        for param in &method.params {
            table.define(
                scope,
                Symbol {
                    name: param.name.clone(),
                    kind: SymbolKind::Parameter,
                    export: false,
                    region: None,
                    defined_at: param.span.clone(),
                    scope,
                },
            );
        }

        collect_locals(&mut table, scope, &method.body);
    }

    table
}

fn collect_locals(table: &mut SymbolTable, scope: ScopeId, body: &[Statement]) {
    let mut index = 0usize;
    walk::each_statement(body, &mut |stmt| {
        match stmt {
            Statement::VarDecl(decl) => {
                for var in &decl.names {
                    table.define(
                        scope,
                        Symbol {
                            name: var.name.clone(),
                            kind: SymbolKind::Variable {
                                declared_at: index,
                                implicit: false,
                            },
                            export: var.export,
                            region: None,
                            defined_at: var.span.clone(),
                            scope,
                        },
                    );
                }
            }
            Statement::Assignment {
                target: Expr::Identifier { name, span },
                ..
            } => {
                if table.resolve(scope, name).found().is_none() {
                    table.define(
                        scope,
                        Symbol {
                            name: name.clone(),
                            kind: SymbolKind::Variable {
                                declared_at: index,
                                implicit: true,
                            },
                            export: false,
                            region: None,
                            defined_at: span.clone(),
                            scope,
                        },
                    );
                }
            }
            // Loop counters are locals of the method.
            Statement::For { variable, span, .. }
            | Statement::ForEach { variable, span, .. } => {
                if table.resolve(scope, variable).found().is_none() {
                    table.define(
                        scope,
                        Symbol {
                            name: variable.clone(),
                            kind: SymbolKind::Variable {
                                declared_at: index,
                                implicit: true,
                            },
                            export: false,
                            region: None,
                            defined_at: span.clone(),
                            scope,
                        },
                    );
                }
            }
            _ => {}
        }
        index += 1;
    });
}
