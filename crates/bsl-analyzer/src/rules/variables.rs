//! Variable rules: duplicate declarations, undefined reads, unused locals.

use std::collections::HashSet;

use bsl_common::{Diagnostic, Severity, Span};

use crate::ast::{walk, Expr, Method, Statement};
use crate::project::ProjectIndex;
use crate::symbols::{SymbolKind, SymbolTable};

use super::{builtins, ModuleAnalysis, Needs, Rule, RuleParams};

/// A name declared twice in the same scope.
pub struct DuplicateVariable;

impl Rule for DuplicateVariable {
    fn id(&self) -> &'static str {
        "duplicate-variable"
    }

    fn severity(&self) -> Severity {
        Severity::Major
    }

    fn needs(&self) -> Needs {
        Needs {
            symbols: true,
            ..Needs::default()
        }
    }

    fn check(
        &self,
        analysis: &ModuleAnalysis<'_>,
        _params: &RuleParams<'_>,
        out: &mut Vec<Diagnostic>,
    ) {
        let Some(table) = analysis.symbols() else {
            return;
        };
        for dup in table.duplicates() {
            out.push(
                Diagnostic::new(
                    self.id(),
                    self.severity(),
                    format!("'{}' is already declared in this scope", dup.name),
                    dup.second.clone(),
                )
                .with_related(dup.first.clone(), "first declaration here"),
            );
        }
    }
}

/// An identifier read that resolves to nothing, or to a declaration that
/// only appears later in the method.
pub struct UndefinedVariable;

impl Rule for UndefinedVariable {
    fn id(&self) -> &'static str {
        "undefined-variable"
    }

    fn severity(&self) -> Severity {
        Severity::Critical
    }

    fn needs(&self) -> Needs {
        Needs {
            symbols: true,
            ..Needs::default()
        }
    }

    fn check(
        &self,
        analysis: &ModuleAnalysis<'_>,
        _params: &RuleParams<'_>,
        out: &mut Vec<Diagnostic>,
    ) {
        let Some(table) = analysis.symbols() else {
            return;
        };
        for (method_index, method) in analysis.module.methods.iter().enumerate() {
            self.check_method(method, method_index, table, analysis.project, out);
        }
    }
}

impl UndefinedVariable {
    fn check_method(
        &self,
        method: &Method,
        method_index: usize,
        table: &SymbolTable,
        project: &ProjectIndex,
        out: &mut Vec<Diagnostic>,
    ) {
        let scope = table.method_scope(method_index);
        // Statement indices follow the same preorder numbering the symbol
        // builder used for `declared_at`.
        let mut index = 0usize;
        walk::each_statement(&method.body, &mut |stmt| {
            for (name, span) in reads_of(stmt) {
                match table.resolve(scope, name).found() {
                    Some(symbol) => {
                        if let SymbolKind::Variable {
                            declared_at,
                            implicit,
                        } = symbol.kind
                        {
                            if declared_at > index {
                                let message = if implicit {
                                    format!("'{}' is read before a value is assigned to it", name)
                                } else {
                                    format!("'{}' is used before its declaration", name)
                                };
                                out.push(Diagnostic::new(
                                    self.id(),
                                    self.severity(),
                                    message,
                                    span.clone(),
                                ));
                            }
                        }
                    }
                    None => {
                        if project.has_module(name) || builtins::is_global_property(name) {
                            continue;
                        }
                        out.push(Diagnostic::new(
                            self.id(),
                            self.severity(),
                            format!("undefined variable '{}'", name),
                            span.clone(),
                        ));
                    }
                }
            }
            index += 1;
        });
    }
}

/// A local that is assigned or declared but never read.
pub struct UnusedLocalVariable;

impl Rule for UnusedLocalVariable {
    fn id(&self) -> &'static str {
        "unused-local-variable"
    }

    fn severity(&self) -> Severity {
        Severity::Minor
    }

    fn needs(&self) -> Needs {
        Needs {
            symbols: true,
            ..Needs::default()
        }
    }

    fn check(
        &self,
        analysis: &ModuleAnalysis<'_>,
        _params: &RuleParams<'_>,
        out: &mut Vec<Diagnostic>,
    ) {
        let Some(table) = analysis.symbols() else {
            return;
        };
        for (method_index, method) in analysis.module.methods.iter().enumerate() {
            let mut read: HashSet<&str> = HashSet::new();
            walk::each_statement(&method.body, &mut |stmt| {
                for (name, _) in reads_of(stmt) {
                    read.insert(name);
                }
            });
            for symbol in table.symbols_in(table.method_scope(method_index)) {
                if !matches!(symbol.kind, SymbolKind::Variable { .. }) {
                    continue;
                }
                if !read.contains(symbol.name.as_str()) {
                    out.push(Diagnostic::new(
                        self.id(),
                        self.severity(),
                        format!("variable '{}' is never read", symbol.name),
                        symbol.defined_at.clone(),
                    ));
                }
            }
        }
    }
}

/// Identifier reads inside one statement. The target of a plain assignment
/// is a write, not a read; indexed or property targets still read their
/// receiver.
fn reads_of<'a>(stmt: &'a Statement) -> Vec<(&'a str, &'a Span)> {
    let mut reads = Vec::new();
    {
        let mut push = |expr: &'a Expr| {
            if let Expr::Identifier { name, span } = expr {
                reads.push((name.as_str(), span));
            }
        };
        match stmt {
            Statement::Assignment { target, value, .. } => {
                if !matches!(target, Expr::Identifier { .. }) {
                    walk::each_subexpr(target, &mut push);
                }
                walk::each_subexpr(value, &mut push);
            }
            other => walk::each_expr_in(other, &mut push),
        }
    }
    reads
}
