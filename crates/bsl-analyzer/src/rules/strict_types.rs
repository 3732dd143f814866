//! Strict-type rules driven by doc-comment annotations.

use bsl_common::{Diagnostic, Severity, Span};

use crate::ast::{walk, Expr};
use crate::types::Type;

use super::{ModuleAnalysis, Needs, Rule, RuleParams};

/// An argument whose inferred type can never match the declared type of
/// the parameter it is passed to.
///
/// `Unknown` intersects with everything, so the rule only fires when both
/// sides are known and provably disjoint.
pub struct ParameterTypeIntersection;

impl Rule for ParameterTypeIntersection {
    fn id(&self) -> &'static str {
        "parameter-type-intersection"
    }

    fn severity(&self) -> Severity {
        Severity::Major
    }

    fn needs(&self) -> Needs {
        Needs {
            types: true,
            ..Needs::default()
        }
    }

    fn check(
        &self,
        analysis: &ModuleAnalysis<'_>,
        _params: &RuleParams<'_>,
        out: &mut Vec<Diagnostic>,
    ) {
        let Some(types) = analysis.types() else {
            return;
        };
        let module = analysis.module;
        for (caller_index, caller) in module.methods.iter().enumerate() {
            walk::each_statement(&caller.body, &mut |stmt| {
                walk::each_expr_in(stmt, &mut |expr| {
                    let Expr::Call { name, args, .. } = expr else {
                        return;
                    };
                    let Some(callee_index) =
                        module.methods.iter().position(|m| m.name == *name)
                    else {
                        return;
                    };
                    let callee = &module.methods[callee_index];
                    let annotation = types.annotation(callee_index);
                    for (param, arg) in callee.params.iter().zip(args) {
                        let declared = annotation.param_type(&param.name);
                        if declared == Type::Unknown {
                            continue;
                        }
                        let actual = types.expr_type(module, caller_index, arg);
                        if !declared.intersects(&actual) {
                            out.push(Diagnostic::new(
                                self.id(),
                                self.severity(),
                                format!(
                                    "argument of type '{}' never matches parameter '{}' of '{}' (declared '{}')",
                                    actual, param.name, name, declared
                                ),
                                arg.span().clone(),
                            ));
                        }
                    }
                });
            });
        }
    }
}

/// Doc-comment lines that do not follow the annotation grammar.
pub struct DocCommentFormat;

impl Rule for DocCommentFormat {
    fn id(&self) -> &'static str {
        "doc-comment-format"
    }

    fn severity(&self) -> Severity {
        Severity::Minor
    }

    fn needs(&self) -> Needs {
        Needs {
            types: true,
            ..Needs::default()
        }
    }

    fn check(
        &self,
        analysis: &ModuleAnalysis<'_>,
        _params: &RuleParams<'_>,
        out: &mut Vec<Diagnostic>,
    ) {
        let Some(types) = analysis.types() else {
            return;
        };
        for (method_index, method) in analysis.module.methods.iter().enumerate() {
            let Some(doc) = &method.doc else {
                continue;
            };
            for malformed in &types.annotation(method_index).malformed {
                let line = doc.span.start.line + malformed.line_offset as u32;
                out.push(Diagnostic::new(
                    self.id(),
                    self.severity(),
                    format!("malformed doc-comment line: '{}'", malformed.text.trim()),
                    Span::on_line(doc.span.file.clone(), line),
                ));
            }
        }
    }
}
