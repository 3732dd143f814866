//! Method call and naming rules.

use bsl_common::{Diagnostic, Severity};

use crate::ast::{walk, Expr};

use super::{builtins, ModuleAnalysis, Needs, Rule, RuleParams};

/// Calls that resolve to no method: neither one of the module's own
/// methods, nor a global method, nor an exported method of a common module
/// named by the receiver.
pub struct UndefinedMethod;

impl Rule for UndefinedMethod {
    fn id(&self) -> &'static str {
        "undefined-method"
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
            let scope = table.method_scope(method_index);
            walk::each_statement(&method.body, &mut |stmt| {
                let mut visit = |expr: &Expr| match expr {
                    Expr::Call { name, span, .. } => {
                        match table.resolve(table.module_scope(), name).found() {
                            Some(symbol) if symbol.kind.is_method() => {}
                            Some(_) => out.push(Diagnostic::new(
                                self.id(),
                                self.severity(),
                                format!("'{}' is not a method", name),
                                span.clone(),
                            )),
                            None => {
                                if !builtins::is_global_method(name) {
                                    out.push(Diagnostic::new(
                                        self.id(),
                                        self.severity(),
                                        format!("undefined method '{}'", name),
                                        span.clone(),
                                    ));
                                }
                            }
                        }
                    }
                    Expr::MethodCall {
                        receiver,
                        name,
                        span,
                        ..
                    } => {
                        // Only receivers naming a common module can be
                        // resolved statically; a local of the same name
                        // shadows the module.
                        if let Expr::Identifier { name: recv, .. } = receiver.as_ref() {
                            if table.resolve(scope, recv).found().is_none()
                                && analysis.project.has_module(recv)
                                && !analysis.project.exports(recv, name)
                            {
                                out.push(Diagnostic::new(
                                    self.id(),
                                    self.severity(),
                                    format!(
                                        "module '{}' has no exported method '{}'",
                                        recv, name
                                    ),
                                    span.clone(),
                                ));
                            }
                        }
                    }
                    _ => {}
                };
                walk::each_expr_in(stmt, &mut visit);
            });
        }
    }
}

/// Method names must match a configurable pattern.
///
/// Parameters: `pattern` (regular expression, anchored by convention),
/// `exclude` (names skipped verbatim, useful for platform event handlers)
/// and `max-length` (0 disables the length check).
pub struct MethodNamePattern;

const DEFAULT_PATTERN: &str = "^[A-Z][A-Za-z0-9]*$";

impl Rule for MethodNamePattern {
    fn id(&self) -> &'static str {
        "method-name-pattern"
    }

    fn severity(&self) -> Severity {
        Severity::Minor
    }

    fn check(
        &self,
        analysis: &ModuleAnalysis<'_>,
        params: &RuleParams<'_>,
        out: &mut Vec<Diagnostic>,
    ) {
        let pattern = params.str("pattern").unwrap_or(DEFAULT_PATTERN);
        let regex = match regex::Regex::new(pattern) {
            Ok(regex) => regex,
            Err(error) => {
                tracing::warn!(rule = self.id(), %pattern, %error, "invalid pattern, rule skipped");
                return;
            }
        };
        let excluded = params.list("exclude").unwrap_or(&[]);
        let max_length = params.int_or("max-length", 0);

        for method in &analysis.module.methods {
            if excluded.iter().any(|name| name == &method.name) {
                continue;
            }
            if !regex.is_match(&method.name) {
                out.push(Diagnostic::new(
                    self.id(),
                    self.severity(),
                    format!(
                        "method name '{}' does not match pattern '{}'",
                        method.name, pattern
                    ),
                    method.span.clone(),
                ));
            }
            if max_length > 0 && method.name.chars().count() > max_length as usize {
                out.push(Diagnostic::new(
                    self.id(),
                    self.severity(),
                    format!(
                        "method name '{}' is longer than {} characters",
                        method.name, max_length
                    ),
                    method.span.clone(),
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build;
    use crate::project::ProjectIndex;
    use bsl_common::ParamValue;
    use std::collections::HashMap;

    fn run_with_project(
        rule: &dyn Rule,
        module: &crate::ast::Module,
        project: &ProjectIndex,
        params: &RuleParams<'_>,
    ) -> Vec<Diagnostic> {
        let analysis = ModuleAnalysis::prepare(module, project, rule.needs());
        let mut out = Vec::new();
        rule.check(&analysis, params, &mut out);
        out
    }

    fn run(rule: &dyn Rule, module: &crate::ast::Module) -> Vec<Diagnostic> {
        run_with_project(rule, module, &ProjectIndex::new(), &RuleParams::empty())
    }

    #[test]
    fn call_to_own_method_resolves() {
        let module = build::module(
            "M",
            vec![
                build::procedure("Run", vec![build::call_stmt("Helper", vec![])]),
                build::procedure("Helper", vec![]),
            ],
        );
        assert!(run(&UndefinedMethod, &module).is_empty());
    }

    #[test]
    fn call_to_global_method_resolves() {
        let module = build::module(
            "M",
            vec![build::procedure(
                "Run",
                vec![build::call_stmt("Message", vec![build::str_lit("hi")])],
            )],
        );
        assert!(run(&UndefinedMethod, &module).is_empty());
    }

    #[test]
    fn unknown_call_is_reported() {
        let module = build::module(
            "M",
            vec![build::procedure(
                "Run",
                vec![build::call_stmt_at(4, "Vanished", vec![])],
            )],
        );
        let out = run(&UndefinedMethod, &module);
        assert_eq!(out.len(), 1);
        assert!(out[0].message.contains("Vanished"));
        assert_eq!(out[0].span.start.line, 4);
    }

    #[test]
    fn cross_module_call_checks_exports() {
        let mut exported = build::procedure("Public", vec![]);
        exported.export = true;
        let helpers = build::module("Helpers", vec![exported, build::procedure("Hidden", vec![])]);

        let caller_body = |target: &str| {
            vec![crate::ast::Statement::Call {
                call: Expr::MethodCall {
                    receiver: Box::new(build::ident("Helpers")),
                    name: target.to_string(),
                    args: vec![],
                    span: bsl_common::Span::dummy(),
                },
                span: bsl_common::Span::dummy(),
            }]
        };
        let good = build::module("M", vec![build::procedure("Run", caller_body("Public"))]);
        let bad = build::module("M", vec![build::procedure("Run", caller_body("Hidden"))]);

        let all = [helpers.clone(), good.clone()];
        let project = ProjectIndex::build(&all);
        assert!(run_with_project(&UndefinedMethod, &good, &project, &RuleParams::empty()).is_empty());

        let out = run_with_project(&UndefinedMethod, &bad, &project, &RuleParams::empty());
        assert_eq!(out.len(), 1);
        assert!(out[0].message.contains("no exported method 'Hidden'"));
    }

    #[test]
    fn object_receiver_is_not_checked() {
        let module = build::module(
            "M",
            vec![build::procedure(
                "Run",
                vec![
                    build::assign("Items", build::new_obj("Array", vec![])),
                    crate::ast::Statement::Call {
                        call: Expr::MethodCall {
                            receiver: Box::new(build::ident("Items")),
                            name: "Add".to_string(),
                            args: vec![build::num(1.0)],
                            span: bsl_common::Span::dummy(),
                        },
                        span: bsl_common::Span::dummy(),
                    },
                ],
            )],
        );
        assert!(run(&UndefinedMethod, &module).is_empty());
    }

    #[test]
    fn default_name_pattern_requires_leading_capital() {
        let module = build::module(
            "M",
            vec![
                build::procedure("PostDocument", vec![]),
                build::procedure("postDocument", vec![]),
            ],
        );
        let out = run(&MethodNamePattern, &module);
        assert_eq!(out.len(), 1);
        assert!(out[0].message.contains("'postDocument'"));
    }

    #[test]
    fn excluded_names_are_skipped() {
        let mut map = HashMap::new();
        map.insert(
            "exclude".to_string(),
            ParamValue::List(vec!["onOpen".to_string()]),
        );
        let params = RuleParams::new(&map);
        let module = build::module("M", vec![build::procedure("onOpen", vec![])]);
        let out = run_with_project(&MethodNamePattern, &module, &ProjectIndex::new(), &params);
        assert!(out.is_empty());
    }

    #[test]
    fn max_length_limits_method_names() {
        let mut map = HashMap::new();
        map.insert("max-length".to_string(), ParamValue::Int(8));
        let params = RuleParams::new(&map);
        let module = build::module(
            "M",
            vec![
                build::procedure("Short", vec![]),
                build::procedure("MuchTooLongName", vec![]),
            ],
        );
        let out = run_with_project(&MethodNamePattern, &module, &ProjectIndex::new(), &params);
        assert_eq!(out.len(), 1);
        assert!(out[0].message.contains("longer than 8"));
    }

    #[test]
    fn invalid_pattern_disables_the_rule() {
        let mut map = HashMap::new();
        map.insert("pattern".to_string(), ParamValue::Str("([".to_string()));
        let params = RuleParams::new(&map);
        let module = build::module("M", vec![build::procedure("anything", vec![])]);
        let out = run_with_project(&MethodNamePattern, &module, &ProjectIndex::new(), &params);
        assert!(out.is_empty());
    }
}
