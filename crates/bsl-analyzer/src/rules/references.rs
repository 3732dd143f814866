//! String references into configuration metadata.

use bsl_common::{Diagnostic, Severity};

use crate::ast::{walk, Expr, Literal};

use super::{ModuleAnalysis, Rule, RuleParams};

/// Validates string arguments that name project entities: role names in
/// `IsInRole(...)` and metadata paths in `PredefinedValue(...)`. Each
/// check only fires when the host supplied the corresponding name list in
/// the project index.
pub struct UnknownReference;

impl Rule for UnknownReference {
    fn id(&self) -> &'static str {
        "unknown-reference"
    }

    fn severity(&self) -> Severity {
        Severity::Major
    }

    fn check(
        &self,
        analysis: &ModuleAnalysis<'_>,
        _params: &RuleParams<'_>,
        out: &mut Vec<Diagnostic>,
    ) {
        for method in &analysis.module.methods {
            walk::each_statement(&method.body, &mut |stmt| {
                walk::each_expr_in(stmt, &mut |expr| {
                    let Expr::Call { name, args, .. } = expr else {
                        return;
                    };
                    let Some(Expr::Literal {
                        value: Literal::String(argument),
                        span,
                    }) = args.first()
                    else {
                        return;
                    };
                    match name.as_str() {
                        "IsInRole" => {
                            if analysis.project.role_exists(argument) == Some(false) {
                                out.push(Diagnostic::new(
                                    self.id(),
                                    self.severity(),
                                    format!("role '{}' is not declared in the project", argument),
                                    span.clone(),
                                ));
                            }
                        }
                        "PredefinedValue" => {
                            // "Catalog.Products.Item" names the object by
                            // its first two segments.
                            let object = argument
                                .splitn(3, '.')
                                .take(2)
                                .collect::<Vec<_>>()
                                .join(".");
                            if analysis.project.metadata_object_exists(&object) == Some(false) {
                                out.push(Diagnostic::new(
                                    self.id(),
                                    self.severity(),
                                    format!("unknown metadata object '{}'", object),
                                    span.clone(),
                                ));
                            }
                        }
                        _ => {}
                    }
                });
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build;
    use crate::project::ProjectIndex;
    use crate::rules::Needs;

    fn run(body: Vec<crate::ast::Statement>, project: &ProjectIndex) -> Vec<Diagnostic> {
        let module = build::module("M", vec![build::procedure("Run", body)]);
        let analysis = ModuleAnalysis::prepare(&module, project, Needs::default());
        let mut out = Vec::new();
        UnknownReference.check(&analysis, &RuleParams::empty(), &mut out);
        out
    }

    fn is_in_role(role: &str) -> crate::ast::Statement {
        build::assign("Allowed", build::call("IsInRole", vec![build::str_lit(role)]))
    }

    #[test]
    fn known_role_is_clean() {
        let project = ProjectIndex::new().with_roles(["Administrator".to_string()]);
        assert!(run(vec![is_in_role("Administrator")], &project).is_empty());
    }

    #[test]
    fn unknown_role_is_flagged() {
        let project = ProjectIndex::new().with_roles(["Administrator".to_string()]);
        let out = run(vec![is_in_role("Ghost")], &project);
        assert_eq!(out.len(), 1);
        assert!(out[0].message.contains("'Ghost'"));
    }

    #[test]
    fn missing_role_list_disables_the_check() {
        assert!(run(vec![is_in_role("Anything")], &ProjectIndex::new()).is_empty());
    }

    #[test]
    fn predefined_value_checks_the_object_segments() {
        let project =
            ProjectIndex::new().with_metadata_objects(["Catalog.Products".to_string()]);
        let good = build::call_stmt(
            "PredefinedValue",
            vec![build::str_lit("Catalog.Products.Default")],
        );
        assert!(run(vec![good], &project).is_empty());

        let bad = build::call_stmt(
            "PredefinedValue",
            vec![build::str_lit("Catalog.Ghosts.Default")],
        );
        let out = run(vec![bad], &project);
        assert_eq!(out.len(), 1);
        assert!(out[0].message.contains("Catalog.Ghosts"));
    }

    #[test]
    fn non_literal_argument_is_ignored() {
        let project = ProjectIndex::new().with_roles(["Administrator".to_string()]);
        let dynamic = build::assign(
            "Allowed",
            build::call("IsInRole", vec![build::ident("RoleName")]),
        );
        assert!(run(vec![dynamic], &project).is_empty());
    }
}
