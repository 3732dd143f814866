//! Goto-in-client-code rule.

use bsl_common::{Diagnostic, Severity};

use crate::ast::{walk, Statement};

use super::{ModuleAnalysis, Rule, RuleParams};

/// `Goto` is not supported by the web client; flag it in every method that
/// can run on the client, determined from the method's compilation
/// directive or, absent one, the module's context.
pub struct UseGoto;

impl Rule for UseGoto {
    fn id(&self) -> &'static str {
        "use-goto"
    }

    fn severity(&self) -> Severity {
        Severity::Critical
    }

    fn check(
        &self,
        analysis: &ModuleAnalysis<'_>,
        _params: &RuleParams<'_>,
        out: &mut Vec<Diagnostic>,
    ) {
        for method in &analysis.module.methods {
            if !method.client_reachable(analysis.module.context) {
                continue;
            }
            walk::each_statement(&method.body, &mut |stmt| {
                if let Statement::Goto { label, span } = stmt {
                    out.push(Diagnostic::new(
                        self.id(),
                        self.severity(),
                        format!("'Goto ~{}' cannot run on the client", label),
                        span.clone(),
                    ));
                }
            });
        }
    }
}
