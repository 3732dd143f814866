//! Unreachable-code rule.

use std::collections::HashSet;

use bsl_common::{Diagnostic, Severity, Span};

use super::{ModuleAnalysis, Needs, Rule, RuleParams};

/// Statements in basic blocks the control-flow graph cannot reach from
/// the method entry. One diagnostic per dead block, at its first
/// statement.
pub struct UnreachableCode;

impl Rule for UnreachableCode {
    fn id(&self) -> &'static str {
        "unreachable-code"
    }

    fn severity(&self) -> Severity {
        Severity::Major
    }

    fn needs(&self) -> Needs {
        Needs {
            cfg: true,
            ..Needs::default()
        }
    }

    fn check(
        &self,
        analysis: &ModuleAnalysis<'_>,
        _params: &RuleParams<'_>,
        out: &mut Vec<Diagnostic>,
    ) {
        let Some(cfgs) = analysis.cfgs() else {
            return;
        };
        for cfg in cfgs {
            let reachable = cfg.reachable();
            let mut reported: HashSet<&Span> = HashSet::new();
            for (id, block) in cfg.blocks() {
                if reachable[id.0] {
                    continue;
                }
                let Some(first) = block.statements.first() else {
                    continue;
                };
                if reported.insert(first.span()) {
                    out.push(Diagnostic::new(
                        self.id(),
                        self.severity(),
                        "unreachable code",
                        first.span().clone(),
                    ));
                }
            }
        }
    }
}
