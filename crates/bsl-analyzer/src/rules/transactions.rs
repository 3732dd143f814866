//! Transaction lifecycle rule.

use bsl_common::{Diagnostic, Severity};

use crate::protocol::transaction::{self, TxIssue};

use super::{ModuleAnalysis, Rule, RuleParams};

/// Checks every `BeginTransaction`..`CommitTransaction` sequence against
/// the canonical shape: the begin is immediately followed by a `Try` whose
/// body commits and whose handler rolls back first.
pub struct TransactionUse;

impl Rule for TransactionUse {
    fn id(&self) -> &'static str {
        "transaction-use"
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
            for finding in transaction::check(&method.body) {
                out.push(Diagnostic::new(
                    self.id(),
                    self.severity(),
                    message(&finding.issue),
                    finding.span,
                ));
            }
        }
    }
}

fn message(issue: &TxIssue) -> &'static str {
    match issue {
        TxIssue::CodeBetweenBeginAndTry => {
            "statement between BeginTransaction and Try runs without exception protection"
        }
        TxIssue::MissingTry => "BeginTransaction must be immediately followed by Try",
        TxIssue::MissingCommit => "transaction is opened but never committed in the Try block",
        TxIssue::MissingBegin => {
            "CommitTransaction or RollbackTransaction without a matching BeginTransaction"
        }
        TxIssue::CodeBeforeRollback => {
            "exception handler must call RollbackTransaction before anything else"
        }
        TxIssue::MissingRollback => "exception handler must roll the transaction back",
    }
}
