//! Code-after-async-call rule.

use bsl_common::{Diagnostic, Severity};

use crate::protocol::async_call::{self, AsyncPolicy};

use super::{ModuleAnalysis, Rule, RuleParams};

/// Flags statements placed after a call that starts an asynchronous
/// operation; they run before the operation's result exists.
///
/// Parameters: `async-methods` replaces the built-in list of async call
/// names; `check-with-notify` also flags calls that already pass a
/// `NotifyDescription` (off by default).
pub struct CodeAfterAsyncCall;

impl Rule for CodeAfterAsyncCall {
    fn id(&self) -> &'static str {
        "code-after-async-call"
    }

    fn severity(&self) -> Severity {
        Severity::Major
    }

    fn check(
        &self,
        analysis: &ModuleAnalysis<'_>,
        params: &RuleParams<'_>,
        out: &mut Vec<Diagnostic>,
    ) {
        let check_with_notify = params.bool_or("check-with-notify", false);
        let policy = match params.list("async-methods") {
            Some(names) => AsyncPolicy::new(names.iter().cloned(), check_with_notify),
            None => AsyncPolicy::new(
                async_call::DEFAULT_ASYNC_METHODS
                    .iter()
                    .map(|s| s.to_string()),
                check_with_notify,
            ),
        };

        for method in &analysis.module.methods {
            for finding in async_call::check(&method.body, &policy) {
                out.push(
                    Diagnostic::new(
                        self.id(),
                        self.severity(),
                        "statement runs before the asynchronous result arrives; move it into the notification handler",
                        finding.trailing_span,
                    )
                    .with_related(finding.call_span, "asynchronous call here"),
                );
            }
        }
    }
}
