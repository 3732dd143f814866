//! Async-call trailer machine.
//!
//! After a call that starts an asynchronous operation, the result arrives
//! through its `NotifyDescription`; any code written after the call in the
//! same block runs before that result exists. The machine flags the first
//! trailing statement per call site: `Normal -> AfterAsyncCall` on a
//! matching call, one finding if the next statement in the block is
//! anything but `Return`.

use std::collections::HashSet;

use bsl_common::Span;

use crate::ast::{Expr, Statement};

/// Which calls count as asynchronous, and whether calls that do pass a
/// `NotifyDescription` are still checked.
#[derive(Debug, Clone)]
pub struct AsyncPolicy {
    names: HashSet<String>,
    pub check_with_notify: bool,
}

/// Platform calls that start an asynchronous operation.
pub const DEFAULT_ASYNC_METHODS: &[&str] = &[
    "ShowQueryBox",
    "ShowMessageBox",
    "ShowValue",
    "ShowInputValue",
    "ShowInputString",
    "ShowInputNumber",
    "ShowInputDate",
    "OpenForm",
    "BeginPutFile",
    "BeginGetFile",
    "BeginCopyingFile",
    "BeginDeletingFile",
    "BeginRunningApplication",
    "BeginInstallAddIn",
    "BeginAttachingFileSystemExtension",
];

impl AsyncPolicy {
    pub fn new(names: impl IntoIterator<Item = String>, check_with_notify: bool) -> Self {
        Self {
            names: names.into_iter().collect(),
            check_with_notify,
        }
    }

    pub fn standard() -> Self {
        Self::new(
            DEFAULT_ASYNC_METHODS.iter().map(|s| s.to_string()),
            false,
        )
    }

    fn applies_to(&self, name: &str, args: &[Expr]) -> bool {
        if !self.names.contains(name) {
            return false;
        }
        self.check_with_notify || !has_notify_description(args)
    }
}

/// A flagged async call site: the call's span plus the trailing statement.
#[derive(Debug, Clone)]
pub struct AsyncFinding {
    pub call_span: Span,
    pub trailing_span: Span,
}

/// Walk a method body and flag async calls followed by code.
pub fn check(body: &[Statement], policy: &AsyncPolicy) -> Vec<AsyncFinding> {
    let mut findings = Vec::new();
    check_block(body, policy, &mut findings);
    findings
}

fn check_block(stmts: &[Statement], policy: &AsyncPolicy, findings: &mut Vec<AsyncFinding>) {
    for (index, stmt) in stmts.iter().enumerate() {
        if let Some((name, args)) = stmt.global_call() {
            if policy.applies_to(name, args) {
                // One finding per call site, at the first trailing
                // statement in the same block.
                if let Some(next) = stmts.get(index + 1) {
                    if !matches!(next, Statement::Return { .. }) {
                        findings.push(AsyncFinding {
                            call_span: stmt.span().clone(),
                            trailing_span: next.span().clone(),
                        });
                    }
                }
            }
        }
        recurse(stmt, policy, findings);
    }
}

fn recurse(stmt: &Statement, policy: &AsyncPolicy, findings: &mut Vec<AsyncFinding>) {
    match stmt {
        Statement::If {
            branches,
            else_body,
            ..
        } => {
            for branch in branches {
                check_block(&branch.body, policy, findings);
            }
            check_block(else_body, policy, findings);
        }
        Statement::While { body, .. }
        | Statement::For { body, .. }
        | Statement::ForEach { body, .. } => check_block(body, policy, findings),
        Statement::TryExcept { body, handler, .. } => {
            check_block(body, policy, findings);
            check_block(handler, policy, findings);
        }
        _ => {}
    }
}

fn has_notify_description(args: &[Expr]) -> bool {
    args.iter().any(|arg| match arg {
        Expr::New { type_name, .. } => type_name == "NotifyDescription",
        _ => false,
    })
}
