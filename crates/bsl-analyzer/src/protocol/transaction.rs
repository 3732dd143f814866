//! Transaction-lifecycle state machine.
//!
//! Verifies the required shape around explicit transactions:
//!
//! ```text
//! BeginTransaction();
//! Try
//!     ...
//!     CommitTransaction();
//! Except
//!     RollbackTransaction();
//!     ...
//! EndTry;
//! ```
//!
//! The machine walks the method's statement stream deterministically:
//! `Idle -> AwaitingTry` on `BeginTransaction`, back to `Idle` once the
//! `Try` block has been checked. Violations recover instead of stopping,
//! so one bug does not mask the next.

use bsl_common::Span;

use crate::ast::Statement;

pub const BEGIN: &str = "BeginTransaction";
pub const COMMIT: &str = "CommitTransaction";
pub const ROLLBACK: &str = "RollbackTransaction";

/// A violation found by the machine. The `transaction-use` rule maps
/// these to diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxIssue {
    /// Executable statement between `BeginTransaction` and `Try`.
    CodeBetweenBeginAndTry,
    /// `BeginTransaction` with no `Try` block after it.
    MissingTry,
    /// The transaction's `Try` body contains no `CommitTransaction`.
    MissingCommit,
    /// `Commit`/`Rollback` with no open transaction.
    MissingBegin,
    /// Statement in the `Except` handler before `RollbackTransaction`.
    CodeBeforeRollback,
    /// The `Except` handler of a transaction never rolls back.
    MissingRollback,
}

#[derive(Debug, Clone)]
pub struct TxFinding {
    pub issue: TxIssue,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    /// `BeginTransaction` seen; the next statement must open a `Try`.
    AwaitingTry { flagged: bool },
    /// Error recovery after a missing `Try`: absorb the closing
    /// `Commit`/`Rollback` of the broken transaction without re-reporting.
    Recovered,
}

/// Walk one method body and collect transaction findings.
pub fn check(body: &[Statement]) -> Vec<TxFinding> {
    let mut machine = Machine {
        state: State::Idle,
        begin_span: None,
        findings: Vec::new(),
    };
    machine.walk(body);
    machine.finish();
    machine.findings
}

struct Machine {
    state: State,
    begin_span: Option<Span>,
    findings: Vec<TxFinding>,
}

impl Machine {
    fn report(&mut self, issue: TxIssue, span: &Span) {
        self.findings.push(TxFinding {
            issue,
            span: span.clone(),
        });
    }

    fn walk(&mut self, stmts: &[Statement]) {
        for stmt in stmts {
            self.step(stmt);
        }
    }

    fn step(&mut self, stmt: &Statement) {
        match self.state {
            State::Idle => self.step_idle(stmt),
            State::AwaitingTry { flagged } => self.step_awaiting(stmt, flagged),
            State::Recovered => self.step_recovered(stmt),
        }
    }

    fn step_idle(&mut self, stmt: &Statement) {
        match stmt.global_call() {
            Some((BEGIN, _)) => {
                self.state = State::AwaitingTry { flagged: false };
                self.begin_span = Some(stmt.span().clone());
            }
            Some((COMMIT, _)) | Some((ROLLBACK, _)) => {
                self.report(TxIssue::MissingBegin, stmt.span());
            }
            _ => self.recurse(stmt),
        }
    }

    fn step_awaiting(&mut self, stmt: &Statement, flagged: bool) {
        match stmt {
            Statement::TryExcept { body, handler, .. } => {
                self.state = State::Idle;
                self.check_transaction_try(body, handler, stmt.span());
            }
            _ => match stmt.global_call() {
                // The transaction closed without any Try at all.
                Some((COMMIT, _)) | Some((ROLLBACK, _)) => {
                    let begin = self.begin_span.take().unwrap_or_else(|| stmt.span().clone());
                    self.report(TxIssue::MissingTry, &begin);
                    self.state = State::Recovered;
                }
                Some((BEGIN, _)) => {
                    let begin = self.begin_span.replace(stmt.span().clone());
                    if let Some(begin) = begin {
                        self.report(TxIssue::MissingTry, &begin);
                    }
                    self.state = State::AwaitingTry { flagged: false };
                }
                _ => {
                    if !flagged {
                        self.report(TxIssue::CodeBetweenBeginAndTry, stmt.span());
                    }
                    // Keep waiting so a later Try is still fully checked.
                    self.state = State::AwaitingTry { flagged: true };
                }
            },
        }
    }

    fn step_recovered(&mut self, stmt: &Statement) {
        match stmt.global_call() {
            // Absorb the closing pair of the already-reported transaction.
            Some((COMMIT, _)) | Some((ROLLBACK, _)) => {
                self.state = State::Idle;
            }
            Some((BEGIN, _)) => {
                self.state = State::AwaitingTry { flagged: false };
                self.begin_span = Some(stmt.span().clone());
            }
            _ => {}
        }
    }

    /// Check the `Try` block that carries a transaction: a commit must be
    /// present in the body, and the handler must roll back first.
    fn check_transaction_try(&mut self, body: &[Statement], handler: &[Statement], span: &Span) {
        let begin = self.begin_span.take();

        if !contains_call(body, COMMIT) {
            let at = begin.clone().unwrap_or_else(|| span.clone());
            self.report(TxIssue::MissingCommit, &at);
        }

        // Nested transactions inside the try body are checked by the same
        // machine; the commit of this transaction is absorbed below.
        let mut inner = Machine {
            state: State::Idle,
            begin_span: None,
            findings: Vec::new(),
        };
        inner.walk_ignoring_own_pair(body);
        inner.finish();
        self.findings.extend(inner.findings);

        self.check_handler(handler, span);
    }

    fn check_handler(&mut self, handler: &[Statement], try_span: &Span) {
        let mut rollback_seen = false;
        for (index, stmt) in handler.iter().enumerate() {
            if let Some((ROLLBACK, _)) = stmt.global_call() {
                if index > 0 && !rollback_seen {
                    self.report(TxIssue::CodeBeforeRollback, stmt.span());
                }
                rollback_seen = true;
            }
        }
        if !rollback_seen {
            self.report(TxIssue::MissingRollback, try_span);
        }
    }

    /// Walk a transaction's try body: the commit/rollback belonging to the
    /// enclosing transaction must not count as "missing begin".
    fn walk_ignoring_own_pair(&mut self, stmts: &[Statement]) {
        for stmt in stmts {
            if self.state == State::Idle {
                if let Some((COMMIT, _)) | Some((ROLLBACK, _)) = stmt.global_call() {
                    continue;
                }
            }
            self.step(stmt);
        }
    }

    /// Recurse into compound statements that are not transaction `Try`
    /// blocks. An inner `Try` that does not itself manage a transaction
    /// is walked for nested transactions, but its handler is not required
    /// to roll back first.
    fn recurse(&mut self, stmt: &Statement) {
        match stmt {
            Statement::If {
                branches,
                else_body,
                ..
            } => {
                for branch in branches {
                    self.walk_nested(&branch.body);
                }
                self.walk_nested(else_body);
            }
            Statement::While { body, .. }
            | Statement::For { body, .. }
            | Statement::ForEach { body, .. } => self.walk_nested(body),
            Statement::TryExcept { body, handler, .. } => {
                self.walk_nested(body);
                self.walk_nested(handler);
            }
            _ => {}
        }
    }

    /// Nested bodies get their own sub-machine so branch-local transactions
    /// are checked independently of the outer statement stream.
    fn walk_nested(&mut self, stmts: &[Statement]) {
        let mut inner = Machine {
            state: State::Idle,
            begin_span: None,
            findings: Vec::new(),
        };
        inner.walk(stmts);
        inner.finish();
        self.findings.extend(inner.findings);
    }

    fn finish(&mut self) {
        if let State::AwaitingTry { flagged } = self.state {
            if !flagged {
                if let Some(begin) = self.begin_span.take() {
                    self.report(TxIssue::MissingTry, &begin);
                }
            }
            self.state = State::Idle;
        }
    }
}

fn contains_call(stmts: &[Statement], name: &str) -> bool {
    let mut found = false;
    crate::ast::walk::each_statement(stmts, &mut |stmt| {
        if let Some((call, _)) = stmt.global_call() {
            if call == name {
                found = true;
            }
        }
    });
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build;

    fn begin() -> Statement {
        build::call_stmt_at(1, BEGIN, vec![])
    }

    fn commit() -> Statement {
        build::call_stmt(COMMIT, vec![])
    }

    fn rollback() -> Statement {
        build::call_stmt(ROLLBACK, vec![])
    }

    fn raise() -> Statement {
        Statement::Raise {
            value: None,
            span: bsl_common::Span::dummy(),
        }
    }

    fn issues(body: &[Statement]) -> Vec<TxIssue> {
        check(body).into_iter().map(|f| f.issue).collect()
    }

    #[test]
    fn well_formed_transaction_is_clean() {
        let body = vec![
            begin(),
            build::try_except(vec![commit()], vec![rollback(), raise()]),
        ];
        assert!(issues(&body).is_empty(), "got: {:?}", issues(&body));
    }

    #[test]
    fn removing_try_yields_exactly_one_missing_try() {
        // The try removed: its contents spill into the method body.
        let body = vec![begin(), commit(), rollback(), raise()];
        assert_eq!(issues(&body), vec![TxIssue::MissingTry]);
    }

    #[test]
    fn begin_as_last_statement_is_missing_try() {
        let body = vec![begin()];
        assert_eq!(issues(&body), vec![TxIssue::MissingTry]);
    }

    #[test]
    fn statement_between_begin_and_try_is_flagged_once() {
        let body = vec![
            begin(),
            build::call_stmt("Log", vec![]),
            build::call_stmt("MoreLog", vec![]),
            build::try_except(vec![commit()], vec![rollback()]),
        ];
        assert_eq!(issues(&body), vec![TxIssue::CodeBetweenBeginAndTry]);
    }

    #[test]
    fn later_try_is_still_checked_after_recovery() {
        let body = vec![
            begin(),
            build::call_stmt("Log", vec![]),
            build::try_except(vec![commit()], vec![raise()]),
        ];
        assert_eq!(
            issues(&body),
            vec![TxIssue::CodeBetweenBeginAndTry, TxIssue::MissingRollback]
        );
    }

    #[test]
    fn code_before_rollback_yields_exactly_one() {
        let body = vec![
            begin(),
            build::try_except(
                vec![commit()],
                vec![build::call_stmt("Log", vec![]), rollback(), raise()],
            ),
        ];
        assert_eq!(issues(&body), vec![TxIssue::CodeBeforeRollback]);
    }

    #[test]
    fn handler_without_rollback() {
        let body = vec![begin(), build::try_except(vec![commit()], vec![raise()])];
        assert_eq!(issues(&body), vec![TxIssue::MissingRollback]);
    }

    #[test]
    fn try_body_without_commit() {
        let body = vec![
            begin(),
            build::try_except(vec![build::call_stmt("Work", vec![])], vec![rollback()]),
        ];
        assert_eq!(issues(&body), vec![TxIssue::MissingCommit]);
    }

    #[test]
    fn commit_without_begin() {
        let body = vec![commit()];
        assert_eq!(issues(&body), vec![TxIssue::MissingBegin]);
    }

    #[test]
    fn rollback_without_begin() {
        let body = vec![rollback()];
        assert_eq!(issues(&body), vec![TxIssue::MissingBegin]);
    }

    #[test]
    fn plain_try_without_transaction_is_clean() {
        let body = vec![build::try_except(
            vec![build::call_stmt("Risky", vec![])],
            vec![build::call_stmt("Handle", vec![])],
        )];
        assert!(issues(&body).is_empty());
    }

    #[test]
    fn inner_try_does_not_need_rollback_first() {
        // Only the Try immediately following BeginTransaction must roll
        // back first.
        let body = vec![
            begin(),
            build::try_except(
                vec![
                    build::try_except(
                        vec![build::call_stmt("Risky", vec![])],
                        vec![build::call_stmt("Handle", vec![])],
                    ),
                    commit(),
                ],
                vec![rollback()],
            ),
        ];
        assert!(issues(&body).is_empty(), "got: {:?}", issues(&body));
    }

    #[test]
    fn transaction_inside_if_branch_is_checked() {
        let body = vec![build::if_stmt(
            build::ident("Cond"),
            vec![begin()],
            vec![],
        )];
        assert_eq!(issues(&body), vec![TxIssue::MissingTry]);
    }

    #[test]
    fn two_sequential_transactions_are_independent() {
        let body = vec![
            begin(),
            build::try_except(vec![commit()], vec![rollback()]),
            begin(),
            build::try_except(vec![commit()], vec![rollback()]),
        ];
        assert!(issues(&body).is_empty());
    }
}
