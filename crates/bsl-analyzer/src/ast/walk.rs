//! Read-only traversal helpers over statement and expression trees.

use super::nodes::{Expr, Statement};

/// Visit every statement in `stmts`, recursing into compound bodies, in
/// source (preorder) order.
pub fn each_statement<'a>(stmts: &'a [Statement], f: &mut impl FnMut(&'a Statement)) {
    for stmt in stmts {
        f(stmt);
        match stmt {
            Statement::If {
                branches,
                else_body,
                ..
            } => {
                for branch in branches {
                    each_statement(&branch.body, f);
                }
                each_statement(else_body, f);
            }
            Statement::While { body, .. }
            | Statement::For { body, .. }
            | Statement::ForEach { body, .. } => each_statement(body, f),
            Statement::TryExcept { body, handler, .. } => {
                each_statement(body, f);
                each_statement(handler, f);
            }
            _ => {}
        }
    }
}

/// Visit the expressions that appear directly in `stmt` (conditions,
/// operands, arguments), without descending into nested statements.
pub fn each_expr_in<'a>(stmt: &'a Statement, f: &mut impl FnMut(&'a Expr)) {
    match stmt {
        Statement::Assignment { target, value, .. } => {
            each_subexpr(target, f);
            each_subexpr(value, f);
        }
        Statement::Call { call, .. } => each_subexpr(call, f),
        Statement::If { branches, .. } => {
            for branch in branches {
                each_subexpr(&branch.condition, f);
            }
        }
        Statement::While { condition, .. } => each_subexpr(condition, f),
        Statement::For { from, to, .. } => {
            each_subexpr(from, f);
            each_subexpr(to, f);
        }
        Statement::ForEach { collection, .. } => each_subexpr(collection, f),
        Statement::Return { value, .. } | Statement::Raise { value, .. } => {
            if let Some(value) = value {
                each_subexpr(value, f);
            }
        }
        Statement::VarDecl(_)
        | Statement::TryExcept { .. }
        | Statement::Break { .. }
        | Statement::Continue { .. }
        | Statement::Goto { .. }
        | Statement::Label { .. } => {}
    }
}

/// Visit `expr` and all of its subexpressions in preorder.
pub fn each_subexpr<'a>(expr: &'a Expr, f: &mut impl FnMut(&'a Expr)) {
    f(expr);
    match expr {
        Expr::Identifier { .. } | Expr::Literal { .. } => {}
        Expr::New { args, .. } | Expr::Call { args, .. } => {
            for arg in args {
                each_subexpr(arg, f);
            }
        }
        Expr::MethodCall { receiver, args, .. } => {
            each_subexpr(receiver, f);
            for arg in args {
                each_subexpr(arg, f);
            }
        }
        Expr::Property { receiver, .. } => each_subexpr(receiver, f),
        Expr::Index {
            receiver, index, ..
        } => {
            each_subexpr(receiver, f);
            each_subexpr(index, f);
        }
        Expr::Unary { operand, .. } => each_subexpr(operand, f),
        Expr::Binary { left, right, .. } => {
            each_subexpr(left, f);
            each_subexpr(right, f);
        }
        Expr::Ternary {
            condition,
            then,
            otherwise,
            ..
        } => {
            each_subexpr(condition, f);
            each_subexpr(then, f);
            each_subexpr(otherwise, f);
        }
    }
}
