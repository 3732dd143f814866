//! Convenience constructors for building module ASTs programmatically.
//!
//! The engine normally receives modules deserialized from the external
//! parser; these helpers exist for hosts that synthesize modules and for
//! the test suites in this crate.

use bsl_common::Span;

use super::nodes::*;

/// A single-line span in a synthetic module file.
pub fn at(line: u32) -> Span {
    Span::on_line("module.bsl", line)
}

pub fn ident(name: &str) -> Expr {
    Expr::Identifier {
        name: name.to_string(),
        span: Span::dummy(),
    }
}

pub fn num(value: f64) -> Expr {
    Expr::Literal {
        value: Literal::Number(value),
        span: Span::dummy(),
    }
}

pub fn str_lit(value: &str) -> Expr {
    Expr::Literal {
        value: Literal::String(value.to_string()),
        span: Span::dummy(),
    }
}

pub fn call(name: &str, args: Vec<Expr>) -> Expr {
    Expr::Call {
        name: name.to_string(),
        args,
        span: Span::dummy(),
    }
}

pub fn new_obj(type_name: &str, args: Vec<Expr>) -> Expr {
    Expr::New {
        type_name: type_name.to_string(),
        args,
        span: Span::dummy(),
    }
}

pub fn call_stmt(name: &str, args: Vec<Expr>) -> Statement {
    call_stmt_at(0, name, args)
}

pub fn call_stmt_at(line: u32, name: &str, args: Vec<Expr>) -> Statement {
    let span = if line == 0 { Span::dummy() } else { at(line) };
    Statement::Call {
        call: Expr::Call {
            name: name.to_string(),
            args,
            span: span.clone(),
        },
        span,
    }
}

pub fn assign(name: &str, value: Expr) -> Statement {
    assign_at(0, name, value)
}

pub fn assign_at(line: u32, name: &str, value: Expr) -> Statement {
    let span = if line == 0 { Span::dummy() } else { at(line) };
    Statement::Assignment {
        target: Expr::Identifier {
            name: name.to_string(),
            span: span.clone(),
        },
        value,
        span,
    }
}

pub fn var_decl(names: &[&str]) -> Statement {
    var_decl_at(0, names)
}

pub fn var_decl_at(line: u32, names: &[&str]) -> Statement {
    let span = if line == 0 { Span::dummy() } else { at(line) };
    Statement::VarDecl(VarDecl {
        names: names
            .iter()
            .map(|n| VarName {
                name: n.to_string(),
                export: false,
                span: span.clone(),
            })
            .collect(),
        span,
    })
}

pub fn ret(value: Option<Expr>) -> Statement {
    Statement::Return {
        value,
        span: Span::dummy(),
    }
}

pub fn try_except(body: Vec<Statement>, handler: Vec<Statement>) -> Statement {
    Statement::TryExcept {
        body,
        handler,
        span: Span::dummy(),
    }
}

pub fn if_stmt(condition: Expr, body: Vec<Statement>, else_body: Vec<Statement>) -> Statement {
    Statement::If {
        branches: vec![IfBranch {
            condition,
            body,
            span: Span::dummy(),
        }],
        else_body,
        span: Span::dummy(),
    }
}

pub fn param(name: &str) -> Param {
    Param {
        name: name.to_string(),
        by_value: false,
        default: None,
        span: Span::dummy(),
    }
}

pub fn procedure(name: &str, body: Vec<Statement>) -> Method {
    Method {
        name: name.to_string(),
        is_function: false,
        export: false,
        directive: None,
        region: None,
        doc: None,
        params: Vec::new(),
        body,
        span: Span::dummy(),
    }
}

pub fn function(name: &str, params: Vec<Param>, body: Vec<Statement>) -> Method {
    Method {
        name: name.to_string(),
        is_function: true,
        export: false,
        directive: None,
        region: None,
        doc: None,
        params,
        body,
        span: Span::dummy(),
    }
}

pub fn doc_comment(lines: &[&str]) -> DocComment {
    DocComment {
        lines: lines.iter().map(|l| l.to_string()).collect(),
        span: Span::dummy(),
    }
}

/// A server common module holding the given methods.
pub fn module(name: &str, methods: Vec<Method>) -> Module {
    Module {
        name: name.to_string(),
        kind: ModuleKind::Common,
        context: ContextFlags {
            server: true,
            ..ContextFlags::default()
        },
        regions: Vec::new(),
        variables: Vec::new(),
        methods,
        span: Span::dummy(),
    }
}
