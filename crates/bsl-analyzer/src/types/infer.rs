//! Best-effort type propagation over method bodies.
//!
//! Sources of type information, in priority order: explicit doc-comment
//! annotations, structural inference from literals and constructors,
//! declared return types of called methods, and finally `Unknown`.
//! Inference never fails; anything it cannot classify stays `Unknown`.

use std::collections::HashMap;

use crate::ast::walk;
use crate::ast::{BinaryOp, Expr, Literal, Method, Module, Statement, UnaryOp};

use super::doc_comment::{self, MethodAnnotation};
use super::model::{Primitive, Type};

/// Cached per-module type information: one annotation and one local-type
/// environment per method. Immutable once built.
#[derive(Debug)]
pub struct TypeInfo {
    annotations: Vec<MethodAnnotation>,
    locals: Vec<HashMap<String, Type>>,
}

impl TypeInfo {
    /// The cached annotation of the `index`-th method.
    pub fn annotation(&self, method_index: usize) -> &MethodAnnotation {
        &self.annotations[method_index]
    }

    /// Inferred type of a local or parameter inside a method.
    pub fn local_type(&self, method_index: usize, name: &str) -> Type {
        self.locals[method_index]
            .get(name)
            .cloned()
            .unwrap_or(Type::Unknown)
    }

    /// Infer the type of an expression in the context of a method.
    pub fn expr_type(&self, module: &Module, method_index: usize, expr: &Expr) -> Type {
        let returns = ReturnTypes::collect(module, &self.annotations);
        let env = Env {
            locals: &self.locals[method_index],
            returns: &returns,
        };
        infer_expr(expr, &env)
    }
}

/// Build type information for a whole module.
pub fn infer_module(module: &Module) -> TypeInfo {
    let annotations: Vec<MethodAnnotation> = module
        .methods
        .iter()
        .map(|m| {
            m.doc
                .as_ref()
                .map(doc_comment::parse)
                .unwrap_or_default()
        })
        .collect();

    let returns = ReturnTypes::collect(module, &annotations);

    let locals = module
        .methods
        .iter()
        .enumerate()
        .map(|(index, method)| infer_method_locals(method, &annotations[index], &returns))
        .collect();

    TypeInfo {
        annotations,
        locals,
    }
}

/// Declared return types of the module's own methods, by name.
struct ReturnTypes(HashMap<String, Type>);

impl ReturnTypes {
    fn collect(module: &Module, annotations: &[MethodAnnotation]) -> Self {
        let mut map = HashMap::new();
        for (method, annotation) in module.methods.iter().zip(annotations) {
            if method.is_function {
                if let Some(ty) = &annotation.returns {
                    map.insert(method.name.clone(), ty.clone());
                }
            }
        }
        Self(map)
    }

    fn get(&self, name: &str) -> Type {
        self.0.get(name).cloned().unwrap_or(Type::Unknown)
    }
}

struct Env<'a> {
    locals: &'a HashMap<String, Type>,
    returns: &'a ReturnTypes,
}

fn infer_method_locals(
    method: &Method,
    annotation: &MethodAnnotation,
    returns: &ReturnTypes,
) -> HashMap<String, Type> {
    let mut locals: HashMap<String, Type> = HashMap::new();
    for param in &method.params {
        locals.insert(param.name.clone(), annotation.param_type(&param.name));
    }

    walk::each_statement(&method.body, &mut |stmt| match stmt {
        Statement::Assignment {
            target: Expr::Identifier { name, .. },
            value,
            ..
        } => {
            let inferred = infer_expr(
                value,
                &Env {
                    locals: &locals,
                    returns,
                },
            );
            merge_local(&mut locals, name, inferred);
        }
        Statement::For { variable, .. } => {
            merge_local(&mut locals, variable, Type::Primitive(Primitive::Number));
        }
        Statement::ForEach {
            variable,
            collection,
            ..
        } => {
            let element = match infer_expr(
                collection,
                &Env {
                    locals: &locals,
                    returns,
                },
            ) {
                Type::Collection { element, .. } => *element,
                _ => Type::Unknown,
            };
            merge_local(&mut locals, variable, element);
        }
        _ => {}
    });

    locals
}

/// Re-assignment widens the variable's type to the union of everything
/// assigned to it.
fn merge_local(locals: &mut HashMap<String, Type>, name: &str, ty: Type) {
    match locals.get(name) {
        Some(existing) if *existing != ty => {
            let merged = Type::union([existing.clone(), ty]);
            locals.insert(name.to_string(), merged);
        }
        Some(_) => {}
        None => {
            locals.insert(name.to_string(), ty);
        }
    }
}

fn infer_expr(expr: &Expr, env: &Env<'_>) -> Type {
    match expr {
        Expr::Literal { value, .. } => match value {
            Literal::Number(_) => Type::Primitive(Primitive::Number),
            Literal::String(_) => Type::Primitive(Primitive::String),
            Literal::Boolean(_) => Type::Primitive(Primitive::Boolean),
            Literal::Date(_) => Type::Primitive(Primitive::Date),
            Literal::Undefined => Type::Primitive(Primitive::Undefined),
            Literal::Null => Type::Primitive(Primitive::Null),
        },
        Expr::Identifier { name, .. } => {
            env.locals.get(name).cloned().unwrap_or(Type::Unknown)
        }
        Expr::New { type_name, .. } => Type::from_constructor(type_name),
        Expr::Call { name, .. } => env.returns.get(name),
        Expr::MethodCall { .. } | Expr::Property { .. } | Expr::Index { .. } => Type::Unknown,
        Expr::Unary { op, .. } => match op {
            UnaryOp::Not => Type::Primitive(Primitive::Boolean),
            UnaryOp::Neg => Type::Primitive(Primitive::Number),
        },
        Expr::Binary {
            op, left, right, ..
        } => {
            if op.is_comparison() || op.is_logical() {
                return Type::Primitive(Primitive::Boolean);
            }
            let lhs = infer_expr(left, env);
            let rhs = infer_expr(right, env);
            if lhs == Type::Unknown || rhs == Type::Unknown {
                return Type::Unknown;
            }
            // `+` concatenates strings; every other arithmetic op is numeric.
            if *op == BinaryOp::Add && lhs == Type::Primitive(Primitive::String) {
                Type::Primitive(Primitive::String)
            } else {
                Type::Primitive(Primitive::Number)
            }
        }
        Expr::Ternary {
            then, otherwise, ..
        } => Type::union([infer_expr(then, env), infer_expr(otherwise, env)]),
    }
}
