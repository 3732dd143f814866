use bsl_common::Span;
use serde::{Deserialize, Serialize};

// ============================================================================
// Module (top-level)
// ============================================================================

/// The kind of module a compilation unit belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModuleKind {
    Common,
    Object,
    Form,
    Manager,
    Command,
}

/// Compilation context flags declared on a module (common modules carry
/// these from metadata; form modules are implicitly client-and-server).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContextFlags {
    #[serde(default)]
    pub server: bool,
    #[serde(default)]
    pub client: bool,
    #[serde(default)]
    pub server_call: bool,
    #[serde(default)]
    pub global: bool,
}

/// A complete module as delivered by the external parser.
///
/// Immutable after construction; the analysis session is its only owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    pub kind: ModuleKind,
    #[serde(default)]
    pub context: ContextFlags,
    /// Declared regions in source order. Regions are cosmetic groupings,
    /// not lexical scopes.
    #[serde(default)]
    pub regions: Vec<Region>,
    /// Module-level variable declarations.
    #[serde(default)]
    pub variables: Vec<VarDecl>,
    #[serde(default)]
    pub methods: Vec<Method>,
    pub span: Span,
}

/// A named source-organization region (`#Region Name` .. `#EndRegion`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
    pub name: String,
    pub span: Span,
}

// ============================================================================
// Methods
// ============================================================================

/// A compilation-directive pragma on a method (`&AtServer` etc.).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Directive {
    AtServer,
    AtClient,
    AtServerNoContext,
    AtClientAtServer,
    AtClientAtServerNoContext,
}

impl Directive {
    /// Whether code under this directive can execute in a client context.
    pub fn is_client_reachable(self) -> bool {
        matches!(
            self,
            Directive::AtClient
                | Directive::AtClientAtServer
                | Directive::AtClientAtServerNoContext
        )
    }
}

/// A procedure or function declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    /// `Function` when true, `Procedure` otherwise.
    pub is_function: bool,
    #[serde(default)]
    pub export: bool,
    #[serde(default)]
    pub directive: Option<Directive>,
    /// Name of the enclosing region, when any.
    #[serde(default)]
    pub region: Option<String>,
    /// Structured doc comment attached to the declaration.
    #[serde(default)]
    pub doc: Option<DocComment>,
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(default)]
    pub body: Vec<Statement>,
    pub span: Span,
}

impl Method {
    /// Whether this method can execute in a client context, falling back to
    /// the module's flags when no directive is present.
    pub fn client_reachable(&self, context: ContextFlags) -> bool {
        match self.directive {
            Some(d) => d.is_client_reachable(),
            None => context.client,
        }
    }
}

/// The raw text of a doc-comment block, one entry per comment line with the
/// leading `//` stripped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocComment {
    pub lines: Vec<String>,
    pub span: Span,
}

/// A method parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    #[serde(default)]
    pub by_value: bool,
    #[serde(default)]
    pub default: Option<Expr>,
    pub span: Span,
}

// ============================================================================
// Statements
// ============================================================================

/// A `Var` declaration statement. One statement can declare several names
/// (`Var A, B Export;`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarDecl {
    pub names: Vec<VarName>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarName {
    pub name: String,
    #[serde(default)]
    pub export: bool,
    pub span: Span,
}

/// One branch of an `If`/`ElsIf` chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IfBranch {
    pub condition: Expr,
    pub body: Vec<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Statement {
    VarDecl(VarDecl),
    Assignment {
        target: Expr,
        value: Expr,
        span: Span,
    },
    /// A call used as a statement (`DoThing(X);`).
    Call {
        call: Expr,
        span: Span,
    },
    If {
        branches: Vec<IfBranch>,
        #[serde(default)]
        else_body: Vec<Statement>,
        span: Span,
    },
    While {
        condition: Expr,
        body: Vec<Statement>,
        span: Span,
    },
    For {
        variable: String,
        from: Expr,
        to: Expr,
        body: Vec<Statement>,
        span: Span,
    },
    ForEach {
        variable: String,
        collection: Expr,
        body: Vec<Statement>,
        span: Span,
    },
    TryExcept {
        body: Vec<Statement>,
        handler: Vec<Statement>,
        span: Span,
    },
    Return {
        #[serde(default)]
        value: Option<Expr>,
        span: Span,
    },
    Break {
        span: Span,
    },
    Continue {
        span: Span,
    },
    Raise {
        #[serde(default)]
        value: Option<Expr>,
        span: Span,
    },
    Goto {
        label: String,
        span: Span,
    },
    Label {
        name: String,
        span: Span,
    },
}

impl Statement {
    pub fn span(&self) -> &Span {
        match self {
            Statement::VarDecl(decl) => &decl.span,
            Statement::Assignment { span, .. }
            | Statement::Call { span, .. }
            | Statement::If { span, .. }
            | Statement::While { span, .. }
            | Statement::For { span, .. }
            | Statement::ForEach { span, .. }
            | Statement::TryExcept { span, .. }
            | Statement::Return { span, .. }
            | Statement::Break { span }
            | Statement::Continue { span }
            | Statement::Raise { span, .. }
            | Statement::Goto { span, .. }
            | Statement::Label { span, .. } => span,
        }
    }

    /// The global-call name of this statement, when it is a plain call
    /// (`BeginTransaction();`). Used by the protocol checkers.
    pub fn global_call(&self) -> Option<(&str, &[Expr])> {
        match self {
            Statement::Call {
                call: Expr::Call { name, args, .. },
                ..
            } => Some((name.as_str(), args.as_slice())),
            _ => None,
        }
    }
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Expr {
    Identifier {
        name: String,
        span: Span,
    },
    Literal {
        value: Literal,
        span: Span,
    },
    /// Constructor expression (`New Structure("Key")`).
    New {
        type_name: String,
        #[serde(default)]
        args: Vec<Expr>,
        span: Span,
    },
    /// Unqualified call (local method or global context function).
    Call {
        name: String,
        #[serde(default)]
        args: Vec<Expr>,
        span: Span,
    },
    /// Qualified call (`Receiver.Method(...)`).
    MethodCall {
        receiver: Box<Expr>,
        name: String,
        #[serde(default)]
        args: Vec<Expr>,
        span: Span,
    },
    Property {
        receiver: Box<Expr>,
        name: String,
        span: Span,
    },
    Index {
        receiver: Box<Expr>,
        index: Box<Expr>,
        span: Span,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        span: Span,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        span: Span,
    },
    /// `?(Condition, Then, Else)`.
    Ternary {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> &Span {
        match self {
            Expr::Identifier { span, .. }
            | Expr::Literal { span, .. }
            | Expr::New { span, .. }
            | Expr::Call { span, .. }
            | Expr::MethodCall { span, .. }
            | Expr::Property { span, .. }
            | Expr::Index { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Ternary { span, .. } => span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Number(f64),
    String(String),
    Boolean(bool),
    /// Date literal kept as its source text (`'20240101'`).
    Date(String),
    Undefined,
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}
