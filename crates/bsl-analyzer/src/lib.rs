//! Static analysis engine for business-logic modules.
//!
//! The engine consumes a parsed [`ast::Module`] (typically deserialized
//! from the external parser's JSON), builds the shared analyses each
//! enabled rule asks for (symbol table, type information, control-flow
//! graphs), and runs the rule registry over every module of a project in
//! parallel.
//!
//! ```
//! use bsl_analyzer::{AnalysisSession, AnalyzerConfig, CancellationToken};
//! use bsl_analyzer::ast::build;
//!
//! let module = build::module("Demo", vec![build::procedure("Run", vec![])]);
//! let session = AnalysisSession::new(AnalyzerConfig::new());
//! let diagnostics = session.analyze(&[module], &CancellationToken::new());
//! assert!(diagnostics.is_empty());
//! ```

pub mod ast;
pub mod cfg;
pub mod engine;
pub mod project;
pub mod protocol;
pub mod rules;
pub mod symbols;
pub mod types;

pub use engine::{AnalysisSession, CancellationToken};
pub use project::ProjectIndex;
pub use rules::{ModuleAnalysis, Needs, Rule, RuleParams, RuleRegistry};

pub use bsl_common::{
    AnalyzerConfig, ConfigError, Diagnostic, DiagnosticBag, ParamValue, RuleConfig, Severity,
    Span,
};
