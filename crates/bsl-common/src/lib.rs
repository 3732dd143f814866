pub mod config;
pub mod diagnostics;
pub mod span;

pub use config::{AnalyzerConfig, ConfigError, ParamValue, RuleConfig};
pub use diagnostics::{Diagnostic, DiagnosticBag, Severity};
pub use span::{Position, Span};
