use serde::{Deserialize, Serialize};

use crate::span::Span;

/// Severity level of a diagnostic.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Severity {
    Info,
    Minor,
    Major,
    Critical,
    Blocker,
}

/// A related source location providing additional context for a diagnostic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelatedSpan {
    pub span: Span,
    pub message: String,
}

/// A diagnostic emitted by one rule at one source location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable identifier of the rule that produced this diagnostic.
    pub rule_id: String,
    pub severity: Severity,
    pub message: String,
    pub span: Span,
    pub related: Vec<RelatedSpan>,
}

impl Diagnostic {
    pub fn new(
        rule_id: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
        span: Span,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            severity,
            message: message.into(),
            span,
            related: Vec::new(),
        }
    }

    pub fn with_related(mut self, span: Span, message: impl Into<String>) -> Self {
        self.related.push(RelatedSpan {
            span,
            message: message.into(),
        });
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.severity {
            Severity::Info => "info",
            Severity::Minor => "minor",
            Severity::Major => "major",
            Severity::Critical => "critical",
            Severity::Blocker => "blocker",
        };
        write!(f, "{}: [{}] {}", prefix, self.rule_id, self.message)?;
        write!(f, "\n  --> {}", self.span)
    }
}

/// Append-only collector for diagnostics during an analysis run.
#[derive(Debug, Default)]
pub struct DiagnosticBag {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(diagnostics);
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Consume the bag, returning diagnostics ordered by source span.
    pub fn into_sorted(mut self) -> Vec<Diagnostic> {
        self.diagnostics
            .sort_by(|a, b| a.span.sort_key().cmp(&b.span.sort_key()));
        self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Span;

    #[test]
    fn builder_and_related() {
        let d = Diagnostic::new("use-goto", Severity::Major, "goto used", Span::dummy())
            .with_related(Span::dummy(), "label declared here");
        assert_eq!(d.rule_id, "use-goto");
        assert_eq!(d.related.len(), 1);
    }

    #[test]
    fn severity_ordering() {
        assert!(Severity::Info < Severity::Minor);
        assert!(Severity::Major < Severity::Critical);
        assert!(Severity::Critical < Severity::Blocker);
    }

    #[test]
    fn bag_sorts_by_span() {
        let mut bag = DiagnosticBag::new();
        bag.report(Diagnostic::new(
            "b",
            Severity::Minor,
            "later",
            Span::on_line("m.bsl", 9),
        ));
        bag.report(Diagnostic::new(
            "a",
            Severity::Minor,
            "earlier",
            Span::on_line("m.bsl", 2),
        ));
        let sorted = bag.into_sorted();
        assert_eq!(sorted[0].message, "earlier");
        assert_eq!(sorted[1].message, "later");
    }

    #[test]
    fn severity_override() {
        let d = Diagnostic::new("r", Severity::Minor, "m", Span::dummy())
            .with_severity(Severity::Blocker);
        assert_eq!(d.severity, Severity::Blocker);
    }

    #[test]
    fn serializes_to_json() {
        let d = Diagnostic::new("r", Severity::Info, "m", Span::on_line("m.bsl", 3));
        let json = serde_json::to_string(&d).unwrap();
        assert!(json.contains("\"rule_id\":\"r\""), "got: {}", json);
        assert!(json.contains("\"Info\""), "got: {}", json);
    }
}
