//! The rule registry and the built-in rules.
//!
//! Rules are stateless objects behind the [`Rule`] trait. Each declares the
//! analyses it needs ([`Needs`]); the engine computes the union once per
//! module and hands every rule the same prepared [`ModuleAnalysis`]. A
//! panicking rule is isolated: its findings are dropped and replaced with a
//! single internal-error diagnostic, and the remaining rules still run.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use bsl_common::{AnalyzerConfig, Diagnostic, DiagnosticBag, ParamValue, Severity};

use crate::ast::Module;
use crate::cfg::Cfg;
use crate::project::ProjectIndex;
use crate::symbols::{self, SymbolTable};
use crate::types::{self, TypeInfo};

pub mod async_calls;
pub mod builtins;
pub mod goto;
pub mod methods;
pub mod references;
pub mod strict_types;
pub mod transactions;
pub mod unreachable;
pub mod variables;

/// Which shared analyses a rule reads.
#[derive(Debug, Clone, Copy, Default)]
pub struct Needs {
    pub symbols: bool,
    pub types: bool,
    pub cfg: bool,
}

impl Needs {
    pub fn union(self, other: Needs) -> Needs {
        Needs {
            symbols: self.symbols || other.symbols,
            types: self.types || other.types,
            cfg: self.cfg || other.cfg,
        }
    }
}

/// Everything computed for one module, shared by every rule that runs on it.
pub struct ModuleAnalysis<'a> {
    pub module: &'a Module,
    pub project: &'a ProjectIndex,
    symbols: Option<SymbolTable>,
    types: Option<TypeInfo>,
    cfgs: Option<Vec<Cfg<'a>>>,
}

impl<'a> ModuleAnalysis<'a> {
    /// Build the analyses in `needs` for `module`. Anything not requested
    /// stays `None`; rules access their declared needs through the getters.
    pub fn prepare(module: &'a Module, project: &'a ProjectIndex, needs: Needs) -> Self {
        Self {
            module,
            project,
            symbols: needs.symbols.then(|| symbols::build(module)),
            types: needs.types.then(|| types::infer_module(module)),
            cfgs: needs.cfg.then(|| {
                module
                    .methods
                    .iter()
                    .map(|m| Cfg::build(&m.body))
                    .collect()
            }),
        }
    }

    pub fn symbols(&self) -> Option<&SymbolTable> {
        self.symbols.as_ref()
    }

    pub fn types(&self) -> Option<&TypeInfo> {
        self.types.as_ref()
    }

    /// One CFG per method, in method order.
    pub fn cfgs(&self) -> Option<&[Cfg<'a>]> {
        self.cfgs.as_deref()
    }
}

/// Read-only view of a rule's configured parameters.
#[derive(Clone, Copy)]
pub struct RuleParams<'a>(&'a HashMap<String, ParamValue>);

impl<'a> RuleParams<'a> {
    pub fn new(map: &'a HashMap<String, ParamValue>) -> Self {
        Self(map)
    }

    pub fn empty() -> RuleParams<'static> {
        static EMPTY: std::sync::OnceLock<HashMap<String, ParamValue>> =
            std::sync::OnceLock::new();
        RuleParams(EMPTY.get_or_init(HashMap::new))
    }

    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        self.0.get(key).and_then(ParamValue::as_bool).unwrap_or(default)
    }

    pub fn int_or(&self, key: &str, default: i64) -> i64 {
        self.0.get(key).and_then(ParamValue::as_int).unwrap_or(default)
    }

    pub fn str(&self, key: &str) -> Option<&'a str> {
        self.0.get(key).and_then(ParamValue::as_str)
    }

    pub fn list(&self, key: &str) -> Option<&'a [String]> {
        self.0.get(key).and_then(ParamValue::as_list)
    }
}

/// A single analysis rule.
pub trait Rule: Send + Sync {
    /// Stable identifier used in configuration and diagnostics.
    fn id(&self) -> &'static str;

    /// Default severity; configuration can override it.
    fn severity(&self) -> Severity;

    fn needs(&self) -> Needs {
        Needs::default()
    }

    fn check(
        &self,
        analysis: &ModuleAnalysis<'_>,
        params: &RuleParams<'_>,
        out: &mut Vec<Diagnostic>,
    );
}

/// The set of rules to run. Hosts can register their own [`Rule`]
/// implementations next to the built-in ones.
pub struct RuleRegistry {
    rules: Vec<Box<dyn Rule>>,
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::with_default_rules()
    }
}

impl RuleRegistry {
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn with_default_rules() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(transactions::TransactionUse));
        registry.register(Box::new(async_calls::CodeAfterAsyncCall));
        registry.register(Box::new(goto::UseGoto));
        registry.register(Box::new(variables::DuplicateVariable));
        registry.register(Box::new(variables::UndefinedVariable));
        registry.register(Box::new(variables::UnusedLocalVariable));
        registry.register(Box::new(methods::UndefinedMethod));
        registry.register(Box::new(methods::MethodNamePattern));
        registry.register(Box::new(references::UnknownReference));
        registry.register(Box::new(strict_types::ParameterTypeIntersection));
        registry.register(Box::new(strict_types::DocCommentFormat));
        registry.register(Box::new(unreachable::UnreachableCode));
        registry
    }

    pub fn register(&mut self, rule: Box<dyn Rule>) {
        self.rules.push(rule);
    }

    pub fn rule_ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.iter().map(|r| r.id())
    }

    /// Union of the needs of every rule enabled under `config`.
    pub fn needs(&self, config: &AnalyzerConfig) -> Needs {
        self.rules
            .iter()
            .filter(|r| config.is_enabled(r.id()))
            .fold(Needs::default(), |acc, r| acc.union(r.needs()))
    }

    /// Run every enabled rule over `analysis` and return the diagnostics
    /// in source order.
    pub fn run(&self, analysis: &ModuleAnalysis<'_>, config: &AnalyzerConfig) -> Vec<Diagnostic> {
        let mut bag = DiagnosticBag::new();
        for rule in &self.rules {
            if !config.is_enabled(rule.id()) {
                continue;
            }
            let params = RuleParams::new(config.parameters(rule.id()));
            let result = catch_unwind(AssertUnwindSafe(|| {
                let mut out = Vec::new();
                rule.check(analysis, &params, &mut out);
                out
            }));
            let mut found = match result {
                Ok(found) => found,
                Err(_) => {
                    tracing::warn!(rule = rule.id(), module = %analysis.module.name,
                        "rule panicked, dropping its findings");
                    vec![Diagnostic::new(
                        rule.id(),
                        Severity::Info,
                        "internal error while running this rule",
                        analysis.module.span.clone(),
                    )]
                }
            };
            if let Some(severity) = config.severity_override(rule.id()) {
                for diagnostic in &mut found {
                    diagnostic.severity = severity;
                }
            }
            bag.extend(found);
        }
        bag.into_sorted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build;
    use bsl_common::{RuleConfig, Span};

    struct AlwaysFires;

    impl Rule for AlwaysFires {
        fn id(&self) -> &'static str {
            "always-fires"
        }
        fn severity(&self) -> Severity {
            Severity::Minor
        }
        fn check(
            &self,
            analysis: &ModuleAnalysis<'_>,
            _params: &RuleParams<'_>,
            out: &mut Vec<Diagnostic>,
        ) {
            out.push(Diagnostic::new(
                self.id(),
                self.severity(),
                "fired",
                analysis.module.span.clone(),
            ));
        }
    }

    struct Panics;

    impl Rule for Panics {
        fn id(&self) -> &'static str {
            "panics"
        }
        fn severity(&self) -> Severity {
            Severity::Minor
        }
        fn check(
            &self,
            _analysis: &ModuleAnalysis<'_>,
            _params: &RuleParams<'_>,
            out: &mut Vec<Diagnostic>,
        ) {
            out.push(Diagnostic::new(self.id(), self.severity(), "partial", Span::dummy()));
            panic!("rule bug");
        }
    }

    fn registry_of(rules: Vec<Box<dyn Rule>>) -> RuleRegistry {
        let mut registry = RuleRegistry::empty();
        for rule in rules {
            registry.register(rule);
        }
        registry
    }

    #[test]
    fn panicking_rule_does_not_stop_the_others() {
        let module = build::module("M", vec![]);
        let project = ProjectIndex::new();
        let analysis = ModuleAnalysis::prepare(&module, &project, Needs::default());
        let registry = registry_of(vec![Box::new(Panics), Box::new(AlwaysFires)]);

        let diagnostics = registry.run(&analysis, &AnalyzerConfig::new());

        assert!(diagnostics.iter().any(|d| d.rule_id == "always-fires"));
        let from_panicked: Vec<_> = diagnostics
            .iter()
            .filter(|d| d.rule_id == "panics")
            .collect();
        assert_eq!(from_panicked.len(), 1);
        assert!(from_panicked[0].message.contains("internal error"));
    }

    #[test]
    fn disabled_rule_is_skipped() {
        let module = build::module("M", vec![]);
        let project = ProjectIndex::new();
        let analysis = ModuleAnalysis::prepare(&module, &project, Needs::default());
        let registry = registry_of(vec![Box::new(AlwaysFires)]);

        let mut config = AnalyzerConfig::new();
        config.set_rule(
            "always-fires",
            RuleConfig {
                enabled: false,
                ..RuleConfig::default()
            },
        );

        assert!(registry.run(&analysis, &config).is_empty());
    }

    #[test]
    fn severity_override_applies_to_findings() {
        let module = build::module("M", vec![]);
        let project = ProjectIndex::new();
        let analysis = ModuleAnalysis::prepare(&module, &project, Needs::default());
        let registry = registry_of(vec![Box::new(AlwaysFires)]);

        let mut config = AnalyzerConfig::new();
        config.set_rule(
            "always-fires",
            RuleConfig {
                severity: Some(Severity::Blocker),
                ..RuleConfig::default()
            },
        );

        let diagnostics = registry.run(&analysis, &config);
        assert_eq!(diagnostics[0].severity, Severity::Blocker);
    }

    #[test]
    fn needs_is_the_union_of_enabled_rules() {
        struct NeedsCfg;
        impl Rule for NeedsCfg {
            fn id(&self) -> &'static str {
                "needs-cfg"
            }
            fn severity(&self) -> Severity {
                Severity::Minor
            }
            fn needs(&self) -> Needs {
                Needs {
                    cfg: true,
                    ..Needs::default()
                }
            }
            fn check(
                &self,
                _analysis: &ModuleAnalysis<'_>,
                _params: &RuleParams<'_>,
                _out: &mut Vec<Diagnostic>,
            ) {
            }
        }

        let registry = registry_of(vec![Box::new(AlwaysFires), Box::new(NeedsCfg)]);
        let needs = registry.needs(&AnalyzerConfig::new());
        assert!(needs.cfg);
        assert!(!needs.symbols);

        let mut config = AnalyzerConfig::new();
        config.set_rule(
            "needs-cfg",
            RuleConfig {
                enabled: false,
                ..RuleConfig::default()
            },
        );
        assert!(!registry.needs(&config).cfg);
    }

    #[test]
    fn diagnostics_come_back_in_source_order() {
        struct TwoSpots;
        impl Rule for TwoSpots {
            fn id(&self) -> &'static str {
                "two-spots"
            }
            fn severity(&self) -> Severity {
                Severity::Minor
            }
            fn check(
                &self,
                _analysis: &ModuleAnalysis<'_>,
                _params: &RuleParams<'_>,
                out: &mut Vec<Diagnostic>,
            ) {
                out.push(Diagnostic::new(
                    self.id(),
                    self.severity(),
                    "later",
                    Span::on_line("m.bsl", 10),
                ));
                out.push(Diagnostic::new(
                    self.id(),
                    self.severity(),
                    "earlier",
                    Span::on_line("m.bsl", 2),
                ));
            }
        }

        let module = build::module("M", vec![]);
        let project = ProjectIndex::new();
        let analysis = ModuleAnalysis::prepare(&module, &project, Needs::default());
        let registry = registry_of(vec![Box::new(TwoSpots)]);
        let diagnostics = registry.run(&analysis, &AnalyzerConfig::new());
        assert_eq!(diagnostics[0].message, "earlier");
        assert_eq!(diagnostics[1].message, "later");
    }
}
