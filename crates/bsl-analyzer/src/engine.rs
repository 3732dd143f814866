//! The analysis session: project index, configuration, rule registry, and
//! the parallel driver over modules.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use bsl_common::{AnalyzerConfig, Diagnostic, Severity};

use crate::ast::Module;
use crate::project::ProjectIndex;
use crate::rules::{ModuleAnalysis, RuleRegistry};

/// Cooperative cancellation flag, checked between modules. Cloning shares
/// the flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// One configured analysis run. The session is immutable and can analyze
/// any number of module sets; modules are independent and processed in
/// parallel.
pub struct AnalysisSession {
    config: AnalyzerConfig,
    registry: RuleRegistry,
}

impl AnalysisSession {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self::with_registry(config, RuleRegistry::with_default_rules())
    }

    pub fn with_registry(config: AnalyzerConfig, registry: RuleRegistry) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyze one module against a prebuilt project index. An invariant
    /// violation inside the analysis passes aborts only this module,
    /// leaving one internal-error diagnostic behind.
    pub fn analyze_module(&self, module: &Module, project: &ProjectIndex) -> Vec<Diagnostic> {
        let span = tracing::debug_span!("analyze_module", module = %module.name);
        let _entered = span.enter();

        let result = catch_unwind(AssertUnwindSafe(|| {
            let needs = self.registry.needs(&self.config);
            let analysis = ModuleAnalysis::prepare(module, project, needs);
            self.registry.run(&analysis, &self.config)
        }));
        match result {
            Ok(diagnostics) => {
                tracing::debug!(count = diagnostics.len(), "module analyzed");
                diagnostics
            }
            Err(_) => {
                tracing::error!(module = %module.name, "analysis aborted for this module");
                vec![Diagnostic::new(
                    "internal-error",
                    Severity::Major,
                    "internal error while analyzing this module",
                    module.span.clone(),
                )]
            }
        }
    }

    /// Analyze a whole project. Diagnostics come back ordered by file and
    /// position regardless of scheduling; a cancelled run returns whatever
    /// was already produced.
    pub fn analyze(&self, modules: &[Module], token: &CancellationToken) -> Vec<Diagnostic> {
        let project = ProjectIndex::build(modules);
        self.analyze_indexed(modules, &project, token)
    }

    /// Like [`analyze`](Self::analyze), but against a caller-supplied index
    /// (hosts that know role and metadata-object names build it themselves).
    pub fn analyze_indexed(
        &self,
        modules: &[Module],
        project: &ProjectIndex,
        token: &CancellationToken,
    ) -> Vec<Diagnostic> {
        let mut diagnostics: Vec<Diagnostic> = modules
            .par_iter()
            .flat_map(|module| {
                if token.is_cancelled() {
                    return Vec::new();
                }
                self.analyze_module(module, project)
            })
            .collect();
        diagnostics.sort_by(|a, b| {
            a.span
                .file
                .cmp(&b.span.file)
                .then_with(|| a.span.sort_key().cmp(&b.span.sort_key()))
        });
        diagnostics
    }
}
