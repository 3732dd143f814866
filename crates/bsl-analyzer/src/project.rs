//! Cross-module lookup index.
//!
//! Built once per analysis run from every module in the project; rules use
//! it to resolve calls into other common modules and to validate role and
//! metadata-object references. Role and metadata name sets are optional:
//! a host that does not load configuration metadata simply never triggers
//! the reference checks.

use std::collections::{HashMap, HashSet};

use crate::ast::{Module, ModuleKind};

/// Exported surface of a project: which modules exist, which of their
/// methods are callable from outside, and the known role and
/// metadata-object names.
#[derive(Debug, Default)]
pub struct ProjectIndex {
    exports: HashMap<String, HashSet<String>>,
    roles: Option<HashSet<String>>,
    metadata_objects: Option<HashSet<String>>,
}

impl ProjectIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(modules: &[Module]) -> Self {
        let mut exports: HashMap<String, HashSet<String>> = HashMap::new();
        for module in modules {
            // Only common modules are addressable by name; other kinds are
            // reached through object instances.
            if module.kind != ModuleKind::Common {
                continue;
            }
            let entry = exports.entry(module.name.clone()).or_default();
            for method in &module.methods {
                if method.export {
                    entry.insert(method.name.clone());
                }
            }
        }
        Self {
            exports,
            roles: None,
            metadata_objects: None,
        }
    }

    /// Supply the declared role names.
    pub fn with_roles(mut self, roles: impl IntoIterator<Item = String>) -> Self {
        self.roles = Some(roles.into_iter().collect());
        self
    }

    /// Supply the declared metadata-object names (`Catalog.Products`,
    /// `Document.Invoice`, ...).
    pub fn with_metadata_objects(mut self, names: impl IntoIterator<Item = String>) -> Self {
        self.metadata_objects = Some(names.into_iter().collect());
        self
    }

    pub fn has_module(&self, name: &str) -> bool {
        self.exports.contains_key(name)
    }

    /// Whether `module.method()` resolves to an exported method.
    pub fn exports(&self, module: &str, method: &str) -> bool {
        self.exports
            .get(module)
            .map_or(false, |methods| methods.contains(method))
    }

    /// `None` when no role list was supplied.
    pub fn role_exists(&self, name: &str) -> Option<bool> {
        self.roles.as_ref().map(|roles| roles.contains(name))
    }

    /// `None` when no metadata list was supplied.
    pub fn metadata_object_exists(&self, name: &str) -> Option<bool> {
        self.metadata_objects
            .as_ref()
            .map(|objects| objects.contains(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build;

    #[test]
    fn indexes_exported_methods_only() {
        let mut exported = build::procedure("Public", vec![]);
        exported.export = true;
        let private = build::procedure("Private", vec![]);
        let module = build::module("Helpers", vec![exported, private]);

        let index = ProjectIndex::build(std::slice::from_ref(&module));
        assert!(index.has_module("Helpers"));
        assert!(index.exports("Helpers", "Public"));
        assert!(!index.exports("Helpers", "Private"));
        assert!(!index.exports("Missing", "Public"));
    }

    #[test]
    fn role_lookup_distinguishes_missing_list_from_missing_role() {
        let bare = ProjectIndex::new();
        assert_eq!(bare.role_exists("Administrator"), None);

        let indexed = ProjectIndex::new().with_roles(["Administrator".to_string()]);
        assert_eq!(indexed.role_exists("Administrator"), Some(true));
        assert_eq!(indexed.role_exists("Ghost"), Some(false));
    }

    #[test]
    fn metadata_lookup() {
        let index =
            ProjectIndex::new().with_metadata_objects(["Catalog.Products".to_string()]);
        assert_eq!(index.metadata_object_exists("Catalog.Products"), Some(true));
        assert_eq!(index.metadata_object_exists("Catalog.Ghosts"), Some(false));
    }
}
