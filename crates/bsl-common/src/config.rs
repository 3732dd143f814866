use std::collections::HashMap;

use serde::Deserialize;

use crate::diagnostics::Severity;

/// Analyzer configuration: per-rule enablement, severity overrides, and
/// free-form rule parameters.
///
/// The engine consumes this without recompilation; hosts typically load it
/// from a TOML file next to the project:
///
/// ```toml
/// [rules.code-after-async-call]
/// severity = "Major"
///
/// [rules.code-after-async-call.parameters]
/// async-methods = ["BeginPutFile", "ShowQueryBox"]
/// check-with-notify = false
///
/// [rules.use-goto]
/// enabled = false
/// ```
#[derive(Debug, Clone, Default)]
pub struct AnalyzerConfig {
    rules: HashMap<String, RuleConfig>,
}

/// Configuration for a single rule.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Overrides the rule's default severity when present.
    #[serde(default)]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub parameters: HashMap<String, ParamValue>,
}

fn default_enabled() -> bool {
    true
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            severity: None,
            parameters: HashMap::new(),
        }
    }
}

/// A rule parameter value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<String>),
}

impl ParamValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            ParamValue::List(items) => Some(items),
            _ => None,
        }
    }
}

/// Raw TOML structure for deserialization.
#[derive(Deserialize)]
struct RawConfig {
    #[serde(default)]
    rules: HashMap<String, RuleConfig>,
}

/// Errors that can occur when loading an analyzer configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("invalid configuration: {0}")]
    ParseError(String),
}

impl AnalyzerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        Ok(Self { rules: raw.rules })
    }

    /// Load a configuration from a TOML file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Programmatic override, mostly used by hosts and tests.
    pub fn set_rule(&mut self, rule_id: impl Into<String>, config: RuleConfig) {
        self.rules.insert(rule_id.into(), config);
    }

    /// Whether a rule is enabled. Rules are enabled unless configured off.
    pub fn is_enabled(&self, rule_id: &str) -> bool {
        self.rules.get(rule_id).map_or(true, |r| r.enabled)
    }

    /// Severity override for a rule, if configured.
    pub fn severity_override(&self, rule_id: &str) -> Option<Severity> {
        self.rules.get(rule_id).and_then(|r| r.severity)
    }

    /// Parameter map for a rule (empty map when unconfigured).
    pub fn parameters(&self, rule_id: &str) -> &HashMap<String, ParamValue> {
        static EMPTY: std::sync::OnceLock<HashMap<String, ParamValue>> = std::sync::OnceLock::new();
        self.rules
            .get(rule_id)
            .map(|r| &r.parameters)
            .unwrap_or_else(|| EMPTY.get_or_init(HashMap::new))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_enables_everything() {
        let config = AnalyzerConfig::from_toml_str("").unwrap();
        assert!(config.is_enabled("transaction-use"));
        assert!(config.severity_override("transaction-use").is_none());
        assert!(config.parameters("transaction-use").is_empty());
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[rules.code-after-async-call]
severity = "Major"

[rules.code-after-async-call.parameters]
async-methods = ["BeginPutFile", "ShowQueryBox"]
check-with-notify = false

[rules.use-goto]
enabled = false

[rules.method-name-pattern.parameters]
pattern = "^[A-Z][A-Za-z0-9_]*$"
max-length = 80
"#;
        let config = AnalyzerConfig::from_toml_str(toml).unwrap();

        assert!(config.is_enabled("code-after-async-call"));
        assert_eq!(
            config.severity_override("code-after-async-call"),
            Some(Severity::Major)
        );
        let params = config.parameters("code-after-async-call");
        assert_eq!(
            params["async-methods"].as_list().unwrap(),
            ["BeginPutFile".to_string(), "ShowQueryBox".to_string()]
        );
        assert_eq!(params["check-with-notify"].as_bool(), Some(false));

        assert!(!config.is_enabled("use-goto"));

        let naming = config.parameters("method-name-pattern");
        assert_eq!(naming["pattern"].as_str(), Some("^[A-Z][A-Za-z0-9_]*$"));
        assert_eq!(naming["max-length"].as_int(), Some(80));
    }

    #[test]
    fn invalid_toml_fails() {
        let result = AnalyzerConfig::from_toml_str("[rules.broken\n");
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("invalid configuration"), "got: {}", err);
    }

    #[test]
    fn param_value_accessors_reject_wrong_kind() {
        let v = ParamValue::Str("x".into());
        assert!(v.as_bool().is_none());
        assert!(v.as_list().is_none());
        assert_eq!(v.as_str(), Some("x"));
    }
}
