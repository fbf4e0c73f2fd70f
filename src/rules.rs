use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::models::Ecosystem;

/// A dependency version below `below` is considered deprecated; `latest` is
/// the newest version the table knows about, used for automatic upgrades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeprecationRule {
    pub below: String,
    pub latest: String,
}

/// Static rule tables consumed by the resolution engine: transitive
/// implications per import symbol, and the deprecation cutoffs. Pluggable
/// data — deserialized from TOML with built-in defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleBase {
    /// ecosystem → import symbol → dependencies it implies.
    pub transitive: BTreeMap<Ecosystem, BTreeMap<String, Vec<String>>>,
    /// ecosystem → dependency name → deprecation rule.
    pub deprecations: BTreeMap<Ecosystem, BTreeMap<String, DeprecationRule>>,
}

impl Default for RuleBase {
    fn default() -> Self {
        let mut transitive: BTreeMap<Ecosystem, BTreeMap<String, Vec<String>>> = BTreeMap::new();

        let python = transitive.entry(Ecosystem::Python).or_default();
        python.insert(
            "numpy".to_string(),
            vec!["scipy".to_string(), "matplotlib".to_string()],
        );
        python.insert(
            "sklearn".to_string(),
            vec!["numpy".to_string(), "scipy".to_string()],
        );

        let node = transitive.entry(Ecosystem::Node).or_default();
        node.insert("react".to_string(), vec!["react-dom".to_string()]);
        node.insert("express".to_string(), vec!["body-parser".to_string()]);

        let mut deprecations: BTreeMap<Ecosystem, BTreeMap<String, DeprecationRule>> =
            BTreeMap::new();
        deprecations.entry(Ecosystem::Python).or_default().insert(
            "tensorflow".to_string(),
            DeprecationRule { below: "2.0.0".to_string(), latest: "2.16.1".to_string() },
        );
        deprecations.entry(Ecosystem::Node).or_default().insert(
            "request".to_string(),
            DeprecationRule { below: "3.0.0".to_string(), latest: "2.88.2".to_string() },
        );

        RuleBase { transitive, deprecations }
    }
}

impl RuleBase {
    /// Dependencies implied by an import symbol, if any.
    pub fn implied(&self, ecosystem: Ecosystem, symbol: &str) -> Option<&[String]> {
        self.transitive
            .get(&ecosystem)
            .and_then(|rules| rules.get(symbol))
            .map(|deps| deps.as_slice())
    }

    /// The deprecation rule for a dependency name, if any.
    pub fn deprecation(&self, ecosystem: Ecosystem, name: &str) -> Option<&DeprecationRule> {
        self.deprecations
            .get(&ecosystem)
            .and_then(|rules| rules.get(name))
    }
}

/// Load the rule base, searching in order:
///
/// 1. `override_path` — path passed via `--rules`
/// 2. `<repo_root>/.depforge/rules.toml`
/// 3. `~/.config/depforge/rules.toml`
/// 4. Built-in [`RuleBase::default`]
pub fn load(repo_root: &Path, override_path: Option<&Path>) -> Result<RuleBase> {
    if let Some(path) = override_path {
        let content = std::fs::read_to_string(path)?;
        return Ok(toml::from_str(&content)?);
    }

    let project_rules = repo_root.join(".depforge").join("rules.toml");
    if project_rules.exists() {
        let content = std::fs::read_to_string(&project_rules)?;
        return Ok(toml::from_str(&content)?);
    }

    if let Some(home) = dirs::home_dir() {
        let home_rules = home.join(".config").join("depforge").join("rules.toml");
        if home_rules.exists() {
            let content = std::fs::read_to_string(&home_rules)?;
            return Ok(toml::from_str(&content)?);
        }
    }

    Ok(RuleBase::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_transitive_rules() {
        let rules = RuleBase::default();
        let implied = rules.implied(Ecosystem::Python, "numpy").unwrap();
        assert_eq!(implied, &["scipy".to_string(), "matplotlib".to_string()]);
        assert!(rules.implied(Ecosystem::Python, "requests").is_none());
        assert!(rules.implied(Ecosystem::Go, "numpy").is_none());
    }

    #[test]
    fn test_default_deprecations() {
        let rules = RuleBase::default();
        let rule = rules.deprecation(Ecosystem::Python, "tensorflow").unwrap();
        assert_eq!(rule.below, "2.0.0");
    }

    #[test]
    fn test_toml_roundtrip() {
        let toml_src = r#"
[transitive.python]
numpy = ["scipy"]

[deprecations.node.request]
below = "3.0.0"
latest = "2.88.2"
"#;
        let rules: RuleBase = toml::from_str(toml_src).unwrap();
        assert_eq!(rules.implied(Ecosystem::Python, "numpy").unwrap(), &["scipy".to_string()]);
        assert!(rules.deprecation(Ecosystem::Node, "request").is_some());
        // Unlisted sections default to empty, not to the built-ins.
        assert!(rules.implied(Ecosystem::Node, "react").is_none());
    }

    #[test]
    fn test_load_falls_back_to_defaults() {
        let tmp = tempfile::TempDir::new().unwrap();
        let rules = load(tmp.path(), None).unwrap();
        assert!(rules.implied(Ecosystem::Python, "numpy").is_some());
    }
}
