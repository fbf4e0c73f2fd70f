use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A programming-language/package-manager context detected within a
/// subdirectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    Python,
    Node,
    Java,
    Go,
    Ruby,
}

impl Ecosystem {
    /// Fixed preference order: tie-breaks for the primary ecosystem and the
    /// iteration order during per-subdirectory resolution.
    pub const PREFERENCE: [Ecosystem; 5] = [
        Ecosystem::Python,
        Ecosystem::Node,
        Ecosystem::Java,
        Ecosystem::Go,
        Ecosystem::Ruby,
    ];

    /// Classify a file extension into an ecosystem. Unknown extensions are
    /// ignored by the caller, not an error.
    pub fn from_extension(ext: &str) -> Option<Ecosystem> {
        match ext {
            "py" | "pyi" => Some(Ecosystem::Python),
            "js" | "mjs" | "cjs" | "jsx" | "ts" | "tsx" => Some(Ecosystem::Node),
            "java" => Some(Ecosystem::Java),
            "go" => Some(Ecosystem::Go),
            "rb" | "rake" | "gemspec" => Some(Ecosystem::Ruby),
            _ => None,
        }
    }

    /// Normalize a dependency name for use as a map key.
    ///
    /// Python distribution names compare case-insensitively with `_`, `.`
    /// and `-` interchangeable; npm names are lowercase by registry rule.
    /// Other ecosystems only need whitespace trimmed.
    pub fn normalize_name(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        match self {
            Ecosystem::Python => trimmed.to_lowercase().replace(['_', '.'], "-"),
            Ecosystem::Node => trimmed.to_lowercase(),
            _ => trimmed.to_string(),
        }
    }

    /// Reduce an import symbol to the root identifier that names its
    /// distribution: `os.path` → `os`, `react-dom/client` → `react-dom`,
    /// `@scope/pkg/sub` → `@scope/pkg`. Java paths are kept whole; the
    /// classifier and rule base match them by dotted prefix.
    pub fn import_root(&self, symbol: &str) -> String {
        let symbol = symbol.trim();
        match self {
            Ecosystem::Python => symbol.split('.').next().unwrap_or(symbol).to_string(),
            Ecosystem::Node => {
                if let Some(rest) = symbol.strip_prefix('@') {
                    let root: Vec<&str> = rest.splitn(3, '/').collect();
                    if root.len() >= 2 {
                        format!("@{}/{}", root[0], root[1])
                    } else {
                        symbol.to_string()
                    }
                } else {
                    symbol.split('/').next().unwrap_or(symbol).to_string()
                }
            }
            _ => symbol.to_string(),
        }
    }
}

impl std::fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ecosystem::Python => write!(f, "python"),
            Ecosystem::Node => write!(f, "node"),
            Ecosystem::Java => write!(f, "java"),
            Ecosystem::Go => write!(f, "go"),
            Ecosystem::Ruby => write!(f, "ruby"),
        }
    }
}

/// A version requirement: a concrete pin, or the distinct unresolved state
/// awaiting registry resolution. Serialized as a plain string where the
/// unresolved state round-trips through `"latest"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VersionSpec {
    Pinned(String),
    Latest,
}

impl From<String> for VersionSpec {
    fn from(s: String) -> Self {
        if s == "latest" {
            VersionSpec::Latest
        } else {
            VersionSpec::Pinned(s)
        }
    }
}

impl From<VersionSpec> for String {
    fn from(v: VersionSpec) -> Self {
        v.to_string()
    }
}

impl std::fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VersionSpec::Pinned(v) => write!(f, "{}", v),
            VersionSpec::Latest => write!(f, "latest"),
        }
    }
}

/// Resolved name → requirement table for one subdirectory. `BTreeMap` keeps
/// iteration (and therefore every downstream log) in a fixed order.
pub type DependencyMap = BTreeMap<String, VersionSpec>;

/// The detector's view of the repository: which ecosystems live where.
/// Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositorySnapshot {
    pub root: PathBuf,
    /// Relative subdirectory path (`/`-separated, root is `"/"`) → ecosystems
    /// observed among its direct files. Directories with no recognized files
    /// still appear, with an empty set.
    pub subdirectories: BTreeMap<String, BTreeSet<Ecosystem>>,
    /// Total recognized file count per ecosystem across the whole tree.
    pub ecosystem_counts: BTreeMap<Ecosystem, usize>,
    pub primary: Ecosystem,
    /// Non-fatal walk problems (permissions, unreadable entries).
    pub warnings: Vec<String>,
}

/// One import statement, tagged with the ecosystem whose analyzer found it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSymbol {
    pub ecosystem: Ecosystem,
    pub symbol: String,
}

/// Everything the static analyzer extracted from one subdirectory: import
/// symbols in encounter order, and raw definition snippets carried for
/// downstream collaborators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseResult {
    pub imports: Vec<ImportSymbol>,
    pub definitions: Vec<String>,
}

impl ParseResult {
    pub fn is_empty(&self) -> bool {
        self.imports.is_empty() && self.definitions.is_empty()
    }

    /// Absorb another result, preserving encounter order.
    pub fn extend(&mut self, other: ParseResult) {
        self.imports.extend(other.imports);
        self.definitions.extend(other.definitions);
    }
}

/// Raw config files found in one subdirectory: file name → line sequence,
/// exactly as on disk. Parsing happens during resolution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeclaredConfig {
    pub files: BTreeMap<String, Vec<String>>,
}

impl DeclaredConfig {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Inference,
    Conflict,
    Deprecation,
}

impl std::fmt::Display for InsightKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InsightKind::Inference => write!(f, "inference"),
            InsightKind::Conflict => write!(f, "conflict"),
            InsightKind::Deprecation => write!(f, "deprecation"),
        }
    }
}

/// An append-only audit entry explaining why a dependency map entry took its
/// value. Every automated decision produces exactly one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub message: String,
}

impl Insight {
    pub fn inference(message: impl Into<String>) -> Self {
        Insight { kind: InsightKind::Inference, message: message.into() }
    }

    pub fn deprecation(message: impl Into<String>) -> Self {
        Insight { kind: InsightKind::Deprecation, message: message.into() }
    }
}

impl std::fmt::Display for Insight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

/// Records a version change made during reconciliation or the deprecation
/// sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictEntry {
    pub subdirectory: String,
    pub name: String,
    pub from: VersionSpec,
    pub to: VersionSpec,
}

impl std::fmt::Display for ConflictEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: resolved {} from {} to {}",
            self.subdirectory, self.name, self.from, self.to
        )
    }
}

/// Resolution output for a single subdirectory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubdirectoryInference {
    pub dependencies: DependencyMap,
    /// Dependencies implied by transitive rules, first-encounter order.
    pub hidden: Vec<String>,
    pub insights: Vec<Insight>,
}

/// The engine's overall output. Immutable after return; cacheable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceResult {
    pub primary: Ecosystem,
    /// Union across subdirectories, for summary purposes only — scoping is
    /// per subdirectory, so a name seen with different versions in different
    /// subdirectories is legal here.
    pub dependencies: DependencyMap,
    /// Exactly one entry per snapshot subdirectory, even if empty.
    pub per_subdirectory: BTreeMap<String, SubdirectoryInference>,
    pub hidden: Vec<String>,
    pub conflicts: Vec<ConflictEntry>,
    pub insights: Vec<Insight>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_classification() {
        assert_eq!(Ecosystem::from_extension("py"), Some(Ecosystem::Python));
        assert_eq!(Ecosystem::from_extension("tsx"), Some(Ecosystem::Node));
        assert_eq!(Ecosystem::from_extension("go"), Some(Ecosystem::Go));
        assert_eq!(Ecosystem::from_extension("md"), None);
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(Ecosystem::Python.normalize_name("Flask_SQLAlchemy"), "flask-sqlalchemy");
        assert_eq!(Ecosystem::Node.normalize_name("Left-Pad"), "left-pad");
        assert_eq!(Ecosystem::Go.normalize_name(" github.com/pkg/errors "), "github.com/pkg/errors");
    }

    #[test]
    fn test_import_root() {
        assert_eq!(Ecosystem::Python.import_root("os.path"), "os");
        assert_eq!(Ecosystem::Node.import_root("react-dom/client"), "react-dom");
        assert_eq!(Ecosystem::Node.import_root("@babel/core/lib"), "@babel/core");
        assert_eq!(Ecosystem::Java.import_root("org.slf4j.Logger"), "org.slf4j.Logger");
    }

    #[test]
    fn test_version_spec_roundtrip() {
        let latest: VersionSpec = "latest".to_string().into();
        assert_eq!(latest, VersionSpec::Latest);
        let pinned: VersionSpec = "1.2.3".to_string().into();
        assert_eq!(pinned, VersionSpec::Pinned("1.2.3".to_string()));
        assert_eq!(String::from(VersionSpec::Latest), "latest");
    }
}
