use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::Result;
use log::{debug, warn};

use crate::models::{DeclaredConfig, Ecosystem, ParseResult};

pub mod golang;
pub mod grammar;
pub mod ruby;

/// An ecosystem-specific analyzer owning its own import/definition
/// extraction for one subdirectory.
pub trait Analyzer: Send + Sync {
    fn parse(&self, path: &Path) -> Result<ParseResult>;
}

/// Statically registered analyzer plugins. Ecosystems without an entry fall
/// back to grammar-aware extraction.
pub fn registered(ecosystem: Ecosystem) -> Option<&'static dyn Analyzer> {
    static GO: golang::GoAnalyzer = golang::GoAnalyzer;
    static RUBY: ruby::RubyAnalyzer = ruby::RubyAnalyzer;

    match ecosystem {
        Ecosystem::Go => Some(&GO),
        Ecosystem::Ruby => Some(&RUBY),
        _ => None,
    }
}

/// Extract imports and definitions from one (subdirectory, ecosystem) pair.
///
/// A registered plugin takes precedence; otherwise the grammar path runs.
/// Any failure degrades to an empty result — missing support for an
/// ecosystem is a degraded scan, not a fatal error.
pub fn analyze(subdir: &Path, ecosystem: Ecosystem) -> ParseResult {
    let outcome = match registered(ecosystem) {
        Some(plugin) => plugin.parse(subdir),
        None => grammar::extract(subdir, ecosystem),
    };

    match outcome {
        Ok(parsed) => parsed,
        Err(err) => {
            warn!(
                "analysis of {} ({}) degraded to empty: {}",
                subdir.display(),
                ecosystem,
                err
            );
            ParseResult::default()
        }
    }
}

/// Well-known manifest filenames read verbatim per ecosystem.
pub const fn manifest_files(ecosystem: Ecosystem) -> &'static [&'static str] {
    match ecosystem {
        Ecosystem::Python => &["requirements.txt", "setup.py", "Pipfile", "pyproject.toml"],
        Ecosystem::Node => &["package.json", "yarn.lock", "package-lock.json"],
        Ecosystem::Java => &["pom.xml", "build.gradle"],
        Ecosystem::Go => &["go.mod", "go.sum"],
        Ecosystem::Ruby => &["Gemfile", "Gemfile.lock"],
    }
}

/// Read the ecosystem's well-known config files from a subdirectory as raw
/// line sequences. No parsing happens here; the resolution engine owns the
/// ecosystem-specific merge rules.
pub fn declared_config(subdir: &Path, ecosystem: Ecosystem) -> DeclaredConfig {
    let mut files = BTreeMap::new();

    for name in manifest_files(ecosystem) {
        let path = subdir.join(name);
        if !path.is_file() {
            continue;
        }
        match fs::read_to_string(&path) {
            Ok(content) => {
                files.insert(
                    name.to_string(),
                    content.lines().map(str::to_string).collect(),
                );
            }
            Err(err) => debug!("unreadable config {}: {}", path.display(), err),
        }
    }

    DeclaredConfig { files }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_registered_plugins() {
        assert!(registered(Ecosystem::Go).is_some());
        assert!(registered(Ecosystem::Ruby).is_some());
        assert!(registered(Ecosystem::Python).is_none());
    }

    #[test]
    fn test_declared_config_reads_known_files_only() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("requirements.txt"), "numpy==1.24.0\n").unwrap();
        fs::write(tmp.path().join("random.cfg"), "ignored\n").unwrap();

        let config = declared_config(tmp.path(), Ecosystem::Python);
        assert_eq!(config.files.len(), 1);
        assert_eq!(config.files["requirements.txt"], vec!["numpy==1.24.0"]);
    }

    #[test]
    fn test_declared_config_empty_when_nothing_present() {
        let tmp = TempDir::new().unwrap();
        assert!(declared_config(tmp.path(), Ecosystem::Java).is_empty());
    }
}
