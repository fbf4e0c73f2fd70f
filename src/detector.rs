use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use log::debug;
use walkdir::{DirEntry, WalkDir};

use crate::models::{Ecosystem, RepositorySnapshot};

/// Directory names never worth scanning: vendored dependencies and build
/// output would swamp the ecosystem counts with files nobody maintains here.
pub(crate) const PRUNED_DIRS: &[&str] =
    &["node_modules", "target", "__pycache__", "venv", ".venv", "vendor"];

/// Walk the repository once and partition it into tagged subdirectories.
///
/// Every visited directory appears in the snapshot (the root as `"/"`), even
/// when none of its direct files belong to a recognized ecosystem. Walk
/// errors are recorded as warnings on the snapshot, never raised.
pub fn detect(root: &Path, forced_primary: Option<Ecosystem>) -> RepositorySnapshot {
    let mut subdirectories: BTreeMap<String, BTreeSet<Ecosystem>> = BTreeMap::new();
    let mut ecosystem_counts: BTreeMap<Ecosystem, usize> = BTreeMap::new();
    let mut warnings = Vec::new();

    subdirectories.insert("/".to_string(), BTreeSet::new());

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !pruned(e));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warnings.push(format!("skipped during scan: {}", err));
                continue;
            }
        };

        if entry.file_type().is_dir() {
            subdirectories
                .entry(relative_tag(root, entry.path()))
                .or_default();
            continue;
        }

        if !entry.file_type().is_file() {
            continue;
        }

        let Some(ecosystem) = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Ecosystem::from_extension)
        else {
            continue;
        };

        *ecosystem_counts.entry(ecosystem).or_insert(0) += 1;

        let parent = entry.path().parent().unwrap_or(root);
        subdirectories
            .entry(relative_tag(root, parent))
            .or_default()
            .insert(ecosystem);
    }

    let primary = forced_primary.unwrap_or_else(|| pick_primary(&ecosystem_counts));
    debug!(
        "detected {} subdirectories, primary ecosystem {}",
        subdirectories.len(),
        primary
    );

    RepositorySnapshot {
        root: root.to_path_buf(),
        subdirectories,
        ecosystem_counts,
        primary,
        warnings,
    }
}

/// Highest file count wins; ties go to the first ecosystem in the fixed
/// preference order. An empty repository defaults to Python.
fn pick_primary(counts: &BTreeMap<Ecosystem, usize>) -> Ecosystem {
    let mut best = Ecosystem::Python;
    let mut best_count = 0usize;
    for eco in Ecosystem::PREFERENCE {
        let count = counts.get(&eco).copied().unwrap_or(0);
        if count > best_count {
            best = eco;
            best_count = count;
        }
    }
    best
}

/// Shared with the cache fingerprint walk so both agree on what "the
/// snapshot" covers.
pub(crate) fn pruned(entry: &DirEntry) -> bool {
    if !entry.file_type().is_dir() || entry.depth() == 0 {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || PRUNED_DIRS.contains(&name.as_ref())
}

fn relative_tag(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let tag = rel.to_string_lossy().replace('\\', "/");
    if tag.is_empty() {
        "/".to_string()
    } else {
        tag
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"").unwrap();
    }

    #[test]
    fn test_detect_tags_and_counts() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "app.py");
        touch(tmp.path(), "util.py");
        let web = tmp.path().join("web");
        fs::create_dir(&web).unwrap();
        touch(&web, "index.js");
        touch(&web, "notes.md");

        let snapshot = detect(tmp.path(), None);

        assert_eq!(snapshot.primary, Ecosystem::Python);
        assert_eq!(snapshot.ecosystem_counts[&Ecosystem::Python], 2);
        assert_eq!(snapshot.ecosystem_counts[&Ecosystem::Node], 1);
        assert!(snapshot.subdirectories["/"].contains(&Ecosystem::Python));
        assert!(snapshot.subdirectories["web"].contains(&Ecosystem::Node));
    }

    #[test]
    fn test_directory_without_recognized_files_still_appears() {
        let tmp = TempDir::new().unwrap();
        let docs = tmp.path().join("docs");
        fs::create_dir(&docs).unwrap();
        touch(&docs, "README.md");

        let snapshot = detect(tmp.path(), None);

        assert!(snapshot.subdirectories.contains_key("docs"));
        assert!(snapshot.subdirectories["docs"].is_empty());
    }

    #[test]
    fn test_primary_tie_break_follows_preference_order() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "a.go");
        touch(tmp.path(), "b.js");

        let snapshot = detect(tmp.path(), None);

        // One file each: Node precedes Go in the preference order.
        assert_eq!(snapshot.primary, Ecosystem::Node);
    }

    #[test]
    fn test_forced_primary_overrides_counts() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "a.py");

        let snapshot = detect(tmp.path(), Some(Ecosystem::Ruby));
        assert_eq!(snapshot.primary, Ecosystem::Ruby);
    }

    #[test]
    fn test_hidden_and_vendored_directories_are_pruned() {
        let tmp = TempDir::new().unwrap();
        let git = tmp.path().join(".git");
        let modules = tmp.path().join("node_modules");
        fs::create_dir(&git).unwrap();
        fs::create_dir(&modules).unwrap();
        touch(&git, "hook.py");
        touch(&modules, "index.js");

        let snapshot = detect(tmp.path(), None);

        assert!(!snapshot.subdirectories.contains_key(".git"));
        assert!(!snapshot.subdirectories.contains_key("node_modules"));
        assert!(snapshot.ecosystem_counts.is_empty());
    }
}
