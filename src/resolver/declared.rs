//! Ecosystem-specific merge rules turning raw [`DeclaredConfig`] lines into
//! the baseline [`DependencyMap`] of record.
//!
//! Files are consulted in priority order (lockfiles first, since they pin);
//! the first file to name a dependency wins. Each file that contributes
//! entries produces one merge insight.

use once_cell::sync::Lazy;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;

use crate::models::{DeclaredConfig, DependencyMap, Ecosystem, Insight, VersionSpec};

static REQUIREMENT_PIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z0-9_\-\.]+)\s*==\s*([^\s;]+)").unwrap());
static REQUIREMENT_BARE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z0-9_\-\.]+)\s*$").unwrap());
static PYPROJECT_DEP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z0-9_\-\.]+)\s*(?:==\s*([^\s;,\[]+))?").unwrap());
static GEMFILE_LOCK_PIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ {4}([A-Za-z0-9_\-]+) \(([^)]+)\)$").unwrap());
static GEMFILE_GEM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^gem\s+['"]([A-Za-z0-9_\-]+)['"](?:\s*,\s*['"]([^'"]+)['"])?"#).unwrap()
});

/// Merge a subdirectory's declared configuration for one ecosystem.
pub fn merge(config: &DeclaredConfig, ecosystem: Ecosystem) -> (DependencyMap, Vec<Insight>) {
    let mut map = DependencyMap::new();
    let mut insights = Vec::new();

    for file in priority_order(ecosystem) {
        let Some(lines) = config.files.get(*file) else {
            continue;
        };

        let parsed = match (ecosystem, *file) {
            (Ecosystem::Python, "requirements.txt") => parse_requirements(lines),
            (Ecosystem::Python, "pyproject.toml") => parse_pyproject(lines),
            (Ecosystem::Node, "package-lock.json") => parse_package_lock(lines),
            (Ecosystem::Node, "package.json") => parse_package_json(lines),
            (Ecosystem::Java, "pom.xml") => parse_pom(lines),
            (Ecosystem::Go, "go.mod") => parse_gomod(lines),
            (Ecosystem::Ruby, "Gemfile.lock") => parse_gemfile_lock(lines),
            (Ecosystem::Ruby, "Gemfile") => parse_gemfile(lines),
            _ => Vec::new(),
        };

        let mut inserted = 0usize;
        for (name, spec) in parsed {
            let name = ecosystem.normalize_name(&name);
            if !map.contains_key(&name) {
                map.insert(name, spec);
                inserted += 1;
            }
        }

        if inserted > 0 {
            insights.push(Insight::inference(format!(
                "merged {} declared {} from {}",
                inserted,
                if inserted == 1 { "dependency" } else { "dependencies" },
                file
            )));
        }
    }

    (map, insights)
}

/// Files consulted per ecosystem, lockfiles first. Files read by the
/// analyzer but not listed here (setup.py, Pipfile, yarn.lock,
/// build.gradle, go.sum) are carried raw for downstream collaborators and
/// contribute nothing to the baseline.
fn priority_order(ecosystem: Ecosystem) -> &'static [&'static str] {
    match ecosystem {
        Ecosystem::Python => &["requirements.txt", "pyproject.toml"],
        Ecosystem::Node => &["package-lock.json", "package.json"],
        Ecosystem::Java => &["pom.xml"],
        Ecosystem::Go => &["go.mod"],
        Ecosystem::Ruby => &["Gemfile.lock", "Gemfile"],
    }
}

/// Map a raw requirement string to a version spec. Range operators keep
/// their base version; wildcards become the unresolved state.
fn version_req(raw: &str) -> VersionSpec {
    let trimmed = raw
        .trim()
        .trim_start_matches(['^', '~', '=', '>', '<'])
        .trim();
    if trimmed.is_empty() || trimmed == "*" || trimmed == "latest" {
        VersionSpec::Latest
    } else {
        VersionSpec::Pinned(trimmed.to_string())
    }
}

/// `requirements.txt` — `name==version` pins plus bare names.
fn parse_requirements(lines: &[String]) -> Vec<(String, VersionSpec)> {
    let mut deps = Vec::new();
    for line in lines {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('-') {
            continue;
        }
        if let Some(caps) = REQUIREMENT_PIN.captures(line) {
            deps.push((caps[1].to_string(), VersionSpec::Pinned(caps[2].to_string())));
        } else if let Some(caps) = REQUIREMENT_BARE.captures(line) {
            deps.push((caps[1].to_string(), VersionSpec::Latest));
        }
    }
    deps
}

/// `pyproject.toml` — `[project].dependencies`.
fn parse_pyproject(lines: &[String]) -> Vec<(String, VersionSpec)> {
    #[derive(serde::Deserialize)]
    struct Pyproject {
        project: Option<Project>,
    }
    #[derive(serde::Deserialize)]
    struct Project {
        #[serde(default)]
        dependencies: Vec<String>,
    }

    let Ok(pyproject) = toml::from_str::<Pyproject>(&lines.join("\n")) else {
        return Vec::new();
    };

    let mut deps = Vec::new();
    if let Some(project) = pyproject.project {
        for dep in &project.dependencies {
            if let Some(caps) = PYPROJECT_DEP.captures(dep.trim()) {
                let spec = caps
                    .get(2)
                    .map(|m| VersionSpec::Pinned(m.as_str().to_string()))
                    .unwrap_or(VersionSpec::Latest);
                deps.push((caps[1].to_string(), spec));
            }
        }
    }
    deps
}

/// `package.json` — `dependencies` and `devDependencies` blocks.
fn parse_package_json(lines: &[String]) -> Vec<(String, VersionSpec)> {
    let Ok(json) = serde_json::from_str::<serde_json::Value>(&lines.join("\n")) else {
        return Vec::new();
    };

    let mut deps = Vec::new();
    for section in ["dependencies", "devDependencies"] {
        if let Some(block) = json.get(section).and_then(|v| v.as_object()) {
            for (name, req) in block {
                let spec = req.as_str().map(version_req).unwrap_or(VersionSpec::Latest);
                deps.push((name.clone(), spec));
            }
        }
    }
    deps
}

/// `package-lock.json` (v2/v3) — entries under `packages/node_modules/...`
/// carry exact installed versions.
fn parse_package_lock(lines: &[String]) -> Vec<(String, VersionSpec)> {
    let Ok(json) = serde_json::from_str::<serde_json::Value>(&lines.join("\n")) else {
        return Vec::new();
    };

    let mut deps = Vec::new();
    if let Some(packages) = json.get("packages").and_then(|v| v.as_object()) {
        for (path, info) in packages {
            let Some(name) = path.strip_prefix("node_modules/") else {
                continue;
            };
            if name.contains("node_modules/") {
                continue; // nested copies shadow the top-level pick
            }
            if let Some(version) = info.get("version").and_then(|v| v.as_str()) {
                deps.push((name.to_string(), VersionSpec::Pinned(version.to_string())));
            }
        }
    }
    deps
}

/// `pom.xml` — `<dependency>` coordinates, `groupId:artifactId` keyed.
/// Property-interpolated versions (`${...}`) stay unresolved.
fn parse_pom(lines: &[String]) -> Vec<(String, VersionSpec)> {
    let xml = lines.join("\n");
    let mut reader = Reader::from_str(&xml);
    reader.config_mut().trim_text(true);

    let mut deps = Vec::new();
    let mut in_dependency = false;
    let mut current_tag = String::new();
    let mut group = String::new();
    let mut artifact = String::new();
    let mut version = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let tag = String::from_utf8_lossy(e.name().local_name().as_ref()).into_owned();
                if tag == "dependency" {
                    in_dependency = true;
                    group.clear();
                    artifact.clear();
                    version.clear();
                } else if in_dependency {
                    current_tag = tag;
                }
            }
            Ok(Event::Text(ref e)) if in_dependency => {
                if let Ok(text) = e.unescape() {
                    match current_tag.as_str() {
                        "groupId" => group = text.to_string(),
                        "artifactId" => artifact = text.to_string(),
                        "version" => version = text.to_string(),
                        _ => {}
                    }
                }
            }
            Ok(Event::End(ref e)) => {
                let tag = String::from_utf8_lossy(e.name().local_name().as_ref()).into_owned();
                if tag == "dependency" {
                    in_dependency = false;
                    if !group.is_empty() && !artifact.is_empty() {
                        let spec = if version.is_empty() || version.contains("${") {
                            VersionSpec::Latest
                        } else {
                            VersionSpec::Pinned(version.clone())
                        };
                        deps.push((format!("{}:{}", group, artifact), spec));
                    }
                } else if in_dependency {
                    current_tag.clear();
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
    }
    deps
}

/// `go.mod` — `require` entries, `v` prefix stripped.
fn parse_gomod(lines: &[String]) -> Vec<(String, VersionSpec)> {
    let mut deps = Vec::new();
    let mut in_block = false;

    for line in lines {
        let line = line.trim();
        if line.starts_with("require (") {
            in_block = true;
            continue;
        }
        if in_block && line == ")" {
            in_block = false;
            continue;
        }

        let entry = if in_block {
            Some(line)
        } else {
            line.strip_prefix("require ")
        };

        if let Some(entry) = entry {
            let mut parts = entry.split_whitespace();
            if let (Some(module), Some(version)) = (parts.next(), parts.next()) {
                if module.starts_with("//") {
                    continue;
                }
                deps.push((
                    module.to_string(),
                    VersionSpec::Pinned(version.trim_start_matches('v').to_string()),
                ));
            }
        }
    }
    deps
}

/// `Gemfile.lock` — pinned `name (version)` entries under the specs section.
fn parse_gemfile_lock(lines: &[String]) -> Vec<(String, VersionSpec)> {
    lines
        .iter()
        .filter_map(|line| GEMFILE_LOCK_PIN.captures(line))
        .map(|caps| (caps[1].to_string(), VersionSpec::Pinned(caps[2].to_string())))
        .collect()
}

/// `Gemfile` — `gem 'name', 'requirement'` lines.
fn parse_gemfile(lines: &[String]) -> Vec<(String, VersionSpec)> {
    let mut deps = Vec::new();
    for line in lines {
        if let Some(caps) = GEMFILE_GEM.captures(line.trim()) {
            let spec = caps
                .get(2)
                .map(|m| version_req(m.as_str().trim_start_matches("~>")))
                .unwrap_or(VersionSpec::Latest);
            deps.push((caps[1].to_string(), spec));
        }
    }
    deps
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn config(file: &str, content: &str) -> DeclaredConfig {
        let mut files = BTreeMap::new();
        files.insert(file.to_string(), content.lines().map(str::to_string).collect());
        DeclaredConfig { files }
    }

    #[test]
    fn test_requirements_pins_and_bare_names() {
        let cfg = config(
            "requirements.txt",
            "# comment\nnumpy==1.24.0\nflask>=2.0.0\nrequests\n",
        );
        let (map, insights) = merge(&cfg, Ecosystem::Python);

        assert_eq!(map["numpy"], VersionSpec::Pinned("1.24.0".to_string()));
        assert_eq!(map["requests"], VersionSpec::Latest);
        assert!(!map.contains_key("flask")); // range requirements are not pins
        assert_eq!(insights.len(), 1);
        assert!(insights[0].message.contains("requirements.txt"));
    }

    #[test]
    fn test_first_file_wins() {
        let mut files = BTreeMap::new();
        files.insert(
            "requirements.txt".to_string(),
            vec!["numpy==1.24.0".to_string()],
        );
        files.insert(
            "pyproject.toml".to_string(),
            vec![
                "[project]".to_string(),
                "name = \"demo\"".to_string(),
                "dependencies = [\"numpy==1.20.0\", \"pandas\"]".to_string(),
            ],
        );
        let (map, insights) = merge(&DeclaredConfig { files }, Ecosystem::Python);

        assert_eq!(map["numpy"], VersionSpec::Pinned("1.24.0".to_string()));
        assert_eq!(map["pandas"], VersionSpec::Latest);
        assert_eq!(insights.len(), 2);
    }

    #[test]
    fn test_package_json() {
        let cfg = config(
            "package.json",
            r#"{"dependencies": {"express": "^4.18.2", "left-pad": "*"}, "devDependencies": {"jest": "29.7.0"}}"#,
        );
        let (map, _) = merge(&cfg, Ecosystem::Node);

        assert_eq!(map["express"], VersionSpec::Pinned("4.18.2".to_string()));
        assert_eq!(map["left-pad"], VersionSpec::Latest);
        assert_eq!(map["jest"], VersionSpec::Pinned("29.7.0".to_string()));
    }

    #[test]
    fn test_package_lock_outranks_manifest() {
        let mut files = BTreeMap::new();
        files.insert(
            "package.json".to_string(),
            vec![r#"{"dependencies": {"express": "^4.0.0"}}"#.to_string()],
        );
        files.insert(
            "package-lock.json".to_string(),
            vec![r#"{"packages": {"": {}, "node_modules/express": {"version": "4.18.2"}}}"#.to_string()],
        );
        let (map, _) = merge(&DeclaredConfig { files }, Ecosystem::Node);

        assert_eq!(map["express"], VersionSpec::Pinned("4.18.2".to_string()));
    }

    #[test]
    fn test_pom_coordinates() {
        let cfg = config(
            "pom.xml",
            r#"<project>
  <dependencies>
    <dependency>
      <groupId>org.slf4j</groupId>
      <artifactId>slf4j-api</artifactId>
      <version>2.0.13</version>
    </dependency>
    <dependency>
      <groupId>com.example</groupId>
      <artifactId>templated</artifactId>
      <version>${example.version}</version>
    </dependency>
  </dependencies>
</project>"#,
        );
        let (map, _) = merge(&cfg, Ecosystem::Java);

        assert_eq!(map["org.slf4j:slf4j-api"], VersionSpec::Pinned("2.0.13".to_string()));
        assert_eq!(map["com.example:templated"], VersionSpec::Latest);
    }

    #[test]
    fn test_gomod_versions() {
        let cfg = config(
            "go.mod",
            "module example.com/app\n\nrequire (\n\tgithub.com/pkg/errors v0.9.1\n)\n",
        );
        let (map, _) = merge(&cfg, Ecosystem::Go);
        assert_eq!(
            map["github.com/pkg/errors"],
            VersionSpec::Pinned("0.9.1".to_string())
        );
    }

    #[test]
    fn test_gemfile_lock_outranks_gemfile() {
        let mut files = BTreeMap::new();
        files.insert(
            "Gemfile".to_string(),
            vec!["gem 'rails', '~> 7.0'".to_string()],
        );
        files.insert(
            "Gemfile.lock".to_string(),
            vec!["GEM".to_string(), "  specs:".to_string(), "    rails (7.1.3)".to_string()],
        );
        let (map, _) = merge(&DeclaredConfig { files }, Ecosystem::Ruby);

        assert_eq!(map["rails"], VersionSpec::Pinned("7.1.3".to_string()));
    }

    #[test]
    fn test_empty_config_is_empty_map() {
        let (map, insights) = merge(&DeclaredConfig::default(), Ecosystem::Python);
        assert!(map.is_empty());
        assert!(insights.is_empty());
    }
}
