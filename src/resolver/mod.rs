//! The dependency resolution engine.
//!
//! Merges declared configuration, classifier predictions and transitive
//! rules into one dependency map per subdirectory, reconciling version
//! conflicts and sweeping deprecated picks. Every automated decision lands
//! in the insight log; every version change lands in the conflict log.
//!
//! Subdirectories are independent: each one reads only its own parse result
//! and declared config, so batches run concurrently and the output is
//! assembled in lexicographic path order regardless of completion order.
//! Dropping the returned future abandons in-flight work without leaving
//! partial entries, since contributions only merge after completion.
//!
//! The insight order is fixed: per subdirectory, per ecosystem in
//! preference order — declared-merge entries, then classification in
//! import-encounter order, then transitive expansions, then registry
//! resolutions, then deprecation entries.

use std::collections::{BTreeMap, BTreeSet};

use futures::future::join_all;
use log::debug;
use semver::Version;

use crate::classifier::{Classifier, CONFIDENCE_THRESHOLD};
use crate::models::{
    ConflictEntry, DeclaredConfig, DependencyMap, Ecosystem, InferenceResult, Insight,
    ParseResult, RepositorySnapshot, SubdirectoryInference, VersionSpec,
};
use crate::registry::VersionSource;
use crate::rules::RuleBase;

pub mod declared;

/// Bounded concurrency across subdirectories.
const BATCH_SIZE: usize = 8;

pub struct ResolutionEngine<'a> {
    classifier: &'a dyn Classifier,
    versions: &'a dyn VersionSource,
    rules: &'a RuleBase,
}

impl<'a> ResolutionEngine<'a> {
    pub fn new(
        classifier: &'a dyn Classifier,
        versions: &'a dyn VersionSource,
        rules: &'a RuleBase,
    ) -> Self {
        Self { classifier, versions, rules }
    }

    /// Resolve every subdirectory of the snapshot. Infallible by design:
    /// degraded collaborators shrink the output, they never abort it.
    pub async fn resolve(
        &self,
        snapshot: &RepositorySnapshot,
        parse_results: &BTreeMap<String, ParseResult>,
        declared_configs: &BTreeMap<String, DeclaredConfig>,
    ) -> InferenceResult {
        let empty_parse = ParseResult::default();
        let empty_config = DeclaredConfig::default();

        let subdirs: Vec<(&String, &BTreeSet<Ecosystem>)> =
            snapshot.subdirectories.iter().collect();

        let mut resolved: Vec<(String, SubdirectoryInference, Vec<ConflictEntry>)> =
            Vec::with_capacity(subdirs.len());

        for batch in subdirs.chunks(BATCH_SIZE) {
            let futures: Vec<_> = batch
                .iter()
                .map(|&(path, ecosystems)| {
                    let parse = parse_results.get(path).unwrap_or(&empty_parse);
                    let config = declared_configs.get(path).unwrap_or(&empty_config);
                    async move {
                        let (inference, conflicts) = self
                            .resolve_subdirectory(path, ecosystems, parse, config)
                            .await;
                        (path.clone(), inference, conflicts)
                    }
                })
                .collect();
            resolved.extend(join_all(futures).await);
        }

        // Merge order is the path order, never the completion order.
        resolved.sort_by(|a, b| a.0.cmp(&b.0));

        let mut result = InferenceResult {
            primary: snapshot.primary,
            dependencies: DependencyMap::new(),
            per_subdirectory: BTreeMap::new(),
            hidden: Vec::new(),
            conflicts: Vec::new(),
            insights: Vec::new(),
        };

        for (path, inference, conflicts) in resolved {
            // Union for summary purposes only; scoping stays per
            // subdirectory, so differing versions across subdirectories are
            // legal and not reconciled here.
            for (name, spec) in &inference.dependencies {
                result.dependencies.insert(name.clone(), spec.clone());
            }
            for hidden in &inference.hidden {
                if !result.hidden.contains(hidden) {
                    result.hidden.push(hidden.clone());
                }
            }
            result.insights.extend(inference.insights.iter().cloned());
            result.conflicts.extend(conflicts);
            result.per_subdirectory.insert(path, inference);
        }

        result
    }

    async fn resolve_subdirectory(
        &self,
        subdir: &str,
        ecosystems: &BTreeSet<Ecosystem>,
        parse: &ParseResult,
        config: &DeclaredConfig,
    ) -> (SubdirectoryInference, Vec<ConflictEntry>) {
        let mut inference = SubdirectoryInference::default();
        let mut conflicts = Vec::new();

        for ecosystem in Ecosystem::PREFERENCE {
            if !ecosystems.contains(&ecosystem) {
                continue;
            }
            self.resolve_ecosystem(subdir, ecosystem, parse, config, &mut inference, &mut conflicts)
                .await;
        }

        (inference, conflicts)
    }

    async fn resolve_ecosystem(
        &self,
        subdir: &str,
        ecosystem: Ecosystem,
        parse: &ParseResult,
        config: &DeclaredConfig,
        inference: &mut SubdirectoryInference,
        conflicts: &mut Vec<ConflictEntry>,
    ) {
        // Declared configuration is the baseline of record.
        let (mut map, merge_insights) = declared::merge(config, ecosystem);
        inference.insights.extend(merge_insights);

        // Classify imports in encounter order; the threshold gate lives
        // here, not in the adapter.
        let mut inferred = DependencyMap::new();
        for import in parse.imports.iter().filter(|i| i.ecosystem == ecosystem) {
            let key = ecosystem.import_root(&import.symbol);
            let predictions = match self.classifier.predict(&key, ecosystem) {
                Ok(predictions) => predictions,
                Err(err) => {
                    inference.insights.push(Insight::inference(format!(
                        "classifier unavailable for '{}' ({}); skipped",
                        key, err
                    )));
                    continue;
                }
            };

            for prediction in predictions {
                if prediction.confidence < CONFIDENCE_THRESHOLD {
                    continue;
                }
                let confidence = prediction.confidence;
                let (name, hint) = prediction.into_parts();
                let name = ecosystem.normalize_name(&name);
                let spec = hint.map(VersionSpec::Pinned).unwrap_or(VersionSpec::Latest);

                // Repeated imports mapping to the same name reconcile
                // rather than overwrite.
                let resolved = match inferred.get(&name).cloned() {
                    Some(existing) if existing != spec => reconcile(&existing, &spec),
                    _ => spec,
                };
                inferred.insert(name.clone(), resolved);
                inference.insights.push(Insight::inference(format!(
                    "inferred {} from '{}' (confidence {:.2})",
                    name, import.symbol, confidence
                )));
            }
        }

        // Transitive expansion: rule hints are deterministic and always
        // surfaced, never confidence-gated.
        for import in parse.imports.iter().filter(|i| i.ecosystem == ecosystem) {
            let key = ecosystem.import_root(&import.symbol);
            if let Some(implied) = self.rules.implied(ecosystem, &key) {
                for dep in implied {
                    if !inference.hidden.contains(dep) {
                        inference.hidden.push(dep.clone());
                    }
                }
                inference.insights.push(Insight::inference(format!(
                    "import '{}' implies {}",
                    key,
                    implied.join(", ")
                )));
            }
        }

        // Reconcile declared against inferred; every change away from the
        // declared value is a logged conflict.
        for (name, inferred_spec) in inferred {
            match map.get(&name).cloned() {
                Some(declared_spec) if declared_spec != inferred_spec => {
                    let resolved = reconcile(&declared_spec, &inferred_spec);
                    if resolved != declared_spec {
                        conflicts.push(ConflictEntry {
                            subdirectory: subdir.to_string(),
                            name: name.clone(),
                            from: declared_spec,
                            to: resolved.clone(),
                        });
                    }
                    map.insert(name, resolved);
                }
                Some(_) => {}
                None => {
                    map.insert(name, inferred_spec);
                }
            }
        }

        // Resolve the unresolved sentinel against the registry,
        // best-effort: any failure leaves it in place.
        let unresolved: Vec<String> = map
            .iter()
            .filter(|(_, spec)| **spec == VersionSpec::Latest)
            .map(|(name, _)| name.clone())
            .collect();
        for name in unresolved {
            match self.versions.latest_version(&name, ecosystem).await {
                Ok(Some(version)) => {
                    inference.insights.push(Insight::inference(format!(
                        "resolved {} to latest published {}",
                        name, version
                    )));
                    map.insert(name, VersionSpec::Pinned(version));
                }
                Ok(None) => {
                    inference.insights.push(Insight::inference(format!(
                        "no published version found for {}; left unresolved",
                        name
                    )));
                }
                Err(err) => {
                    debug!("version lookup failed for {}: {}", name, err);
                    inference.insights.push(Insight::inference(format!(
                        "version lookup failed for {}; left unresolved",
                        name
                    )));
                }
            }
        }

        // Deprecation sweep over the resolved picks.
        let names: Vec<String> = map.keys().cloned().collect();
        for name in names {
            let Some(rule) = self.rules.deprecation(ecosystem, &name) else {
                continue;
            };
            let VersionSpec::Pinned(current) = map[&name].clone() else {
                continue;
            };
            let (Some(current_version), Some(cutoff)) =
                (parse_lenient(&current), parse_lenient(&rule.below))
            else {
                continue;
            };
            if current_version >= cutoff {
                continue;
            }

            inference.insights.push(Insight::deprecation(format!(
                "{}@{} is deprecated (below {}); upgrading",
                name, current, rule.below
            )));

            if parse_lenient(&rule.latest).is_some_and(|latest| latest > current_version) {
                conflicts.push(ConflictEntry {
                    subdirectory: subdir.to_string(),
                    name: name.clone(),
                    from: VersionSpec::Pinned(current),
                    to: VersionSpec::Pinned(rule.latest.clone()),
                });
                map.insert(name, VersionSpec::Pinned(rule.latest.clone()));
            }
        }

        // Accumulate; a name shared across ecosystems within one
        // subdirectory reconciles by the same rules.
        for (name, spec) in map {
            match inference.dependencies.get(&name).cloned() {
                Some(existing) if existing != spec => {
                    let resolved = reconcile(&existing, &spec);
                    if resolved != existing {
                        conflicts.push(ConflictEntry {
                            subdirectory: subdir.to_string(),
                            name: name.clone(),
                            from: existing,
                            to: resolved.clone(),
                        });
                        inference.dependencies.insert(name, resolved);
                    }
                }
                Some(_) => {}
                None => {
                    inference.dependencies.insert(name, spec);
                }
            }
        }
    }
}

/// Reconciliation ordering for two requirements on one name:
/// both valid semantic versions → the higher; a valid inferred pin beats an
/// invalid declared one; an unresolved inferred value never displaces a
/// declared pin; anything else degrades to the unresolved state.
fn reconcile(declared: &VersionSpec, inferred: &VersionSpec) -> VersionSpec {
    match (declared, inferred) {
        (VersionSpec::Pinned(d), VersionSpec::Pinned(i)) => {
            match (parse_lenient(d), parse_lenient(i)) {
                (Some(dv), Some(iv)) => {
                    if iv > dv {
                        inferred.clone()
                    } else {
                        declared.clone()
                    }
                }
                (_, Some(_)) => inferred.clone(),
                _ => VersionSpec::Latest,
            }
        }
        (VersionSpec::Latest, VersionSpec::Pinned(i)) => {
            if parse_lenient(i).is_some() {
                inferred.clone()
            } else {
                VersionSpec::Latest
            }
        }
        (VersionSpec::Pinned(d), VersionSpec::Latest) => {
            if parse_lenient(d).is_some() {
                declared.clone()
            } else {
                VersionSpec::Latest
            }
        }
        (VersionSpec::Latest, VersionSpec::Latest) => VersionSpec::Latest,
    }
}

/// Lenient semantic version parsing: optional `v` prefix, and one- or
/// two-component numeric versions padded with zeros (`1.9` → `1.9.0`).
fn parse_lenient(raw: &str) -> Option<Version> {
    let raw = raw.trim().trim_start_matches('v');
    if let Ok(version) = Version::parse(raw) {
        return Some(version);
    }

    let parts: Vec<&str> = raw.split('.').collect();
    if parts.len() < 3
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
    {
        let mut padded: Vec<String> = parts.iter().map(|p| p.to_string()).collect();
        while padded.len() < 3 {
            padded.push("0".to_string());
        }
        return Version::parse(&padded.join(".")).ok();
    }
    None
}
