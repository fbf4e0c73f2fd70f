use std::collections::BTreeMap;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use depforge::analyzer;
use depforge::cache::{self, ResultCache};
use depforge::classifier::lexicon::LexiconClassifier;
use depforge::cli::{Cli, ReportFormat};
use depforge::detector;
use depforge::materializer;
use depforge::models::{DeclaredConfig, Ecosystem, InferenceResult, ParseResult};
use depforge::registry::{OfflineVersionSource, RegistryVersionSource, VersionSource};
use depforge::report;
use depforge::resolver::ResolutionEngine;
use depforge::rules;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    // Materialize the repository — the only fatal failure class, retried
    // before surfacing.
    let workspace = materializer::materialize_with_retry(&cli.reference, 3)?;
    let path = workspace.path.clone();

    let rule_base = rules::load(&path, cli.rules.as_deref())?;

    // Cache probe: an unchanged repository is served without re-analysis.
    let cache = (!cli.no_cache).then(ResultCache::open);
    let fingerprint = match &cache {
        Some(_) => match cache::fingerprint(&path) {
            Ok(fp) => Some(fp),
            Err(err) => {
                log::warn!("fingerprinting failed; cache disabled: {}", err);
                None
            }
        },
        None => None,
    };

    if let (Some(cache), Some(fp)) = (&cache, &fingerprint) {
        if let Some(result) = cache.get(fp) {
            if !cli.quiet {
                eprintln!("  {} serving cached result", "→".cyan());
            }
            return render(&result, &path, &cli);
        }
    }

    // Detect ecosystems and partition into subdirectories.
    let snapshot = detector::detect(&path, cli.lang.as_ref().map(Into::into));
    for warning in &snapshot.warnings {
        log::warn!("{}", warning);
    }
    if !cli.quiet {
        eprintln!(
            "  {} {} subdirectories, primary ecosystem {}",
            "→".cyan(),
            snapshot.subdirectories.len(),
            snapshot.primary
        );
    }

    // Analyze each (subdirectory, ecosystem) pair.
    let pb = if !cli.quiet {
        let pb = ProgressBar::new(snapshot.subdirectories.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("#>-"),
        );
        pb.set_message("analyzing");
        Some(pb)
    } else {
        None
    };

    let mut parse_results: BTreeMap<String, ParseResult> = BTreeMap::new();
    let mut declared_configs: BTreeMap<String, DeclaredConfig> = BTreeMap::new();

    for (subdir, ecosystems) in &snapshot.subdirectories {
        let sub_path = if subdir == "/" {
            path.clone()
        } else {
            path.join(subdir)
        };

        let mut parsed = ParseResult::default();
        let mut config = DeclaredConfig::default();
        for ecosystem in Ecosystem::PREFERENCE {
            if !ecosystems.contains(&ecosystem) {
                continue;
            }
            parsed.extend(analyzer::analyze(&sub_path, ecosystem));
            config
                .files
                .extend(analyzer::declared_config(&sub_path, ecosystem).files);
        }
        parse_results.insert(subdir.clone(), parsed);
        declared_configs.insert(subdir.clone(), config);

        if let Some(pb) = &pb {
            pb.inc(1);
        }
    }
    if let Some(pb) = pb {
        pb.finish_with_message("analyzed");
    }

    // Resolve.
    let classifier = LexiconClassifier::new();
    let versions: Box<dyn VersionSource> = if cli.offline {
        Box::new(OfflineVersionSource)
    } else {
        Box::new(RegistryVersionSource::new()?)
    };
    let engine = ResolutionEngine::new(&classifier, versions.as_ref(), &rule_base);
    let result = engine
        .resolve(&snapshot, &parse_results, &declared_configs)
        .await;

    if let (Some(cache), Some(fp)) = (&cache, &fingerprint) {
        cache.put(fp, &result);
    }

    render(&result, &path, &cli)
}

fn render(result: &InferenceResult, path: &std::path::Path, cli: &Cli) -> Result<()> {
    match cli.report {
        ReportFormat::Terminal => report::terminal::render(result, path, cli.verbose, cli.quiet),
        ReportFormat::Json => {
            println!("{}", serde_json::to_string_pretty(result)?);
            Ok(())
        }
    }
}
