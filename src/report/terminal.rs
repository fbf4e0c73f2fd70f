use std::path::Path;

use anyhow::Result;
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use crate::models::{InferenceResult, InsightKind, VersionSpec};

/// Render a colored terminal report.
pub fn render(result: &InferenceResult, path: &Path, verbose: bool, quiet: bool) -> Result<()> {
    let subdir_count = result.per_subdirectory.len();
    let dep_count: usize = result
        .per_subdirectory
        .values()
        .map(|s| s.dependencies.len())
        .sum();
    let unresolved_count: usize = result
        .per_subdirectory
        .values()
        .flat_map(|s| s.dependencies.values())
        .filter(|spec| **spec == VersionSpec::Latest)
        .count();

    if quiet {
        println!(
            "Subdirs: {}  Deps: {}  Hidden: {}  Conflicts: {}",
            subdir_count,
            dep_count.to_string().green(),
            result.hidden.len().to_string().cyan(),
            result.conflicts.len().to_string().yellow(),
        );
        return Ok(());
    }

    println!("\n {} v{}", "depforge".bold(), env!("CARGO_PKG_VERSION"));
    println!(" Scanned: {}\n", path.display());

    println!(" ┌────────────────────────────────────────────────────┐");
    println!(" │  {:<48} │", "SUMMARY".bold());
    println!(
        " │  {:<48} │",
        format!("Primary ecosystem   : {}", result.primary)
    );
    println!(
        " │  {:<48} │",
        format!("Subdirectories      : {}", subdir_count)
    );
    println!(
        " │  {:<48} │",
        format!("Dependencies        : {}", dep_count)
    );
    println!(
        " │  {:<48} │",
        format!("Unresolved versions : {}", unresolved_count)
    );
    println!(
        " │  {:<48} │",
        format!("Hidden dependencies : {}", result.hidden.len())
    );
    println!(
        " │  {:<48} │",
        format!("Conflicts resolved  : {}", result.conflicts.len())
    );
    println!(" └────────────────────────────────────────────────────┘\n");

    // Per-subdirectory tables; empty subdirectories only in verbose mode.
    for (subdir, inference) in &result.per_subdirectory {
        if inference.dependencies.is_empty() && !verbose {
            continue;
        }
        println!(" {} {}\n", "[DIR]".cyan().bold(), subdir);
        render_table(inference);
        println!();
    }

    if !result.hidden.is_empty() {
        println!(" {} Hidden dependencies (implied, not imported):\n", "[HIDDEN]".cyan().bold());
        for hidden in &result.hidden {
            println!("   - {}", hidden);
        }
        println!();
    }

    if !result.conflicts.is_empty() {
        println!(" {} Version conflicts resolved:\n", "[CONFLICT]".yellow().bold());
        for conflict in &result.conflicts {
            println!("   - {}", conflict);
        }
        println!();
    }

    let deprecations: Vec<_> = result
        .insights
        .iter()
        .filter(|i| i.kind == InsightKind::Deprecation)
        .collect();
    if !deprecations.is_empty() {
        println!(" {} Deprecated picks:\n", "[DEPRECATED]".red().bold());
        for insight in deprecations {
            println!("   - {}", insight.message);
        }
        println!();
    }

    if verbose && !result.insights.is_empty() {
        println!(" {} Insight log:\n", "[INSIGHTS]".bold());
        for insight in &result.insights {
            println!("   {}", insight);
        }
        println!();
    }

    Ok(())
}

fn render_table(inference: &crate::models::SubdirectoryInference) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Dependency").add_attribute(Attribute::Bold),
            Cell::new("Version").add_attribute(Attribute::Bold),
        ]);

    for (name, spec) in &inference.dependencies {
        let version_cell = match spec {
            VersionSpec::Pinned(v) => Cell::new(v),
            VersionSpec::Latest => Cell::new("latest").fg(Color::Yellow),
        };
        table.add_row(vec![Cell::new(name), version_cell]);
    }

    println!("{}", table);
}
