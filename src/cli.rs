use std::path::PathBuf;

use clap::Parser;

use crate::models::Ecosystem;

#[derive(Parser, Debug)]
#[command(
    name = "depforge",
    about = "Infer, reconcile and audit project dependencies across ecosystems",
    version
)]
pub struct Cli {
    /// Repository to scan: a local path or an http(s) git URL
    #[arg(default_value = ".")]
    pub reference: String,

    /// Force the primary ecosystem instead of auto-detecting
    #[arg(long, value_name = "ECOSYSTEM")]
    pub lang: Option<EcosystemArg>,

    /// Skip registry lookups; unresolved versions stay unresolved
    #[arg(long)]
    pub offline: bool,

    /// Bypass the result cache
    #[arg(long)]
    pub no_cache: bool,

    /// Rule base file [default: ./.depforge/rules.toml, fallback ~/.config/depforge/rules.toml]
    #[arg(long, value_name = "FILE")]
    pub rules: Option<PathBuf>,

    /// Report format
    #[arg(long, default_value = "terminal", value_name = "FORMAT")]
    pub report: ReportFormat,

    /// Show empty subdirectories and the full insight log
    #[arg(short, long)]
    pub verbose: bool,

    /// Only print the summary line
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum ReportFormat {
    Terminal,
    Json,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum EcosystemArg {
    Python,
    Node,
    Java,
    Go,
    Ruby,
}

impl From<&EcosystemArg> for Ecosystem {
    fn from(arg: &EcosystemArg) -> Self {
        match arg {
            EcosystemArg::Python => Ecosystem::Python,
            EcosystemArg::Node => Ecosystem::Node,
            EcosystemArg::Java => Ecosystem::Java,
            EcosystemArg::Go => Ecosystem::Go,
            EcosystemArg::Ruby => Ecosystem::Ruby,
        }
    }
}
