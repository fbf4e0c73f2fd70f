use std::fs;
use std::path::Path;

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{Ecosystem, ImportSymbol, ParseResult};

static GEM_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^gem\s+['"]([A-Za-z0-9_\-]+)['"]"#).unwrap());

/// Plugin analyzer for Ruby subdirectories: the `Gemfile`'s `gem` entries
/// stand in as the import symbols.
pub struct RubyAnalyzer;

impl super::Analyzer for RubyAnalyzer {
    fn parse(&self, path: &Path) -> Result<ParseResult> {
        let gemfile = path.join("Gemfile");
        if !gemfile.is_file() {
            return Ok(ParseResult::default());
        }

        let content = fs::read_to_string(&gemfile)?;
        let mut parsed = ParseResult::default();

        for line in content.lines() {
            if let Some(caps) = GEM_LINE.captures(line.trim()) {
                parsed.imports.push(ImportSymbol {
                    ecosystem: Ecosystem::Ruby,
                    symbol: caps[1].to_string(),
                });
            }
        }

        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::Analyzer;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_gemfile() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("Gemfile"),
            "source 'https://rubygems.org'\n\ngem 'rails', '~> 7.1'\ngem \"nokogiri\"\n# gem 'commented'\n",
        )
        .unwrap();

        let parsed = RubyAnalyzer.parse(tmp.path()).unwrap();
        let symbols: Vec<&str> = parsed.imports.iter().map(|i| i.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["rails", "nokogiri"]);
    }

    #[test]
    fn test_missing_gemfile_is_empty() {
        let tmp = TempDir::new().unwrap();
        let parsed = RubyAnalyzer.parse(tmp.path()).unwrap();
        assert!(parsed.is_empty());
    }
}
