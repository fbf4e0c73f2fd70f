use std::fs;
use std::path::Path;

use anyhow::Result;

use crate::models::{Ecosystem, ImportSymbol, ParseResult};

/// Plugin analyzer for Go subdirectories.
///
/// Go modules declare their dependency set in `go.mod`; the `require`
/// entries are the import symbols of record. Handles both single-line
/// requires and `require ( ... )` blocks.
pub struct GoAnalyzer;

impl super::Analyzer for GoAnalyzer {
    fn parse(&self, path: &Path) -> Result<ParseResult> {
        let gomod = path.join("go.mod");
        if !gomod.is_file() {
            return Ok(ParseResult::default());
        }

        let content = fs::read_to_string(&gomod)?;
        let mut parsed = ParseResult::default();
        let mut in_block = false;

        for line in content.lines() {
            let line = line.trim();
            if line.starts_with("require (") {
                in_block = true;
                continue;
            }
            if in_block && line == ")" {
                in_block = false;
                continue;
            }

            let module = if in_block {
                line.split_whitespace().next()
            } else if let Some(rest) = line.strip_prefix("require ") {
                rest.split_whitespace().next()
            } else {
                None
            };

            if let Some(module) = module {
                if !module.is_empty() && !module.starts_with("//") {
                    parsed.imports.push(ImportSymbol {
                        ecosystem: Ecosystem::Go,
                        symbol: module.to_string(),
                    });
                }
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
    fn test_parse_require_block_and_single_line() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("go.mod"),
            "module example.com/app\n\ngo 1.22\n\nrequire github.com/pkg/errors v0.9.1\n\nrequire (\n\tgithub.com/spf13/cobra v1.8.0\n\tgolang.org/x/sync v0.7.0 // indirect\n)\n",
        )
        .unwrap();

        let parsed = GoAnalyzer.parse(tmp.path()).unwrap();
        let symbols: Vec<&str> = parsed.imports.iter().map(|i| i.symbol.as_str()).collect();
        assert_eq!(
            symbols,
            vec![
                "github.com/pkg/errors",
                "github.com/spf13/cobra",
                "golang.org/x/sync"
            ]
        );
    }

    #[test]
    fn test_missing_gomod_is_empty() {
        let tmp = TempDir::new().unwrap();
        let parsed = GoAnalyzer.parse(tmp.path()).unwrap();
        assert!(parsed.is_empty());
    }
}
