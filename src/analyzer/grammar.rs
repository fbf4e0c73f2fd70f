//! Grammar-aware import and definition extraction via tree-sitter.
//!
//! One query per supported grammar, each with two capture names:
//! `@import` binds the node holding the imported module/source symbol,
//! `@definition` binds a whole function/method declaration whose raw text is
//! kept as a snippet.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::Result;
use log::{debug, warn};
use once_cell::sync::Lazy;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Language, Parser, Query, QueryCursor};

use crate::models::{Ecosystem, ImportSymbol, ParseResult};

const PYTHON_QUERY: &str = r#"
(import_statement name: (dotted_name) @import)
(import_statement name: (aliased_import name: (dotted_name) @import))
(import_from_statement module_name: (dotted_name) @import)
(function_definition) @definition
"#;

const JAVASCRIPT_QUERY: &str = r#"
(import_statement source: (string (string_fragment) @import))
(function_declaration) @definition
"#;

const JAVA_QUERY: &str = r#"
(import_declaration (scoped_identifier) @import)
(method_declaration) @definition
"#;

struct GrammarConfig {
    language: Language,
    query: Query,
}

static GRAMMARS: Lazy<HashMap<Ecosystem, GrammarConfig>> = Lazy::new(|| {
    let sources: [(Ecosystem, Language, &str); 3] = [
        (Ecosystem::Python, tree_sitter_python::LANGUAGE.into(), PYTHON_QUERY),
        (Ecosystem::Node, tree_sitter_javascript::LANGUAGE.into(), JAVASCRIPT_QUERY),
        (Ecosystem::Java, tree_sitter_java::LANGUAGE.into(), JAVA_QUERY),
    ];

    let mut grammars = HashMap::new();
    for (ecosystem, language, query_src) in sources {
        match Query::new(&language, query_src) {
            Ok(query) => {
                grammars.insert(ecosystem, GrammarConfig { language, query });
            }
            Err(err) => warn!("query for {} failed to compile: {}", ecosystem, err),
        }
    }
    grammars
});

/// Whether a grammar is available for the ecosystem.
pub fn supports(ecosystem: Ecosystem) -> bool {
    GRAMMARS.contains_key(&ecosystem)
}

/// Extract from every direct source file of the ecosystem in `subdir`.
/// Nested directories are their own scanning units and are not descended
/// into. No grammar for the ecosystem yields an empty result.
pub fn extract(subdir: &Path, ecosystem: Ecosystem) -> Result<ParseResult> {
    if !supports(ecosystem) {
        debug!("no grammar for {}; returning empty parse", ecosystem);
        return Ok(ParseResult::default());
    }

    let mut entries: Vec<_> = fs::read_dir(subdir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .and_then(Ecosystem::from_extension)
                    == Some(ecosystem)
        })
        .collect();
    entries.sort();

    let mut parsed = ParseResult::default();
    for path in entries {
        match fs::read_to_string(&path) {
            Ok(source) => parsed.extend(extract_source(&source, ecosystem)),
            Err(err) => debug!("unreadable source {}: {}", path.display(), err),
        }
    }
    Ok(parsed)
}

/// Run the ecosystem's query over a single source text.
pub fn extract_source(source: &str, ecosystem: Ecosystem) -> ParseResult {
    let Some(config) = GRAMMARS.get(&ecosystem) else {
        return ParseResult::default();
    };

    let mut parser = Parser::new();
    if parser.set_language(&config.language).is_err() {
        return ParseResult::default();
    }
    let Some(tree) = parser.parse(source, None) else {
        return ParseResult::default();
    };

    let capture_names = config.query.capture_names();
    let mut parsed = ParseResult::default();
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(&config.query, tree.root_node(), source.as_bytes());

    while let Some(m) = matches.next() {
        for capture in m.captures {
            let name = capture_names.get(capture.index as usize).copied().unwrap_or("");
            let Ok(text) = capture.node.utf8_text(source.as_bytes()) else {
                continue;
            };
            match name {
                "import" => parsed.imports.push(ImportSymbol {
                    ecosystem,
                    symbol: text.trim().to_string(),
                }),
                "definition" => parsed.definitions.push(text.to_string()),
                _ => {}
            }
        }
    }

    parsed
}
