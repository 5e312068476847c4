//! Entity extraction orchestration
//!
//! Parses one source file with tree-sitter and hands the tree to the
//! detector for its language.

use std::path::Path;

use tree_sitter::Parser;

use crate::detectors::java;
use crate::error::{EngineError, Result};
use crate::lang::Lang;
use crate::schema::Entity;

/// Entities found in one file
#[derive(Debug, Clone, Default)]
pub struct FileExtraction {
    pub path: String,
    pub entities: Vec<Entity>,
    /// The syntax tree contained error nodes
    pub has_errors: bool,
}

/// Parse a source file and extract its entities
///
/// A file whose tree has syntax errors is still extracted; only a file the
/// parser cannot process at all is a `ParseFailure`.
pub fn parse_and_extract(path: &Path, source: &str, lang: Lang) -> Result<FileExtraction> {
    let display = path.display().to_string();

    let mut parser = Parser::new();
    parser
        .set_language(&lang.tree_sitter_language())
        .map_err(|e| EngineError::ParseFailure {
            path: display.clone(),
            message: format!("Failed to set language: {:?}", e),
        })?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| EngineError::ParseFailure {
            path: display.clone(),
            message: "Failed to parse file".to_string(),
        })?;

    let entities = match lang {
        Lang::Java => java::extract(&display, source, &tree),
    };

    Ok(FileExtraction {
        path: display,
        has_errors: tree.root_node().has_error(),
        entities,
    })
}
