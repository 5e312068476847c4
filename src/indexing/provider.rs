//! Parallel entity-model construction
//!
//! Files are parsed on a bounded rayon pool. Every file yields an immutable
//! extraction or a skip record; the model is assembled afterwards in path
//! order so the first declaration of a qualified name always wins.

use std::fs;
use std::path::Path;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::ParallelConfig;
use crate::error::{EngineError, Result};
use crate::extract::{parse_and_extract, FileExtraction};
use crate::indexing::files::collect_files;
use crate::lang::Lang;
use crate::schema::{EntityModel, SkippedFile};

/// Entity model plus ingestion diagnostics
#[derive(Debug, Clone, Default)]
pub struct ProviderOutput {
    pub model: EntityModel,
    /// Files that could not be read or parsed, sorted by path
    pub skipped: Vec<SkippedFile>,
    pub files_parsed: usize,
    /// Entities dropped because their qualified name was already declared
    pub duplicate_entities: usize,
}

/// Source of the structural model for a project root
pub trait EntityProvider: Send + Sync {
    fn provide(&self, root: &Path) -> Result<ProviderOutput>;
}

/// Tree-sitter Java front-end
#[derive(Debug, Clone, Default)]
pub struct JavaProvider {
    parallel: ParallelConfig,
}

enum FileOutcome {
    Parsed(FileExtraction),
    Skipped(SkippedFile),
}

impl JavaProvider {
    pub fn new(parallel: ParallelConfig) -> Self {
        Self { parallel }
    }

    fn process_file(path: &Path) -> FileOutcome {
        let shown = path.display().to_string();
        let skip = |reason: String| {
            FileOutcome::Skipped(SkippedFile {
                path: shown.clone(),
                reason,
            })
        };

        let lang = match Lang::from_path(path) {
            Ok(lang) => lang,
            Err(e) => return skip(e.to_string()),
        };
        let source = match fs::read_to_string(path) {
            Ok(source) => source,
            Err(e) => {
                warn!("Skipping {}: {}", shown, e);
                return skip(e.to_string());
            }
        };

        match parse_and_extract(path, &source, lang) {
            Ok(extraction) if extraction.has_errors && extraction.entities.is_empty() => {
                warn!("Skipping {}: syntax errors and no declarations", shown);
                skip("syntax errors and no declarations".to_string())
            }
            Ok(extraction) => {
                if extraction.has_errors {
                    debug!("{} has syntax errors, keeping {} entities", shown, extraction.entities.len());
                }
                FileOutcome::Parsed(extraction)
            }
            Err(e) => {
                warn!("Skipping {}: {}", shown, e);
                skip(e.to_string())
            }
        }
    }

    fn process_all(&self, files: &[std::path::PathBuf]) -> Vec<FileOutcome> {
        if !self.parallel.enabled {
            return files.iter().map(|p| Self::process_file(p)).collect();
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.parallel.threads)
            .build();
        match pool {
            Ok(pool) => pool.install(|| files.par_iter().map(|p| Self::process_file(p)).collect()),
            Err(e) => {
                warn!("Falling back to the global thread pool: {}", e);
                files.par_iter().map(|p| Self::process_file(p)).collect()
            }
        }
    }
}

impl EntityProvider for JavaProvider {
    fn provide(&self, root: &Path) -> Result<ProviderOutput> {
        if !root.is_dir() {
            return Err(EngineError::InvalidProjectRoot {
                path: root.display().to_string(),
            });
        }

        let files = collect_files(root, None);
        info!("Parsing {} source files under {}", files.len(), root.display());

        let mut output = ProviderOutput::default();
        // par_iter collect keeps input order
        for outcome in self.process_all(&files) {
            match outcome {
                FileOutcome::Parsed(extraction) => {
                    output.files_parsed += 1;
                    for entity in extraction.entities {
                        if !output.model.insert(entity) {
                            output.duplicate_entities += 1;
                        }
                    }
                }
                FileOutcome::Skipped(skipped) => output.skipped.push(skipped),
            }
        }
        output.skipped.sort();

        debug!(
            "Model: {} entities from {} files, {} skipped, {} duplicate names",
            output.model.len(),
            output.files_parsed,
            output.skipped.len(),
            output.duplicate_entities
        );
        Ok(output)
    }
}
