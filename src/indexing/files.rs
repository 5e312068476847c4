//! Source file discovery
//!
//! Walks a project with `ignore`, honouring `.gitignore`, and keeps files
//! whose extension has a front-end.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use crate::lang::Lang;

/// Collect all supported source files under `dir`, sorted by path.
///
/// `max_depth` of `None` walks the whole tree.
pub fn collect_files(dir: &Path, max_depth: Option<usize>) -> Vec<PathBuf> {
    let walker = WalkBuilder::new(dir)
        .hidden(true)
        .git_ignore(true)
        .git_global(false)
        .git_exclude(true)
        .max_depth(max_depth)
        .filter_entry(|entry| entry.depth() == 0 || !should_skip_path(entry.path()))
        .build();

    let mut files: Vec<PathBuf> = walker
        .filter_map(|e| e.ok())
        .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| Lang::from_extension(ext).is_ok())
        })
        .collect();

    files.sort();
    files
}

/// Check if a path should be skipped during file collection.
///
/// Skips:
/// - Hidden files/directories (starting with '.')
/// - Build output and dependency directories: target, build, out, node_modules, etc.
pub fn should_skip_path(path: &Path) -> bool {
    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
        name.starts_with('.')
            || name == "node_modules"
            || name == "target"
            || name == "dist"
            || name == "build"
            || name == "out"
            || name == "bin"
            || name == "coverage"
            || name == "vendor"
    } else {
        false
    }
}
