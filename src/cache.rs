//! Result caching
//!
//! Two layers:
//! - [`ResultCache`]: in-memory memo of full analyses, keyed by canonical
//!   project root, living as long as the [`crate::Analyzer`].
//! - [`CacheDir`]: XDG-compliant on-disk JSON results keyed by a hash of the
//!   canonical project path, invalidated when any source file changes.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::ProjectAnalysis;
use crate::error::Result;
use crate::schema::{fnv1a_hash, SCHEMA_VERSION};

/// Metadata for cached results to detect staleness
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMeta {
    /// Schema version for compatibility
    pub schema_version: String,

    /// When this cache was generated
    pub generated_at: String,

    /// Source files that contributed to this cache entry
    pub source_files: Vec<SourceFileInfo>,
}

/// Information about a source file for staleness detection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFileInfo {
    /// Relative path from project root
    pub path: String,

    /// File modification time (Unix timestamp)
    pub mtime: u64,

    /// File size in bytes (for quick change detection)
    pub size: u64,
}

impl SourceFileInfo {
    /// Create from a file path
    pub fn from_path(path: &Path, repo_root: &Path) -> Option<Self> {
        let metadata = fs::metadata(path).ok()?;
        let mtime = metadata
            .modified()
            .ok()?
            .duration_since(SystemTime::UNIX_EPOCH)
            .ok()?
            .as_secs();

        Some(Self {
            path: relative_path(path, repo_root),
            mtime,
            size: metadata.len(),
        })
    }

    /// Check if the source file has changed
    pub fn is_stale(&self, repo_root: &Path) -> bool {
        let full_path = repo_root.join(&self.path);
        match fs::metadata(&full_path) {
            Ok(metadata) => {
                let current_mtime = metadata
                    .modified()
                    .ok()
                    .and_then(|t| t.duration_since(SystemTime::UNIX_EPOCH).ok())
                    .map(|d| d.as_secs())
                    .unwrap_or(0);

                current_mtime != self.mtime || metadata.len() != self.size
            }
            Err(_) => true,
        }
    }
}

fn relative_path(path: &Path, repo_root: &Path) -> String {
    path.strip_prefix(repo_root)
        .unwrap_or(path)
        .to_string_lossy()
        .to_string()
}

impl CacheMeta {
    pub fn new(source_files: Vec<SourceFileInfo>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            source_files,
        }
    }

    /// Stale if any recorded file changed or the file set itself changed
    pub fn is_stale(&self, repo_root: &Path, current_files: &[PathBuf]) -> bool {
        let recorded: BTreeSet<&str> = self.source_files.iter().map(|f| f.path.as_str()).collect();
        let current: BTreeSet<String> = current_files
            .iter()
            .map(|p| relative_path(p, repo_root))
            .collect();
        if recorded.len() != current.len() || current.iter().any(|p| !recorded.contains(p.as_str())) {
            return true;
        }
        self.source_files.iter().any(|f| f.is_stale(repo_root))
    }

    pub fn is_compatible(&self) -> bool {
        self.schema_version == SCHEMA_VERSION
    }
}

/// On-disk cache location for one project
#[derive(Debug, Clone)]
pub struct CacheDir {
    /// Root of the cache for this project
    pub root: PathBuf,

    /// Canonical project root
    pub repo_root: PathBuf,

    /// Project hash (for identification)
    pub repo_hash: String,
}

impl CacheDir {
    /// Cache directory for a project under the XDG cache base
    pub fn for_repo(repo_path: &Path) -> Result<Self> {
        let repo_root = repo_path.canonicalize()?;
        let repo_hash = compute_repo_hash(&repo_root);
        let root = get_cache_base_dir().join(&repo_hash);

        Ok(Self {
            root,
            repo_root,
            repo_hash,
        })
    }

    /// Cache directory at an explicit location
    pub fn at(root: PathBuf, repo_root: PathBuf) -> Self {
        let repo_hash = compute_repo_hash(&repo_root);
        Self {
            root,
            repo_root,
            repo_hash,
        }
    }

    pub fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    /// Check if the cache holds a stored analysis
    pub fn exists(&self) -> bool {
        self.meta_path().exists() && self.analysis_path().exists()
    }

    pub fn meta_path(&self) -> PathBuf {
        self.root.join("meta.json")
    }

    pub fn analysis_path(&self) -> PathBuf {
        self.root.join("analysis.json")
    }

    /// Get cache size in bytes
    pub fn size(&self) -> u64 {
        dir_size(&self.root)
    }

    /// Clear the cache
    pub fn clear(&self) -> Result<()> {
        if self.root.exists() {
            fs::remove_dir_all(&self.root)?;
        }
        Ok(())
    }

    /// Store an analysis together with the files it was computed from
    pub fn save_analysis(&self, analysis: &ProjectAnalysis, source_files: &[PathBuf]) -> Result<()> {
        self.init()?;

        let infos = source_files
            .iter()
            .filter_map(|p| SourceFileInfo::from_path(p, &self.repo_root))
            .collect();
        let meta = CacheMeta::new(infos);

        fs::write(self.analysis_path(), serde_json::to_string(analysis)?)?;
        fs::write(self.meta_path(), serde_json::to_string_pretty(&meta)?)?;
        debug!("Cached analysis at {}", self.root.display());
        Ok(())
    }

    /// Load a stored analysis if it is still fresh for `source_files`
    pub fn load_analysis(&self, source_files: &[PathBuf]) -> Result<Option<ProjectAnalysis>> {
        if !self.exists() {
            return Ok(None);
        }

        let meta: CacheMeta = serde_json::from_str(&fs::read_to_string(self.meta_path())?)?;
        if !meta.is_compatible() {
            debug!("Ignoring cache with schema {}", meta.schema_version);
            return Ok(None);
        }
        if meta.is_stale(&self.repo_root, source_files) {
            debug!("Cache at {} is stale", self.root.display());
            return Ok(None);
        }

        let analysis = serde_json::from_str(&fs::read_to_string(self.analysis_path())?)?;
        Ok(Some(analysis))
    }
}

/// Get the base cache directory (XDG-compliant)
pub fn get_cache_base_dir() -> PathBuf {
    if let Ok(xdg_cache) = std::env::var("XDG_CACHE_HOME") {
        return PathBuf::from(xdg_cache).join("depsight");
    }

    if let Some(cache) = dirs::cache_dir() {
        return cache.join("depsight");
    }

    std::env::temp_dir().join("depsight")
}

/// Stable hash of a project's canonical path
pub fn compute_repo_hash(repo_path: &Path) -> String {
    let canonical = repo_path
        .canonicalize()
        .unwrap_or_else(|_| repo_path.to_path_buf());
    format!("{:016x}", fnv1a_hash(&canonical.to_string_lossy()))
}

/// Calculate total size of a directory
fn dir_size(path: &Path) -> u64 {
    fs::read_dir(path)
        .into_iter()
        .flatten()
        .filter_map(|entry| entry.ok())
        .map(|entry| {
            let path = entry.path();
            if path.is_dir() {
                dir_size(&path)
            } else {
                fs::metadata(&path).map(|m| m.len()).unwrap_or(0)
            }
        })
        .sum()
}

/// In-memory memo of full analyses
#[derive(Debug, Default)]
pub struct ResultCache {
    entries: RwLock<HashMap<PathBuf, Arc<ProjectAnalysis>>>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, root: &Path) -> Option<Arc<ProjectAnalysis>> {
        self.entries.read().get(root).cloned()
    }

    pub fn insert(&self, root: PathBuf, analysis: Arc<ProjectAnalysis>) {
        self.entries.write().insert(root, analysis);
    }

    /// Drop every memoized result
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
