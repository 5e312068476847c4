//! Temporary Java project builder

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A throwaway project directory, deleted on drop
pub struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file relative to the project root, creating parent directories
    pub fn add_file(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, content).expect("write file");
        path
    }

    /// Write `src/main/java/<package path>/<name>.java`
    pub fn add_java(&self, package: &str, name: &str, body: &str) -> PathBuf {
        let dir = package.replace('.', "/");
        let content = if package.is_empty() {
            body.to_string()
        } else {
            format!("package {};\n\n{}", package, body)
        };
        self.add_file(&format!("src/main/java/{}/{}.java", dir, name), &content)
    }

    /// Same as `add_java` but under `src/test/java`
    pub fn add_java_test(&self, package: &str, name: &str, body: &str) -> PathBuf {
        let dir = package.replace('.', "/");
        let content = format!("package {};\n\n{}", package, body);
        self.add_file(&format!("src/test/java/{}/{}.java", dir, name), &content)
    }

    /// Builder-style variant of `add_java`
    pub fn with_java(self, package: &str, name: &str, body: &str) -> Self {
        self.add_java(package, name, body);
        self
    }

    pub fn with_config(self, toml: &str) -> Self {
        self.add_file("depsight.toml", toml);
        self
    }
}

impl Default for TestRepo {
    fn default() -> Self {
        Self::new()
    }
}
