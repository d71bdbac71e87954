//! # Workspace Storage
//!
//! Where generated artifacts land. Paths are relative and slash-separated;
//! backends never see an absolute path or a `..` segment.

use crate::error::{Error, ErrorKind, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Storage backend trait
pub trait ArtifactStorage: Send + Sync {
    /// Write `content` at `path`, replacing any previous content
    fn materialize(&mut self, path: &str, content: &str) -> Result<()>;
    /// All stored paths, sorted
    fn list(&self) -> Result<Vec<String>>;
    fn read(&self, path: &str) -> Result<String>;
    fn delete(&mut self, path: &str) -> Result<()>;
}

/// Normalize and check a workspace-relative path.
///
/// Backslashes become `/`, leading `./` and `/` are dropped, empty segments
/// collapse. Empty paths and `..` segments are rejected.
pub fn normalize_path(path: &str) -> Result<String> {
    let unified = path.trim().replace('\\', "/");
    let mut segments = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                return Err(Error::invalid_argument(format!("path escapes the workspace: {}", path))
                    .with_context("path", path))
            }
            s => segments.push(s),
        }
    }
    if segments.is_empty() {
        return Err(Error::invalid_argument("empty workspace path"));
    }
    Ok(segments.join("/"))
}

/// In-memory workspace (volatile, but useful for testing)
#[derive(Debug, Clone, Default)]
pub struct MemoryWorkspace {
    files: BTreeMap<String, String>,
}

impl MemoryWorkspace {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ArtifactStorage for MemoryWorkspace {
    fn materialize(&mut self, path: &str, content: &str) -> Result<()> {
        self.files.insert(normalize_path(path)?, content.to_string());
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>> {
        Ok(self.files.keys().cloned().collect())
    }

    fn read(&self, path: &str) -> Result<String> {
        let key = normalize_path(path)?;
        self.files
            .get(&key)
            .cloned()
            .ok_or_else(|| Error::storage_not_found(key))
    }

    fn delete(&mut self, path: &str) -> Result<()> {
        let key = normalize_path(path)?;
        self.files
            .remove(&key)
            .map(|_| ())
            .ok_or_else(|| Error::storage_not_found(key))
    }
}

/// Directory-backed workspace (persistent)
pub struct DirWorkspace {
    root: PathBuf,
}

impl DirWorkspace {
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root).map_err(|e| {
            Error::from(e)
                .with_operation("workspace::open")
                .with_context("root", root.display().to_string())
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<(String, PathBuf)> {
        let key = normalize_path(path)?;
        let full = self.root.join(&key);
        Ok((key, full))
    }
}

impl ArtifactStorage for DirWorkspace {
    fn materialize(&mut self, path: &str, content: &str) -> Result<()> {
        let (key, full) = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::from(e).with_operation("workspace::materialize").with_context("path", &key))?;
        }
        std::fs::write(&full, content)
            .map_err(|e| Error::from(e).with_operation("workspace::materialize").with_context("path", &key))?;
        debug!(path = %key, bytes = content.len(), "materialized");
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>> {
        let mut paths = Vec::new();
        for entry in WalkDir::new(&self.root).follow_links(false) {
            let entry = entry.map_err(|e| {
                Error::new(ErrorKind::IoFailed, e.to_string())
                    .with_operation("workspace::list")
                    .set_source(e)
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Ok(relative) = entry.path().strip_prefix(&self.root) {
                let parts: Vec<String> = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                paths.push(parts.join("/"));
            }
        }
        paths.sort();
        Ok(paths)
    }

    fn read(&self, path: &str) -> Result<String> {
        let (key, full) = self.resolve(path)?;
        if !full.is_file() {
            return Err(Error::storage_not_found(key));
        }
        std::fs::read_to_string(&full)
            .map_err(|e| Error::from(e).with_operation("workspace::read").with_context("path", key))
    }

    fn delete(&mut self, path: &str) -> Result<()> {
        let (key, full) = self.resolve(path)?;
        if !full.is_file() {
            return Err(Error::storage_not_found(key));
        }
        std::fs::remove_file(&full)
            .map_err(|e| Error::from(e).with_operation("workspace::delete").with_context("path", key))
    }
}

/// Workspace - high-level handle over a storage backend
pub struct Workspace {
    backend: Box<dyn ArtifactStorage>,
}

impl Workspace {
    /// Create a workspace with an in-memory backend
    pub fn memory() -> Self {
        Self::with_backend(MemoryWorkspace::new())
    }

    /// Create a workspace rooted at a directory
    pub fn dir(root: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::with_backend(DirWorkspace::new(root)?))
    }

    pub fn with_backend(backend: impl ArtifactStorage + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    pub fn materialize(&mut self, path: &str, content: &str) -> Result<()> {
        self.backend.materialize(path, content)
    }

    pub fn list(&self) -> Result<Vec<String>> {
        self.backend.list()
    }

    pub fn read(&self, path: &str) -> Result<String> {
        self.backend.read(path)
    }

    pub fn delete(&mut self, path: &str) -> Result<()> {
        self.backend.delete(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("src/main.py").unwrap(), "src/main.py");
        assert_eq!(normalize_path("\\static\\app.js").unwrap(), "static/app.js");
        assert_eq!(normalize_path("./a//b/").unwrap(), "a/b");
        assert_eq!(normalize_path("../etc/passwd").unwrap_err().kind(), ErrorKind::InvalidArgument);
        assert!(normalize_path("  ").is_err());
    }

    #[test]
    fn test_memory_workspace() {
        let mut ws = Workspace::memory();

        ws.materialize("README.md", "# App\n").unwrap();
        ws.materialize("src/main.py", "print(1)\n").unwrap();
        ws.materialize("src/main.py", "print(2)\n").unwrap();

        assert_eq!(ws.list().unwrap(), vec!["README.md", "src/main.py"]);
        assert_eq!(ws.read("src/main.py").unwrap(), "print(2)\n");

        ws.delete("README.md").unwrap();
        assert_eq!(ws.list().unwrap(), vec!["src/main.py"]);
        assert_eq!(ws.delete("README.md").unwrap_err().kind(), ErrorKind::StorageNotFound);
    }

    #[test]
    fn test_dir_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let mut ws = Workspace::dir(dir.path()).unwrap();

        ws.materialize("frontend/templates/index.html", "<html></html>\n").unwrap();
        ws.materialize("calculator.py", "x = 1\n").unwrap();

        assert!(dir.path().join("frontend/templates/index.html").is_file());
        assert_eq!(
            ws.list().unwrap(),
            vec!["calculator.py", "frontend/templates/index.html"]
        );
        assert_eq!(ws.read("calculator.py").unwrap(), "x = 1\n");

        ws.delete("calculator.py").unwrap();
        assert!(!dir.path().join("calculator.py").exists());
        assert_eq!(ws.read("calculator.py").unwrap_err().kind(), ErrorKind::StorageNotFound);
    }

    #[test]
    fn test_dir_workspace_rejects_escape() {
        let dir = tempfile::tempdir().unwrap();
        let mut ws = DirWorkspace::new(dir.path().join("ws")).unwrap();

        assert!(ws.materialize("../outside.txt", "nope").is_err());
        assert!(!dir.path().join("outside.txt").exists());
    }
}
