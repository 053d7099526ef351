//! Output sinks.
//!
//! Every byte the generator produces goes through an [`OutputSink`], so the
//! page and asset stages can be exercised against memory in tests.

use std::{
    collections::BTreeMap,
    fs,
    io,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

/// Destination for generated files. Paths are relative to the output root.
pub trait OutputSink: Send + Sync {
    /// Write a file, creating intermediate directories.
    fn write(&self, rel: &Path, bytes: &[u8]) -> io::Result<()>;

    /// Create a directory, applying `permissions` when given.
    fn create_dir(&self, rel: &Path, permissions: Option<fs::Permissions>) -> io::Result<()>;

    /// Copy a source file verbatim.
    fn copy_from(&self, src: &Path, rel: &Path) -> io::Result<()> {
        let bytes = fs::read(src)?;
        self.write(rel, &bytes)
    }
}

/// Sink writing under a directory on disk.
#[derive(Debug, Clone)]
pub struct FsSink {
    root: PathBuf,
}

impl FsSink {
    /// Create a sink rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The output root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl OutputSink for FsSink {
    fn write(&self, rel: &Path, bytes: &[u8]) -> io::Result<()> {
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, bytes)
    }

    fn create_dir(&self, rel: &Path, permissions: Option<fs::Permissions>) -> io::Result<()> {
        let path = self.root.join(rel);
        fs::create_dir_all(&path)?;
        if let Some(permissions) = permissions {
            fs::set_permissions(&path, permissions)?;
        }
        Ok(())
    }

    fn copy_from(&self, src: &Path, rel: &Path) -> io::Result<()> {
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(src, path).map(|_| ())
    }
}

/// In-memory sink that records files and directories.
#[derive(Debug, Default)]
pub struct MemorySink {
    files: Mutex<BTreeMap<PathBuf, Vec<u8>>>,
    dirs: Mutex<Vec<PathBuf>>,
}

impl MemorySink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Contents of a written file.
    #[must_use]
    pub fn get(&self, rel: impl AsRef<Path>) -> Option<Vec<u8>> {
        lock(&self.files).get(rel.as_ref()).cloned()
    }

    /// Contents of a written file as UTF-8.
    #[must_use]
    pub fn get_string(&self, rel: impl AsRef<Path>) -> Option<String> {
        self.get(rel).and_then(|bytes| String::from_utf8(bytes).ok())
    }

    /// Written file paths in sorted order.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        lock(&self.files).keys().cloned().collect()
    }

    /// Created directories in creation order.
    #[must_use]
    pub fn dirs(&self) -> Vec<PathBuf> {
        lock(&self.dirs).clone()
    }
}

impl OutputSink for MemorySink {
    fn write(&self, rel: &Path, bytes: &[u8]) -> io::Result<()> {
        lock(&self.files).insert(rel.to_path_buf(), bytes.to_vec());
        Ok(())
    }

    fn create_dir(&self, rel: &Path, _permissions: Option<fs::Permissions>) -> io::Result<()> {
        lock(&self.dirs).push(rel.to_path_buf());
        Ok(())
    }
}

// A panic while holding the lock leaves the map intact; keep using it.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
