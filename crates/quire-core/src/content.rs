//! Content documents and file name conventions.

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::error::{CoreError, Result};

/// Extension of every generated page.
pub const OUTPUT_EXTENSION: &str = "html";

/// Rendering strategy selected by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    /// Markdown converted to HTML (`.md`).
    Markdown,
    /// HTML passed through verbatim (`.html`).
    Html,
    /// Body executed as a template against its own front matter (`.tmpl`).
    Template,
}

impl ContentType {
    /// Determine content type from a file extension (without the dot).
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "md" => Some(Self::Markdown),
            "html" => Some(Self::Html),
            "tmpl" => Some(Self::Template),
            _ => None,
        }
    }

    /// Get the file extension for this content type.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Html => "html",
            Self::Template => "tmpl",
        }
    }
}

/// A source document read from the content tree.
#[derive(Debug, Clone)]
pub struct ContentDocument {
    /// Source path.
    pub path: PathBuf,
    /// Rendering strategy.
    pub content_type: ContentType,
    /// Raw file content, front matter included.
    pub raw: String,
}

impl ContentDocument {
    /// Create a document from in-memory content.
    ///
    /// Fails with `UnsupportedContentType` when the extension is unknown.
    pub fn new(path: impl Into<PathBuf>, raw: impl Into<String>) -> Result<Self> {
        let path = path.into();
        let content_type = content_type_of(&path)?;
        Ok(Self {
            path,
            content_type,
            raw: raw.into(),
        })
    }

    /// Read a document from disk.
    ///
    /// The extension is checked before the file is read.
    pub fn load(path: &Path) -> Result<Self> {
        let content_type = content_type_of(path)?;
        let raw = fs::read_to_string(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            content_type,
            raw,
        })
    }

    /// Output path relative to the output root: the path relative to
    /// `content_root` with its extension replaced by `.html`.
    #[must_use]
    pub fn output_path(&self, content_root: &Path) -> PathBuf {
        relative_output_path(&self.path, content_root)
    }
}

fn content_type_of(path: &Path) -> Result<ContentType> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    ContentType::from_extension(ext).ok_or_else(|| {
        let shown = if ext.is_empty() {
            String::new()
        } else {
            format!(".{ext}")
        };
        CoreError::unsupported(path, shown)
    })
}

/// Map a source path to its output path relative to the output root.
#[must_use]
pub fn relative_output_path(path: &Path, content_root: &Path) -> PathBuf {
    let relative = match path.strip_prefix(content_root) {
        Ok(relative) => relative.to_path_buf(),
        Err(_) => path.file_name().map(PathBuf::from).unwrap_or_default(),
    };
    relative.with_extension(OUTPUT_EXTENSION)
}

/// Whether a file name marks a hidden or editor temporary file.
///
/// Matches dot-prefixed names, `~`-suffixed names and names containing
/// `.tmp` or `.swp`. The `.tmpl` content extension is not a `.tmp` marker.
#[must_use]
pub fn is_ignored_name(name: &str) -> bool {
    name.starts_with('.')
        || name.ends_with('~')
        || name.contains(".swp")
        || name
            .match_indices(".tmp")
            .any(|(i, _)| !name[i..].starts_with(".tmpl"))
}

/// [`is_ignored_name`] applied to the final component of a path.
#[must_use]
pub fn is_ignored_path(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| is_ignored_name(&name.to_string_lossy()))
}
