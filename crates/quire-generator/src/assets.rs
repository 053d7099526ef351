//! Static asset processing.
//!
//! Mirrors the asset tree into the output root. Stylesheets are bundled
//! (`@import`s inlined) and minified with Lightning CSS; every other file is
//! copied byte for byte. A failing entry is recorded and the walk goes on.

use std::path::{Path, PathBuf};

use lightningcss::{
    bundler::{Bundler, FileProvider},
    stylesheet::{MinifyOptions, ParserOptions, PrinterOptions},
};
use quire_core::is_ignored_name;
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::output::OutputSink;

/// Asset processing errors.
#[derive(Debug, Error)]
pub enum AssetError {
    /// IO error.
    #[error("IO error processing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stylesheet could not be bundled or printed.
    #[error("failed to process stylesheet {path}: {message}")]
    Css { path: PathBuf, message: String },

    /// Directory walk error.
    #[error("failed to walk assets: {0}")]
    Walk(#[from] walkdir::Error),

    /// Invalid asset path.
    #[error("invalid asset path: {0}")]
    InvalidPath(PathBuf),
}

/// Result type for asset operations.
pub type Result<T> = std::result::Result<T, AssetError>;

/// Summary of one asset pass.
#[derive(Debug, Default)]
pub struct AssetReport {
    /// Files copied unchanged.
    pub copied: usize,
    /// Stylesheets bundled.
    pub stylesheets: usize,
    /// Directories recreated.
    pub directories: usize,
    /// Entries that failed.
    pub failures: Vec<AssetError>,
}

impl AssetReport {
    /// Whether every entry was processed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of files written.
    #[must_use]
    pub fn files(&self) -> usize {
        self.copied + self.stylesheets
    }
}

/// Asset processor for copying static files and bundling CSS.
#[derive(Debug, Clone)]
pub struct AssetProcessor {
    minify_css: bool,
}

impl Default for AssetProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetProcessor {
    /// Create a processor that minifies stylesheets.
    #[must_use]
    pub fn new() -> Self {
        Self { minify_css: true }
    }

    /// Toggle stylesheet minification. Bundling always happens.
    #[must_use]
    pub fn with_minify_css(mut self, minify: bool) -> Self {
        self.minify_css = minify;
        self
    }

    /// Process every entry under `asset_root` into `sink`.
    ///
    /// A missing asset root yields an empty report.
    pub fn process(&self, asset_root: &Path, sink: &dyn OutputSink) -> AssetReport {
        let mut report = AssetReport::default();

        if !asset_root.is_dir() {
            debug!(dir = %asset_root.display(), "asset directory does not exist, skipping");
            return report;
        }

        info!(source = %asset_root.display(), "processing assets");

        let walker = WalkDir::new(asset_root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0 || !is_ignored_name(&entry.file_name().to_string_lossy())
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "asset walk error");
                    report.failures.push(e.into());
                    continue;
                }
            };
            if entry.depth() == 0 {
                continue;
            }

            let path = entry.path();
            let is_dir = entry.file_type().is_dir();
            if let Err(e) = self.process_entry(asset_root, path, is_dir, sink, &mut report) {
                warn!(path = %path.display(), error = %e, "failed to process asset");
                report.failures.push(e);
            }
        }

        info!(
            copied = report.copied,
            stylesheets = report.stylesheets,
            directories = report.directories,
            failures = report.failures.len(),
            "assets processed"
        );
        report
    }

    fn process_entry(
        &self,
        asset_root: &Path,
        path: &Path,
        is_dir: bool,
        sink: &dyn OutputSink,
        report: &mut AssetReport,
    ) -> Result<()> {
        let relative = path
            .strip_prefix(asset_root)
            .map_err(|_| AssetError::InvalidPath(path.to_path_buf()))?;
        let io_err = |source| AssetError::Io {
            path: path.to_path_buf(),
            source,
        };

        if is_dir {
            let permissions = std::fs::metadata(path).map_err(io_err)?.permissions();
            sink.create_dir(relative, Some(permissions)).map_err(io_err)?;
            report.directories += 1;
        } else if is_stylesheet(path) {
            let css = self.bundle_css(path)?;
            sink.write(relative, css.as_bytes()).map_err(io_err)?;
            debug!(path = %relative.display(), "bundled stylesheet");
            report.stylesheets += 1;
        } else {
            sink.copy_from(path, relative).map_err(io_err)?;
            debug!(path = %relative.display(), "copied asset");
            report.copied += 1;
        }

        Ok(())
    }

    /// Bundle a stylesheet with its imports and print it.
    pub fn bundle_css(&self, path: &Path) -> Result<String> {
        let css_err = |message: String| AssetError::Css {
            path: path.to_path_buf(),
            message,
        };

        let provider = FileProvider::new();
        let mut bundler = Bundler::new(&provider, None, ParserOptions::default());
        let mut stylesheet = bundler.bundle(path).map_err(|e| css_err(e.to_string()))?;

        if self.minify_css {
            stylesheet
                .minify(MinifyOptions::default())
                .map_err(|e| css_err(e.to_string()))?;
        }

        let printed = stylesheet
            .to_css(PrinterOptions {
                minify: self.minify_css,
                ..PrinterOptions::default()
            })
            .map_err(|e| css_err(e.to_string()))?;

        Ok(printed.code)
    }
}

fn is_stylesheet(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "css")
}
