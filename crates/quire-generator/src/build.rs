//! Build orchestration.
//!
//! Validates the layout, loads the layout templates, renders every content
//! document in sorted walk order and finally copies the assets. The first
//! page error aborts the build; asset failures only produce a warning.

use std::{
    fs,
    path::PathBuf,
    time::Instant,
};

use quire_core::{ContentDocument, CoreError, SiteLayout, is_ignored_name};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::{
    assets::{AssetProcessor, AssetReport},
    output::{FsSink, OutputSink},
    page::{PageError, PageTransformer},
    template::{TemplateError, TemplateRegistry},
};

/// Build errors.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Invalid site layout.
    #[error(transparent)]
    Config(CoreError),

    /// Layout templates could not be loaded.
    #[error("failed to load templates from {dir}: {source}")]
    TemplateLoad {
        dir: PathBuf,
        #[source]
        source: TemplateError,
    },

    /// A content document failed.
    #[error(transparent)]
    Page(#[from] PageError),

    /// The content tree could not be walked.
    #[error("failed to walk content directory: {0}")]
    Walk(#[from] walkdir::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for build operations.
pub type Result<T> = std::result::Result<T, BuildError>;

/// Result of a successful build.
#[derive(Debug, Default)]
pub struct BuildOutcome {
    /// Documents rendered.
    pub documents: usize,

    /// Hidden or temporary files skipped in the content tree.
    pub skipped: usize,

    /// Asset pass summary.
    pub assets: AssetReport,

    /// Build duration in milliseconds.
    pub duration_ms: u64,
}

impl BuildOutcome {
    /// One-line warning when some assets failed.
    #[must_use]
    pub fn asset_warning(&self) -> Option<String> {
        match self.assets.failures.len() {
            0 => None,
            1 => Some(format!("1 asset failed to process: {}", self.assets.failures[0])),
            n => Some(format!("{n} assets failed to process")),
        }
    }
}

/// Site builder that orchestrates the build process.
#[derive(Debug, Clone)]
pub struct Builder {
    clean: bool,
    assets: AssetProcessor,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    /// Create a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            clean: false,
            assets: AssetProcessor::new(),
        }
    }

    /// Remove the output root before building.
    #[must_use]
    pub fn with_clean(mut self, clean: bool) -> Self {
        self.clean = clean;
        self
    }

    /// Toggle stylesheet minification.
    #[must_use]
    pub fn with_minify_css(mut self, minify: bool) -> Self {
        self.assets = self.assets.with_minify_css(minify);
        self
    }

    /// Build the site into `layout.output_root`.
    ///
    /// The output root is only touched once the templates have loaded, so a
    /// build that fails up front leaves no output directory behind.
    pub fn build(&self, layout: &SiteLayout) -> Result<BuildOutcome> {
        let start = Instant::now();
        layout.validate().map_err(BuildError::Config)?;
        let registry = load_registry(layout)?;

        if self.clean && layout.output_root.exists() {
            debug!(dir = %layout.output_root.display(), "cleaning output directory");
            fs::remove_dir_all(&layout.output_root)?;
        }

        let outcome = self.run(layout, &registry, &FsSink::new(&layout.output_root), start)?;
        // A site with no pages and no assets still gets an output root.
        fs::create_dir_all(&layout.output_root)?;
        Ok(outcome)
    }

    /// Build the site, writing every output file to `sink`.
    pub fn build_into(&self, layout: &SiteLayout, sink: &dyn OutputSink) -> Result<BuildOutcome> {
        let start = Instant::now();
        layout.validate().map_err(BuildError::Config)?;
        let registry = load_registry(layout)?;

        self.run(layout, &registry, sink, start)
    }

    fn run(
        &self,
        layout: &SiteLayout,
        registry: &TemplateRegistry,
        sink: &dyn OutputSink,
        start: Instant,
    ) -> Result<BuildOutcome> {
        info!(
            content = %layout.content_root.display(),
            output = %layout.output_root.display(),
            templates = registry.len(),
            "starting build"
        );

        let mut outcome = self.render_pages(layout, registry, sink)?;

        outcome.assets = self.assets.process(&layout.asset_root, sink);
        if let Some(warning) = outcome.asset_warning() {
            warn!("{warning}");
        }

        outcome.duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        info!(
            documents = outcome.documents,
            skipped = outcome.skipped,
            assets = outcome.assets.files(),
            duration_ms = outcome.duration_ms,
            "build complete"
        );

        Ok(outcome)
    }

    fn render_pages(
        &self,
        layout: &SiteLayout,
        registry: &TemplateRegistry,
        sink: &dyn OutputSink,
    ) -> Result<BuildOutcome> {
        let transformer = PageTransformer::new(&layout.content_root);
        let mut outcome = BuildOutcome::default();

        let walker = WalkDir::new(&layout.content_root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !entry.file_type().is_dir()
                    || !is_ignored_name(&entry.file_name().to_string_lossy())
            });

        for entry in walker {
            let entry = entry?;
            let path = entry.path();

            if entry.file_type().is_dir() || !path.is_file() {
                continue;
            }
            if is_ignored_name(&entry.file_name().to_string_lossy()) {
                debug!(path = %path.display(), "skipping hidden or temporary file");
                outcome.skipped += 1;
                continue;
            }

            let document = ContentDocument::load(path).map_err(PageError::from)?;
            let written = transformer.transform(&document, registry, sink)?;
            debug!(source = %path.display(), output = %written.display(), "wrote page");
            outcome.documents += 1;
        }

        Ok(outcome)
    }
}

fn load_registry(layout: &SiteLayout) -> Result<TemplateRegistry> {
    TemplateRegistry::load(&layout.template_root).map_err(|source| BuildError::TemplateLoad {
        dir: layout.template_root.clone(),
        source,
    })
}
