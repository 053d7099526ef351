//! Page transformation.
//!
//! Turns one content document into one HTML page: front matter is parsed,
//! the body is rendered according to the content type, the result is stored
//! under `content` and the layout named by `template` is executed.

use std::path::PathBuf;

use quire_core::{ContentDocument, ContentType, CoreError, frontmatter::parse_document};
use quire_parser::{ContentParser, HtmlPassthrough, MarkdownParser};
use thiserror::Error;
use tracing::debug;

use crate::{
    output::OutputSink,
    template::{Template, TemplateError, TemplateRegistry},
};

/// Page transformation errors.
#[derive(Debug, Error)]
pub enum PageError {
    /// Front matter or content type error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The layout named in the front matter is not registered.
    #[error("template `{template}` referenced by {path} does not exist")]
    TemplateNotFound { template: String, path: PathBuf },

    /// A template failed while rendering this document.
    #[error("error executing template for {path}: {source}")]
    TemplateExecution {
        path: PathBuf,
        #[source]
        source: TemplateError,
    },

    /// The rendered page could not be written.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for page operations.
pub type Result<T> = std::result::Result<T, PageError>;

/// A fully rendered page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    /// Path relative to the output root.
    pub output_path: PathBuf,
    /// Final HTML.
    pub html: String,
}

/// Renders content documents through their layouts.
#[derive(Debug, Clone)]
pub struct PageTransformer {
    content_root: PathBuf,
    markdown: MarkdownParser,
}

impl PageTransformer {
    /// Create a transformer for documents under `content_root`.
    #[must_use]
    pub fn new(content_root: impl Into<PathBuf>) -> Self {
        Self {
            content_root: content_root.into(),
            markdown: MarkdownParser::new(),
        }
    }

    /// Render a document without writing it.
    pub fn render(&self, document: &ContentDocument, registry: &TemplateRegistry) -> Result<RenderedPage> {
        let path = &document.path;
        let (front_matter, body) = parse_document(&document.raw, path)?;

        let fragment = match document.content_type {
            ContentType::Markdown => self.markdown.to_html(body),
            ContentType::Html => HtmlPassthrough.to_html(body),
            ContentType::Template => Template::parse(path.display().to_string(), body)
                .and_then(|template| template.render_with(front_matter.context(), registry))
                .map_err(|source| PageError::TemplateExecution {
                    path: path.clone(),
                    source,
                })?,
        };

        let layout_name = front_matter.template().to_string();
        let layout = registry
            .get(&layout_name)
            .ok_or_else(|| PageError::TemplateNotFound {
                template: layout_name.clone(),
                path: path.clone(),
            })?;

        let context = front_matter.into_context_with_content(fragment);
        let html = layout
            .render_with(&context, registry)
            .map_err(|source| PageError::TemplateExecution {
                path: path.clone(),
                source,
            })?;

        debug!(path = %path.display(), template = %layout_name, "rendered page");

        Ok(RenderedPage {
            output_path: document.output_path(&self.content_root),
            html,
        })
    }

    /// Render a document and write it to `sink`.
    pub fn transform(
        &self,
        document: &ContentDocument,
        registry: &TemplateRegistry,
        sink: &dyn OutputSink,
    ) -> Result<PathBuf> {
        let page = self.render(document, registry)?;
        write_page(&page, sink)?;
        Ok(page.output_path)
    }
}

/// Write a rendered page to its output path.
pub fn write_page(page: &RenderedPage, sink: &dyn OutputSink) -> Result<()> {
    sink.write(&page.output_path, page.html.as_bytes())
        .map_err(|source| PageError::Write {
            path: page.output_path.clone(),
            source,
        })
}
