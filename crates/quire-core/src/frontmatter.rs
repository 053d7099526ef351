//! Front matter parsing for content documents.
//!
//! A document is laid out as
//!
//! ```text
//! <prelude, usually empty>
//! ---
//! title: Hello
//! template: post
//! ---
//! <body>
//! ```
//!
//! The delimiter is a line consisting of exactly `---`. Anything before the
//! first delimiter is ignored.

use std::path::Path;

use crate::{
    context::{TemplateContext, Value},
    error::{CoreError, Result},
};

/// Front matter delimiter line (without line terminator).
pub const DELIMITER: &str = "---";

/// Layout used when the front matter has no `template` key.
pub const DEFAULT_TEMPLATE: &str = "index";

/// Key naming the layout template.
pub const TEMPLATE_KEY: &str = "template";

/// Required key.
pub const TITLE_KEY: &str = "title";

/// Reserved key receiving the rendered document body.
pub const CONTENT_KEY: &str = "content";

/// The three parts of a raw document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitDocument<'a> {
    /// Text before the opening delimiter.
    pub prelude: &'a str,
    /// Metadata block between the delimiters.
    pub meta: &'a str,
    /// Everything after the closing delimiter.
    pub body: &'a str,
}

/// Split content on the first two delimiter lines.
///
/// Returns `None` when fewer than two delimiter lines are present. A
/// delimiter must be terminated by `\n` (or `\r\n`); a trailing `---` at end
/// of file does not count.
pub fn split_front_matter(content: &str) -> Option<SplitDocument<'_>> {
    let mut marks = Vec::with_capacity(2);
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        if is_delimiter(line) {
            marks.push((offset, offset + line.len()));
            if marks.len() == 2 {
                break;
            }
        }
        offset += line.len();
    }

    match marks.as_slice() {
        [(prelude_end, meta_start), (meta_end, body_start)] => Some(SplitDocument {
            prelude: &content[..*prelude_end],
            meta: &content[*meta_start..*meta_end],
            body: &content[*body_start..],
        }),
        _ => None,
    }
}

fn is_delimiter(line: &str) -> bool {
    line.strip_suffix('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .is_some_and(|l| l == DELIMITER)
}

/// Parsed front matter with the defaulted `template` key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontMatter {
    context: TemplateContext,
}

impl FrontMatter {
    /// Parse a metadata block.
    ///
    /// Defaults `template` to [`DEFAULT_TEMPLATE`] and rejects blocks
    /// without a `title` key.
    pub fn parse(meta: &str, path: &Path) -> Result<Self> {
        let mut context = if meta.trim().is_empty() {
            TemplateContext::new()
        } else {
            let value: serde_yaml::Value =
                serde_yaml::from_str(meta).map_err(|e| CoreError::frontmatter(path, e.to_string()))?;
            match value {
                serde_yaml::Value::Mapping(mapping) => TemplateContext::from_yaml(mapping),
                serde_yaml::Value::Null => TemplateContext::new(),
                _ => {
                    return Err(CoreError::frontmatter(
                        path,
                        "front matter must be a key/value mapping",
                    ));
                }
            }
        };

        if !context.contains(TEMPLATE_KEY) {
            context.insert(TEMPLATE_KEY, DEFAULT_TEMPLATE);
        }
        if context.get_text(TEMPLATE_KEY).is_none() {
            return Err(CoreError::frontmatter(path, "`template` must be a string"));
        }

        if !context.contains(TITLE_KEY) {
            return Err(CoreError::missing_title(path));
        }

        Ok(Self { context })
    }

    /// Name of the layout template.
    #[must_use]
    pub fn template(&self) -> &str {
        self.context.get_text(TEMPLATE_KEY).unwrap_or(DEFAULT_TEMPLATE)
    }

    /// Page title, empty when the title is not a scalar.
    #[must_use]
    pub fn title(&self) -> &str {
        self.context.get_text(TITLE_KEY).unwrap_or_default()
    }

    /// Borrow the metadata as a template context.
    #[must_use]
    pub fn context(&self) -> &TemplateContext {
        &self.context
    }

    /// Consume the front matter and inject the rendered body under
    /// [`CONTENT_KEY`], overriding any `content` key from the metadata.
    #[must_use]
    pub fn into_context_with_content(self, content: String) -> TemplateContext {
        let mut context = self.context;
        context.insert(CONTENT_KEY, Value::Text(content));
        context
    }
}

/// Split and parse a document, returning front matter and body.
pub fn parse_document<'a>(content: &'a str, path: &Path) -> Result<(FrontMatter, &'a str)> {
    let split = split_front_matter(content).ok_or_else(|| CoreError::malformed(path))?;
    let front_matter = FrontMatter::parse(split.meta, path)?;
    Ok((front_matter, split.body))
}
