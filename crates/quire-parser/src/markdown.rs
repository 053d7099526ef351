//! Markdown renderer using pulldown-cmark.

use pulldown_cmark::{Options, Parser, html};

/// Markdown to HTML renderer.
#[derive(Debug, Clone)]
pub struct MarkdownParser {
    options: Options,
}

impl Default for MarkdownParser {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownParser {
    /// Create a new markdown parser with default options.
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);

        Self { options }
    }

    /// Render a markdown body to HTML.
    pub fn render(&self, body: &str) -> String {
        let parser = Parser::new_ext(body, self.options);
        let mut output = String::with_capacity(body.len() * 3 / 2);
        html::push_html(&mut output, parser);
        output
    }
}
