//! Quire Parser Library
//!
//! Body renderers for content documents that do not need template
//! execution: Markdown conversion and verbatim HTML.

pub mod markdown;

pub use markdown::MarkdownParser;

/// Converts a document body to an HTML fragment.
pub trait ContentParser {
    /// Render `body` as HTML.
    fn to_html(&self, body: &str) -> String;
}

impl ContentParser for MarkdownParser {
    fn to_html(&self, body: &str) -> String {
        self.render(body)
    }
}

/// Passes HTML bodies through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlPassthrough;

impl ContentParser for HtmlPassthrough {
    fn to_html(&self, body: &str) -> String {
        body.to_string()
    }
}
