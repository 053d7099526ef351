//! Quire Core Library
//!
//! Core types, site layout, front matter and error handling shared by the
//! quire build pipeline.

pub mod config;
pub mod content;
pub mod context;
pub mod error;
pub mod frontmatter;

pub use config::{Settings, SiteLayout};
pub use content::{ContentDocument, ContentType, is_ignored_name, is_ignored_path};
pub use context::{TemplateContext, Value};
pub use error::{CoreError, Result};
pub use frontmatter::{DEFAULT_TEMPLATE, FrontMatter};
