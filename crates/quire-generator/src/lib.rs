//! Quire Generator Library
//!
//! Static site generation engine for quire.
//!
//! # Modules
//!
//! - [`template`] - Named layout templates with variables and includes
//! - [`page`] - Content document to HTML page transformation
//! - [`assets`] - Static asset copying and CSS bundling
//! - [`output`] - Output sinks (filesystem and in-memory)
//! - [`build`] - Build orchestration

pub mod assets;
pub mod build;
pub mod output;
pub mod page;
pub mod template;

pub use assets::{AssetError, AssetProcessor, AssetReport};
pub use build::{BuildError, BuildOutcome, Builder};
pub use output::{FsSink, MemorySink, OutputSink};
pub use page::{PageError, PageTransformer, RenderedPage};
pub use template::{Template, TemplateError, TemplateRegistry};
