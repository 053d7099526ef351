//! Error types for the quire core library.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error types for quire.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Site layout or settings error.
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The document does not contain two front matter delimiter lines.
    #[error("invalid front matter format in {path}: expected a `---` line before and after the metadata")]
    MalformedFrontMatter { path: PathBuf },

    /// The front matter block is not valid YAML.
    #[error("error parsing front matter in {path}: {message}")]
    FrontMatter { path: PathBuf, message: String },

    /// The front matter has no `title` key.
    #[error("{path} doesn't contain a title")]
    MissingTitle { path: PathBuf },

    /// The document extension has no rendering strategy.
    #[error("unsupported content type `{extension}` for {path}")]
    UnsupportedContentType { path: PathBuf, extension: String },

    /// File system I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings crate error.
    #[error("Config crate error: {0}")]
    ConfigCrate(#[from] config::ConfigError),
}

impl CoreError {
    /// Create a new configuration error with a message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new configuration error with source.
    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new malformed front matter error.
    pub fn malformed(path: impl Into<PathBuf>) -> Self {
        Self::MalformedFrontMatter { path: path.into() }
    }

    /// Create a new front matter parse error.
    pub fn frontmatter(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::FrontMatter {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new missing title error.
    pub fn missing_title(path: impl Into<PathBuf>) -> Self {
        Self::MissingTitle { path: path.into() }
    }

    /// Create a new unsupported content type error.
    pub fn unsupported(path: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self::UnsupportedContentType {
            path: path.into(),
            extension: extension.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error() {
        let err = CoreError::config("pages directory cannot be empty");
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("pages directory"));
    }

    #[test]
    fn test_malformed_error_names_file() {
        let err = CoreError::malformed("pages/broken.md");
        assert!(err.to_string().contains("invalid front matter format"));
        assert!(err.to_string().contains("pages/broken.md"));
    }

    #[test]
    fn test_missing_title_error() {
        let err = CoreError::missing_title("pages/untitled.md");
        assert_eq!(err.to_string(), "pages/untitled.md doesn't contain a title");
    }

    #[test]
    fn test_unsupported_names_extension() {
        let err = CoreError::unsupported("pages/notes.txt", ".txt");
        assert!(err.to_string().contains("`.txt`"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CoreError = io_err.into();
        assert!(err.to_string().contains("IO error"));
    }
}
