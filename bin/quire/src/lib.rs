//! Quire CLI Library
//!
//! Command implementations, the development file server and the
//! watch-rebuild loop behind the `quire` binary.
//!
//! # Modules
//!
//! - [`cmd`] - Command implementations (build, serve, init)
//! - [`server`] - Static file server for the output directory
//! - [`watch`] - Debounced rebuild loop driven by file system events
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use quire::cmd;
//!
//! // Build the site in the current directory into ./public
//! cmd::build::run(Path::new("."), None, false).unwrap();
//! ```

pub mod cmd;
pub mod server;
pub mod watch;

pub use quire_core::{Settings, SiteLayout};
pub use quire_generator::{BuildOutcome, Builder};
use tracing::Level;

/// Map the count of `-v` flags to the default log level.
fn verbosity_level(verbose: u8) -> Level {
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Install the global subscriber for the `quire` binary.
///
/// `verbose` picks the default level; `RUST_LOG` directives such as
/// `quire_generator=debug` still win for the targets they name. Log lines go
/// to stderr so build summaries on stdout stay readable.
pub fn init_tracing(verbose: u8) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::builder()
        .with_default_directive(verbosity_level(verbose).into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(verbose > 1))
        .with(filter)
        .init();
}
