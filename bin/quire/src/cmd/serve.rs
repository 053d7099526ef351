//! Serve command - development server with rebuild on change

use std::path::Path;

use color_eyre::eyre::{Result, WrapErr};
use quire_core::{Settings, SiteLayout};
use quire_generator::Builder;
use tokio::net::TcpListener;

use super::build::print_outcome;
use crate::{
    server::create_router,
    watch::{SiteRebuild, spawn_watch},
};

/// Command-line overrides for `serve`.
#[derive(Debug, Clone, Default)]
pub struct ServeOptions {
    /// Port override.
    pub port: Option<u16>,
    /// Host override.
    pub host: Option<String>,
    /// Open the site in a browser once listening.
    pub open_browser: bool,
    /// Run the watch-rebuild loop.
    pub watch: bool,
}

/// Run the serve command.
///
/// Builds once when the output directory is missing, then serves it while
/// the watch loop rebuilds on change. Ctrl-C stops both.
pub async fn run(site_root: &Path, options: ServeOptions) -> Result<()> {
    let settings = Settings::load(site_root).wrap_err("Failed to load settings")?;
    let layout = SiteLayout::from_site_root(site_root);
    let builder = Builder::new().with_minify_css(settings.assets.minify_css);

    let host = options.host.unwrap_or_else(|| settings.serve.host.clone());
    let port = options.port.unwrap_or(settings.serve.port);
    tracing::info!(?site_root, %host, port, watch = options.watch, "Starting dev server");

    if !layout.output_root.exists() {
        println!("Public directory not found, building site...");
        let start = std::time::Instant::now();
        let outcome = builder.build(&layout).wrap_err("Initial build failed")?;
        print_outcome(&outcome, &layout, start.elapsed().as_secs_f64());
    }

    let watch = if options.watch {
        let rebuild = SiteRebuild::new(builder, layout.clone());
        match spawn_watch(&layout, &settings.watch, rebuild) {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to start file watcher");
                eprintln!("  ⚠ File watching disabled: {e}");
                None
            }
        }
    } else {
        None
    };

    let app = create_router(&layout.output_root);
    let addr = format!("{host}:{port}");
    let listener = TcpListener::bind(&addr)
        .await
        .wrap_err_with(|| format!("Failed to bind to {addr}"))?;

    let url = format!("http://{addr}");
    println!();
    println!("  Serving site from: {}", layout.output_root.display());
    println!("  Dev server running at {url}");
    if watch.is_some() {
        println!("  Watching for file changes...");
    }
    println!("  Press Ctrl+C to stop");
    println!();

    if options.open_browser
        && let Err(e) = open::that(&url)
    {
        tracing::warn!(error = %e, "Failed to open browser");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .wrap_err("Server error")?;

    if let Some(handle) = watch {
        let report = handle.stop().await.wrap_err("Watch loop panicked")?;
        tracing::info!(?report, "Watch loop stopped");
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
