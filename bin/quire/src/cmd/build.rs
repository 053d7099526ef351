//! Build command - renders the site once

use std::{path::Path, time::Instant};

use color_eyre::eyre::{Result, WrapErr};
use quire_core::{Settings, SiteLayout};
use quire_generator::{BuildOutcome, Builder};

/// Run the build command.
///
/// Builds `site_root` into `output` (or `<site_root>/public`).
pub fn run(site_root: &Path, output: Option<&Path>, clean: bool) -> Result<()> {
    let start = Instant::now();
    tracing::info!(?site_root, ?output, clean, "Starting build");

    let settings = Settings::load(site_root).wrap_err("Failed to load settings")?;
    tracing::debug!(?settings, "Loaded settings");

    let mut layout = SiteLayout::from_site_root(site_root);
    if let Some(output) = output {
        layout = layout.with_output_root(output);
    }

    let outcome = Builder::new()
        .with_clean(clean)
        .with_minify_css(settings.assets.minify_css)
        .build(&layout)
        .wrap_err("Build failed")?;

    print_outcome(&outcome, &layout, start.elapsed().as_secs_f64());

    tracing::info!(documents = outcome.documents, "Build completed successfully");

    Ok(())
}

/// Print build results in a user-friendly format.
pub fn print_outcome(outcome: &BuildOutcome, layout: &SiteLayout, seconds: f64) {
    println!();
    println!("  Site built successfully! Processed {} files.", outcome.documents);
    println!();
    println!("  Pages:      {}", outcome.documents);
    println!("  Skipped:    {}", outcome.skipped);
    println!("  Assets:     {}", outcome.assets.files());
    println!();
    println!("  Duration:   {seconds:.2}s");
    println!("  Output:     {}", layout.output_root.display());
    println!();

    if let Some(warning) = outcome.asset_warning() {
        eprintln!("  ⚠ Asset processing warning: {warning}");
        for failure in &outcome.assets.failures {
            eprintln!("    - {failure}");
        }
        eprintln!();
    }
}
