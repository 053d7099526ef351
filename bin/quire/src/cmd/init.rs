//! Init command - scaffolds a new site

use std::{fs, path::Path};

use color_eyre::eyre::{Result, WrapErr, bail};
use quire_core::config::{ASSETS_DIR, PAGES_DIR, TEMPLATES_DIR};

/// Files written by `init`, relative to the site root.
const SCAFFOLD: &[(&str, &str, &str)] = &[
    (PAGES_DIR, "index.md", INDEX_PAGE),
    (TEMPLATES_DIR, "index.html", INDEX_LAYOUT),
    (TEMPLATES_DIR, "partials.html", PARTIALS),
    (ASSETS_DIR, "style.css", STYLESHEET),
];

const INDEX_PAGE: &str = r#"---
title: Welcome
description: A site built with quire
---

# Welcome

Edit `pages/index.md` and run `quire serve` to see changes live.
"#;

const INDEX_LAYOUT: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{{ .title }}</title>
    <meta name="description" content="{{ description? }}">
    <link rel="stylesheet" href="/style.css">
</head>
<body>
    {{ template "header" . }}
    <main>
        {{ content }}
    </main>
    {{ template "footer" . }}
</body>
</html>
"#;

const PARTIALS: &str = r#"{{ define "header" }}<header><a href="/">{{ title }}</a></header>{{ end }}

{{ define "footer" }}<footer>Built with quire</footer>{{ end }}
"#;

const STYLESHEET: &str = r#"body {
    font-family: system-ui, sans-serif;
    max-width: 42rem;
    margin: 0 auto;
    padding: 1rem;
    line-height: 1.6;
}

header a {
    color: inherit;
    text-decoration: none;
}
"#;

/// Run the init command.
///
/// Writes the starter pages, layouts and stylesheet. Refuses to touch a
/// directory that already contains any of them.
pub fn run(site_root: &Path) -> Result<()> {
    tracing::info!(?site_root, "Creating new site");

    let existing: Vec<_> = SCAFFOLD
        .iter()
        .map(|(dir, name, _)| site_root.join(dir).join(name))
        .filter(|path| path.exists())
        .collect();
    if let Some(first) = existing.first() {
        bail!(
            "{} already exists, refusing to overwrite ({} scaffold files present)",
            first.display(),
            existing.len()
        );
    }

    for (dir, name, content) in SCAFFOLD {
        let dir = site_root.join(dir);
        fs::create_dir_all(&dir)
            .wrap_err_with(|| format!("Failed to create {}", dir.display()))?;

        let path = dir.join(name);
        fs::write(&path, content).wrap_err_with(|| format!("Failed to write {}", path.display()))?;

        tracing::debug!(?path, "Created file");
        println!("Created: {}", path.display());
    }

    println!();
    println!("  Site created in {}", site_root.display());
    println!("  Run `quire serve {}` to start the dev server", site_root.display());
    println!();

    Ok(())
}
