//! End-to-end tests for quire.
//!
//! Each test lays out a small site in a temporary directory and runs a full
//! build against it.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use quire_core::{CoreError, SiteLayout};
use quire_generator::{BuildError, Builder, PageError, TemplateError};
use tempfile::TempDir;
use walkdir::WalkDir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().expect("parent")).expect("create dirs");
    fs::write(path, content).expect("write file");
}

fn site(files: &[(&str, &str)]) -> (TempDir, SiteLayout) {
    let dir = tempfile::tempdir().expect("create temp dir");
    for (rel, content) in files {
        write(dir.path(), rel, content);
    }
    let layout = SiteLayout::from_site_root(dir.path());
    (dir, layout)
}

fn read_tree(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    WalkDir::new(root)
        .into_iter()
        .map(|e| e.expect("walk"))
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e.path().strip_prefix(root).expect("prefix").to_path_buf();
            (rel, fs::read(e.path()).expect("read"))
        })
        .collect()
}

#[test]
fn test_hello_page_through_default_layout() {
    let (dir, layout) = site(&[
        ("templates/index.html", "<main>{{content}}</main>"),
        ("pages/hello.md", "---\ntitle: Hi\n---\n# Hello"),
    ]);

    let outcome = Builder::new().build(&layout).expect("build");

    assert_eq!(outcome.documents, 1);
    let html = fs::read_to_string(dir.path().join("public/hello.html")).expect("read output");
    assert_eq!(html, "<main><h1>Hello</h1>\n</main>");
}

#[test]
fn test_full_site() {
    let (dir, layout) = site(&[
        (
            "templates/partials.html",
            "{{ define \"header\" }}<header>My Site</header>{{ end }}\n",
        ),
        (
            "templates/index.html",
            "<html><head><title>{{ .title }}</title></head><body>{{ template \"header\" . }}{{ content }}</body></html>",
        ),
        (
            "templates/post.html",
            "{{ template \"header\" }}<article><h1>{{ title }}</h1>{{ content }}<p>{{ tags? }}</p></article>",
        ),
        ("pages/index.md", "---\ntitle: Home\n---\nWelcome."),
        (
            "pages/blog/first.md",
            "---\ntitle: First\ntemplate: post\ntags: [rust, web]\n---\nSome *text*.",
        ),
        ("pages/about.html", "---\ntitle: About\n---\n<section>About us</section>"),
        (
            "pages/list.tmpl",
            "---\ntitle: List\nitems: [a, b]\n---\n<ul><li>{{ items }}</li></ul>",
        ),
        ("assets/style.css", "body {\n  color: blue;\n}\n"),
        ("assets/img/logo.svg", "<svg/>"),
    ]);

    let outcome = Builder::new().build(&layout).expect("build");

    assert_eq!(outcome.documents, 4);
    assert_eq!(outcome.assets.stylesheets, 1);
    assert_eq!(outcome.assets.copied, 1);
    assert!(outcome.asset_warning().is_none());

    let public = dir.path().join("public");
    let index = fs::read_to_string(public.join("index.html")).expect("index");
    assert_eq!(
        index,
        "<html><head><title>Home</title></head><body><header>My Site</header><p>Welcome.</p>\n</body></html>"
    );

    let post = fs::read_to_string(public.join("blog/first.html")).expect("post");
    assert!(post.starts_with("<header>My Site</header><article><h1>First</h1>"));
    assert!(post.contains("<em>text</em>"));
    assert!(post.contains("<p>rust, web</p>"));

    let about = fs::read_to_string(public.join("about.html")).expect("about");
    assert!(about.contains("<section>About us</section>"));

    let list = fs::read_to_string(public.join("list.html")).expect("list");
    assert!(list.contains("<ul><li>a, b</li></ul>"));

    assert_eq!(
        fs::read_to_string(public.join("img/logo.svg")).expect("logo"),
        "<svg/>"
    );
    let css = fs::read_to_string(public.join("style.css")).expect("css");
    assert!(css.starts_with("body{"));
}

#[test]
fn test_build_is_idempotent() {
    let (dir, layout) = site(&[
        ("templates/index.html", "<main>{{content}}</main>"),
        ("pages/a.md", "---\ntitle: A\n---\n# A"),
        ("pages/nested/b.html", "---\ntitle: B\n---\n<b>b</b>"),
        ("pages/c.tmpl", "---\ntitle: C\n---\n{{ title }}"),
        ("assets/site.css", "@import \"parts/x.css\";\n"),
        ("assets/parts/x.css", "p { margin: 0 }\n"),
    ]);
    let public = dir.path().join("public");

    Builder::new().build(&layout).expect("first build");
    let first = read_tree(&public);

    Builder::new().build(&layout).expect("second build");
    let second = read_tree(&public);

    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn test_missing_title_names_file() {
    let (_dir, layout) = site(&[
        ("templates/index.html", "<main>{{content}}</main>"),
        ("pages/untitled.md", "---\ntemplate: index\n---\nbody"),
    ]);

    let err = Builder::new().build(&layout).expect_err("build should fail");

    match err {
        BuildError::Page(PageError::Core(CoreError::MissingTitle { path })) => {
            assert!(path.ends_with("pages/untitled.md"));
        }
        other => panic!("expected MissingTitle, got {other}"),
    }
}

#[test]
fn test_unsupported_extension_names_extension() {
    let (_dir, layout) = site(&[
        ("templates/index.html", "<main>{{content}}</main>"),
        ("pages/notes.txt", "---\ntitle: Notes\n---\nplain"),
    ]);

    let err = Builder::new().build(&layout).expect_err("build should fail");

    match err {
        BuildError::Page(PageError::Core(CoreError::UnsupportedContentType { extension, .. })) => {
            assert_eq!(extension, ".txt");
        }
        other => panic!("expected UnsupportedContentType, got {other}"),
    }
}

#[test]
fn test_missing_template_cited() {
    let (_dir, layout) = site(&[
        ("templates/index.html", "<main>{{content}}</main>"),
        ("pages/post.md", "---\ntitle: Post\ntemplate: post\n---\nbody"),
    ]);

    let err = Builder::new().build(&layout).expect_err("build should fail");

    assert!(matches!(
        &err,
        BuildError::Page(PageError::TemplateNotFound { template, .. }) if template == "post"
    ));
    assert!(err.to_string().contains("`post`"));
}

#[test]
fn test_unresolved_include_fails_load() {
    let (_dir, layout) = site(&[
        ("templates/index.html", "{{ template \"nav\" }}{{content}}"),
        ("pages/a.md", "---\ntitle: A\n---\nbody"),
    ]);

    let err = Builder::new().build(&layout).expect_err("build should fail");

    assert!(matches!(
        err,
        BuildError::TemplateLoad {
            source: TemplateError::UnresolvedInclude { .. },
            ..
        }
    ));
}

#[test]
fn test_malformed_front_matter() {
    let (dir, layout) = site(&[
        ("templates/index.html", "<main>{{content}}</main>"),
        ("pages/broken.md", "---\ntitle: Broken\n# never closed\n"),
    ]);

    let err = Builder::new().build(&layout).expect_err("build should fail");

    assert!(matches!(
        err,
        BuildError::Page(PageError::Core(CoreError::MalformedFrontMatter { .. }))
    ));
    assert!(!dir.path().join("public/broken.html").exists());
}

#[test]
fn test_output_override() {
    let (dir, layout) = site(&[
        ("templates/index.html", "<main>{{content}}</main>"),
        ("pages/index.md", "---\ntitle: Home\n---\nhome"),
    ]);
    let layout = layout.with_output_root(dir.path().join("dist"));

    Builder::new().build(&layout).expect("build");

    assert!(dir.path().join("dist/index.html").is_file());
    assert!(!dir.path().join("public").exists());
}
