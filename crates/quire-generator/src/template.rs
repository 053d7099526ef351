//! Layout template system.
//!
//! A lightweight interpolation language rather than a general template
//! engine:
//!
//! - `{{ title }}` inserts a variable (`{{ .title }}` is accepted too),
//!   `{{ author.name }}` walks nested mappings and `{{ subtitle? }}` renders
//!   nothing when the variable is absent.
//! - `{{ template "header" }}` includes another named template, rendered
//!   against the same context.
//! - `{{ define "header" }}...{{ end }}` declares a named block inside a
//!   layout file.
//! - `{{/* ... */}}` is a comment.
//!
//! Layout files are read from a single directory (subdirectories are not
//! scanned). Each file registers its top-level text under the file stem and
//! every `define` block under its own name.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use quire_core::{TemplateContext, Value, is_ignored_name};
use thiserror::Error;
use tracing::{debug, info};

/// Template loading and rendering errors.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Missing required variable.
    #[error("missing required variable `{variable}` in template `{template}`")]
    MissingVariable { template: String, variable: String },

    /// Variable holds a mapping, which has no textual form.
    #[error("variable `{variable}` in template `{template}` is a mapping and cannot be rendered")]
    NotScalar { template: String, variable: String },

    /// Template not found.
    #[error("template not found: {0}")]
    NotFound(String),

    /// Invalid template syntax.
    #[error("invalid template syntax in {origin}: {message}")]
    InvalidSyntax { origin: String, message: String },

    /// The same name is defined twice.
    #[error("template `{name}` is defined in both {first} and {second}")]
    Duplicate {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// An include names a template that does not exist.
    #[error("template `{template}` includes unknown template `{include}`")]
    UnresolvedInclude { template: String, include: String },

    /// Templates include each other in a loop.
    #[error("template include cycle: {}", .0.join(" -> "))]
    Cycle(Vec<String>),

    /// The template directory produced no templates.
    #[error("no template files found in {0}")]
    Empty(PathBuf),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for template operations.
pub type Result<T> = std::result::Result<T, TemplateError>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Text(String),
    Variable { path: String, optional: bool },
    Include(String),
}

/// A parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    name: String,
    nodes: Vec<Node>,
}

impl Template {
    /// Parse a standalone template. `define` blocks are not allowed here.
    pub fn parse(name: impl Into<String>, source: &str) -> Result<Self> {
        let name = name.into();
        let parsed = parse_source(&name, source)?;
        if !parsed.blocks.is_empty() {
            return Err(TemplateError::InvalidSyntax {
                origin: name,
                message: "`define` is only supported in layout files".to_string(),
            });
        }
        Ok(Self {
            name,
            nodes: parsed.top,
        })
    }

    /// Get the template name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Names of the templates this template includes directly.
    pub fn includes(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().filter_map(|node| match node {
            Node::Include(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Render the template with the given context.
    ///
    /// Includes fail with [`TemplateError::NotFound`]; use
    /// [`Template::render_with`] to resolve them.
    pub fn render(&self, context: &TemplateContext) -> Result<String> {
        let mut out = String::new();
        self.render_into(context, None, &mut Vec::new(), &mut out)?;
        Ok(out)
    }

    /// Render the template, resolving includes against `registry`.
    pub fn render_with(&self, context: &TemplateContext, registry: &TemplateRegistry) -> Result<String> {
        let mut out = String::new();
        self.render_into(context, Some(registry), &mut Vec::new(), &mut out)?;
        Ok(out)
    }

    fn render_into(
        &self,
        context: &TemplateContext,
        registry: Option<&TemplateRegistry>,
        stack: &mut Vec<String>,
        out: &mut String,
    ) -> Result<()> {
        stack.push(self.name.clone());

        for node in &self.nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Variable { path, optional } => match context.lookup(path) {
                    Some(value) => self.write_value(path, value, out)?,
                    None if *optional => {}
                    None => {
                        return Err(TemplateError::MissingVariable {
                            template: self.name.clone(),
                            variable: path.clone(),
                        });
                    }
                },
                Node::Include(name) => {
                    if stack.iter().any(|n| n == name) {
                        let mut chain = stack.clone();
                        chain.push(name.clone());
                        return Err(TemplateError::Cycle(chain));
                    }
                    let included = registry
                        .and_then(|r| r.get(name))
                        .ok_or_else(|| TemplateError::NotFound(name.clone()))?;
                    included.render_into(context, registry, stack, out)?;
                }
            }
        }

        stack.pop();
        Ok(())
    }

    fn write_value(&self, variable: &str, value: &Value, out: &mut String) -> Result<()> {
        match value {
            Value::Text(text) => out.push_str(text),
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.write_value(variable, item, out)?;
                }
            }
            Value::Map(_) => {
                return Err(TemplateError::NotScalar {
                    template: self.name.clone(),
                    variable: variable.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Registry of named layout templates.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, Template>,
    origins: HashMap<String, PathBuf>,
}

impl TemplateRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every file directly under `template_root`.
    ///
    /// Hidden and editor temporary files are skipped. Fails when no template
    /// is found, on syntax errors, duplicate names, unknown includes and
    /// include cycles.
    pub fn load(template_root: &Path) -> Result<Self> {
        info!(dir = %template_root.display(), "loading templates");

        let mut files = Vec::new();
        for entry in fs::read_dir(template_root)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if is_ignored_name(&entry.file_name().to_string_lossy()) {
                debug!(path = %path.display(), "skipping temporary template file");
                continue;
            }
            files.push(path);
        }
        files.sort();

        let mut registry = Self::new();
        for path in &files {
            let source = fs::read_to_string(path)?;
            registry.add_source(path, &source)?;
        }

        if registry.is_empty() {
            return Err(TemplateError::Empty(template_root.to_path_buf()));
        }

        registry.validate()?;

        info!(
            files = files.len(),
            templates = registry.len(),
            "templates loaded"
        );
        Ok(registry)
    }

    /// Parse one layout file and register its templates.
    ///
    /// Top-level text is registered under the file stem when it is not
    /// blank; each `define` block is registered under its own name.
    pub fn add_source(&mut self, path: &Path, source: &str) -> Result<()> {
        let origin = path.display().to_string();
        let parsed = parse_source(&origin, source)?;

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| origin.clone());

        let top_is_blank = parsed.top.iter().all(|node| match node {
            Node::Text(text) => text.trim().is_empty(),
            _ => false,
        });
        if !top_is_blank {
            self.insert_unique(path, Template {
                name: stem,
                nodes: parsed.top,
            })?;
        }

        for (name, nodes) in parsed.blocks {
            self.insert_unique(path, Template { name, nodes })?;
        }

        Ok(())
    }

    fn insert_unique(&mut self, path: &Path, template: Template) -> Result<()> {
        if let Some(first) = self.origins.get(&template.name) {
            return Err(TemplateError::Duplicate {
                name: template.name,
                first: first.clone(),
                second: path.to_path_buf(),
            });
        }
        debug!(name = %template.name, file = %path.display(), "registered template");
        self.origins.insert(template.name.clone(), path.to_path_buf());
        self.templates.insert(template.name.clone(), template);
        Ok(())
    }

    /// Register a template, replacing any template with the same name.
    pub fn register(&mut self, template: Template) {
        self.origins.remove(&template.name);
        self.templates.insert(template.name.clone(), template);
    }

    /// Get a template by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    /// Check if a template exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Registered names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.templates.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Check that every include resolves and that no include chain loops.
    pub fn validate(&self) -> Result<()> {
        let mut marks = HashMap::new();
        for name in self.names() {
            self.visit(name, &mut marks, &mut Vec::new())?;
        }
        Ok(())
    }

    fn visit<'a>(
        &'a self,
        name: &'a str,
        marks: &mut HashMap<&'a str, Mark>,
        path: &mut Vec<&'a str>,
    ) -> Result<()> {
        match marks.get(name) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::Visiting) => {
                let start = path.iter().position(|n| *n == name).unwrap_or(0);
                let mut chain: Vec<String> = path[start..].iter().map(ToString::to_string).collect();
                chain.push(name.to_string());
                return Err(TemplateError::Cycle(chain));
            }
            None => {}
        }

        marks.insert(name, Mark::Visiting);
        path.push(name);

        if let Some(template) = self.templates.get(name) {
            for include in template.includes() {
                if !self.templates.contains_key(include) {
                    return Err(TemplateError::UnresolvedInclude {
                        template: name.to_string(),
                        include: include.to_string(),
                    });
                }
                self.visit(include, marks, path)?;
            }
        }

        path.pop();
        marks.insert(name, Mark::Done);
        Ok(())
    }

    /// Render a named template with the given context.
    pub fn render(&self, name: &str, context: &TemplateContext) -> Result<String> {
        let template = self
            .get(name)
            .ok_or_else(|| TemplateError::NotFound(name.to_string()))?;
        template.render_with(context, self)
    }
}

#[derive(Debug, Clone, Copy)]
enum Mark {
    Visiting,
    Done,
}

struct ParsedSource {
    top: Vec<Node>,
    blocks: Vec<(String, Vec<Node>)>,
}

fn parse_source(origin: &str, source: &str) -> Result<ParsedSource> {
    let syntax = |message: String| TemplateError::InvalidSyntax {
        origin: origin.to_string(),
        message,
    };

    let mut top = Vec::new();
    let mut blocks = Vec::new();
    let mut open: Option<(String, Vec<Node>)> = None;
    let mut rest = source;

    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        let end = after
            .find("}}")
            .ok_or_else(|| syntax("unclosed {{ delimiter".to_string()))?;
        let action = after[..end].trim();

        let target = match open.as_mut() {
            Some((_, nodes)) => nodes,
            None => &mut top,
        };
        if start > 0 {
            target.push(Node::Text(rest[..start].to_string()));
        }
        rest = &after[end + 2..];

        if action.starts_with("/*") && action.ends_with("*/") {
            continue;
        }

        if let Some(args) = action.strip_prefix("define ") {
            if let Some((name, _)) = &open {
                return Err(syntax(format!("`define` nested inside `{name}`")));
            }
            let name = quoted_name(args, false)
                .ok_or_else(|| syntax(format!("malformed action `{{{{ {action} }}}}`")))?;
            open = Some((name.to_string(), Vec::new()));
        } else if action == "end" {
            let block = open
                .take()
                .ok_or_else(|| syntax("`end` without matching `define`".to_string()))?;
            blocks.push(block);
        } else if let Some(args) = action.strip_prefix("template ") {
            let name = quoted_name(args, true)
                .ok_or_else(|| syntax(format!("malformed action `{{{{ {action} }}}}`")))?;
            target.push(Node::Include(name.to_string()));
        } else {
            target.push(variable_node(action).ok_or_else(|| {
                syntax(format!("invalid variable `{{{{ {action} }}}}`"))
            })?);
        }
    }

    if let Some((name, _)) = open {
        return Err(syntax(format!("`define \"{name}\"` is missing its `end`")));
    }
    if !rest.is_empty() {
        top.push(Node::Text(rest.to_string()));
    }

    Ok(ParsedSource { top, blocks })
}

/// Parse `"name"` optionally followed by a `.` context argument.
fn quoted_name(args: &str, allow_dot: bool) -> Option<&str> {
    let args = args.trim_start().strip_prefix('"')?;
    let close = args.find('"')?;
    let name = &args[..close];
    let tail = args[close + 1..].trim();
    let tail_ok = tail.is_empty() || (allow_dot && tail == ".");
    (!name.is_empty() && tail_ok).then_some(name)
}

fn variable_node(action: &str) -> Option<Node> {
    let (path, optional) = match action.strip_suffix('?') {
        Some(stripped) => (stripped.trim_end(), true),
        None => (action, false),
    };
    let path = path.strip_prefix('.').unwrap_or(path);

    let valid = !path.is_empty()
        && path.split('.').all(|segment| {
            !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
        });

    valid.then(|| Node::Variable {
        path: path.to_string(),
        optional,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_from(files: &[(&str, &str)]) -> Result<TemplateRegistry> {
        let mut registry = TemplateRegistry::new();
        for (name, source) in files {
            registry.add_source(Path::new(name), source)?;
        }
        registry.validate()?;
        Ok(registry)
    }

    #[test]
    fn test_template_simple_render() {
        let template = Template::parse("test", "Hello, {{ name }}!").unwrap();
        let ctx = TemplateContext::new().with_var("name", "World");

        assert_eq!(template.render(&ctx).unwrap(), "Hello, World!");
    }

    #[test]
    fn test_tight_and_dotted_syntax() {
        let template = Template::parse("test", "<main>{{content}}</main>{{ .title }}").unwrap();
        let ctx = TemplateContext::new()
            .with_var("content", "<p>x</p>")
            .with_var("title", "T");

        assert_eq!(template.render(&ctx).unwrap(), "<main><p>x</p></main>T");
    }

    #[test]
    fn test_template_optional_variable() {
        let template = Template::parse("test", "Hello{{ suffix? }}!").unwrap();

        assert_eq!(template.render(&TemplateContext::new()).unwrap(), "Hello!");

        let ctx = TemplateContext::new().with_var("suffix", ", World");
        assert_eq!(template.render(&ctx).unwrap(), "Hello, World!");
    }

    #[test]
    fn test_template_missing_required_variable() {
        let template = Template::parse("test", "Hello, {{ name }}!").unwrap();
        let result = template.render(&TemplateContext::new());

        assert!(matches!(
            result,
            Err(TemplateError::MissingVariable { ref variable, .. }) if variable == "name"
        ));
    }

    #[test]
    fn test_nested_and_list_values() {
        let mut author = TemplateContext::new();
        author.insert("name", "Ada");
        let ctx = TemplateContext::new()
            .with_var("author", author)
            .with_var(
                "tags",
                Value::List(vec![Value::from("rust"), Value::from("web")]),
            );

        let template = Template::parse("t", "{{ author.name }}: {{ tags }}").unwrap();
        assert_eq!(template.render(&ctx).unwrap(), "Ada: rust, web");

        let template = Template::parse("t", "{{ author }}").unwrap();
        assert!(matches!(
            template.render(&ctx),
            Err(TemplateError::NotScalar { .. })
        ));
    }

    #[test]
    fn test_unclosed_delimiter() {
        let err = Template::parse("broken", "Hello {{ name").unwrap_err();
        assert!(matches!(err, TemplateError::InvalidSyntax { .. }));
    }

    #[test]
    fn test_invalid_variable_name() {
        assert!(Template::parse("t", "{{ }}").is_err());
        assert!(Template::parse("t", "{{ a b }}").is_err());
        assert!(Template::parse("t", "{{ a..b }}").is_err());
    }

    #[test]
    fn test_comments_are_dropped() {
        let template = Template::parse("t", "a{{/* note */}}b").unwrap();
        assert_eq!(template.render(&TemplateContext::new()).unwrap(), "ab");
    }

    #[test]
    fn test_define_not_allowed_in_standalone_template() {
        let err = Template::parse("page", "{{ define \"x\" }}x{{ end }}").unwrap_err();
        assert!(err.to_string().contains("define"));
    }

    #[test]
    fn test_file_stem_registration() {
        let registry = registry_from(&[("templates/index.html", "<main>{{content}}</main>")]).unwrap();

        assert!(registry.contains("index"));
        let ctx = TemplateContext::new().with_var("content", "<h1>Hello</h1>\n");
        assert_eq!(
            registry.render("index", &ctx).unwrap(),
            "<main><h1>Hello</h1>\n</main>"
        );
    }

    #[test]
    fn test_define_blocks_and_include() {
        let registry = registry_from(&[
            (
                "templates/partials.html",
                "{{ define \"header\" }}<header>Site</header>{{ end }}\n{{ define \"footer\" }}<footer>{{ title }}</footer>{{ end }}\n",
            ),
            (
                "templates/post.html",
                "{{ template \"header\" }}<article>{{ content }}</article>{{ template \"footer\" . }}",
            ),
        ])
        .unwrap();

        assert_eq!(registry.names(), vec!["footer", "header", "post"]);
        assert!(!registry.contains("partials"));

        let ctx = TemplateContext::new()
            .with_var("title", "Hi")
            .with_var("content", "body");
        assert_eq!(
            registry.render("post", &ctx).unwrap(),
            "<header>Site</header><article>body</article><footer>Hi</footer>"
        );
    }

    #[test]
    fn test_unresolved_include_rejected() {
        let err = registry_from(&[("templates/index.html", "{{ template \"nav\" }}")]).unwrap_err();
        match err {
            TemplateError::UnresolvedInclude { template, include } => {
                assert_eq!(template, "index");
                assert_eq!(include, "nav");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_include_cycle_rejected() {
        let err = registry_from(&[(
            "templates/loop.html",
            "{{ define \"a\" }}{{ template \"b\" }}{{ end }}{{ define \"b\" }}{{ template \"a\" }}{{ end }}",
        )])
        .unwrap_err();

        match err {
            TemplateError::Cycle(chain) => assert_eq!(chain, vec!["a", "b", "a"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_render_time_cycle_guard() {
        let mut registry = TemplateRegistry::new();
        registry.register(Template::parse("self", "{{ template \"self\" }}").unwrap());

        let err = registry.render("self", &TemplateContext::new()).unwrap_err();
        assert!(matches!(err, TemplateError::Cycle(_)));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = registry_from(&[
            ("templates/a.html", "{{ define \"nav\" }}a{{ end }}"),
            ("templates/b.html", "{{ define \"nav\" }}b{{ end }}"),
        ])
        .unwrap_err();
        assert!(matches!(err, TemplateError::Duplicate { .. }));
    }

    #[test]
    fn test_unbalanced_define() {
        assert!(registry_from(&[("t.html", "{{ define \"x\" }}open")]).is_err());
        assert!(registry_from(&[("t.html", "{{ end }}")]).is_err());
        assert!(
            registry_from(&[("t.html", "{{ define \"x\" }}{{ define \"y\" }}{{ end }}{{ end }}")])
                .is_err()
        );
    }

    #[test]
    fn test_load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "<main>{{content}}</main>").unwrap();
        fs::write(dir.path().join(".index.html.swp"), "garbage {{").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested/ignored.html"), "{{ define \"x\" }}{{ end }}").unwrap();

        let registry = TemplateRegistry::load(dir.path()).unwrap();

        assert_eq!(registry.names(), vec!["index"]);
    }

    #[test]
    fn test_load_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = TemplateRegistry::load(dir.path()).unwrap_err();
        assert!(matches!(err, TemplateError::Empty(_)));
    }

    #[test]
    fn test_load_missing_directory() {
        let err = TemplateRegistry::load(Path::new("/nonexistent/templates")).unwrap_err();
        assert!(matches!(err, TemplateError::Io(_)));
    }

    #[test]
    fn test_render_unknown_template() {
        let registry = TemplateRegistry::new();
        let result = registry.render("nonexistent", &TemplateContext::new());
        assert!(matches!(result, Err(TemplateError::NotFound(_))));
    }
}
