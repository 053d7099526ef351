//! Template context values.
//!
//! Front matter is decoded into an insertion-ordered, string-keyed mapping
//! whose values are either text, lists or nested mappings. Every later stage
//! (document body templates, layouts) reads from this one representation.

use indexmap::IndexMap;

/// A value stored in a [`TemplateContext`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Scalar rendered verbatim.
    Text(String),
    /// Sequence of values.
    List(Vec<Value>),
    /// Nested mapping.
    Map(TemplateContext),
}

impl Value {
    /// Borrow the value as text when it is a scalar.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Convert a decoded YAML value.
    ///
    /// Booleans and numbers keep their display form, `null` becomes an empty
    /// string and tags are dropped in favour of the tagged value.
    pub fn from_yaml(value: serde_yaml::Value) -> Self {
        match value {
            serde_yaml::Value::Sequence(items) => {
                Self::List(items.into_iter().map(Self::from_yaml).collect())
            }
            serde_yaml::Value::Mapping(mapping) => Self::Map(TemplateContext::from_yaml(mapping)),
            serde_yaml::Value::Tagged(tagged) => Self::from_yaml(tagged.value),
            scalar => Self::Text(scalar_to_string(&scalar)),
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<TemplateContext> for Value {
    fn from(map: TemplateContext) -> Self {
        Self::Map(map)
    }
}

/// Ordered variables available to a template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateContext {
    variables: IndexMap<String, Value>,
}

impl TemplateContext {
    /// Create a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context from a YAML mapping, stringifying non-string keys.
    pub fn from_yaml(mapping: serde_yaml::Mapping) -> Self {
        let variables = mapping
            .into_iter()
            .map(|(key, value)| (scalar_to_string(&key), Value::from_yaml(value)))
            .collect();
        Self { variables }
    }

    /// Insert a variable, returning the previous value for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.variables.insert(key.into(), value.into())
    }

    /// Create context with an additional variable.
    #[must_use]
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Get a top-level variable.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.variables.get(key)
    }

    /// Get a top-level variable as text.
    #[must_use]
    pub fn get_text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_text)
    }

    /// Resolve a dotted path such as `author.name` through nested mappings.
    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.get(segments.next()?)?;
        for segment in segments {
            match current {
                Value::Map(map) => current = map.get(segment)?,
                _ => return None,
            }
        }
        Some(current)
    }

    /// Check if a variable exists.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.variables.contains_key(key)
    }

    /// Number of top-level variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// Whether the context has no variables.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Iterate over variables in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.variables.iter().map(|(k, v)| (k.as_str(), v))
    }
}

fn scalar_to_string(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::Null => String::new(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}
