//! HTML page templates.
//!
//! A small Handlebars-style syntax, covering what the drive pages need:
//!
//! - `{{name}}` expands HTML-escaped, `{{{name}}}` expands raw
//! - `{{#if name}}...{{else}}...{{/if}}` and `{{#unless name}}...{{/unless}}`
//! - `{{#each list}}...{{/each}}`, where object fields, `this`, `@index`,
//!   `@first` and `@last` are visible inside the body
//!
//! ```
//! use wasabi_drive::template::{render, TemplateContext};
//!
//! let context = TemplateContext::new().with("name", "<World>");
//! let html = render("<p>Hello, {{name}}!</p>", &context).unwrap();
//! assert_eq!(html, "<p>Hello, &lt;World&gt;!</p>");
//! ```

mod loader;
mod parser;
mod renderer;

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

pub use loader::TemplateLoader;
pub use parser::{Node, Parser};
pub use renderer::{escape_html, Renderer};

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Render error: {0}")]
    Render(String),
}

pub type Result<T> = std::result::Result<T, TemplateError>;

/// Data visible to a page.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Number(i64),
    Bool(bool),
    List(Vec<Value>),
    Object(HashMap<String, Value>),
    Null,
}

impl Value {
    /// Text written for `{{name}}`. Lists and objects write nothing.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::List(_) | Value::Object(_) | Value::Null => String::new(),
        }
    }

    /// Whether `{{#if}}` takes its first branch.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::String(s) => !s.is_empty(),
            Value::Number(n) => *n != 0,
            Value::Bool(b) => *b,
            Value::List(items) => !items.is_empty(),
            Value::Object(fields) => !fields.is_empty(),
            Value::Null => false,
        }
    }

    /// Convert a serializable view record, such as a listing row.
    pub fn from_serialize<T: Serialize>(value: &T) -> Result<Self> {
        serde_json::to_value(value)
            .map(Value::from)
            .map_err(|e| TemplateError::Render(format!("Failed to convert value: {e}")))
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Number(i),
                None => Value::String(n.to_string()),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

/// Named values for one render.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    variables: HashMap<String, Value>,
}

impl TemplateContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.variables.insert(name.into(), value.into());
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }
}

/// Parse and render a page in one step.
pub fn render(content: &str, context: &TemplateContext) -> Result<String> {
    let nodes = Parser::new(content).parse()?;
    Renderer::new(context).render(&nodes)
}
