//! Writes a parsed page out against a [`TemplateContext`].

use super::parser::Node;
use super::{Result, TemplateContext, TemplateError, Value};

/// Escape text for HTML element content and attribute values.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

pub struct Renderer<'a> {
    context: &'a TemplateContext,
}

impl<'a> Renderer<'a> {
    pub fn new(context: &'a TemplateContext) -> Self {
        Self { context }
    }

    pub fn render(&self, nodes: &[Node]) -> Result<String> {
        let mut out = String::new();
        self.write(nodes, &mut out)?;
        Ok(out)
    }

    fn write(&self, nodes: &[Node], out: &mut String) -> Result<()> {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Variable { name, raw } => {
                    // Missing names write nothing
                    let text = self.lookup(name).map(Value::to_display_string).unwrap_or_default();
                    if *raw {
                        out.push_str(&text);
                    } else {
                        out.push_str(&escape_html(&text));
                    }
                }
                Node::If {
                    condition,
                    then_branch,
                    else_branch,
                } => {
                    let branch = if self.truthy(condition) { then_branch } else { else_branch };
                    self.write(branch, out)?;
                }
                Node::Unless { condition, body } => {
                    if !self.truthy(condition) {
                        self.write(body, out)?;
                    }
                }
                Node::Each { list, body } => self.write_each(list, body, out)?,
            }
        }
        Ok(())
    }

    fn lookup(&self, name: &str) -> Option<&'a Value> {
        self.context.get(name)
    }

    fn truthy(&self, name: &str) -> bool {
        self.lookup(name).is_some_and(Value::is_truthy)
    }

    fn write_each(&self, list: &str, body: &[Node], out: &mut String) -> Result<()> {
        let items = match self.lookup(list) {
            Some(Value::List(items)) => items,
            Some(Value::Null) | None => return Ok(()),
            Some(_) => return Err(TemplateError::Render(format!("'{list}' is not a list"))),
        };

        for (index, item) in items.iter().enumerate() {
            let mut scope = self.context.clone();
            scope.set("this", item.clone());
            scope.set("@index", index as i64);
            scope.set("@first", index == 0);
            scope.set("@last", index + 1 == items.len());
            if let Value::Object(fields) = item {
                for (key, value) in fields {
                    scope.set(key.clone(), value.clone());
                }
            }
            Renderer::new(&scope).write(body, out)?;
        }
        Ok(())
    }
}
