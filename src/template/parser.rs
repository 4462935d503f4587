//! Turns page text into a tree of [`Node`]s.

use super::{Result, TemplateError};

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    /// `{{name}}`, or `{{{name}}}` when `raw`.
    Variable { name: String, raw: bool },
    If {
        condition: String,
        then_branch: Vec<Node>,
        else_branch: Vec<Node>,
    },
    Unless { condition: String, body: Vec<Node> },
    Each { list: String, body: Vec<Node> },
}

/// Where a run of nodes stopped.
#[derive(Debug, PartialEq)]
enum Stop {
    End,
    Else,
    Close(String),
}

pub struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    pub fn parse(mut self) -> Result<Vec<Node>> {
        let (nodes, stop) = self.parse_nodes()?;
        match stop {
            Stop::End => Ok(nodes),
            Stop::Else => Err(TemplateError::Parse("{{else}} outside a block".to_string())),
            Stop::Close(tag) => Err(TemplateError::Parse(format!("Unopened {{{{/{tag}}}}}"))),
        }
    }

    /// Nodes up to the end of input, an `{{else}}` or a closing tag.
    fn parse_nodes(&mut self) -> Result<(Vec<Node>, Stop)> {
        let mut nodes = Vec::new();

        loop {
            let rest = self.rest();
            let Some(open) = rest.find("{{") else {
                if !rest.is_empty() {
                    nodes.push(Node::Text(rest.to_string()));
                }
                self.pos = self.input.len();
                return Ok((nodes, Stop::End));
            };
            if open > 0 {
                nodes.push(Node::Text(rest[..open].to_string()));
            }
            self.pos += open;

            if self.rest().starts_with("{{{") {
                self.pos += 3;
                let name = self.tag_body("}}}")?;
                nodes.push(Node::Variable { name, raw: true });
                continue;
            }

            self.pos += 2;
            let tag = self.tag_body("}}")?;
            if let Some(block) = tag.strip_prefix('#') {
                nodes.push(self.parse_block(block.trim())?);
            } else if let Some(closing) = tag.strip_prefix('/') {
                return Ok((nodes, Stop::Close(closing.trim().to_string())));
            } else if tag == "else" {
                return Ok((nodes, Stop::Else));
            } else {
                nodes.push(Node::Variable {
                    name: check_name(&tag)?,
                    raw: false,
                });
            }
        }
    }

    fn parse_block(&mut self, header: &str) -> Result<Node> {
        let (keyword, argument) = header
            .split_once(char::is_whitespace)
            .ok_or_else(|| TemplateError::Parse(format!("Block '{header}' needs an argument")))?;
        let argument = check_name(argument.trim())?;

        let (body, stop) = self.parse_nodes()?;
        match keyword {
            "if" => {
                let else_branch = match stop {
                    Stop::Else => {
                        let (else_branch, stop) = self.parse_nodes()?;
                        expect_close(stop, "if")?;
                        else_branch
                    }
                    stop => {
                        expect_close(stop, "if")?;
                        Vec::new()
                    }
                };
                Ok(Node::If {
                    condition: argument,
                    then_branch: body,
                    else_branch,
                })
            }
            "unless" => {
                expect_close(stop, "unless")?;
                Ok(Node::Unless {
                    condition: argument,
                    body,
                })
            }
            "each" => {
                expect_close(stop, "each")?;
                Ok(Node::Each { list: argument, body })
            }
            other => Err(TemplateError::Parse(format!("Unknown block tag: {other}"))),
        }
    }

    /// Text up to `close`, trimmed, with `close` consumed.
    fn tag_body(&mut self, close: &str) -> Result<String> {
        let rest = self.rest();
        let end = rest
            .find(close)
            .ok_or_else(|| TemplateError::Parse(format!("Expected '{close}'")))?;
        let body = rest[..end].trim().to_string();
        self.pos += end + close.len();
        Ok(body)
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }
}

fn check_name(name: &str) -> Result<String> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '@'));
    if valid {
        Ok(name.to_string())
    } else {
        Err(TemplateError::Parse(format!("Invalid name '{name}'")))
    }
}

fn expect_close(stop: Stop, tag: &str) -> Result<()> {
    match stop {
        Stop::Close(found) if found == tag => Ok(()),
        Stop::Close(found) => Err(TemplateError::Parse(format!(
            "Expected {{{{/{tag}}}}} but found {{{{/{found}}}}}"
        ))),
        Stop::Else => Err(TemplateError::Parse(format!("{{{{else}}}} inside {tag}"))),
        Stop::End => Err(TemplateError::Parse(format!("Unclosed {{{{#{tag}}}}}"))),
    }
}
