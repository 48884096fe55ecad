//! Django-inspired template engine used to render the page.
//!
//! Workflow:
//! 1. `render_template` loads the requested template from the template directory.
//! 2. `tokenize_template` splits content into Text, Variable, and Tag tokens.
//! 3. `parse_tokens` and `parse_nodes` build an AST of `Node`.
//! 4. Child `Block` definitions and the `Extends` tag are collected.
//! 5. `merge_blocks` merges child blocks into the base template by name.
//! 6. `expand_includes` splices `{% include %}` partials into the tree.
//! 7. `render_nodes` walks the AST and outputs HTML, resolving variables
//!    (escaped unless marked `|safe`), `if` conditions and `for` loops.
//!
//! Runtime logging is controlled via `set_display_logs`.

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{Error, Result};
use crate::router::Response;

/// Global switch for enabling/disabling internal template logs
static DISPLAY_LOGS: Lazy<AtomicBool> = Lazy::new(|| AtomicBool::new(false));

static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)(\{\{.*?\}\}|\{%.*?%\})").expect("token pattern is valid"));

/// Deepest chain of nested `{% include %}` tags followed before giving up.
const MAX_INCLUDE_DEPTH: usize = 8;

/// Enable or disable internal debug logs for the template engine
pub fn set_display_logs(enabled: bool) {
    DISPLAY_LOGS.store(enabled, Ordering::Relaxed);
}

/// Internal debug: logs only if DISPLAY_LOGS is true
macro_rules! tdebug {
    ($($arg:tt)+) => {
        if DISPLAY_LOGS.load(Ordering::Relaxed) {
            debug!($($arg)+);
        }
    }
}

/// Supported value types for template context
#[derive(Clone, Debug, PartialEq)]
pub enum TemplateValue {
    String(String),
    Bool(bool),
    Number(f64),
    List(Vec<TemplateValue>),
    Object(HashMap<String, TemplateValue>),
}

/// Variables available to a render.
pub type Context = HashMap<String, TemplateValue>;

impl TemplateValue {
    /// Convert the value to a string for rendering
    pub fn as_string(&self) -> String {
        match self {
            TemplateValue::String(s) => s.clone(),
            TemplateValue::Bool(b) => b.to_string(),
            TemplateValue::Number(n) => n.to_string(),
            TemplateValue::List(_) | TemplateValue::Object(_) => String::new(),
        }
    }

    /// Whether `{% if %}` takes its `then` branch for this value.
    pub fn is_truthy(&self) -> bool {
        match self {
            TemplateValue::String(s) => !s.is_empty(),
            TemplateValue::Bool(b) => *b,
            TemplateValue::Number(n) => *n != 0.0,
            TemplateValue::List(items) => !items.is_empty(),
            TemplateValue::Object(_) => true,
        }
    }

    /// Build an object value from `(key, value)` pairs.
    pub fn object<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<TemplateValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        TemplateValue::Object(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl fmt::Display for TemplateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

impl From<&str> for TemplateValue {
    fn from(s: &str) -> Self {
        TemplateValue::String(s.to_string())
    }
}

impl From<String> for TemplateValue {
    fn from(s: String) -> Self {
        TemplateValue::String(s)
    }
}

impl From<bool> for TemplateValue {
    fn from(b: bool) -> Self {
        TemplateValue::Bool(b)
    }
}

impl From<u32> for TemplateValue {
    fn from(n: u32) -> Self {
        TemplateValue::Number(f64::from(n))
    }
}

impl<T: Into<TemplateValue>> From<Vec<T>> for TemplateValue {
    fn from(items: Vec<T>) -> Self {
        TemplateValue::List(items.into_iter().map(Into::into).collect())
    }
}

/// Token types extracted from the template
#[derive(Debug, Clone)]
pub enum Token {
    Text(String),     // Plain text
    Variable(String), // {{ variable }}
    Tag(String),      // {% tag %}
}

/// AST node types for the template engine
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    Variable(String),
    If {
        condition: String,
        then_body: Vec<Node>,
        else_body: Vec<Node>,
    },
    For {
        var_name: String,
        list_name: String,
        body: Vec<Node>,
    },
    Block {
        name: String,
        body: Vec<Node>,
    },
    Extends(String), // {% extends "base.html" %}
    Include(String), // {% include "partials/footer.html" %}
}

/// Escape the characters that are significant in HTML text and attributes.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
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

/// Tokenizes the template content into a Vec<Token>
pub fn tokenize_template(content: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut last_end = 0;
    for mat in TOKEN_RE.find_iter(content) {
        let start = mat.start();
        let end = mat.end();
        if start > last_end {
            tokens.push(Token::Text(content[last_end..start].to_string()));
        }
        let m = mat.as_str().trim();
        if m.starts_with("{{") {
            let inner = m
                .trim_start_matches("{{")
                .trim_end_matches("}}")
                .trim()
                .to_string();
            tdebug!("tokenize: Variable '{{ {{ {} }} }}'", inner);
            tokens.push(Token::Variable(inner));
        } else {
            let inner = m
                .trim_start_matches("{%")
                .trim_end_matches("%}")
                .trim()
                .to_string();
            tdebug!("tokenize: Tag '{{% {} %}}'", inner);
            tokens.push(Token::Tag(inner));
        }
        last_end = end;
    }
    if last_end < content.len() {
        tokens.push(Token::Text(content[last_end..].to_string()));
    }
    tokens
}

/// Parses a sequence of Token into an AST of Node
pub fn parse_tokens(tokens: &[Token]) -> Vec<Node> {
    let mut idx = 0;
    parse_nodes(tokens, &mut idx, &[])
}

/// Recursive parser: consumes tokens until an `end_tag` is found
fn parse_nodes(tokens: &[Token], idx: &mut usize, end_tags: &[&str]) -> Vec<Node> {
    let mut nodes = Vec::new();
    while *idx < tokens.len() {
        match &tokens[*idx] {
            Token::Text(t) => {
                nodes.push(Node::Text(t.clone()));
                *idx += 1;
            }
            Token::Variable(v) => {
                nodes.push(Node::Variable(v.clone()));
                *idx += 1;
            }
            Token::Tag(tag) => {
                let t = tag.trim();
                if end_tags.contains(&t) {
                    break;
                }
                if let Some(rest) = t.strip_prefix("extends ") {
                    nodes.push(Node::Extends(rest.trim().trim_matches('"').to_string()));
                    *idx += 1;
                    continue;
                }
                if let Some(rest) = t.strip_prefix("include ") {
                    nodes.push(Node::Include(rest.trim().trim_matches('"').to_string()));
                    *idx += 1;
                    continue;
                }
                if let Some(name) = t.strip_prefix("block ") {
                    *idx += 1;
                    let body = parse_nodes(tokens, idx, &["endblock"]);
                    *idx += 1; // skip endblock
                    nodes.push(Node::Block {
                        name: name.trim().to_string(),
                        body,
                    });
                    continue;
                }
                if let Some(cond) = t.strip_prefix("if ") {
                    *idx += 1;
                    let then_body = parse_nodes(tokens, idx, &["else", "endif"]);
                    let mut else_body = Vec::new();
                    if let Some(Token::Tag(tt)) = tokens.get(*idx) {
                        if tt.trim() == "else" {
                            *idx += 1;
                            else_body = parse_nodes(tokens, idx, &["endif"]);
                        }
                    }
                    *idx += 1; // skip endif
                    nodes.push(Node::If {
                        condition: cond.trim().to_string(),
                        then_body,
                        else_body,
                    });
                    continue;
                }
                if let Some(rest) = t.strip_prefix("for ") {
                    let parts: Vec<&str> = rest.split_whitespace().collect();
                    if parts.len() == 3 && parts[1] == "in" {
                        *idx += 1;
                        let body = parse_nodes(tokens, idx, &["endfor"]);
                        *idx += 1; // skip endfor
                        nodes.push(Node::For {
                            var_name: parts[0].to_string(),
                            list_name: parts[2].to_string(),
                            body,
                        });
                        continue;
                    }
                }
                tdebug!("parse: skipping unknown tag '{}'", t);
                *idx += 1;
            }
        }
    }
    nodes
}

/// Resolves a dotted variable path 'a.b.c' within the context
fn resolve_variable<'a>(name: &str, context: &'a Context) -> Option<&'a TemplateValue> {
    let mut current: Option<&TemplateValue> = None;
    for (i, key) in name.split('.').enumerate() {
        if i == 0 {
            current = context.get(key);
        } else if let Some(TemplateValue::Object(map)) = current {
            current = map.get(key);
        } else {
            return None;
        }
    }
    current
}

/// Evaluates an `if` condition: a variable path, optionally prefixed by `not`.
fn evaluate_condition(condition: &str, context: &Context) -> bool {
    match condition.strip_prefix("not ") {
        Some(inner) => !evaluate_condition(inner.trim(), context),
        None => resolve_variable(condition, context).is_some_and(TemplateValue::is_truthy),
    }
}

/// Merges child blocks into base AST by matching block names
fn merge_blocks(nodes: &[Node], child_blocks: &HashMap<String, Vec<Node>>) -> Vec<Node> {
    nodes
        .iter()
        .map(|node| match node {
            Node::Block { name, body } => {
                if let Some(child) = child_blocks.get(name) {
                    Node::Block {
                        name: name.clone(),
                        body: child.clone(),
                    }
                } else {
                    Node::Block {
                        name: name.clone(),
                        body: merge_blocks(body, child_blocks),
                    }
                }
            }
            Node::If {
                condition,
                then_body,
                else_body,
            } => Node::If {
                condition: condition.clone(),
                then_body: merge_blocks(then_body, child_blocks),
                else_body: merge_blocks(else_body, child_blocks),
            },
            Node::For {
                var_name,
                list_name,
                body,
            } => Node::For {
                var_name: var_name.clone(),
                list_name: list_name.clone(),
                body: merge_blocks(body, child_blocks),
            },
            other => other.clone(),
        })
        .collect()
}

fn read_template(dir: &Path, name: &str) -> Result<Vec<Node>> {
    let path = dir.join(name);
    let content =
        std::fs::read_to_string(&path).map_err(|_| Error::TemplateNotFound(name.to_string()))?;
    Ok(parse_tokens(&tokenize_template(&content)))
}

/// Replaces every `Include` node with the parsed partial it names.
pub fn expand_includes(nodes: Vec<Node>, dir: &Path, depth: usize) -> Result<Vec<Node>> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Node::Include(name) => {
                if depth >= MAX_INCLUDE_DEPTH {
                    log::warn!("Include depth limit reached at '{}'", name);
                    continue;
                }
                let partial = read_template(dir, &name)?;
                out.extend(expand_includes(partial, dir, depth + 1)?);
            }
            Node::Block { name, body } => out.push(Node::Block {
                name,
                body: expand_includes(body, dir, depth)?,
            }),
            Node::If {
                condition,
                then_body,
                else_body,
            } => out.push(Node::If {
                condition,
                then_body: expand_includes(then_body, dir, depth)?,
                else_body: expand_includes(else_body, dir, depth)?,
            }),
            Node::For {
                var_name,
                list_name,
                body,
            } => out.push(Node::For {
                var_name,
                list_name,
                body: expand_includes(body, dir, depth)?,
            }),
            other => out.push(other),
        }
    }
    Ok(out)
}

/// Renders the AST into HTML string using the context
pub fn render_nodes(nodes: &[Node], context: &Context) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            Node::Text(t) => out.push_str(t),
            Node::Variable(expr) => {
                let (name, safe) = match expr.split_once('|') {
                    Some((name, filter)) => (name.trim(), filter.trim() == "safe"),
                    None => (expr.as_str(), false),
                };
                if let Some(val) = resolve_variable(name, context) {
                    if safe {
                        out.push_str(&val.as_string());
                    } else {
                        out.push_str(&escape_html(&val.as_string()));
                    }
                }
            }
            Node::If {
                condition,
                then_body,
                else_body,
            } => {
                if evaluate_condition(condition, context) {
                    out.push_str(&render_nodes(then_body, context));
                } else {
                    out.push_str(&render_nodes(else_body, context));
                }
            }
            Node::For {
                var_name,
                list_name,
                body,
            } => {
                if let Some(TemplateValue::List(items)) = resolve_variable(list_name, context) {
                    for item in items {
                        let mut local = context.clone();
                        local.insert(var_name.clone(), item.clone());
                        out.push_str(&render_nodes(body, &local));
                    }
                }
            }
            Node::Block { body, .. } => {
                out.push_str(&render_nodes(body, context));
            }
            Node::Extends(_) | Node::Include(_) => {}
        }
    }
    out
}

/// Loads `name` from `dir`, resolves `extends` and `include`, and returns the AST.
pub fn load_template(dir: impl AsRef<Path>, name: &str) -> Result<Vec<Node>> {
    let dir = dir.as_ref();
    let child_nodes = read_template(dir, name)?;
    tdebug!("Child AST: {:?}", child_nodes);

    let mut child_blocks = HashMap::new();
    let mut base_t: Option<String> = None;
    for node in &child_nodes {
        if let Node::Extends(b) = node {
            base_t = Some(b.clone());
        }
        if let Node::Block { name, body } = node {
            child_blocks.insert(name.clone(), body.clone());
        }
    }

    let merged = match base_t {
        Some(base) => {
            let base_nodes = read_template(dir, &base)?;
            tdebug!("Base AST: {:?}", base_nodes);
            merge_blocks(&base_nodes, &child_blocks)
        }
        None => merge_blocks(&child_nodes, &child_blocks),
    };
    tdebug!("Merged AST: {:?}", merged);

    expand_includes(merged, dir, 0)
}

/// Main entry: loads the template from `dir`, merges with its base, and renders HTML
pub fn render_template(dir: impl AsRef<Path>, template_name: &str, context: &Context) -> Response {
    match load_template(dir, template_name) {
        Ok(nodes) => Response::html(render_nodes(&nodes, context)),
        Err(e) => {
            log::error!("Template render failed: {}", e);
            let mut response = Response::html(escape_html(&e.to_string()));
            response.status_code = 404;
            response
        }
    }
}
