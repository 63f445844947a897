//! View rendering.
//!
//! # Responsibilities
//! - Interpret a view's instruction tree against a state snapshot
//! - Produce the full markup string and the handler table for that markup
//!
//! # Design Decisions
//! - Pure: (view, state, options) → markup; no surface access here
//! - Names resolve against state first, then loop locals (innermost first)
//! - `{each}` bodies are concatenated with no separator
//! - Handler attributes are replaced by an index into the handler table,
//!   which is rebuilt on every render together with the markup

use serde_json::Value;
use thiserror::Error;

use crate::compiler::ast::{Node, ViewBlock};
use crate::compiler::{Action, EvalError, Scope, Span};
use crate::reactive::state::State;
use crate::reactive::value::{is_truthy, to_display};

#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    /// HTML-escape interpolated values.
    pub escape_html: bool,
    /// Attribute prefix for rendered handlers, e.g. `data-on-` → `data-on-click="0"`.
    pub handler_attribute_prefix: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            escape_html: false,
            handler_attribute_prefix: "data-on-".to_string(),
        }
    }
}

/// A rendered handler: its actions plus the loop locals in scope where it appeared.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerBinding {
    pub event: String,
    pub actions: Vec<Action>,
    pub locals: Vec<(String, Value)>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rendered {
    pub markup: String,
    pub handlers: Vec<HandlerBinding>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    #[error("{span}: {source}")]
    Eval { source: EvalError, span: Span },

    #[error("{span}: `{collection}` is not an array")]
    NotIterable { collection: String, span: Span },
}

/// State first, then locals from innermost outwards.
pub(crate) struct LayeredScope<'a> {
    pub state: &'a State,
    pub locals: &'a [(String, Value)],
}

impl Scope for LayeredScope<'_> {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.state.get(name).cloned().or_else(|| {
            self.locals
                .iter()
                .rev()
                .find(|(local, _)| local == name)
                .map(|(_, value)| value.clone())
        })
    }
}

pub fn render(
    view: &ViewBlock,
    state: &State,
    options: &RenderOptions,
) -> Result<Rendered, RenderError> {
    let mut renderer = Renderer {
        state,
        options,
        locals: Vec::new(),
        out: Rendered::default(),
    };
    renderer.nodes(&view.nodes)?;
    Ok(renderer.out)
}

struct Renderer<'a> {
    state: &'a State,
    options: &'a RenderOptions,
    locals: Vec<(String, Value)>,
    out: Rendered,
}

impl Renderer<'_> {
    fn nodes(&mut self, nodes: &[Node]) -> Result<(), RenderError> {
        for node in nodes {
            match node {
                Node::Text { text } => self.out.markup.push_str(text),
                Node::Interpolation(interp) => {
                    let scope = LayeredScope {
                        state: self.state,
                        locals: &self.locals,
                    };
                    let value = interp.expr.eval(&scope).map_err(|source| RenderError::Eval {
                        source,
                        span: interp.span,
                    })?;
                    let text = to_display(&value);
                    if self.options.escape_html {
                        push_escaped(&mut self.out.markup, &text);
                    } else {
                        self.out.markup.push_str(&text);
                    }
                }
                Node::Each(block) => {
                    let Some(Value::Array(items)) = self.state.get(&block.collection) else {
                        return Err(RenderError::NotIterable {
                            collection: block.collection.clone(),
                            span: block.span,
                        });
                    };
                    for item in items {
                        self.locals.push((block.item.clone(), item.clone()));
                        let result = self.nodes(&block.body);
                        self.locals.pop();
                        result?;
                    }
                }
                Node::If(block) => {
                    if self.state.get(&block.key).is_some_and(is_truthy) {
                        self.nodes(&block.body)?;
                    }
                }
                Node::Handler(handler) => {
                    let index = self.out.handlers.len();
                    self.out.handlers.push(HandlerBinding {
                        event: handler.event.clone(),
                        actions: handler.actions.clone(),
                        locals: self.locals.clone(),
                    });
                    self.out.markup.push_str(&format!(
                        "{}{}=\"{}\"",
                        self.options.handler_attribute_prefix, handler.event, index
                    ));
                }
            }
        }
        Ok(())
    }
}

fn push_escaped(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
}
