//! Instruction tree produced by the compiler.
//!
//! A [`ComponentDecl`] is the component definition: instances are created
//! from it directly and its [`ViewBlock`] is interpreted by the renderer.

use serde::Serialize;

use crate::compiler::error::Span;
use crate::compiler::expr::Expr;
use crate::compiler::handler::Action;
use crate::routing::Fragment;

/// All components declared in one template source, in source order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Program {
    pub components: Vec<ComponentDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentDecl {
    pub name: String,
    pub route: Option<RouteDecl>,
    /// Initializers, evaluated once per instance in declaration order.
    pub states: Vec<StateDecl>,
    pub view: ViewBlock,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteDecl {
    pub fragment: Fragment,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateDecl {
    pub name: String,
    pub init: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewBlock {
    pub nodes: Vec<Node>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Text { text: String },
    Interpolation(Interpolation),
    Each(EachBlock),
    If(IfBlock),
    Handler(HandlerAttr),
}

/// `${expr}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interpolation {
    pub expr: Expr,
    pub span: Span,
}

/// `{each collection as item} ... {endeach}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EachBlock {
    pub collection: String,
    pub item: String,
    pub body: Vec<Node>,
    pub span: Span,
}

/// `{if key} ... {endif}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IfBlock {
    pub key: String,
    pub body: Vec<Node>,
    pub span: Span,
}

/// `on<event>="code"` inside view markup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandlerAttr {
    /// Lowercased event name without the `on` prefix.
    pub event: String,
    pub source: String,
    pub actions: Vec<Action>,
    pub span: Span,
}

impl ComponentDecl {
    /// Every handler attribute in the view, in document order.
    pub fn handlers(&self) -> Vec<&HandlerAttr> {
        fn walk<'a>(nodes: &'a [Node], out: &mut Vec<&'a HandlerAttr>) {
            for node in nodes {
                match node {
                    Node::Handler(handler) => out.push(handler),
                    Node::Each(block) => walk(&block.body, out),
                    Node::If(block) => walk(&block.body, out),
                    Node::Text { .. } | Node::Interpolation(_) => {}
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.view.nodes, &mut out);
        out
    }
}
