//! Recursive-descent parser for template sources.
//!
//! # Responsibilities
//! - Parse `component Name { route, state..., view { ... } }` declarations
//! - Scan view markup, splitting out interpolations, blocks and handlers
//! - Enforce the structural rules of a component body
//!
//! # Design Decisions
//! - Declarations are tokenized; view markup is scanned raw so arbitrary
//!   text survives untouched
//! - Unrelated `{`/`}` pairs inside markup are balanced and kept as text
//! - The view block must be the last member of its component

use crate::compiler::ast::{
    ComponentDecl, EachBlock, HandlerAttr, IfBlock, Interpolation, Node, Program, RouteDecl,
    StateDecl, ViewBlock,
};
use crate::compiler::error::{CompileError, Span};
use crate::compiler::expr::parse_expression;
use crate::compiler::handler::HandlerSyntax;
use crate::compiler::lexer::{is_ident_continue, is_ident_start, Lexer, Token};
use crate::routing::Fragment;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    View,
    Each,
    If,
}

impl Block {
    fn name(self) -> &'static str {
        match self {
            Block::View => "view",
            Block::Each => "each",
            Block::If => "if",
        }
    }
}

pub struct Parser<'s, 'h> {
    lexer: Lexer<'s>,
    handlers: &'h dyn HandlerSyntax,
}

impl<'s, 'h> Parser<'s, 'h> {
    pub fn new(source: &'s str, handlers: &'h dyn HandlerSyntax) -> Self {
        Self {
            lexer: Lexer::new(source),
            handlers,
        }
    }

    pub fn parse_program(mut self) -> Result<Program, CompileError> {
        let mut components = Vec::new();
        loop {
            let next = self.lexer.peek()?;
            if next.token == Token::Eof {
                break;
            }
            if !next.token.is_ident("component") {
                let next = next.clone();
                return Err(CompileError::expected("`component`", next.token, next.span));
            }
            components.push(self.parse_component()?);
        }
        Ok(Program { components })
    }

    fn parse_component(&mut self) -> Result<ComponentDecl, CompileError> {
        let span = self.lexer.next()?.span;
        let (name, _) = self.lexer.expect_ident("component name")?;
        self.lexer.expect_punct("{")?;

        let mut route: Option<RouteDecl> = None;
        let mut states = Vec::new();
        let mut view: Option<ViewBlock> = None;

        loop {
            let next = self.lexer.next()?;
            match next.token {
                Token::Punct("}") => break,
                Token::Eof => {
                    return Err(CompileError::Unterminated {
                        block: "component",
                        span,
                    })
                }
                Token::Ident(kw) if kw == "view" => {
                    if view.is_some() {
                        return Err(CompileError::DuplicateView {
                            component: name,
                            span: next.span,
                        });
                    }
                    view = Some(self.parse_view(next.span)?);
                }
                Token::Ident(kw) if view.is_some() && (kw == "route" || kw == "state") => {
                    return Err(CompileError::MemberAfterView {
                        component: name,
                        span: next.span,
                    });
                }
                Token::Ident(kw) if kw == "route" => {
                    if route.is_some() {
                        return Err(CompileError::DuplicateRoute {
                            component: name,
                            span: next.span,
                        });
                    }
                    self.lexer.expect_punct("=")?;
                    let value = self.lexer.next()?;
                    let Token::Str(fragment) = value.token else {
                        return Err(CompileError::expected(
                            "quoted route fragment",
                            value.token,
                            value.span,
                        ));
                    };
                    route = Some(RouteDecl {
                        fragment: Fragment::normalize(&fragment),
                        span: next.span,
                    });
                }
                Token::Ident(kw) if kw == "state" => {
                    let (state_name, _) = self.lexer.expect_ident("state name")?;
                    self.lexer.expect_punct("=")?;
                    let init = parse_expression(&mut self.lexer)?;
                    states.push(StateDecl {
                        name: state_name,
                        init,
                        span: next.span,
                    });
                }
                other => {
                    return Err(CompileError::expected(
                        "`route`, `state`, `view` or `}`",
                        other,
                        next.span,
                    ));
                }
            }
        }

        let Some(view) = view else {
            return Err(CompileError::MissingView {
                component: name,
                span,
            });
        };
        Ok(ComponentDecl {
            name,
            route,
            states,
            view,
            span,
        })
    }

    fn parse_view(&mut self, span: Span) -> Result<ViewBlock, CompileError> {
        self.lexer.expect_punct("{")?;
        let nodes = self.parse_nodes(Block::View, span)?;
        Ok(ViewBlock { nodes, span })
    }

    fn parse_nodes(&mut self, block: Block, opened: Span) -> Result<Vec<Node>, CompileError> {
        let mut nodes = Vec::new();
        let mut text = String::new();
        let mut depth = 0usize;
        let mut prev: Option<char> = None;

        loop {
            let cursor = self.lexer.cursor();
            let span = cursor.span();
            let rest = cursor.rest();
            let Some(c) = cursor.peek() else {
                return Err(CompileError::Unterminated {
                    block: block.name(),
                    span: opened,
                });
            };

            if rest.starts_with("${") {
                flush(&mut text, &mut nodes);
                cursor.eat("${");
                let expr = parse_expression(&mut self.lexer)?;
                self.lexer.expect_punct("}")?;
                nodes.push(Node::Interpolation(Interpolation { expr, span }));
                prev = Some('}');
                continue;
            }

            if opens_tag(rest, "{each") {
                flush(&mut text, &mut nodes);
                cursor.eat("{each");
                let header = block_header(cursor.eat_while(|c| c != '}'), span)?;
                if !cursor.eat("}") {
                    return Err(CompileError::Unterminated { block: "each", span });
                }
                let (collection, item) = parse_each_header(header, span)?;
                let body = self.parse_nodes(Block::Each, span)?;
                nodes.push(Node::Each(EachBlock {
                    collection,
                    item,
                    body,
                    span,
                }));
                prev = Some('}');
                continue;
            }

            if opens_tag(rest, "{if") {
                flush(&mut text, &mut nodes);
                cursor.eat("{if");
                let header = block_header(cursor.eat_while(|c| c != '}'), span)?;
                if !cursor.eat("}") {
                    return Err(CompileError::Unterminated { block: "if", span });
                }
                if !is_identifier(header) {
                    return Err(CompileError::UnsupportedCondition {
                        condition: header.to_string(),
                        span,
                    });
                }
                let body = self.parse_nodes(Block::If, span)?;
                nodes.push(Node::If(IfBlock {
                    key: header.to_string(),
                    body,
                    span,
                }));
                prev = Some('}');
                continue;
            }

            for (tag, closes) in [("{endeach}", Block::Each), ("{endif}", Block::If)] {
                if rest.starts_with(tag) {
                    if block != closes {
                        return Err(CompileError::UnmatchedEnd { tag, span });
                    }
                    cursor.eat(tag);
                    flush(&mut text, &mut nodes);
                    return Ok(nodes);
                }
            }

            if c == '}' && depth == 0 {
                if block != Block::View {
                    return Err(CompileError::Unterminated {
                        block: block.name(),
                        span: opened,
                    });
                }
                cursor.bump();
                flush(&mut text, &mut nodes);
                return Ok(nodes);
            }

            if c == 'o' && prev.is_some_and(char::is_whitespace) && is_handler_attr(rest) {
                flush(&mut text, &mut nodes);
                cursor.eat("on");
                let event = cursor.eat_while(|c| c.is_ascii_alphabetic()).to_ascii_lowercase();
                cursor.eat("=\"");
                let code_span = cursor.span();
                let code = cursor.eat_while(|c| c != '"');
                if !cursor.eat("\"") {
                    return Err(CompileError::Unterminated {
                        block: "handler attribute",
                        span,
                    });
                }
                let actions = self.handlers.parse(code, code_span)?;
                nodes.push(Node::Handler(HandlerAttr {
                    event,
                    source: code.to_string(),
                    actions,
                    span,
                }));
                prev = Some('"');
                continue;
            }

            match c {
                '{' => depth += 1,
                '}' => depth -= 1,
                _ => {}
            }
            cursor.bump();
            text.push(c);
            prev = Some(c);
        }
    }
}

fn flush(text: &mut String, nodes: &mut Vec<Node>) {
    if !text.is_empty() {
        nodes.push(Node::Text {
            text: std::mem::take(text),
        });
    }
}

/// `{each ...` / `{if ...`: the keyword followed by whitespace.
fn opens_tag(rest: &str, tag: &str) -> bool {
    rest.strip_prefix(tag)
        .and_then(|after| after.chars().next())
        .is_some_and(char::is_whitespace)
}

fn block_header(raw: &str, span: Span) -> Result<&str, CompileError> {
    if raw.contains('\n') {
        return Err(CompileError::expected("`}` on the same line", "line break", span));
    }
    Ok(raw.trim())
}

fn parse_each_header(header: &str, span: Span) -> Result<(String, String), CompileError> {
    let parts: Vec<&str> = header.split_whitespace().collect();
    match parts.as_slice() {
        [collection, "as", item] if is_identifier(collection) && is_identifier(item) => {
            Ok((collection.to_string(), item.to_string()))
        }
        _ => Err(CompileError::expected(
            "`COLLECTION as ITEM`",
            format!("`{header}`"),
            span,
        )),
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some_and(is_ident_start) && chars.all(is_ident_continue)
}

/// `on<letters>="` at the start of `rest`.
fn is_handler_attr(rest: &str) -> bool {
    let Some(after) = rest.strip_prefix("on") else {
        return false;
    };
    let letters = after.chars().take_while(char::is_ascii_alphabetic).count();
    letters > 0 && after[letters..].starts_with("=\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::expr::Expr;
    use crate::compiler::handler::{Action, Shorthand};
    use serde_json::json;

    fn parse(src: &str) -> Result<Program, CompileError> {
        Parser::new(src, &Shorthand).parse_program()
    }

    fn single(src: &str) -> ComponentDecl {
        parse(src).unwrap().components.remove(0)
    }

    #[test]
    fn test_full_component() {
        let component = single(
            r#"component Counter {
                route = "counter"
                state n = 0
                state items = [1, 2]
                view { <p>${n}</p> }
            }"#,
        );
        assert_eq!(component.name, "Counter");
        assert_eq!(component.route.unwrap().fragment.as_str(), "#/counter");
        assert_eq!(component.states.len(), 2);
        assert_eq!(component.states[1].init, Expr::Array(vec![
            Expr::Literal(json!(1)),
            Expr::Literal(json!(2)),
        ]));
        let nodes = &component.view.nodes;
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0], Node::Text { text: " <p>".into() });
        assert!(matches!(
            &nodes[1],
            Node::Interpolation(Interpolation { expr: Expr::Ident(name), .. }) if name == "n"
        ));
        assert_eq!(nodes[2], Node::Text { text: "</p> ".into() });
    }

    #[test]
    fn test_blocks_nest() {
        let component = single(
            "component L { state items = [] state open = true view {{if open}<ul>{each items as item}<li>${item}</li>{endeach}</ul>{endif}} }",
        );
        let Node::If(block) = &component.view.nodes[0] else {
            panic!("expected if block");
        };
        assert_eq!(block.key, "open");
        let Node::Each(each) = &block.body[1] else {
            panic!("expected each block");
        };
        assert_eq!((each.collection.as_str(), each.item.as_str()), ("items", "item"));
        assert_eq!(each.body.len(), 3);
    }

    #[test]
    fn test_literal_braces_are_text() {
        let component = single("component S { view { <style>p { color: red; }</style> } }");
        assert_eq!(
            component.view.nodes,
            vec![Node::Text {
                text: " <style>p { color: red; }</style> ".into()
            }]
        );
    }

    #[test]
    fn test_handler_attribute() {
        let component =
            single(r#"component C { state n = 0 view { <button onClick="n++">+</button> } }"#);
        let handlers = component.handlers();
        assert_eq!(handlers.len(), 1);
        assert_eq!(handlers[0].event, "click");
        assert_eq!(
            handlers[0].actions,
            vec![Action::Increment { target: "n".into() }]
        );
    }

    #[test]
    fn test_missing_view() {
        assert!(matches!(
            parse("component A { state n = 0 }"),
            Err(CompileError::MissingView { .. })
        ));
    }

    #[test]
    fn test_view_must_be_last() {
        let err = parse("component A { view { x }\n  state n = 0 }").unwrap_err();
        assert!(matches!(err, CompileError::MemberAfterView { .. }));
        assert_eq!(err.span().line, 2);
    }

    #[test]
    fn test_duplicate_view_and_route() {
        assert!(matches!(
            parse("component A { view { a } view { b } }"),
            Err(CompileError::DuplicateView { .. })
        ));
        assert!(matches!(
            parse(r#"component A { route = "a" route = "b" view { } }"#),
            Err(CompileError::DuplicateRoute { .. })
        ));
    }

    #[test]
    fn test_compound_condition_rejected() {
        assert!(matches!(
            parse("component A { view { {if a && b}x{endif} } }"),
            Err(CompileError::UnsupportedCondition { .. })
        ));
    }

    #[test]
    fn test_unbalanced_blocks() {
        assert!(matches!(
            parse("component A { view { {each xs as x} } }"),
            Err(CompileError::Unterminated { block: "each", .. })
        ));
        assert!(matches!(
            parse("component A { view { {endif} } }"),
            Err(CompileError::UnmatchedEnd { tag: "{endif}", .. })
        ));
    }

    #[test]
    fn test_top_level_garbage() {
        let err = parse("let x = 1").unwrap_err();
        assert!(matches!(err, CompileError::Expected { .. }));
        assert_eq!(err.span(), Span::start());
    }
}
