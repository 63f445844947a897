//! Inline event-handler syntax.
//!
//! # Responsibilities
//! - Turn the code of an `on<event>="..."` attribute into state actions
//! - Keep the recognised vocabulary behind a replaceable strategy
//!
//! # Design Decisions
//! - The default [`Shorthand`] strategy knows exactly five forms on a bare
//!   state name: `n++`, `n--`, `n = expr`, `n.push(args)`, `n.pop()`
//! - Anything else is kept verbatim as [`Action::Script`]; it never writes
//!   state and is handed to the runtime's script host

use std::fmt;

use serde::Serialize;

use crate::compiler::error::{CompileError, Span};
use crate::compiler::expr::{parse_list, parse_standalone, Expr};
use crate::compiler::lexer::{is_ident_continue, is_ident_start, Cursor, Lexer, Token};

/// One step of a handler, applied to the owning instance's state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Action {
    Increment { target: String },
    Decrement { target: String },
    Assign { target: String, value: Expr },
    Push { target: String, items: Vec<Expr> },
    Pop { target: String },
    Script { code: String },
}

impl Action {
    /// The state key this action writes, if any.
    pub fn target(&self) -> Option<&str> {
        match self {
            Action::Increment { target }
            | Action::Decrement { target }
            | Action::Assign { target, .. }
            | Action::Push { target, .. }
            | Action::Pop { target } => Some(target),
            Action::Script { .. } => None,
        }
    }
}

/// Strategy for parsing handler code.
pub trait HandlerSyntax: fmt::Debug {
    /// Parse the attribute value `code`, which starts at `origin` in the template.
    fn parse(&self, code: &str, origin: Span) -> Result<Vec<Action>, CompileError>;
}

/// The shorthand mutation vocabulary.
#[derive(Debug, Default, Clone, Copy)]
pub struct Shorthand;

impl HandlerSyntax for Shorthand {
    fn parse(&self, code: &str, origin: Span) -> Result<Vec<Action>, CompileError> {
        Ok(split_statements(code)
            .into_iter()
            .map(|stmt| parse_statement(stmt, origin))
            .collect())
    }
}

/// Split on `;` outside of quotes and brackets. Empty statements are dropped.
fn split_statements(code: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in code.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' | '`' => quote = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ';' if depth == 0 => {
                out.push(&code[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(&code[start..]);
    out.into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_statement(stmt: &str, origin: Span) -> Action {
    let script = || Action::Script {
        code: stmt.to_string(),
    };

    let ident_len = match stmt.chars().next() {
        Some(c) if is_ident_start(c) => stmt
            .find(|c: char| !is_ident_continue(c))
            .unwrap_or(stmt.len()),
        _ => return script(),
    };
    let target = stmt[..ident_len].to_string();
    let rest = stmt[ident_len..].trim_start();

    if rest == "++" {
        return Action::Increment { target };
    }
    if rest == "--" {
        return Action::Decrement { target };
    }
    if let Some(args) = rest.strip_prefix(".push(") {
        if rest.ends_with(')') {
            return match parse_arguments(args, origin) {
                Ok(items) => Action::Push { target, items },
                Err(_) => script(),
            };
        }
    }
    if rest.starts_with(".pop(") && rest.ends_with(')') {
        return Action::Pop { target };
    }
    if let Some(rhs) = rest.strip_prefix('=') {
        if !rhs.starts_with('=') {
            let mut lexer = Lexer::from_cursor(Cursor::at(rhs, origin));
            return match parse_standalone(&mut lexer) {
                Ok(value) => Action::Assign { target, value },
                Err(_) => script(),
            };
        }
    }
    script()
}

/// Parse `a, b)`: the argument list after an opening parenthesis.
fn parse_arguments(args: &str, origin: Span) -> Result<Vec<Expr>, CompileError> {
    let mut lexer = Lexer::from_cursor(Cursor::at(args, origin));
    let items = parse_list(&mut lexer, ")")?;
    let next = lexer.next()?;
    if next.token != Token::Eof {
        return Err(CompileError::expected("end of handler", next.token, next.span));
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(code: &str) -> Vec<Action> {
        Shorthand.parse(code, Span::start()).unwrap()
    }

    #[test]
    fn test_increment_and_decrement() {
        assert_eq!(
            parse("count++; total --"),
            vec![
                Action::Increment {
                    target: "count".into()
                },
                Action::Decrement {
                    target: "total".into()
                },
            ]
        );
    }

    #[test]
    fn test_assignment() {
        assert_eq!(
            parse("name = 'ada'"),
            vec![Action::Assign {
                target: "name".into(),
                value: Expr::Literal(json!("ada")),
            }]
        );
    }

    #[test]
    fn test_push_and_pop() {
        let actions = parse("items.push(1, 'two'); items.pop()");
        assert_eq!(
            actions,
            vec![
                Action::Push {
                    target: "items".into(),
                    items: vec![Expr::Literal(json!(1)), Expr::Literal(json!("two"))],
                },
                Action::Pop {
                    target: "items".into()
                },
            ]
        );
    }

    #[test]
    fn test_semicolon_inside_string_does_not_split() {
        let actions = parse("label = 'a;b'");
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].target(), Some("label"));
    }

    #[test]
    fn test_other_code_passes_through() {
        assert_eq!(
            parse("alert('hi'); a == b; x += 1"),
            vec![
                Action::Script {
                    code: "alert('hi')".into()
                },
                Action::Script {
                    code: "a == b".into()
                },
                Action::Script {
                    code: "x += 1".into()
                },
            ]
        );
    }

    #[test]
    fn test_unparseable_assignment_passes_through() {
        assert_eq!(
            parse("x = compute()"),
            vec![Action::Script {
                code: "x = compute()".into()
            }]
        );
    }
}
