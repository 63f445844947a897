//! Template expressions.
//!
//! # Responsibilities
//! - Parse the expression sublanguage used by state initializers,
//!   interpolations and handler arguments
//! - Evaluate expressions against a [`Scope`]
//!
//! # Design Decisions
//! - Precedence climbing over a one-token lookahead lexer
//! - Values are `serde_json::Value`; coercions live in `reactive::value`
//! - `&&` and `||` short-circuit and yield an operand, not a boolean
//! - Evaluation never mutates; writes only happen through handler actions

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::compiler::error::CompileError;
use crate::compiler::lexer::{Lexer, Token};
use crate::reactive::value::{is_truthy, loosely_equal, number, to_display, to_number};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinaryOp {
    fn from_punct(p: &str) -> Option<(Self, u8)> {
        let op = match p {
            "||" => (BinaryOp::Or, 1),
            "&&" => (BinaryOp::And, 2),
            "==" | "===" => (BinaryOp::Eq, 3),
            "!=" | "!==" => (BinaryOp::NotEq, 3),
            "<" => (BinaryOp::Lt, 4),
            "<=" => (BinaryOp::LtEq, 4),
            ">" => (BinaryOp::Gt, 4),
            ">=" => (BinaryOp::GtEq, 4),
            "+" => (BinaryOp::Add, 5),
            "-" => (BinaryOp::Sub, 5),
            "*" => (BinaryOp::Mul, 6),
            "/" => (BinaryOp::Div, 6),
            "%" => (BinaryOp::Rem, 6),
            _ => return None,
        };
        Some(op)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    Literal(Value),
    Ident(String),
    Array(Vec<Expr>),
    Object(Vec<(String, Expr)>),
    Member {
        object: Box<Expr>,
        property: String,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Conditional {
        test: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
}

/// Name resolution for evaluation.
pub trait Scope {
    fn lookup(&self, name: &str) -> Option<Value>;
}

impl Scope for Map<String, Value> {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("`{0}` is not defined")]
    Unbound(String),

    #[error("{0}")]
    Type(String),
}

/// Parse one expression, leaving the following token unconsumed.
pub fn parse_expression(lexer: &mut Lexer<'_>) -> Result<Expr, CompileError> {
    let test = parse_binary(lexer, 1)?;
    if lexer.eat_punct("?")? {
        let then = parse_expression(lexer)?;
        lexer.expect_punct(":")?;
        let otherwise = parse_expression(lexer)?;
        return Ok(Expr::Conditional {
            test: Box::new(test),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        });
    }
    Ok(test)
}

/// Parse a complete standalone expression such as a handler right-hand side.
pub fn parse_standalone(lexer: &mut Lexer<'_>) -> Result<Expr, CompileError> {
    let expr = parse_expression(lexer)?;
    let next = lexer.next()?;
    if next.token != Token::Eof {
        return Err(CompileError::expected("end of expression", next.token, next.span));
    }
    Ok(expr)
}

fn parse_binary(lexer: &mut Lexer<'_>, min_prec: u8) -> Result<Expr, CompileError> {
    let mut left = parse_unary(lexer)?;
    loop {
        let (op, prec) = match &lexer.peek()?.token {
            Token::Punct(p) => match BinaryOp::from_punct(p) {
                Some(found) => found,
                None => break,
            },
            _ => break,
        };
        if prec < min_prec {
            break;
        }
        lexer.next()?;
        let right = parse_binary(lexer, prec + 1)?;
        left = Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        };
    }
    Ok(left)
}

fn parse_unary(lexer: &mut Lexer<'_>) -> Result<Expr, CompileError> {
    let op = if lexer.eat_punct("!")? {
        UnaryOp::Not
    } else if lexer.eat_punct("-")? {
        UnaryOp::Neg
    } else {
        return parse_postfix(lexer);
    };
    let operand = parse_unary(lexer)?;
    Ok(Expr::Unary {
        op,
        operand: Box::new(operand),
    })
}

fn parse_postfix(lexer: &mut Lexer<'_>) -> Result<Expr, CompileError> {
    let mut expr = parse_primary(lexer)?;
    loop {
        if lexer.eat_punct(".")? {
            let (property, _) = lexer.expect_ident("property name")?;
            expr = Expr::Member {
                object: Box::new(expr),
                property,
            };
        } else if lexer.eat_punct("[")? {
            let index = parse_expression(lexer)?;
            lexer.expect_punct("]")?;
            expr = Expr::Index {
                object: Box::new(expr),
                index: Box::new(index),
            };
        } else {
            return Ok(expr);
        }
    }
}

fn parse_primary(lexer: &mut Lexer<'_>) -> Result<Expr, CompileError> {
    let next = lexer.next()?;
    let expr = match next.token {
        Token::Number(n) => Expr::Literal(Value::Number(n)),
        Token::Str(s) => Expr::Literal(Value::String(s)),
        Token::Ident(name) => match name.as_str() {
            "true" => Expr::Literal(Value::Bool(true)),
            "false" => Expr::Literal(Value::Bool(false)),
            "null" | "undefined" => Expr::Literal(Value::Null),
            _ => Expr::Ident(name),
        },
        Token::Punct("(") => {
            let inner = parse_expression(lexer)?;
            lexer.expect_punct(")")?;
            inner
        }
        Token::Punct("[") => Expr::Array(parse_list(lexer, "]")?),
        Token::Punct("{") => parse_object(lexer)?,
        other => return Err(CompileError::expected("expression", other, next.span)),
    };
    Ok(expr)
}

/// Comma-separated expressions up to `close`; a trailing comma is allowed.
pub fn parse_list(lexer: &mut Lexer<'_>, close: &'static str) -> Result<Vec<Expr>, CompileError> {
    let mut items = Vec::new();
    loop {
        if lexer.eat_punct(close)? {
            return Ok(items);
        }
        items.push(parse_expression(lexer)?);
        if !lexer.eat_punct(",")? {
            lexer.expect_punct(close)?;
            return Ok(items);
        }
    }
}

fn parse_object(lexer: &mut Lexer<'_>) -> Result<Expr, CompileError> {
    let mut fields = Vec::new();
    loop {
        if lexer.eat_punct("}")? {
            break;
        }
        let key = lexer.next()?;
        let key = match key.token {
            Token::Ident(name) | Token::Str(name) => name,
            Token::Number(n) => to_display(&Value::Number(n)),
            other => return Err(CompileError::expected("object key", other, key.span)),
        };
        lexer.expect_punct(":")?;
        fields.push((key, parse_expression(lexer)?));
        if !lexer.eat_punct(",")? {
            lexer.expect_punct("}")?;
            break;
        }
    }
    Ok(Expr::Object(fields))
}

impl Expr {
    pub fn eval(&self, scope: &dyn Scope) -> Result<Value, EvalError> {
        match self {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Ident(name) => scope
                .lookup(name)
                .ok_or_else(|| EvalError::Unbound(name.clone())),
            Expr::Array(items) => items
                .iter()
                .map(|item| item.eval(scope))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Expr::Object(fields) => {
                let mut map = Map::new();
                for (key, value) in fields {
                    map.insert(key.clone(), value.eval(scope)?);
                }
                Ok(Value::Object(map))
            }
            Expr::Member { object, property } => {
                let object = object.eval(scope)?;
                member(&object, property)
            }
            Expr::Index { object, index } => {
                let object = object.eval(scope)?;
                let index = index.eval(scope)?;
                match (&object, &index) {
                    (Value::Array(items), _) => Ok(to_number(&index)
                        .filter(|i| *i >= 0.0 && i.fract() == 0.0)
                        .and_then(|i| items.get(i as usize).cloned())
                        .unwrap_or(Value::Null)),
                    _ => member(&object, &to_display(&index)),
                }
            }
            Expr::Unary { op, operand } => {
                let value = operand.eval(scope)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!is_truthy(&value))),
                    UnaryOp::Neg => numeric(&value, "-").map(|n| number(-n)),
                }
            }
            Expr::Binary { op, left, right } => binary(*op, left, right, scope),
            Expr::Conditional {
                test,
                then,
                otherwise,
            } => {
                if is_truthy(&test.eval(scope)?) {
                    then.eval(scope)
                } else {
                    otherwise.eval(scope)
                }
            }
        }
    }
}

fn member(object: &Value, property: &str) -> Result<Value, EvalError> {
    match object {
        Value::Null => Err(EvalError::Type(format!(
            "cannot read property `{property}` of null"
        ))),
        Value::Array(items) if property == "length" => Ok(Value::from(items.len())),
        Value::String(s) if property == "length" => Ok(Value::from(s.chars().count())),
        Value::String(s) => Ok(property
            .parse::<usize>()
            .ok()
            .and_then(|i| s.chars().nth(i))
            .map(|c| Value::String(c.to_string()))
            .unwrap_or(Value::Null)),
        Value::Object(map) => Ok(map.get(property).cloned().unwrap_or(Value::Null)),
        _ => Ok(Value::Null),
    }
}

fn numeric(value: &Value, op: &str) -> Result<f64, EvalError> {
    to_number(value).ok_or_else(|| {
        EvalError::Type(format!(
            "operand of `{op}` is not a number: {}",
            to_display(value)
        ))
    })
}

/// State values cannot hold `NaN` or infinities, so such results are errors.
fn finite(result: f64, op: &str) -> Result<Value, EvalError> {
    if result.is_finite() {
        Ok(number(result))
    } else {
        Err(EvalError::Type(format!("`{op}` has no finite result")))
    }
}

fn binary(op: BinaryOp, left: &Expr, right: &Expr, scope: &dyn Scope) -> Result<Value, EvalError> {
    let l = left.eval(scope)?;
    match op {
        BinaryOp::And => {
            return if is_truthy(&l) { right.eval(scope) } else { Ok(l) };
        }
        BinaryOp::Or => {
            return if is_truthy(&l) { Ok(l) } else { right.eval(scope) };
        }
        _ => {}
    }

    let r = right.eval(scope)?;
    let value = match op {
        BinaryOp::Eq => Value::Bool(loosely_equal(&l, &r)),
        BinaryOp::NotEq => Value::Bool(!loosely_equal(&l, &r)),
        BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
            let ordering = match (&l, &r) {
                (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
                _ => match (to_number(&l), to_number(&r)) {
                    (Some(a), Some(b)) => a.partial_cmp(&b),
                    _ => None,
                },
            };
            let Some(ordering) = ordering else {
                return Ok(Value::Bool(false));
            };
            Value::Bool(match op {
                BinaryOp::Lt => ordering.is_lt(),
                BinaryOp::LtEq => ordering.is_le(),
                BinaryOp::Gt => ordering.is_gt(),
                _ => ordering.is_ge(),
            })
        }
        BinaryOp::Add if concatenates(&l) || concatenates(&r) => {
            Value::String(format!("{}{}", to_display(&l), to_display(&r)))
        }
        BinaryOp::Add => finite(numeric(&l, "+")? + numeric(&r, "+")?, "+")?,
        BinaryOp::Sub => finite(numeric(&l, "-")? - numeric(&r, "-")?, "-")?,
        BinaryOp::Mul => finite(numeric(&l, "*")? * numeric(&r, "*")?, "*")?,
        BinaryOp::Div => finite(numeric(&l, "/")? / numeric(&r, "/")?, "/")?,
        BinaryOp::Rem => finite(numeric(&l, "%")? % numeric(&r, "%")?, "%")?,
        BinaryOp::And | BinaryOp::Or => unreachable!("short-circuit operators handled above"),
    };
    Ok(value)
}

fn concatenates(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Array(_) | Value::Object(_))
}
