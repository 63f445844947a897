//! Template compiler subsystem.
//!
//! # Data Flow
//! ```text
//! Template source text
//!     → lexer.rs (cursor + tokens, with line/column spans)
//!     → parser.rs (component / route / state / view members)
//!         → expr.rs (state initializers, `${...}` expressions)
//!         → handler.rs (on<event>="..." code → actions)
//!     → ast.rs Program { ComponentDecl... }
//!     → instantiated and rendered by the reactive subsystem
//! ```
//!
//! # Design Decisions
//! - The output is an instruction tree, not generated source; nothing is
//!   evaluated as code
//! - Structural errors are reported with a precise span instead of being
//!   passed through to fail later
//! - Compilation is pure: same input, same tree

pub mod ast;
pub mod error;
pub mod expr;
pub mod handler;
pub mod lexer;
pub mod parser;

pub use ast::{ComponentDecl, Node, Program};
pub use error::{CompileError, Span};
pub use expr::{EvalError, Expr, Scope};
pub use handler::{Action, HandlerSyntax, Shorthand};

use parser::Parser;

/// Template compiler with a configurable handler syntax.
#[derive(Debug)]
pub struct Compiler {
    handlers: Box<dyn HandlerSyntax>,
}

impl Compiler {
    pub fn new() -> Self {
        Self::with_handler_syntax(Shorthand)
    }

    pub fn with_handler_syntax(syntax: impl HandlerSyntax + 'static) -> Self {
        Self {
            handlers: Box::new(syntax),
        }
    }

    pub fn compile(&self, source: &str) -> Result<Program, CompileError> {
        let program = Parser::new(source, self.handlers.as_ref()).parse_program()?;
        tracing::debug!(
            components = program.components.len(),
            bytes = source.len(),
            "Compiled template source"
        );
        Ok(program)
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Compile with the default shorthand handler syntax.
pub fn compile(source: &str) -> Result<Program, CompileError> {
    Compiler::new().compile(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::handler::Action;

    #[derive(Debug)]
    struct ScriptOnly;

    impl HandlerSyntax for ScriptOnly {
        fn parse(&self, code: &str, _origin: Span) -> Result<Vec<Action>, CompileError> {
            Ok(vec![Action::Script {
                code: code.to_string(),
            }])
        }
    }

    #[test]
    fn test_compile_is_deterministic() {
        let src = r##"component A { route = "#/x" state n = 0 view { ${n} } }"##;
        assert_eq!(compile(src).unwrap(), compile(src).unwrap());
    }

    #[test]
    fn test_handler_syntax_is_pluggable() {
        let compiler = Compiler::with_handler_syntax(ScriptOnly);
        let program = compiler
            .compile(r#"component A { state n = 0 view { <b onclick="n++">x</b> } }"#)
            .unwrap();
        let handlers = program.components[0].handlers();
        assert_eq!(
            handlers[0].actions,
            vec![Action::Script { code: "n++".into() }]
        );
    }

    #[test]
    fn test_multiple_components() {
        let program = compile("component A { view { a } }\ncomponent B { view { b } }").unwrap();
        let names: Vec<_> = program.components.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["A", "B"]);
    }
}
