//! Handler dispatch.
//!
//! # Data Flow
//! ```text
//! Interaction (instance, handler index)
//!     → HandlerBinding from the last render (actions + captured locals)
//!     → each action in order:
//!         state write → ComponentInstance::set (one UI update per write)
//!         Script      → ScriptHost
//!     → one trailing UI update
//! ```
//!
//! # Design Decisions
//! - `++`/`--` treat a missing or null value as 0
//! - `push`/`pop` copy the array and write it back through `set`, so they
//!   re-render like any other write
//! - The first failing action stops the handler; earlier writes stay

use serde_json::Value;
use thiserror::Error;

use crate::compiler::{Action, EvalError};
use crate::observability::metrics;
use crate::reactive::instance::{ComponentInstance, InstanceId};
use crate::reactive::render::{LayeredScope, RenderError};
use crate::reactive::value::{number, to_number};
use crate::routing::Fragment;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    #[error("{instance} has no handler #{index}")]
    UnknownHandler { instance: InstanceId, index: usize },

    #[error("`{target}` is not a number")]
    NotANumber { target: String },

    #[error("`{target}` is not an array")]
    NotAnArray { target: String },

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Receives handler code the built-in actions do not cover.
pub trait ScriptHost {
    fn run(&mut self, instance: InstanceId, code: &str) -> anyhow::Result<()>;
}

/// Logs script code and does nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct IgnoreScripts;

impl ScriptHost for IgnoreScripts {
    fn run(&mut self, instance: InstanceId, code: &str) -> anyhow::Result<()> {
        tracing::debug!(%instance, code, "No script host installed; handler code ignored");
        Ok(())
    }
}

impl ComponentInstance {
    /// Run handler `index` from the most recent render.
    pub fn dispatch(
        &mut self,
        index: usize,
        current: &Fragment,
        scripts: &mut dyn ScriptHost,
    ) -> Result<(), DispatchError> {
        let binding = self
            .handlers
            .get(index)
            .cloned()
            .ok_or(DispatchError::UnknownHandler {
                instance: self.id(),
                index,
            })?;
        metrics::record_dispatch(self.name());
        tracing::debug!(
            instance = %self.id(),
            event = %binding.event,
            actions = binding.actions.len(),
            "Dispatching handler"
        );

        for action in &binding.actions {
            match action {
                Action::Increment { target } => {
                    let n = self.numeric(target)?;
                    self.set(target.as_str(), number(n + 1.0), current)?;
                }
                Action::Decrement { target } => {
                    let n = self.numeric(target)?;
                    self.set(target.as_str(), number(n - 1.0), current)?;
                }
                Action::Assign { target, value } => {
                    let value = value.eval(&LayeredScope {
                        state: &self.state,
                        locals: &binding.locals,
                    })?;
                    self.set(target.as_str(), value, current)?;
                }
                Action::Push { target, items } => {
                    let scope = LayeredScope {
                        state: &self.state,
                        locals: &binding.locals,
                    };
                    let values = items
                        .iter()
                        .map(|item| item.eval(&scope))
                        .collect::<Result<Vec<_>, _>>()?;
                    let mut array = self.array(target)?;
                    array.extend(values);
                    self.set(target.as_str(), Value::Array(array), current)?;
                }
                Action::Pop { target } => {
                    let mut array = self.array(target)?;
                    array.pop();
                    self.set(target.as_str(), Value::Array(array), current)?;
                }
                Action::Script { code } => {
                    if let Err(e) = scripts.run(self.id(), code) {
                        tracing::warn!(instance = %self.id(), error = %e, "Script handler failed");
                    }
                }
            }
        }

        self.update_ui(current)?;
        Ok(())
    }

    fn numeric(&self, target: &str) -> Result<f64, DispatchError> {
        match self.state.get(target) {
            None => Ok(0.0),
            Some(value) => to_number(value).ok_or_else(|| DispatchError::NotANumber {
                target: target.to_string(),
            }),
        }
    }

    fn array(&self, target: &str) -> Result<Vec<Value>, DispatchError> {
        match self.state.get(target) {
            Some(Value::Array(items)) => Ok(items.clone()),
            _ => Err(DispatchError::NotAnArray {
                target: target.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;
    use crate::reactive::render::RenderOptions;
    use crate::surface::{Document, MemoryDocument};
    use serde_json::json;
    use std::rc::Rc;

    #[derive(Default)]
    struct Recorder(Vec<String>);

    impl ScriptHost for Recorder {
        fn run(&mut self, _instance: InstanceId, code: &str) -> anyhow::Result<()> {
            self.0.push(code.to_string());
            Ok(())
        }
    }

    fn mounted(src: &str) -> (ComponentInstance, MemoryDocument) {
        let decl = compile(src).unwrap().components.remove(0);
        let mut inst =
            ComponentInstance::new(InstanceId(7), Rc::new(decl), RenderOptions::default()).unwrap();
        let document = MemoryDocument::with_surfaces(["app"]);
        inst.attach(document.surface("app").unwrap());
        inst.update_ui(&Fragment::root()).unwrap();
        (inst, document)
    }

    #[test]
    fn test_increment_renders_per_write_plus_one() {
        let (mut inst, document) =
            mounted(r#"component C { state n = 0 view {<b onclick="n++; n++">${n}</b>} }"#);
        inst.dispatch(0, &Fragment::root(), &mut IgnoreScripts).unwrap();
        let record = document.record("app").unwrap();
        assert_eq!(inst.get("n"), Some(&json!(2)));
        assert_eq!(record.content, r#"<b data-on-click="0">2</b>"#);
        // initial render, two writes, trailing update
        assert_eq!(record.content_writes, 4);
    }

    #[test]
    fn test_missing_counter_starts_at_zero() {
        let (mut inst, _) = mounted(r#"component C { view {<b onclick="n--">x</b>} }"#);
        inst.dispatch(0, &Fragment::root(), &mut IgnoreScripts).unwrap();
        assert_eq!(inst.get("n"), Some(&json!(-1)));
    }

    #[test]
    fn test_null_counter_counts_as_zero() {
        let (mut inst, document) = mounted(
            r#"component C { state up = null state down = null view {<b onclick="up++"></b><b onclick="down--"></b>${up}/${down}} }"#,
        );
        let root = Fragment::root();
        inst.dispatch(0, &root, &mut IgnoreScripts).unwrap();
        inst.dispatch(1, &root, &mut IgnoreScripts).unwrap();
        assert_eq!(inst.get("up"), Some(&json!(1)));
        assert_eq!(inst.get("down"), Some(&json!(-1)));
        assert!(document.content("app").unwrap().ends_with("1/-1"));
    }

    #[test]
    fn test_large_counter_keeps_its_magnitude() {
        let (mut inst, _) =
            mounted(r#"component C { state n = 100000000000000000000 view {<b onclick="n++"></b>} }"#);
        inst.dispatch(0, &Fragment::root(), &mut IgnoreScripts).unwrap();
        assert_eq!(inst.get("n").and_then(Value::as_f64), Some(1e20));
    }

    #[test]
    fn test_assignment_sees_loop_locals() {
        let (mut inst, document) = mounted(
            r#"component C { state items = ["a", "b"] state picked = "" view {{each items as item}<i onclick="picked = item"></i>{endeach}${picked}} }"#,
        );
        inst.dispatch(1, &Fragment::root(), &mut IgnoreScripts).unwrap();
        assert_eq!(inst.get("picked"), Some(&json!("b")));
        assert!(document.content("app").unwrap().ends_with('b'));
    }

    #[test]
    fn test_push_and_pop() {
        let (mut inst, _) = mounted(
            r#"component C { state xs = [1] view {<a onclick="xs.push(xs.length + 1)"></a><a onclick="xs.pop()"></a>} }"#,
        );
        let root = Fragment::root();
        inst.dispatch(0, &root, &mut IgnoreScripts).unwrap();
        assert_eq!(inst.get("xs"), Some(&json!([1, 2])));
        inst.dispatch(1, &root, &mut IgnoreScripts).unwrap();
        inst.dispatch(1, &root, &mut IgnoreScripts).unwrap();
        inst.dispatch(1, &root, &mut IgnoreScripts).unwrap();
        assert_eq!(inst.get("xs"), Some(&json!([])));
    }

    #[test]
    fn test_push_on_non_array() {
        let (mut inst, _) =
            mounted(r#"component C { state xs = 1 view {<a onclick="xs.push(2)"></a>} }"#);
        let err = inst.dispatch(0, &Fragment::root(), &mut IgnoreScripts).unwrap_err();
        assert_eq!(err, DispatchError::NotAnArray { target: "xs".into() });
    }

    #[test]
    fn test_pop_on_non_array() {
        let (mut inst, _) = mounted(
            r#"component C { state xs = "abc" view {<a onclick="xs.pop()"></a><a onclick="ys.pop()"></a>} }"#,
        );
        let root = Fragment::root();
        let err = inst.dispatch(0, &root, &mut IgnoreScripts).unwrap_err();
        assert_eq!(err, DispatchError::NotAnArray { target: "xs".into() });
        assert_eq!(inst.get("xs"), Some(&json!("abc")));

        let err = inst.dispatch(1, &root, &mut IgnoreScripts).unwrap_err();
        assert_eq!(err, DispatchError::NotAnArray { target: "ys".into() });
    }

    #[test]
    fn test_script_goes_to_host() {
        let (mut inst, _) =
            mounted(r#"component C { view {<a onclick="alert('hi')"></a>} }"#);
        let mut host = Recorder::default();
        inst.dispatch(0, &Fragment::root(), &mut host).unwrap();
        assert_eq!(host.0, ["alert('hi')"]);
    }

    #[test]
    fn test_unknown_handler() {
        let (mut inst, _) = mounted("component C { view {x} }");
        assert!(matches!(
            inst.dispatch(3, &Fragment::root(), &mut IgnoreScripts),
            Err(DispatchError::UnknownHandler { index: 3, .. })
        ));
    }
}
