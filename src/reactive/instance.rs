//! Component instances.
//!
//! # Responsibilities
//! - Own one instance's state, route spec, surface and handler table
//! - Turn every state write into exactly one UI update
//! - Show, hide and re-render against the current fragment
//!
//! # Design Decisions
//! - Writes go through [`ComponentInstance::set`]; there is no interception
//!   of arbitrary mutation
//! - An instance without a surface keeps its state but never renders
//! - A hidden instance is not re-rendered; its last content stays in place

use std::fmt;
use std::rc::Rc;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::compiler::{ComponentDecl, EvalError, Span};
use crate::observability::metrics;
use crate::reactive::render::{render, HandlerBinding, RenderError, RenderOptions};
use crate::reactive::state::State;
use crate::routing::{Fragment, Matcher, RouteSpec};
use crate::surface::Surface;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct InstanceId(pub(crate) u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "instance-{}", self.0)
    }
}

/// Hook run on route changes before the instance re-renders.
pub type RouteHook = Box<dyn FnMut(&Fragment, &mut State) -> anyhow::Result<()>>;

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{span}: initializer of `{component}.{key}` failed: {source}")]
pub struct InitError {
    pub component: String,
    pub key: String,
    pub span: Span,
    pub source: EvalError,
}

pub struct ComponentInstance {
    id: InstanceId,
    definition: Rc<ComponentDecl>,
    pub(crate) state: State,
    route: RouteSpec,
    surface: Option<Box<dyn Surface>>,
    pub(crate) handlers: Vec<HandlerBinding>,
    route_hook: Option<RouteHook>,
    options: RenderOptions,
}

impl ComponentInstance {
    /// Evaluate the definition's state initializers in declaration order.
    ///
    /// Each initializer sees the keys declared before it. Nothing renders.
    pub fn new(
        id: InstanceId,
        definition: Rc<ComponentDecl>,
        options: RenderOptions,
    ) -> Result<Self, InitError> {
        let mut state = State::new();
        for decl in &definition.states {
            let value = decl.init.eval(&state).map_err(|source| InitError {
                component: definition.name.clone(),
                key: decl.name.clone(),
                span: decl.span,
                source,
            })?;
            state.stage(decl.name.clone(), value);
        }
        let route = definition
            .route
            .as_ref()
            .map(|r| RouteSpec::Literal(r.fragment.clone()))
            .unwrap_or_default();

        Ok(Self {
            id,
            definition,
            state,
            route,
            surface: None,
            handlers: Vec::new(),
            route_hook: None,
            options,
        })
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn definition(&self) -> &Rc<ComponentDecl> {
        &self.definition
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.state.get(key)
    }

    pub fn route(&self) -> &RouteSpec {
        &self.route
    }

    pub fn set_route(&mut self, route: RouteSpec) {
        self.route = route;
    }

    pub fn set_route_hook(&mut self, hook: RouteHook) {
        self.route_hook = Some(hook);
    }

    /// Handler table of the most recent successful render.
    pub fn handlers(&self) -> &[HandlerBinding] {
        &self.handlers
    }

    pub fn is_mounted(&self) -> bool {
        self.surface.is_some()
    }

    pub fn surface_id(&self) -> Option<&str> {
        self.surface.as_ref().map(|s| s.id())
    }

    pub(crate) fn attach(&mut self, surface: Box<dyn Surface>) {
        self.surface = Some(surface);
    }

    pub(crate) fn detach(&mut self) -> Option<Box<dyn Surface>> {
        self.handlers.clear();
        self.surface.take()
    }

    /// Register `key` with an initial value. Does not render.
    pub fn make_reactive(&mut self, key: impl Into<String>, initial: Value) {
        self.state.stage(key, initial);
    }

    /// Store `value` under `key`, then update the UI.
    ///
    /// The value is stored even when the update fails.
    pub fn set(
        &mut self,
        key: impl Into<String>,
        value: Value,
        current: &Fragment,
    ) -> Result<(), RenderError> {
        self.state.stage(key, value);
        self.update_ui(current)
    }

    /// Read-modify-write of one key, with a single UI update.
    pub fn update<F>(&mut self, key: &str, f: F, current: &Fragment) -> Result<(), RenderError>
    where
        F: FnOnce(Option<&Value>) -> Value,
    {
        let value = f(self.state.get(key));
        self.set(key, value, current)
    }

    pub fn should_render_for_route(&self, current: &Fragment) -> bool {
        self.route.matches(current)
    }

    /// Bring the surface in line with state and route.
    pub fn update_ui(&mut self, current: &Fragment) -> Result<(), RenderError> {
        if self.surface.is_none() {
            return Ok(());
        }
        let visible = self.should_render_for_route(current);
        metrics::record_render(&self.definition.name, visible);

        let Some(surface) = self.surface.as_mut() else {
            return Ok(());
        };
        if !visible {
            surface.set_visible(false);
            return Ok(());
        }
        surface.set_visible(true);

        let rendered = render(&self.definition.view, &self.state, &self.options)?;
        surface.replace_content(&rendered.markup);
        self.handlers = rendered.handlers;
        tracing::trace!(instance = %self.id, component = %self.definition.name, "Rendered");
        Ok(())
    }

    /// Run the route hook, if any. The caller re-renders afterwards.
    pub fn on_route_change(&mut self, current: &Fragment) -> anyhow::Result<()> {
        match self.route_hook.as_mut() {
            Some(hook) => hook(current, &mut self.state),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for ComponentInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInstance")
            .field("id", &self.id)
            .field("name", &self.definition.name)
            .field("state", &self.state)
            .field("route", &self.route)
            .field("surface", &self.surface_id())
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;
    use crate::surface::{Document, MemoryDocument};
    use serde_json::json;

    fn instance(src: &str) -> ComponentInstance {
        let decl = compile(src).unwrap().components.remove(0);
        ComponentInstance::new(InstanceId(1), Rc::new(decl), RenderOptions::default()).unwrap()
    }

    fn mounted(src: &str) -> (ComponentInstance, MemoryDocument) {
        let document = MemoryDocument::with_surfaces(["app"]);
        let mut inst = instance(src);
        inst.attach(document.surface("app").unwrap());
        (inst, document)
    }

    #[test]
    fn test_initializers_see_earlier_keys() {
        let inst = instance("component A { state a = 2 state b = a * 3 view { } }");
        assert_eq!(inst.get("b"), Some(&json!(6)));
    }

    #[test]
    fn test_failing_initializer() {
        let decl = compile("component A { state b = missing view { } }")
            .unwrap()
            .components
            .remove(0);
        let err = ComponentInstance::new(InstanceId(1), Rc::new(decl), RenderOptions::default())
            .unwrap_err();
        assert_eq!(err.key, "b");
        assert_eq!(err.source, EvalError::Unbound("missing".into()));
    }

    #[test]
    fn test_unmounted_set_is_silent() {
        let mut inst = instance("component A { state n = 0 view { ${n} } }");
        inst.set("n", json!(4), &Fragment::root()).unwrap();
        assert_eq!(inst.get("n"), Some(&json!(4)));
        assert!(!inst.is_mounted());
    }

    #[test]
    fn test_each_set_renders_once() {
        let (mut inst, document) = mounted("component A { state n = 0 view {${n}} }");
        let root = Fragment::root();
        inst.set("n", json!(1), &root).unwrap();
        inst.update("n", |v| json!(v.and_then(Value::as_i64).unwrap_or(0) + 1), &root)
            .unwrap();
        let record = document.record("app").unwrap();
        assert_eq!(record.content, "2");
        assert_eq!(record.content_writes, 2);
    }

    #[test]
    fn test_hidden_instance_keeps_content() {
        let (mut inst, document) =
            mounted(r#"component A { route = "x" state n = 0 view {${n}} }"#);
        inst.update_ui(&Fragment::normalize("#/x")).unwrap();
        inst.set("n", json!(9), &Fragment::root()).unwrap();

        let record = document.record("app").unwrap();
        assert!(!record.visible);
        assert_eq!(record.content, "0");
        assert_eq!(record.content_writes, 1);
    }

    #[test]
    fn test_route_hook_runs_before_render() {
        let (mut inst, document) = mounted("component A { state n = 5 view {${n}} }");
        inst.set_route_hook(Box::new(|_: &Fragment, state: &mut State| -> anyhow::Result<()> {
            state.stage("n", json!(0));
            Ok(())
        }));
        let root = Fragment::root();
        inst.on_route_change(&root).unwrap();
        inst.update_ui(&root).unwrap();
        assert_eq!(document.content("app").as_deref(), Some("0"));
    }

    #[test]
    fn test_render_failure_leaves_content() {
        let (mut inst, document) =
            mounted("component A { state items = [1] view {{each items as i}${i}{endeach}} }");
        let root = Fragment::root();
        inst.update_ui(&root).unwrap();
        let err = inst.set("items", json!("nope"), &root).unwrap_err();
        assert!(matches!(err, RenderError::NotIterable { .. }));
        assert_eq!(document.content("app").as_deref(), Some("1"));
    }
}
