//! Application context.
//!
//! # Responsibilities
//! - Own the router, the instance registry, the document, the shared store
//!   and the registered component definitions
//! - Mount and unmount instances
//! - Broadcast route changes to every registered instance
//! - Expose the programmatic navigation API (`navigate_to`, `go_back`)
//!
//! # Design Decisions
//! - One explicit context object replaces process-wide singletons
//! - A hook or render failure in one instance is logged and the broadcast
//!   continues with the next instance
//! - A missing mount surface is not an error: the instance is discarded

use std::collections::BTreeMap;
use std::rc::Rc;

use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::compiler::{CompileError, ComponentDecl, Compiler, Program};
use crate::reactive::{
    ComponentInstance, DispatchError, IgnoreScripts, InitError, InstanceId, Registry,
    RenderError, RenderOptions, ScriptHost, State,
};
use crate::routing::{Fragment, Location, Navigation, NavigationEvent, Router};
use crate::store::Store;
use crate::surface::Document;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("no component named `{0}` is registered")]
    UnknownComponent(String),

    #[error("{0} is not mounted")]
    UnknownInstance(InstanceId),

    #[error(transparent)]
    Init(#[from] InitError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// Copies a store key into an instance's state.
#[derive(Debug, Clone)]
struct StoreBinding {
    key: String,
    instance: InstanceId,
    state_key: String,
}

pub struct App {
    pub(crate) router: Router,
    pub(crate) registry: Registry,
    document: Box<dyn Document>,
    store: Store,
    scripts: Box<dyn ScriptHost>,
    compiler: Compiler,
    options: RenderOptions,
    definitions: BTreeMap<String, Rc<ComponentDecl>>,
    store_bindings: Vec<StoreBinding>,
    pub(crate) navigation: Option<mpsc::UnboundedReceiver<NavigationEvent>>,
}

impl App {
    pub fn new(location: impl Location + 'static, document: impl Document + 'static) -> Self {
        Self {
            router: Router::new(Box::new(location)),
            registry: Registry::new(),
            document: Box::new(document),
            store: Store::new(),
            scripts: Box::new(IgnoreScripts),
            compiler: Compiler::new(),
            options: RenderOptions::default(),
            definitions: BTreeMap::new(),
            store_bindings: Vec::new(),
            navigation: None,
        }
    }

    pub fn with_render_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_script_host(mut self, scripts: impl ScriptHost + 'static) -> Self {
        self.scripts = Box::new(scripts);
        self
    }

    pub fn with_compiler(mut self, compiler: Compiler) -> Self {
        self.compiler = compiler;
        self
    }

    pub fn with_store(mut self, store: Store) -> Self {
        self.store = store;
        self
    }

    /// Read the ambient fragment, start listening for changes and run one
    /// broadcast so initial visibility is correct.
    ///
    /// Calling it again re-reads the fragment and broadcasts, without
    /// subscribing twice.
    pub fn init(&mut self) {
        if self.navigation.is_none() {
            self.navigation = Some(self.router.subscribe());
        }
        self.update_all();
        tracing::info!(
            fragment = %self.router.current_fragment(),
            instances = self.registry.len(),
            "Application initialized"
        );
    }

    pub fn current_fragment(&self) -> &Fragment {
        self.router.current_fragment()
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn compile(&self, source: &str) -> Result<Program, CompileError> {
        self.compiler.compile(source)
    }

    /// Register a definition under its name, replacing any earlier one.
    pub fn register_definition(&mut self, definition: ComponentDecl) -> Rc<ComponentDecl> {
        let definition = Rc::new(definition);
        if self
            .definitions
            .insert(definition.name.clone(), Rc::clone(&definition))
            .is_some()
        {
            tracing::debug!(component = %definition.name, "Replaced component definition");
        }
        definition
    }

    pub fn definition(&self, name: &str) -> Option<&Rc<ComponentDecl>> {
        self.definitions.get(name)
    }

    pub fn definition_names(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    /// Create an unmounted instance; its state initializers run now.
    pub fn instantiate(&mut self, definition: Rc<ComponentDecl>) -> Result<ComponentInstance, InitError> {
        let id = self.registry.allocate_id();
        ComponentInstance::new(id, definition, self.options.clone())
    }

    /// Attach `instance` to surface `surface_id`, register it and render it once.
    ///
    /// Returns `None` and drops the instance when the surface does not exist.
    pub fn mount(&mut self, mut instance: ComponentInstance, surface_id: &str) -> Option<InstanceId> {
        let Some(surface) = self.document.surface(surface_id) else {
            tracing::debug!(
                component = %instance.name(),
                surface = %surface_id,
                "Mount surface not found; skipping"
            );
            return None;
        };
        instance.attach(surface);
        let id = self.registry.register(instance);

        let current = self.router.current_fragment().clone();
        if let Some(instance) = self.registry.get_mut(id) {
            tracing::debug!(instance = %id, component = %instance.name(), surface = %surface_id, "Mounted");
            if let Err(e) = instance.update_ui(&current) {
                tracing::warn!(instance = %id, error = %e, "Initial render failed");
            }
        }
        Some(id)
    }

    /// Instantiate the registered definition `name` and mount it.
    pub fn mount_named(&mut self, name: &str, surface_id: &str) -> Result<Option<InstanceId>, AppError> {
        let definition = self
            .definitions
            .get(name)
            .cloned()
            .ok_or_else(|| AppError::UnknownComponent(name.to_string()))?;
        let instance = self.instantiate(definition)?;
        Ok(self.mount(instance, surface_id))
    }

    /// Remove an instance from the broadcast set and release its surface.
    pub fn unmount(&mut self, id: InstanceId) -> Option<ComponentInstance> {
        let mut instance = self.registry.remove(id)?;
        instance.detach();
        self.store_bindings.retain(|b| b.instance != id);
        tracing::debug!(instance = %id, component = %instance.name(), "Unmounted");
        Some(instance)
    }

    pub fn instance(&self, id: InstanceId) -> Option<&ComponentInstance> {
        self.registry.get(id)
    }

    pub fn instance_mut(&mut self, id: InstanceId) -> Option<&mut ComponentInstance> {
        self.registry.get_mut(id)
    }

    pub fn instance_ids(&self) -> Vec<InstanceId> {
        self.registry.ids()
    }

    pub fn instance_count(&self) -> usize {
        self.registry.len()
    }

    pub fn state(&self, id: InstanceId) -> Option<&State> {
        self.registry.get(id).map(ComponentInstance::state)
    }

    /// Write one state key of a mounted instance and re-render it.
    pub fn set_state(&mut self, id: InstanceId, key: &str, value: Value) -> Result<(), AppError> {
        let current = self.router.current_fragment().clone();
        let instance = self
            .registry
            .get_mut(id)
            .ok_or(AppError::UnknownInstance(id))?;
        instance.set(key, value, &current)?;
        Ok(())
    }

    /// Run handler `handler` of instance `id`.
    pub fn dispatch(&mut self, id: InstanceId, handler: usize) -> Result<(), AppError> {
        let current = self.router.current_fragment().clone();
        let instance = self
            .registry
            .get_mut(id)
            .ok_or(AppError::UnknownInstance(id))?;
        instance.dispatch(handler, &current, self.scripts.as_mut())?;
        Ok(())
    }

    /// Recompute the current fragment, then run every instance's route hook
    /// and UI update in registration order.
    pub fn update_all(&mut self) {
        let current = self.router.refresh().clone();
        tracing::debug!(fragment = %current, instances = self.registry.len(), "Broadcasting route change");
        for instance in self.registry.iter_mut() {
            if let Err(e) = instance.on_route_change(&current) {
                tracing::warn!(instance = %instance.id(), error = %e, "Route hook failed");
            }
            if let Err(e) = instance.update_ui(&current) {
                tracing::warn!(instance = %instance.id(), error = %e, "Render failed");
            }
        }
    }

    /// Navigate to a fragment.
    ///
    /// Navigating to the current fragment broadcasts immediately; any other
    /// target changes the ambient hash and the broadcast happens when the
    /// change notification is processed.
    pub fn navigate(&mut self, target: &str) {
        if self.router.navigate(target) == Navigation::Refresh {
            self.update_all();
        }
    }

    /// `#...` targets go through the router; anything else leaves the app.
    pub fn navigate_to(&mut self, target: &str) {
        if target.is_empty() || target.starts_with('#') {
            self.navigate(target);
        } else {
            self.router.location_mut().assign(target);
        }
    }

    /// Go back in history, or to `fallback` when there is none.
    pub fn go_back(&mut self, fallback: Option<&str>) {
        if self.router.location().has_history() {
            self.router.location_mut().back();
        } else if let Some(fallback) = fallback {
            self.navigate_to(fallback);
        }
    }

    /// Copy store key `key` into `state_key` of instance `id` now (if set)
    /// and on every later [`App::store_set`] / [`App::store_update`] of it.
    pub fn bind_store_key(&mut self, key: &str, id: InstanceId, state_key: &str) -> Result<(), AppError> {
        if self.registry.get(id).is_none() {
            return Err(AppError::UnknownInstance(id));
        }
        self.store_bindings.push(StoreBinding {
            key: key.to_string(),
            instance: id,
            state_key: state_key.to_string(),
        });
        if let Some(value) = self.store.get(key) {
            self.set_state(id, state_key, value)?;
        }
        Ok(())
    }

    pub fn store_set(&mut self, key: &str, value: Value) {
        self.store.set(key, value.clone());
        self.propagate_store_key(key, &value);
    }

    pub fn store_update<F>(&mut self, key: &str, f: F)
    where
        F: FnOnce(Option<&Value>) -> Value,
    {
        self.store.update(key, f);
        if let Some(value) = self.store.get(key) {
            self.propagate_store_key(key, &value);
        }
    }

    fn propagate_store_key(&mut self, key: &str, value: &Value) {
        let current = self.router.current_fragment().clone();
        for binding in self.store_bindings.iter().filter(|b| b.key == key) {
            let Some(instance) = self.registry.get_mut(binding.instance) else {
                continue;
            };
            if let Err(e) = instance.set(binding.state_key.as_str(), value.clone(), &current) {
                tracing::warn!(instance = %binding.instance, error = %e, "Render after store update failed");
            }
        }
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("router", &self.router)
            .field("instances", &self.registry.len())
            .field("definitions", &self.definitions.keys().collect::<Vec<_>>())
            .field("store", &self.store)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{MemoryLocation, RouteSpec};
    use crate::surface::MemoryDocument;
    use serde_json::json;

    fn app(initial: &str, surfaces: &[&str]) -> (App, MemoryLocation, MemoryDocument) {
        let location = MemoryLocation::new(initial);
        let document = MemoryDocument::with_surfaces(surfaces.iter().copied());
        let app = App::new(location.clone(), document.clone());
        (app, location, document)
    }

    fn define(app: &mut App, source: &str) {
        for component in app.compile(source).unwrap().components {
            app.register_definition(component);
        }
    }

    #[test]
    fn test_mount_renders_once() {
        let (mut app, _, document) = app("", &["app"]);
        define(&mut app, "component A { state n = 3 view {${n}} }");
        let id = app.mount_named("A", "app").unwrap();
        assert!(id.is_some());
        let record = document.record("app").unwrap();
        assert_eq!(record.content, "3");
        assert_eq!(record.content_writes, 1);
    }

    #[test]
    fn test_missing_surface_is_silent() {
        let (mut app, _, _) = app("", &["app"]);
        define(&mut app, "component A { view {x} }");
        assert_eq!(app.mount_named("A", "nowhere").unwrap(), None);
        assert_eq!(app.instance_count(), 0);
    }

    #[test]
    fn test_unknown_component() {
        let (mut app, _, _) = app("", &["app"]);
        assert!(matches!(
            app.mount_named("Nope", "app"),
            Err(AppError::UnknownComponent(_))
        ));
    }

    #[test]
    fn test_navigate_to_current_broadcasts_immediately() {
        let (mut app, location, document) = app("#/", &["app"]);
        define(&mut app, "component A { view {x} }");
        app.mount_named("A", "app").unwrap();
        app.init();
        let before = document.record("app").unwrap().content_writes;

        app.navigate("#/");
        assert_eq!(document.record("app").unwrap().content_writes, before + 1);
        assert_eq!(location.history_len(), 0);
        assert_eq!(app.process_pending(), 0);
    }

    #[test]
    fn test_navigate_elsewhere_waits_for_notification() {
        let (mut app, location, document) = app("#/", &["app"]);
        define(&mut app, r#"component A { route = "x" view {x} }"#);
        app.mount_named("A", "app").unwrap();
        app.init();
        assert_eq!(document.is_visible("app"), Some(false));

        app.navigate("x");
        assert_eq!(location.hash(), "#/x");
        assert_eq!(app.current_fragment().as_str(), "#/");
        assert_eq!(app.process_pending(), 1);
        assert_eq!(app.current_fragment().as_str(), "#/x");
        assert_eq!(document.is_visible("app"), Some(true));
    }

    #[test]
    fn test_failing_hook_does_not_stop_broadcast() {
        let (mut app, _, document) = app("#/", &["a", "b"]);
        define(&mut app, "component A { state n = 0 view {${n}} }");
        let first = app.mount_named("A", "a").unwrap().unwrap();
        app.mount_named("A", "b").unwrap();
        app.instance_mut(first)
            .unwrap()
            .set_route_hook(Box::new(|_: &Fragment, _: &mut State| -> anyhow::Result<()> {
                anyhow::bail!("hook exploded")
            }));

        app.update_all();
        assert_eq!(document.record("a").unwrap().content_writes, 2);
        assert_eq!(document.record("b").unwrap().content_writes, 2);
    }

    #[test]
    fn test_failing_render_does_not_stop_broadcast() {
        let (mut app, _, document) = app("#/", &["a", "b"]);
        define(
            &mut app,
            "component Bad { state items = 1 view {{each items as i}${i}{endeach}} }
             component Good { view {ok} }",
        );
        app.mount_named("Bad", "a").unwrap();
        app.mount_named("Good", "b").unwrap();
        assert_eq!(document.record("a").unwrap().content_writes, 0);
        assert_eq!(document.record("b").unwrap().content_writes, 1);

        app.update_all();
        assert_eq!(document.record("a").unwrap().content_writes, 0);
        assert_eq!(document.record("b").unwrap().content_writes, 2);
        assert_eq!(document.content("b").as_deref(), Some("ok"));
    }

    #[test]
    fn test_unmount_removes_from_broadcast() {
        let (mut app, _, document) = app("#/", &["a", "b"]);
        define(&mut app, "component A { view {x} }");
        let a = app.mount_named("A", "a").unwrap().unwrap();
        app.mount_named("A", "b").unwrap();
        assert!(app.unmount(a).is_some());
        assert!(app.unmount(a).is_none());

        app.update_all();
        assert_eq!(app.instance_count(), 1);
        assert_eq!(document.record("a").unwrap().content_writes, 1);
        assert_eq!(document.record("b").unwrap().content_writes, 2);
    }

    #[test]
    fn test_predicate_route() {
        let (mut app, _, document) = app("#/admin/users", &["app"]);
        define(&mut app, "component A { view {x} }");
        let id = app.mount_named("A", "app").unwrap().unwrap();
        app.instance_mut(id)
            .unwrap()
            .set_route(RouteSpec::predicate(|f: &str| f.starts_with("#/admin")));
        app.init();
        assert_eq!(document.is_visible("app"), Some(true));
        app.navigate("home");
        app.process_pending();
        assert_eq!(document.is_visible("app"), Some(false));
    }

    #[test]
    fn test_navigate_to_external() {
        let (mut app, location, _) = app("#/", &[]);
        app.init();
        app.navigate_to("https://example.com/docs");
        assert_eq!(location.external_destinations(), ["https://example.com/docs"]);
        assert_eq!(location.hash(), "#/");
    }

    #[test]
    fn test_go_back() {
        let (mut app, location, _) = app("#/", &[]);
        app.init();
        app.go_back(None);
        assert_eq!(location.hash(), "#/");

        app.go_back(Some("#/home"));
        assert_eq!(location.hash(), "#/home");
        app.go_back(Some("#/elsewhere"));
        assert_eq!(location.hash(), "#/");
        assert_eq!(app.process_pending(), 2);
    }

    #[test]
    fn test_store_binding() {
        let (mut app, _, document) = app("#/", &["app"]);
        define(&mut app, "component A { state user = \"\" view {${user}} }");
        let id = app.mount_named("A", "app").unwrap().unwrap();
        app.store_set("user", json!("ada"));
        app.bind_store_key("user", id, "user").unwrap();
        assert_eq!(document.content("app").as_deref(), Some("ada"));

        app.store_update("user", |_| json!("grace"));
        assert_eq!(document.content("app").as_deref(), Some("grace"));
        assert_eq!(app.state(id).unwrap().get("user"), Some(&json!("grace")));
    }
}
