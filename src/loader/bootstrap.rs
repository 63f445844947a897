//! Compile discovered sources and mount their first components.

use serde::Serialize;
use thiserror::Error;

use crate::compiler::CompileError;
use crate::loader::discovery::TemplateSource;
use crate::observability::metrics;
use crate::reactive::{InitError, InstanceId};
use crate::runtime::App;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("{0}")]
    Compile(#[from] CompileError),

    #[error("{0}")]
    Init(#[from] InitError),

    #[error("source declares no component")]
    EmptySource,
}

/// A source that could not be loaded.
#[derive(Debug)]
pub struct LoadFailure {
    pub mount: String,
    /// Page line the source starts on.
    pub line: usize,
    pub error: LoadError,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mounted {
    pub component: String,
    pub surface: String,
    pub instance: InstanceId,
}

#[derive(Debug, Default)]
pub struct LoadReport {
    pub mounted: Vec<Mounted>,
    pub failures: Vec<LoadFailure>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Load every source into `app`.
///
/// All components of a source are registered as definitions; the first one
/// is instantiated and mounted on the source's surface. A failing source is
/// reported and skipped. A missing surface is skipped without a failure.
pub fn bootstrap(app: &mut App, sources: &[TemplateSource]) -> LoadReport {
    let mut report = LoadReport::default();
    for source in sources {
        match load_source(app, source) {
            Ok(Some(mounted)) => report.mounted.push(mounted),
            Ok(None) => {}
            Err(error) => {
                tracing::error!(
                    mount = %source.mount,
                    line = source.line,
                    error = %error,
                    "Failed to load template source"
                );
                report.failures.push(LoadFailure {
                    mount: source.mount.clone(),
                    line: source.line,
                    error,
                });
            }
        }
    }
    tracing::info!(
        mounted = report.mounted.len(),
        failed = report.failures.len(),
        "Template sources loaded"
    );
    report
}

fn load_source(app: &mut App, source: &TemplateSource) -> Result<Option<Mounted>, LoadError> {
    let program = app
        .compile(&source.source)
        .inspect_err(|_| metrics::record_compile_failure())?;
    let mut components = program.components.into_iter();
    let first = components.next().ok_or(LoadError::EmptySource)?;

    let definition = app.register_definition(first);
    for other in components {
        app.register_definition(other);
    }

    let instance = app.instantiate(definition)?;
    let component = instance.name().to_string();
    Ok(app.mount(instance, &source.mount).map(|id| Mounted {
        component,
        surface: source.mount.clone(),
        instance: id,
    }))
}
