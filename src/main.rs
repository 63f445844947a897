//! hashview command-line tool.
//!
//! ```text
//! hashview [-c config.toml] check  <file> [--emit-tree]
//! hashview [-c config.toml] render <file> [--route R]...
//! hashview [-c config.toml] watch  <file> [--route R]
//! ```
//!
//! `.html`/`.htm` files are scanned for template sources; any other file is
//! a single source mounted on the configured default surface.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

use hashview::config::{self, AppConfig, SourceWatcher};
use hashview::loader::{bootstrap, discover_template_sources, TemplateSource};
use hashview::observability::logging;
use hashview::routing::MemoryLocation;
use hashview::surface::MemoryDocument;
use hashview::{App, Compiler, Shutdown};

#[derive(Parser)]
#[command(name = "hashview")]
#[command(about = "Check and render hashview templates", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile every template source and report errors
    Check {
        file: PathBuf,
        /// Print the compiled instruction tree as JSON
        #[arg(long)]
        emit_tree: bool,
    },
    /// Mount every source and print the surfaces, once per route
    Render {
        file: PathBuf,
        #[arg(long = "route")]
        routes: Vec<String>,
    },
    /// Render, then render again whenever the file changes
    Watch {
        file: PathBuf,
        #[arg(long)]
        route: Option<String>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => config::load_config(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => AppConfig::default(),
    };
    logging::init(&config.observability)?;

    match cli.command {
        Commands::Check { file, emit_tree } => check(&file, &config, emit_tree),
        Commands::Render { file, routes } => render(&file, &config, &routes),
        Commands::Watch { file, route } => watch(&file, &config, route).await,
    }
}

fn read_sources(file: &Path, config: &AppConfig) -> anyhow::Result<Vec<TemplateSource>> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let is_page = file
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"));

    if is_page {
        Ok(discover_template_sources(&text, &config.loader))
    } else {
        Ok(vec![TemplateSource {
            mount: config.loader.default_mount.clone(),
            source: text,
            line: 1,
        }])
    }
}

fn check(file: &Path, config: &AppConfig, emit_tree: bool) -> anyhow::Result<()> {
    let sources = read_sources(file, config)?;
    let compiler = Compiler::new();
    let mut failed = 0;

    for source in &sources {
        match compiler.compile(&source.source) {
            Ok(program) => {
                let names: Vec<_> = program.components.iter().map(|c| c.name.as_str()).collect();
                println!(
                    "{}: source at line {}: ok [{}]",
                    file.display(),
                    source.line,
                    names.join(", ")
                );
                if emit_tree {
                    println!("{}", serde_json::to_string_pretty(&program)?);
                }
            }
            Err(e) => {
                failed += 1;
                eprintln!("{}: source at line {}: error: {}", file.display(), source.line, e);
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} template sources failed to compile", failed, sources.len());
    }
    Ok(())
}

fn render(file: &Path, config: &AppConfig, routes: &[String]) -> anyhow::Result<()> {
    let sources = read_sources(file, config)?;
    let (mut app, document) = build_app(config, &sources);
    app.init();

    if routes.is_empty() {
        print_surfaces(&app, &document);
    }
    for route in routes {
        app.navigate(route);
        app.process_pending();
        print_surfaces(&app, &document);
    }
    Ok(())
}

async fn watch(file: &Path, config: &AppConfig, route: Option<String>) -> anyhow::Result<()> {
    let routes: Vec<String> = route.into_iter().collect();
    let shutdown = Shutdown::new();
    let mut stop = shutdown.subscribe();
    let _signal = shutdown.trigger_on_ctrl_c();

    let (watcher, mut changes) = SourceWatcher::new(file, &config.watch);
    let _watcher = watcher.run()?;

    render(file, config, &routes)?;
    loop {
        tokio::select! {
            _ = stop.recv() => break,
            changed = changes.recv() => match changed {
                Some(_) => {
                    if let Err(e) = render(file, config, &routes) {
                        tracing::error!(error = %e, "Render failed; waiting for the next change");
                    }
                }
                None => break,
            },
        }
    }

    tracing::info!("Watch stopped");
    Ok(())
}

/// One surface per distinct mount target, with every source loaded.
fn build_app(config: &AppConfig, sources: &[TemplateSource]) -> (App, MemoryDocument) {
    let mounts: BTreeSet<&str> = sources.iter().map(|s| s.mount.as_str()).collect();
    let document = MemoryDocument::with_surfaces(mounts);
    let location = MemoryLocation::new(&config.router.initial_fragment);
    let mut app = App::new(location, document.clone()).with_render_options((&config.render).into());

    let report = bootstrap(&mut app, sources);
    for failure in &report.failures {
        eprintln!("source at line {} ({}): {}", failure.line, failure.mount, failure.error);
    }
    (app, document)
}

fn print_surfaces(app: &App, document: &MemoryDocument) {
    println!("== {} ==", app.current_fragment());
    for (id, record) in document.snapshot() {
        if record.visible {
            println!("[{}]", id);
            println!("{}", record.content);
        } else {
            println!("[{}] (hidden)", id);
        }
    }
}
