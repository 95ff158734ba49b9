//! viewset CLI
//!
//! Command-line host for the viewset template registry: render templates from a
//! directory, list what was discovered, and check that everything compiles.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use viewset::{RegistryConfig, TemplateRegistry, ViewData, ViewEngine};

/// Config file picked up from the working directory when `--config` is absent.
const DEFAULT_CONFIG_FILE: &str = "viewset.toml";

/// viewset - render templates from a directory with live reload
#[derive(Parser)]
#[command(name = "viewset", version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Path to a TOML config file (defaults to ./viewset.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Template root directory
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    /// Template file extension, including the dot
    #[arg(short, long, global = true)]
    ext: Option<String>,

    /// Recompile templates before every render
    #[arg(long, global = true)]
    reload: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available viewset commands
#[derive(Subcommand)]
enum Commands {
    /// Render a template to stdout
    ///
    /// Renders NAME, or the default template when NAME is omitted. Data comes
    /// from a JSON file and/or key=value assignments.
    Render {
        /// Template name (e.g. "foo/bar/index")
        name: Option<String>,

        /// JSON file with an object to render against
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Set a value (key=value, JSON values are parsed)
        #[arg(short, long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,

        /// Re-render every SECS seconds with reload enabled until Ctrl-C
        #[arg(short, long, value_name = "SECS")]
        watch: Option<u64>,
    },

    /// List every discovered template name
    List,

    /// Compile all templates and report errors
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize tracing subscriber
    init_tracing(cli.verbose);

    // Execute command
    if let Err(e) = run(cli).await {
        // Log with tracing
        error!("Command failed: {:#}", e);
        // Also print to stderr for CLI users
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Initialize tracing subscriber for structured logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = if verbose {
        EnvFilter::new("viewset=debug")
    } else {
        EnvFilter::new("viewset=info")
    };

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .init();
}

/// Execute the specified command
async fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(&cli)?;
    info!(
        "Template root: {} ({})",
        config.root.display(),
        config.extension
    );

    let registry = TemplateRegistry::from_config(&config)
        .with_context(|| format!("Failed to compile templates in {}", config.root.display()))?;

    match cli.command {
        Commands::Render {
            name,
            data,
            set,
            watch,
        } => {
            let data = build_data(data.as_deref(), &set)?;
            match watch {
                Some(secs) => run_watch(Arc::new(registry), name, data, secs).await,
                None => run_render(&registry, name.as_deref(), &data),
            }
        }
        Commands::List => run_list(&registry),
        Commands::Check => run_check(&registry),
    }
}

/// Load the config file (explicit or default) and apply command-line overrides
fn resolve_config(cli: &Cli) -> Result<RegistryConfig> {
    let mut config = match &cli.config {
        Some(path) => RegistryConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
            RegistryConfig::load(Path::new(DEFAULT_CONFIG_FILE))
                .context("Failed to load ./viewset.toml")?
        }
        None => RegistryConfig::default(),
    };

    if let Some(root) = &cli.root {
        config.root = root.clone();
    }
    if let Some(ext) = &cli.ext {
        config.extension = ext.clone();
    }
    if cli.reload {
        config.reload = true;
    }

    Ok(config)
}

/// Assemble render data from an optional JSON file and key=value assignments
fn build_data(path: Option<&Path>, assignments: &[String]) -> Result<ViewData> {
    let mut data = match path {
        Some(path) => ViewData::from_json_file(path).context("Failed to load render data")?,
        None => ViewData::new(),
    };
    for assignment in assignments {
        data.set_assignment(assignment)
            .with_context(|| format!("Invalid --set assignment: {assignment}"))?;
    }
    Ok(data)
}

fn render(
    registry: &TemplateRegistry,
    name: Option<&str>,
    data: &ViewData,
) -> viewset::Result<String> {
    match name {
        Some(name) => registry.render_to_string(name, data),
        None => registry.render_default_to_string(data),
    }
}

/// Run the render command once
fn run_render(registry: &TemplateRegistry, name: Option<&str>, data: &ViewData) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match name {
        Some(name) => registry
            .render_named(&mut out, name, data)
            .with_context(|| format!("Failed to render {name}"))?,
        None => registry
            .render_default(&mut out, data)
            .context("Failed to render default template")?,
    }
    out.flush().context("Failed to flush stdout")?;
    Ok(())
}

/// Re-render on an interval, printing output whenever it changes
async fn run_watch(
    registry: Arc<TemplateRegistry>,
    name: Option<String>,
    data: ViewData,
    secs: u64,
) -> Result<()> {
    registry.set_reload(true);
    let mut ticker = tokio::time::interval(Duration::from_secs(secs.max(1)));
    let mut last: Option<String> = None;

    // Kept across iterations so a Ctrl-C during a render is still delivered.
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            biased;

            result = &mut ctrl_c => {
                result.context("Failed to listen for Ctrl-C")?;
                info!("Stopping watch");
                return Ok(());
            }
            _ = ticker.tick() => {
                let registry = Arc::clone(&registry);
                let name = name.clone();
                let data = data.clone();
                let result = tokio::task::spawn_blocking(move || {
                    render(&registry, name.as_deref(), &data)
                })
                .await
                .context("Render task panicked")?;

                match result {
                    Ok(output) if last.as_deref() != Some(output.as_str()) => {
                        let mut out = std::io::stdout().lock();
                        out.write_all(output.as_bytes())
                            .and_then(|()| out.flush())
                            .context("Failed to write to stdout")?;
                        last = Some(output);
                    }
                    Ok(_) => {}
                    Err(e) => warn!("Render failed: {:#}", anyhow::Error::new(e)),
                }
            }
        }
    }
}

/// Run the list command
fn run_list(registry: &TemplateRegistry) -> Result<()> {
    let mut out = std::io::stdout().lock();
    for name in registry.list_templates() {
        writeln!(out, "{name}").context("Failed to write to stdout")?;
    }
    Ok(())
}

/// Run the check command
fn run_check(registry: &TemplateRegistry) -> Result<()> {
    let set = registry.snapshot();
    println!(
        "✔ Compiled {} template(s) from {}",
        set.len(),
        registry.root().display()
    );
    if let Some(default) = set.default_name() {
        println!("  default: {default}");
    }
    Ok(())
}
