//! homeflow - Main Entry Point
//!
//! Command-line interface for inspecting smart-home compositions: list their
//! privacy pipelines, cut denied ones, and compare saved graphs.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use homeflow::{
    catalog::Catalog,
    config::{ensure_app_data_dir, AppConfig, GraphFile, LoadPolicy},
    graph::{presets::Preset, Graph},
    policy::{OverlayBuilder, PathEnumerator, Permissions},
};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "homeflow")]
#[command(about = "Privacy pipelines for smart-home compositions", long_about = None)]
struct Cli {
    /// Config file (defaults to homeflow.toml in the app data directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Extra module/sensor catalog (TOML), merged over the built-ins
    #[arg(long)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every pipeline of a graph with its index and decision
    Pipelines {
        /// Graph file (defaults to the configured store path)
        graph: Option<PathBuf>,

        /// Output as JSON (machine-readable)
        #[arg(long)]
        json: bool,
    },

    /// Write the graph with denied pipelines cut
    Overlay {
        graph: Option<PathBuf>,

        /// Pipeline index to deny (repeatable)
        #[arg(long, required = true)]
        deny: Vec<usize>,

        /// Where to write the overlay graph
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Write a reference composition
    Preset {
        #[arg(value_enum)]
        name: Preset,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Show what changed between two graph files
    Diff { a: PathBuf, b: PathBuf },

    /// Load a graph leniently and report every rejected entity or edge
    Check { graph: Option<PathBuf> },
}

fn init_logging(config: &AppConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));

    let (file_layer, guard) = if config.logging.log_to_file {
        match ensure_app_data_dir() {
            Ok(dir) => {
                let appender = tracing_appender::rolling::daily(dir, "homeflow.log");
                let (writer, guard) = tracing_appender::non_blocking(appender);
                (
                    Some(fmt::layer().with_ansi(false).with_writer(writer)),
                    Some(guard),
                )
            }
            Err(e) => {
                eprintln!("File logging disabled: {}", e);
                (None, None)
            }
        }
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    guard
}

fn load_catalog(cli: &Cli, config: &AppConfig) -> Result<Catalog> {
    let mut catalog = Catalog::builtin();
    for path in [config.catalog_path.as_ref(), cli.catalog.as_ref()]
        .into_iter()
        .flatten()
    {
        let extra = Catalog::load(path)
            .with_context(|| format!("Failed to load catalog {:?}", path))?;
        catalog.merge(extra);
    }
    Ok(catalog)
}

fn graph_path(arg: Option<PathBuf>, config: &AppConfig) -> Result<PathBuf> {
    arg.or_else(|| config.store_path.clone())
        .context("No graph file given and no store_path configured")
}

fn load_graph(file: &GraphFile, catalog: &Catalog, policy: LoadPolicy) -> Result<Graph> {
    match policy {
        LoadPolicy::Strict => {
            Graph::from_format(&file.graph, catalog).context("Graph file is inconsistent")
        }
        LoadPolicy::Lenient => {
            let (graph, skipped) = Graph::from_format_lenient(&file.graph, catalog);
            for err in &skipped {
                tracing::warn!("Skipped: {}", err);
            }
            Ok(graph)
        }
    }
}

fn permissions_of(graph: &Graph, file: &GraphFile) -> Permissions {
    let mut permissions = Permissions::new(PathEnumerator::enumerate(&graph.to_format()));
    permissions.apply_records(&file.permissions);
    permissions
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match cli.config.clone().or_else(AppConfig::default_path) {
        Some(path) => AppConfig::load(&path)
            .with_context(|| format!("Failed to load config {:?}", path))?,
        None => AppConfig::default(),
    };
    let _guard = init_logging(&config);
    let catalog = load_catalog(&cli, &config)?;

    match cli.command {
        Commands::Pipelines { graph, json } => {
            let path = graph_path(graph, &config)?;
            let file = GraphFile::load(&path)?;
            let g = load_graph(&file, &catalog, config.load_policy)?;
            let permissions = permissions_of(&g, &file);

            if json {
                let rows: Vec<_> = permissions
                    .iter()
                    .map(|(index, pipeline, allowed)| {
                        serde_json::json!({
                            "index": index,
                            "allowed": allowed,
                            "pipeline": pipeline,
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                for (index, pipeline, allowed) in permissions.iter() {
                    let decision = if allowed { "allow" } else { "deny " };
                    println!("[{:>3}] {} {}", index, decision, pipeline);
                }
            }
        }

        Commands::Overlay {
            graph,
            deny,
            output,
        } => {
            let path = graph_path(graph, &config)?;
            let file = GraphFile::load(&path)?;
            let g = load_graph(&file, &catalog, config.load_policy)?;
            let mut permissions = permissions_of(&g, &file);
            for index in deny {
                permissions.deny(index)?;
            }

            let overlay = OverlayBuilder::new(&catalog).build(&g, &permissions)?;
            for module in &overlay.report.revoked_network {
                println!("revoked network access: {}", module);
            }
            for edge in &overlay.report.removed_state_edges {
                println!("removed state edge: {}", edge);
            }

            let name = format!("{} (overlay)", file.name);
            GraphFile::new(name, overlay.graph.to_format())
                .with_permissions(permissions.to_records())
                .save(&output)?;
        }

        Commands::Preset { name, output } => {
            let g = name.build(&catalog)?;
            GraphFile::new(name.name(), g.to_format()).save(&output)?;
            println!("Wrote {} to {}", name.name(), output.display());
        }

        Commands::Diff { a, b } => {
            let before = GraphFile::load(&a)?;
            let after = GraphFile::load(&b)?;
            let diff = before.graph.diff(&after.graph);
            if diff.is_empty() {
                println!("No changes");
            } else {
                print!("{}", diff);
            }
        }

        Commands::Check { graph } => {
            let path = graph_path(graph, &config)?;
            check(&path, &catalog)?;
        }
    }

    Ok(())
}

fn check(path: &Path, catalog: &Catalog) -> Result<()> {
    let file = GraphFile::load(path)?;
    let (graph, skipped) = Graph::from_format_lenient(&file.graph, catalog);
    for err in &skipped {
        println!("rejected: {}", err);
    }
    if !skipped.is_empty() {
        bail!("{} items of {:?} were rejected", skipped.len(), path);
    }
    println!(
        "{:?}: {} sensors, {} modules, {} pipelines",
        path,
        graph.sensor_count(),
        graph.module_count(),
        PathEnumerator::enumerate(&graph.to_format()).len()
    );
    Ok(())
}
