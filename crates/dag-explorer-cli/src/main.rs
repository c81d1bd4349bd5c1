use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod error;

use dag_explorer_graph::ExplorerPath;
use error::CliError;

#[derive(Parser, Debug)]
#[clap(version, about = "Inspect asset graphs and replay explorer selection sessions")]
struct Args {
    /// Enable verbose output
    #[arg(short = 'v', global = true)]
    verbose: bool,

    /// TOML file with explorer settings (scale thresholds, zoom factors)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that a graph can be laid out: no cycles, and which notice applies
    Check {
        /// Graph snapshot JSON or an array of asset records
        #[arg()]
        graph: PathBuf,

        /// Number of assets the query could match (defaults to the node count)
        #[arg(long)]
        query_items: Option<usize>,

        /// The graph was replaced by an empty default because it is too large
        #[arg(long)]
        empty_default: bool,
    },

    /// Print whether TO lies downstream or upstream of FROM
    Direction {
        #[arg()]
        graph: PathBuf,
        /// Asset token, path components joined with '/'
        #[arg()]
        from: String,
        #[arg()]
        to: String,
    },

    /// Print the tokens a shift-click from FROM to TO would select
    Range {
        #[arg()]
        graph: PathBuf,
        #[arg()]
        from: String,
        #[arg()]
        to: String,
    },

    /// Print the edges drawn at a zoom scale
    Edges {
        #[arg()]
        graph: PathBuf,
        /// Layout JSON produced by the layout engine
        #[arg()]
        layout: PathBuf,
        #[arg(long, default_value_t = 1.0)]
        scale: f64,
    },

    /// Replay a script of clicks and key presses through the selection machine
    Select {
        #[arg()]
        graph: PathBuf,
        /// Event script, one event per line
        #[arg()]
        script: PathBuf,
        #[arg(long)]
        layout: Option<PathBuf>,
        /// Initial selection, comma-separated tokens
        #[arg(long)]
        selection: Option<String>,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.verbose);
    tracing::debug!(?args, "parsed arguments");

    let config = commands::load_config(args.config.as_deref())?;

    let output = match args.command {
        Command::Check {
            graph,
            query_items,
            empty_default,
        } => commands::check(commands::load_graph(&graph)?, query_items, empty_default)?,
        Command::Direction { graph, from, to } => {
            commands::direction(&commands::load_graph(&graph)?, &from, &to)?
        }
        Command::Range { graph, from, to } => {
            commands::range(&commands::load_graph(&graph)?, &from, &to)?
        }
        Command::Edges {
            graph,
            layout,
            scale,
        } => commands::edges(
            &commands::load_graph(&graph)?,
            &commands::load_layout(&layout)?,
            &config,
            scale,
        ),
        Command::Select {
            graph,
            script,
            layout,
            selection,
        } => {
            let graph = commands::load_graph(&graph)?;
            let layout = layout
                .map(|path| commands::load_layout(&path))
                .transpose()?;
            let script = std::fs::read_to_string(&script)
                .map_err(|e| CliError::Read(script.clone(), e))?;
            let path = ExplorerPath {
                op_names: selection.into_iter().collect(),
                ..ExplorerPath::default()
            };
            commands::select(&graph, layout.as_ref(), &config, path, &script)?
        }
    };

    println!("{output}");
    Ok(())
}
