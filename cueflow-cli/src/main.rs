//! cueflow CLI - validate and run interactive graphics automation headlessly.

mod commands;
mod observability;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::actions::ActionOptions;
use commands::run::RunOptions;
use observability::{LogFormat, init_tracing};
use std::path::PathBuf;

/// cueflow - "when X happens, do Y" for broadcast graphics.
#[derive(Parser)]
#[command(name = "cueflow")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log output format (defaults to pretty on a terminal)
    #[arg(long, global = true, value_enum, env = "CUEFLOW_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Engine settings file (YAML or JSON)
    #[arg(short, long, global = true, env = "CUEFLOW_CONFIG")]
    config: Option<PathBuf>,

    /// Record per-node debug events in the authored log
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a node graph file
    Validate {
        /// Path to the graph (YAML or JSON)
        file: PathBuf,

        /// Host function names that callFunction nodes may use
        #[arg(short, long = "function")]
        functions: Vec<String>,

        /// Treat warnings as failures
        #[arg(long)]
        strict: bool,
    },

    /// Dispatch one event through a node graph
    Run {
        /// Path to the graph (YAML or JSON)
        graph: PathBuf,

        /// Event type, e.g. click
        #[arg(short, long)]
        event: String,

        /// Id of the element that raised the event
        #[arg(long)]
        element: Option<String>,

        /// Event payload as JSON
        #[arg(long)]
        payload: Option<String>,

        /// Scene file with elements, templates, layers and data
        #[arg(short, long)]
        scene: Option<PathBuf>,

        /// Initial runtime state file
        #[arg(long)]
        state: Option<PathBuf>,

        /// Complete delays immediately
        #[arg(long)]
        instant: bool,
    },

    /// Run an action list
    Actions {
        /// Path to the action list (YAML or JSON)
        file: PathBuf,

        /// Event type the list is bound to
        #[arg(short, long, default_value = "click")]
        event: String,

        /// Id of the element that raised the event
        #[arg(long)]
        element: Option<String>,

        /// Event payload as JSON
        #[arg(long)]
        payload: Option<String>,

        /// Scene file with elements, templates, layers and data
        #[arg(short, long)]
        scene: Option<PathBuf>,

        /// Initial runtime state file
        #[arg(long)]
        state: Option<PathBuf>,

        /// Complete delays immediately
        #[arg(long)]
        instant: bool,
    },

    /// Evaluate an expression (or a script with --script)
    Eval {
        /// Expression or script source
        source: String,

        /// Treat the source as a script
        #[arg(long)]
        script: bool,

        /// Only check that the source is valid
        #[arg(long)]
        check: bool,

        /// Scene file with elements, templates, layers and data
        #[arg(short, long)]
        scene: Option<PathBuf>,

        /// Initial runtime state file
        #[arg(long)]
        state: Option<PathBuf>,
    },

    /// Show version information and effective limits
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_format)?;
    let settings = commands::load_settings(cli.config.as_deref(), cli.debug)?;

    match cli.command {
        Commands::Validate {
            file,
            functions,
            strict,
        } => commands::validate::run(&file, &functions, strict),
        Commands::Run {
            graph,
            event,
            element,
            payload,
            scene,
            state,
            instant,
        } => {
            let options = RunOptions {
                graph: &graph,
                event: &event,
                element: element.as_deref(),
                payload: payload.as_deref(),
                scene: scene.as_deref(),
                state: state.as_deref(),
                instant,
            };
            commands::run::run(options, settings).await
        }
        Commands::Actions {
            file,
            event,
            element,
            payload,
            scene,
            state,
            instant,
        } => {
            let options = ActionOptions {
                file: &file,
                event: &event,
                element: element.as_deref(),
                payload: payload.as_deref(),
                scene: scene.as_deref(),
                state: state.as_deref(),
                instant,
            };
            commands::actions::run(options, settings).await
        }
        Commands::Eval {
            source,
            script,
            check,
            scene,
            state,
        } => {
            commands::eval::run(
                &source,
                script,
                check,
                scene.as_deref(),
                state.as_deref(),
                settings,
            )
            .await
        }
        Commands::Version => commands::version::run(&settings),
    }
}
