//! Waymark command line: inspect occupancy-grid maps and render annotated
//! composites without a window.
//!
//! ```text
//! waymark info map.pgm --json
//! waymark render map.pgm -o out.pgm --waypoint 10,20,0 --waypoint 80,40 --plan --grid
//! ```

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use wm_core::{ConfigError, FormatError, LoadError, PlanningError, Waypoint};
use wm_render::LayerError;

#[derive(Parser, Debug)]
#[command(name = "waymark", version, about = "Occupancy-grid map annotator")]
struct Cli {
    /// Editor settings as JSON; missing keys keep their defaults.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log at debug level (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the header and sample statistics of a P5 map.
    Info {
        file: PathBuf,

        /// Emit JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Load a map, annotate it, and write the flattened composite as P5.
    Render {
        file: PathBuf,

        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// `x,y` or `x,y,theta` in image pixels and radians. Repeatable.
        #[arg(long = "waypoint", value_name = "X,Y[,THETA]", value_parser = commands::parse_waypoint)]
        waypoints: Vec<Waypoint>,

        /// Plan and draw a path through the waypoints.
        #[arg(long)]
        plan: bool,

        /// Show the reference grid.
        #[arg(long)]
        grid: bool,

        /// Hide a layer by name (base, drawing, waypoints, path). Repeatable.
        #[arg(long, value_name = "LAYER")]
        hide: Vec<String>,

        /// Use the dark canvas theme.
        #[arg(long)]
        dark: bool,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Layer(#[from] LayerError),

    #[error(transparent)]
    Planning(#[from] PlanningError),

    #[error("nothing to render")]
    Empty,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = commands::load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Info { file, json } => commands::info(&file, &config, json),
        Command::Render {
            file,
            output,
            waypoints,
            plan,
            grid,
            hide,
            dark,
        } => commands::render(
            config,
            &commands::RenderJob {
                file,
                output,
                waypoints,
                plan,
                grid,
                hide,
                dark,
            },
        ),
    }
}
