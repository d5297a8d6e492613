//! Phylo CLI - Command-line interface for neuroevolution runs.

mod commands;
mod config;
mod tasks;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::filter::LevelFilter;

#[derive(Parser)]
#[command(name = "phylo")]
#[command(author, version, about = "Phylo - Evolving network topologies and weights", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new Phylo project
    Init {
        /// Project directory (default: current directory)
        #[arg(short, long)]
        path: Option<String>,
    },

    /// Evolve XOR solvers, resuming the current session if there is one
    Run {
        /// Maximum generations to run (default: from phylo.toml)
        #[arg(short, long)]
        generations: Option<u64>,

        /// Stop once the champion reaches this fitness
        #[arg(long)]
        goal: Option<f64>,

        /// Random seed for a new population
        #[arg(short, long)]
        seed: Option<u64>,

        /// Start a new population even if a session exists
        #[arg(long)]
        fresh: bool,
    },

    /// Show generation statistics
    Stats {
        /// Fraction of each generation averaged as its elite
        #[arg(short, long, default_value = "0.25")]
        elite: f64,

        /// Only show the most recent generations
        #[arg(short, long)]
        last: Option<usize>,
    },

    /// Show the champion network
    Show {
        /// Also list every gene
        #[arg(short, long)]
        genes: bool,
    },

    /// Manage sessions
    Session {
        #[command(subcommand)]
        command: SessionCommands,
    },
}

#[derive(Subcommand)]
enum SessionCommands {
    /// Save current session
    Save {
        /// Session name
        name: String,
    },

    /// Load a saved session
    Load {
        /// Session name
        name: String,
    },

    /// List saved sessions
    List,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Init { path } => commands::init::run(path),
        Commands::Run {
            generations,
            goal,
            seed,
            fresh,
        } => commands::run::run(
            commands::run::RunOptions {
                generations,
                goal,
                seed,
                fresh,
            },
            cli.verbose,
        ),
        Commands::Stats { elite, last } => commands::stats::run(elite, last),
        Commands::Show { genes } => commands::show::run(genes),
        Commands::Session { command } => match command {
            SessionCommands::Save { name } => commands::session::save(&name),
            SessionCommands::Load { name } => commands::session::load(&name),
            SessionCommands::List => commands::session::list(),
        },
    }
}
