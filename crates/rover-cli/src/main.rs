//! CLI frontend for running rover bot scripts.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "rover",
    about = "Rover: scriptable bots on a 2D field",
    version,
    propagate_version = true
)]
struct Cli {
    /// Log more (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a script against a bot in the demo world
    Run {
        /// Script file
        script: PathBuf,

        /// Callsign of the bot to drive (default: the first bot)
        #[arg(short = 'B', long)]
        bot: Option<String>,

        /// Extra random bots to add to the demo roster
        #[arg(short, long, default_value = "0")]
        bots: usize,

        /// RNG seed for the extra bots
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Animate motions in wall-clock time instead of simulated frames
        #[arg(long)]
        realtime: bool,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compile a script and report syntax errors without running it
    Check {
        /// Script file
        script: PathBuf,
    },

    /// Run the per-tick systems over the demo world
    Simulate {
        /// Number of ticks to run
        #[arg(short, long, default_value = "60")]
        ticks: u64,

        /// Simulated milliseconds per tick
        #[arg(short, long, default_value = "1000")]
        delta_ms: u64,

        /// Extra random bots to add to the demo roster
        #[arg(short, long, default_value = "0")]
        bots: usize,

        /// RNG seed for the extra bots
        #[arg(short, long, default_value = "42")]
        seed: u64,
    },

    /// List script modules and their functions
    Modules {
        /// Print the catalog as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            script,
            bot,
            bots,
            seed,
            realtime,
            json,
        } => commands::run::run(
            &script,
            &commands::run::RunOptions {
                bot,
                bots,
                seed,
                realtime,
                json,
            },
        ),
        Commands::Check { script } => commands::check::run(&script),
        Commands::Simulate {
            ticks,
            delta_ms,
            bots,
            seed,
        } => commands::simulate::run(ticks, delta_ms, bots, seed),
        Commands::Modules { json } => commands::modules::run(json),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
