pub mod commands;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "stylegraph",
    about = "Stylegraph operator CLI",
    long_about = "Build navigation graphs over a catalog snapshot, generate synthetic \
                  interaction sessions, and produce personalized recommendations.",
    after_help = "Examples:\n  stylegraph migrate\n  stylegraph seed\n  stylegraph build-graph\n  stylegraph simulate\n  stylegraph recommend --user user001\n  stylegraph doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the deterministic demo catalog into the metadata store")]
    Seed,
    #[command(about = "Build the navigation graph from the current catalog snapshot")]
    BuildGraph {
        #[arg(long, help = "RNG seed for the diversity-injection scan")]
        seed: Option<u64>,
    },
    #[command(about = "Generate one synthetic interaction session per simulated user")]
    Simulate {
        #[arg(long, help = "RNG seed for the session walks")]
        seed: Option<u64>,
    },
    #[command(about = "Produce personalized recommendations for the target users")]
    Recommend {
        #[arg(long, help = "Recommend for this user only (defaults to configured targets)")]
        user: Option<String>,
        #[arg(long, help = "Source item id (defaults to the user's most recent click)")]
        source: Option<String>,
        #[arg(long, help = "RNG seed for cold-start source selection")]
        seed: Option<u64>,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution"
    )]
    Config,
    #[command(about = "Validate config, database connectivity, and schema readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::BuildGraph { seed } => commands::build_graph::run(seed),
        Command::Simulate { seed } => commands::simulate::run(seed),
        Command::Recommend { user, source, seed } => {
            commands::recommend::run(user.as_deref(), source.as_deref(), seed)
        }
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Diagnostics go to stderr so stdout stays machine-readable.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}
