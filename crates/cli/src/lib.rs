pub mod commands;
pub mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "waypoint",
    about = "Waypoint point-of-interest dialog CLI",
    long_about = "Inspect configuration, replay scripted conversations, and chat with the \
                  waypoint dialog over fixture providers.",
    after_help = "Examples:\n  waypoint config\n  \
                  waypoint replay --script scripts/route_to_nearest.toml\n  \
                  waypoint chat --fixtures my_places.toml"
)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        help = "Config file (defaults to waypoint.toml or config/waypoint.toml)"
    )]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Run a TOML replay script and report expectation failures")]
    Replay {
        #[arg(long, help = "Replay script to run")]
        script: PathBuf,
        #[arg(long, help = "Fixture catalog to search instead of the bundled demo places")]
        fixtures: Option<PathBuf>,
    },
    #[command(
        about = "Talk to the dialog on stdin; `/location <lat>,<lon>` sends a device location"
    )]
    Chat {
        #[arg(long, help = "Fixture catalog to search instead of the bundled demo places")]
        fixtures: Option<PathBuf>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => commands::config::run(cli.config.as_deref()),
        Command::Replay { script, fixtures } => {
            commands::replay::run(&commands::replay::ReplayArgs {
                script,
                fixtures,
                config: cli.config,
            })
        }
        Command::Chat { fixtures } => commands::chat::run(cli.config.as_deref(), fixtures),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
