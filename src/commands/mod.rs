use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod build;
mod report;

use build::{BuildArgs, run_build};
use report::{run_places, run_stats};

#[derive(Parser)]
#[command(
    name = "story-skeleton",
    version,
    about = "Seeded grid simulation that writes a story skeleton timeline",
    long_about = None
)]
pub struct Cli {
    /// Log simulation progress to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true, action = ArgAction::SetTrue)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run a simulation and write its skeleton document
    Build(BuildArgs),
    /// Summarize the actions recorded in a skeleton file
    Stats {
        /// Skeleton JSON file written by `build`
        file: PathBuf,
    },
    /// List every place name of a grid
    Places {
        /// Grid side length
        #[arg(long, allow_negative_numbers = true)]
        grid_size: i64,
    },
}

pub fn run() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    if let Err(err) = dispatch(cli.command) {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_target(false)
        .init();
}

fn dispatch(command: Command) -> Result<(), String> {
    match command {
        Command::Build(args) => run_build(args),
        Command::Stats { file } => run_stats(&file),
        Command::Places { grid_size } => run_places(grid_size),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_build_overrides() {
        let cli = Cli::try_parse_from([
            "story-skeleton",
            "build",
            "--seed",
            "7",
            "--grid-size",
            "4",
            "--characters",
            "3",
            "--iterations",
            "2",
            "--show-labels",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        let Command::Build(args) = cli.command else {
            panic!("expected build");
        };
        assert_eq!(args.seed, Some(7));
        assert_eq!(args.grid_size, Some(4));
        assert_eq!(args.characters, Some(3));
        assert_eq!(args.iterations, Some(2));
        assert!(args.show_labels);
        assert!(args.output.is_none());
    }

    #[test]
    fn negative_sizes_reach_validation() {
        let cli =
            Cli::try_parse_from(["story-skeleton", "places", "--grid-size", "-2"]).unwrap();
        let Command::Places { grid_size } = cli.command else {
            panic!("expected places");
        };
        assert_eq!(grid_size, -2);
        assert!(dispatch(Command::Places { grid_size }).is_err());
    }
}
