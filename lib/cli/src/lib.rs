use clap::{command, Args, Parser, Subcommand};
use getset::Getters;
use std::path::PathBuf;

pub mod run;

/// Default location of the optional TOML configuration file.
pub const DEFAULT_CONFIG_FILE: &str = "crashes.toml";

/// crashes: Crash analytics over the state crash record extracts
#[derive(Debug, Parser, Getters)]
#[command(name = "crashes")]
#[command(about = "crashes: Batch analytics over vehicle crash records", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    #[getset(get = "pub")]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run all eight analyses and write the report
    Run(RunArgs),
    /// List the analyses and their descriptions
    List,
}

#[derive(Debug, Args, Getters)]
#[getset(get = "pub")]
pub struct RunArgs {
    /// Path to the TOML configuration file (optional)
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// Directory holding the six input CSV files
    #[arg(short, long)]
    data_dir: Option<PathBuf>,
    /// Directory the report is written to
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
    /// Run the analyses one after another instead of in parallel
    #[arg(short, long)]
    sequential: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions_sorted::assert_eq;

    #[test]
    fn test_parse_run_flags() {
        let cli = Cli::parse_from([
            "crashes",
            "run",
            "--data-dir",
            "input",
            "-o",
            "out",
            "--sequential",
        ]);
        let Commands::Run(args) = cli.command() else {
            panic!("expected the run command");
        };
        assert_eq!(args.config(), &PathBuf::from(DEFAULT_CONFIG_FILE));
        assert_eq!(args.data_dir(), &Some(PathBuf::from("input")));
        assert_eq!(args.output_dir(), &Some(PathBuf::from("out")));
        assert!(*args.sequential());
    }

    #[test]
    fn test_parse_list() {
        let cli = Cli::parse_from(["crashes", "list"]);
        assert!(matches!(cli.command(), Commands::List));
    }

    #[test]
    fn test_rejects_unknown_command() {
        assert!(Cli::try_parse_from(["crashes", "serve"]).is_err());
    }
}
