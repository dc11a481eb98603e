use clap::Parser;
use cli::run::{handle_list, handle_run, load_config};
use cli::{Cli, Commands};
use common::config::DEFAULT_LOG_LEVEL;
use common::util::trace::initialize_tracing;
use tracing::info;

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    match args.command() {
        Commands::Run(args) => {
            let config = load_config(args)?;
            initialize_tracing(config.log_level())?;
            info!("crashes started");
            let report = handle_run(&config)?;
            println!("{}", report.display());
        }
        Commands::List => {
            initialize_tracing(DEFAULT_LOG_LEVEL)?;
            handle_list(&mut std::io::stdout().lock())?;
        }
    }

    Ok(())
}
