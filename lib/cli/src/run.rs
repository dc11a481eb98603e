use crate::RunArgs;
use analysis::{run_pipeline, Analysis};
use anyhow::{Context, Result};
use common::config::CrashConfig;
use std::io::Write;
use std::path::PathBuf;
use tracing::{info, instrument};

/// Loads the configuration named by `args` and applies the command line
/// overrides on top of it.
pub fn load_config(args: &RunArgs) -> Result<CrashConfig> {
    let config = CrashConfig::load_from_file_and_env(args.config())
        .with_context(|| format!("loading configuration from {}", args.config().display()))?;
    Ok(apply_overrides(args, config))
}

/// Flags given on the command line win over file and environment values.
pub fn apply_overrides(args: &RunArgs, mut config: CrashConfig) -> CrashConfig {
    if let Some(data_dir) = args.data_dir() {
        config.set_data_dir(data_dir.clone());
    }
    if let Some(output_dir) = args.output_dir() {
        config.set_output_dir(output_dir.clone());
    }
    if *args.sequential() {
        config.set_parallel(false);
    }
    config
}

#[instrument(skip_all, fields(data_dir = ?config.data_dir(), parallel = config.parallel()))]
pub fn handle_run(config: &CrashConfig) -> Result<PathBuf> {
    let report = run_pipeline(config).context("crash analysis run failed")?;
    info!(report = %report.display(), "Analyses completed");
    Ok(report)
}

/// Prints one line per analysis: its number and description.
pub fn handle_list(out: &mut impl Write) -> Result<()> {
    for analysis in Analysis::ALL {
        writeln!(out, "{:>2}  {}", analysis.number(), analysis.description())?;
    }
    Ok(())
}
