use crate::analyses::Analysis;
use crate::context::PipelineContext;
use crate::error::Result;
use crate::report::{assemble, write_report};
use crate::result::AnalysisResult;
use common::config::CrashConfig;
use common::util::time::format_duration;
use rayon::prelude::*;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, instrument};

/// Runs all eight analyses over `context`, returning their results in
/// analysis order. With `parallel` set the analyses run as rayon tasks.
/// The first failing analysis fails the whole run.
#[instrument(skip(context))]
pub fn run_all(context: &PipelineContext, parallel: bool) -> Result<Vec<(Analysis, AnalysisResult)>> {
    let run = |analysis: &Analysis| analysis.run(context).map(|result| (*analysis, result));
    if parallel {
        Analysis::ALL.par_iter().map(run).collect()
    } else {
        Analysis::ALL.iter().map(run).collect()
    }
}

/// Loads the inputs named by `config`, runs every analysis and writes the
/// report. Returns the path of the written report.
#[instrument(skip_all)]
pub fn run_pipeline(config: &CrashConfig) -> Result<PathBuf> {
    config.validate()?;

    let start = Instant::now();
    let context = PipelineContext::load(config)?;
    info!("Loaded inputs in {}", format_duration(start.elapsed()));

    let analyses_start = Instant::now();
    let results = run_all(&context, *config.parallel())?;
    info!(
        "Ran {} analyses in {}",
        results.len(),
        format_duration(analyses_start.elapsed())
    );

    let path = config.report_path();
    write_report(&assemble(&results)?, &path)?;
    info!("Pipeline finished in {}", format_duration(start.elapsed()));
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions_sorted::assert_eq;

    #[test]
    fn test_parallel_matches_sequential() {
        let context = PipelineContext::empty();
        let sequential = run_all(&context, false).unwrap();
        let parallel = run_all(&context, true).unwrap();
        assert_eq!(parallel, sequential);
        assert_eq!(
            sequential.iter().map(|(a, _)| a.number()).collect::<Vec<_>>(),
            vec![1, 2, 3, 4, 5, 6, 7, 8]
        );
    }
}
