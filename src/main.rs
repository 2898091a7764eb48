use std::path::PathBuf;
use std::process::ExitCode;

use litgrid::pipeline::{Pipeline, PipelineConfig, RunOutcome};
use litgrid::LitgridApi;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .try_init();

    let api = LitgridApi::from_env_values();

    let mut config = PipelineConfig::default();
    if let Ok(dir) = std::env::var("LITGRID_OUTPUT_DIR") {
        config.output_dir = PathBuf::from(dir);
    }

    let pipeline = Pipeline::new(&api).with_config(config);
    let now = chrono::Local::now().naive_local();

    match pipeline.run(now) {
        Ok(RunOutcome::Completed { export, reports, .. }) => {
            tracing::info!(
                export = %export.display(),
                reports = reports.len(),
                "all files written"
            );
            ExitCode::SUCCESS
        }
        Ok(RunOutcome::NoData) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("analysis failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
