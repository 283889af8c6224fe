use menuwise_core::{AnalysisRequest, PricingAnalyzer};
use tracing::info;

use crate::commands::{data_failure, load_config, read_snapshot, CommandResult, GlobalOptions};

/// Loads config and the data snapshot, runs one request, and renders the outcome.
pub fn run(command: &str, global: &GlobalOptions, request: AnalysisRequest) -> CommandResult {
    let config = match load_config(command, global) {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let data = match read_snapshot(&config.data.snapshot_path) {
        Ok(data) => data,
        Err(error) => return data_failure(command, &error),
    };

    let mut analyzer = PricingAnalyzer::new(data, config.analysis);
    if let Some(as_of) = global.as_of {
        analyzer = analyzer.with_reference_date(as_of);
    }

    info!(
        event_name = "cli.analysis.start",
        command,
        analysis = request.kind(),
        snapshot = %config.data.snapshot_path.display(),
        "running analysis"
    );
    let outcome = analyzer.run(&request);
    CommandResult::from_outcome(&outcome, global.json)
}
