use menuwise_core::CostRollup;
use serde::Serialize;
use tracing::info;

use crate::commands::{
    data_failure, load_config, read_snapshot, write_snapshot, CommandResult, GlobalOptions,
};

#[derive(Debug, Serialize)]
struct CostsPayload<'a> {
    command: &'a str,
    status: &'a str,
    written: bool,
    rollup: &'a CostRollup,
}

/// Recomputes product costs from recipes; `write` persists them back into the snapshot.
pub fn run(global: &GlobalOptions, write: bool) -> CommandResult {
    let config = match load_config("costs", global) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let path = config.data.snapshot_path;

    let data = match read_snapshot(&path) {
        Ok(data) => data,
        Err(error) => return data_failure("costs", &error),
    };
    let rollup = match data.refresh_costs() {
        Ok(rollup) => rollup,
        Err(error) => return data_failure("costs", &anyhow::Error::new(error)),
    };

    if write {
        let persisted = data.snapshot().map_err(anyhow::Error::new);
        if let Err(error) = persisted.and_then(|snapshot| write_snapshot(&path, &snapshot)) {
            return data_failure("costs", &error);
        }
        info!(
            event_name = "cli.costs.written",
            snapshot = %path.display(),
            updated = rollup.updated_products,
            "recomputed costs written to snapshot"
        );
    }

    if global.json {
        let payload = CostsPayload { command: "costs", status: "ok", written: write, rollup: &rollup };
        return match serde_json::to_string_pretty(&payload) {
            Ok(output) => CommandResult { exit_code: 0, output },
            Err(error) => CommandResult::failure("costs", "serialization", error.to_string(), 1),
        };
    }

    let mut lines = vec![format!(
        "recomputed {} product cost(s), {} changed{}",
        rollup.costs.len(),
        rollup.updated_products,
        if write { ", snapshot updated" } else { "" }
    )];
    lines.extend(
        rollup.costs.iter().map(|(product, cost)| format!("- {product} = {:.2}", cost.round_dp(2))),
    );
    lines.extend(rollup.unmatched_lines.iter().map(|line| format!("! skipped recipe line {line}")));
    CommandResult { exit_code: 0, output: lines.join("\n") }
}
