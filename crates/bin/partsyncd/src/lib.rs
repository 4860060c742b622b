// Core modules
pub mod cli;
pub mod context;
pub mod sync;

#[cfg(test)]
mod tests;

use config::Config;
use metastore::HttpQueryService;

use self::{cli::Cli, sync::TableOutcome};

// Re-export for convenience
pub use self::{context::RunContext, sync::TableReport};

/// Loads configuration, builds the run context and drives one reconciliation
/// pass, logging a per-table summary at the end.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(&cli.config, true, None)?;
    tracing::info!(
        stage = %config.stage,
        config = %config.config_path.display(),
        "starting partition reconciliation"
    );

    let service = HttpQueryService::new(
        &config.query_endpoint,
        config.query_results_url.to_string(),
    )?;
    let ctx = RunContext::from_config(&config)?;

    let reports = sync::run(&ctx, &service, cli.prefix.as_deref()).await?;

    let mut failures = 0usize;
    for report in &reports {
        match &report.outcome {
            Ok(TableOutcome::Reconciled { discovered, added }) => {
                tracing::info!(
                    table = %report.table,
                    discovered,
                    added,
                    "table in sync"
                );
            }
            Ok(TableOutcome::NoPartitions) => {
                tracing::info!(table = %report.table, prefix = %report.prefix, "nothing to reconcile");
            }
            Ok(TableOutcome::QueryFailed { reason }) => {
                failures += 1;
                tracing::warn!(table = %report.table, %reason, "query execution failed");
            }
            Err(err) => {
                failures += 1;
                tracing::warn!(table = %report.table, error = %err, "table not reconciled");
            }
        }
    }

    if failures > 0 {
        tracing::warn!(tables = reports.len(), failures, "run finished with failures");
    } else {
        tracing::info!(tables = reports.len(), "run finished");
    }

    Ok(())
}
