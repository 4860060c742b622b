//! The reconciliation pipeline: discover partitions in storage, ask the query
//! service what it already knows, register the difference.

use common::discovery::{self, ListObjectsError, ListPrefixesError};
use metastore::{
    PollError, QualifiedTable, QueryOutcome, QueryService, QueryServiceError,
    execution::wait_for_completion,
    reconcile, results,
    results::{FetchResultsError, ResultLocationError},
    statement,
};
use object_store::path::Path;

use crate::context::RunContext;

/// Outcome of reconciling one table.
#[derive(Debug, PartialEq, Eq)]
pub enum TableOutcome {
    /// The pipeline ran to completion.
    Reconciled { discovered: usize, added: usize },
    /// Storage held no materialized partition under the prefix; nothing to do.
    NoPartitions,
    /// The `SHOW PARTITIONS` query reached a terminal failure state.
    QueryFailed { reason: String },
}

/// Per-table record of a run.
#[derive(Debug)]
pub struct TableReport {
    pub table: QualifiedTable,
    pub prefix: Path,
    pub outcome: Result<TableOutcome, SyncError>,
}

/// Runs one reconciliation pass.
///
/// With an explicit `prefix` the single table under it is reconciled;
/// otherwise the configured catalog root is walked and every discovered table
/// is processed in sequence. Table failures are collected into the report,
/// never propagated: one table cannot abort the rest of a catalog run.
pub async fn run<S: QueryService>(
    ctx: &RunContext,
    service: &S,
    prefix: Option<&str>,
) -> Result<Vec<TableReport>, SyncError> {
    match prefix {
        Some(prefix) => {
            let (table, prefix) = resolve_explicit_prefix(ctx, prefix)?;
            tracing::info!(table = %table, prefix = %prefix, "reconciling explicit prefix");
            let outcome = sync_table(ctx, service, &table, &prefix).await;
            Ok(vec![TableReport {
                table,
                prefix,
                outcome,
            }])
        }
        None => run_catalog(ctx, service).await,
    }
}

/// Walks the catalog root and reconciles every non-excluded table against the
/// current month's partition prefix.
async fn run_catalog<S: QueryService>(
    ctx: &RunContext,
    service: &S,
) -> Result<Vec<TableReport>, SyncError> {
    let root = Path::from(ctx.catalog.root_prefix.as_str());
    let tables = discovery::discover_tables(
        ctx.data_store.as_ref(),
        &root,
        &ctx.catalog.excluded_tables,
    )
    .await
    .map_err(SyncError::Walk)?;

    tracing::info!(root = %root, tables = tables.len(), "walked catalog root");

    let mut reports = Vec::with_capacity(tables.len());
    for discovered in tables {
        let table = QualifiedTable::from_storage(
            &discovered.database,
            &discovered.table,
            &ctx.partition_folder,
        );
        let prefix = Path::from(format!(
            "{}/{}/{}",
            discovered.prefix, ctx.partition_folder, ctx.year_month
        ));

        let outcome = sync_table(ctx, service, &table, &prefix).await;
        if let Err(err) = &outcome {
            tracing::error!(table = %table, error = %err, "table reconciliation failed");
        }
        reports.push(TableReport {
            table,
            prefix,
            outcome,
        });
    }

    Ok(reports)
}

/// Reconciles a single table: discovered partitions minus registered
/// partitions, each missing one registered via `ADD IF NOT EXISTS`.
pub async fn sync_table<S: QueryService>(
    ctx: &RunContext,
    service: &S,
    table: &QualifiedTable,
    prefix: &Path,
) -> Result<TableOutcome, SyncError> {
    let discovered = discovery::discover_partitions(
        ctx.data_store.as_ref(),
        prefix,
        ctx.catalog.partition_depth,
        &ctx.catalog.data_file_extension,
    )
    .await
    .map_err(SyncError::Discover)?;

    if discovered.is_empty() {
        tracing::info!(table = %table, prefix = %prefix, "no partitions in storage prefix");
        return Ok(TableOutcome::NoPartitions);
    }

    let show = statement::show_partitions(table);
    let execution_id = service
        .submit(table.database(), &show)
        .await
        .map_err(SyncError::Submit)?;
    let outcome = wait_for_completion(service, &execution_id, &ctx.poll)
        .await
        .map_err(SyncError::Poll)?;

    let output_location = match outcome {
        QueryOutcome::Succeeded { output_location } => output_location,
        QueryOutcome::Failed { reason } => return Ok(TableOutcome::QueryFailed { reason }),
    };

    let result_path =
        results::result_object_path(&output_location).map_err(SyncError::ResultLocation)?;
    let registered =
        results::fetch_registered_partitions(ctx.results_store.as_ref(), &result_path)
            .await
            .map_err(SyncError::FetchResults)?;

    let missing = reconcile::missing_partitions(&discovered, &registered);
    reconcile::register_missing(service, table, &missing)
        .await
        .map_err(SyncError::Register)?;

    tracing::info!(
        table = %table,
        discovered = discovered.len(),
        registered = registered.len(),
        added = missing.len(),
        "table reconciled"
    );

    Ok(TableOutcome::Reconciled {
        discovered: discovered.len(),
        added: missing.len(),
    })
}

/// Derives the qualified table for an explicitly supplied prefix.
///
/// The prefix must live under the catalog root; its first two segments below
/// the root are the database and table directories.
fn resolve_explicit_prefix(
    ctx: &RunContext,
    prefix: &str,
) -> Result<(QualifiedTable, Path), SyncError> {
    let prefix = Path::from(prefix);
    let root = Path::from(ctx.catalog.root_prefix.as_str());

    let mut segments = prefix
        .prefix_match(&root)
        .ok_or_else(|| SyncError::PrefixOutsideCatalog {
            prefix: prefix.to_string(),
            root: root.to_string(),
        })?;

    let (Some(database), Some(table)) = (segments.next(), segments.next()) else {
        return Err(SyncError::MalformedPrefix {
            prefix: prefix.to_string(),
        });
    };

    let table = QualifiedTable::from_storage(
        database.as_ref(),
        table.as_ref(),
        &ctx.partition_folder,
    );

    Ok((table, prefix.clone()))
}

/// Errors from one table's reconciliation pipeline, or from resolving what to
/// reconcile in the first place.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("failed to walk the catalog root")]
    Walk(#[source] ListPrefixesError),

    #[error("prefix '{prefix}' is not under the catalog root '{root}'")]
    PrefixOutsideCatalog { prefix: String, root: String },

    #[error("prefix '{prefix}' does not contain database and table segments")]
    MalformedPrefix { prefix: String },

    #[error("failed to discover partitions in storage")]
    Discover(#[source] ListObjectsError),

    #[error("failed to submit query")]
    Submit(#[source] QueryServiceError),

    #[error("failed while waiting for query completion")]
    Poll(#[source] PollError),

    #[error("query service reported an unusable result location")]
    ResultLocation(#[source] ResultLocationError),

    #[error("failed to fetch registered partitions")]
    FetchResults(#[source] FetchResultsError),

    #[error("failed to register missing partitions")]
    Register(#[source] QueryServiceError),
}
