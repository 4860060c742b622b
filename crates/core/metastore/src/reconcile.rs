//! One-directional reconciliation of discovered vs. registered partitions.

use std::collections::HashSet;

use common::partition::PartitionKey;

use crate::{
    client::{QueryService, QueryServiceError},
    statement::{self, QualifiedTable},
};

/// Computes `discovered \ registered` by exact, case-sensitive string
/// membership, preserving discovery order.
///
/// The sync is one-directional: partitions present in both sets are left
/// alone, and partitions only the service knows about are never removed.
pub fn missing_partitions(
    discovered: &[PartitionKey],
    registered: &HashSet<PartitionKey>,
) -> Vec<PartitionKey> {
    discovered
        .iter()
        .filter(|key| !registered.contains(key))
        .cloned()
        .collect()
}

/// Submits one `ADD IF NOT EXISTS PARTITION` statement per missing key.
///
/// Each submission is awaited at the protocol level so rejected statements
/// surface immediately, but the executions are not polled to completion:
/// `IF NOT EXISTS` makes a re-run converge on whatever this run leaves
/// unfinished.
pub async fn register_missing<S: QueryService>(
    service: &S,
    table: &QualifiedTable,
    missing: &[PartitionKey],
) -> Result<(), QueryServiceError> {
    for key in missing {
        tracing::info!(table = %table, partition = %key, "registering missing partition");
        let ddl = statement::add_partition(table, key);
        service.submit(table.database(), &ddl).await?;
    }

    Ok(())
}
