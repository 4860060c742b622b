//! Storage-side discovery: which databases, tables and partitions physically
//! exist under a bucket prefix.
//!
//! All listing is read-only and paginated by the `object_store` client;
//! storage errors surface unmodified as error sources.

use std::collections::HashSet;

use futures::TryStreamExt;
use object_store::{ObjectStore, path::Path};

use crate::partition::PartitionKey;

/// A table found by walking the catalog root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredTable {
    /// Database-level path segment, as spelled in storage.
    pub database: String,
    /// Table-level path segment.
    pub table: String,
    /// Prefix of the table directory: `<root>/<database>/<table>`.
    pub prefix: Path,
}

/// Lists one level of directory-like common prefixes under `prefix`.
pub async fn list_common_prefixes(
    store: &dyn ObjectStore,
    prefix: &Path,
) -> Result<Vec<Path>, ListPrefixesError> {
    let list_result = store
        .list_with_delimiter(Some(prefix))
        .await
        .map_err(|err| ListPrefixesError {
            prefix: prefix.to_string(),
            source: err,
        })?;

    Ok(list_result.common_prefixes)
}

/// Walks two levels below the catalog `root` (database level, then table
/// level) and returns every table not named in `excluded`.
pub async fn discover_tables(
    store: &dyn ObjectStore,
    root: &Path,
    excluded: &HashSet<String>,
) -> Result<Vec<DiscoveredTable>, ListPrefixesError> {
    let mut tables = Vec::new();

    for database_prefix in list_common_prefixes(store, root).await? {
        let Some(database) = last_segment(&database_prefix) else {
            continue;
        };

        for table_prefix in list_common_prefixes(store, &database_prefix).await? {
            let Some(table) = last_segment(&table_prefix) else {
                continue;
            };
            if excluded.contains(&table) {
                tracing::debug!(%database, %table, "table excluded from catalog walk");
                continue;
            }

            tables.push(DiscoveredTable {
                database: database.clone(),
                table,
                prefix: table_prefix,
            });
        }
    }

    Ok(tables)
}

/// Lists every object under `prefix` and collects the partition keys their
/// paths evidence, deduplicated in first-seen order.
///
/// A partition directory with no file matching `extension` is treated as not
/// yet materialized and yields no key.
pub async fn discover_partitions(
    store: &dyn ObjectStore,
    prefix: &Path,
    depth: usize,
    extension: &str,
) -> Result<Vec<PartitionKey>, ListObjectsError> {
    let objects: Vec<_> = store
        .list(Some(prefix))
        .try_collect()
        .await
        .map_err(|err| ListObjectsError {
            prefix: prefix.to_string(),
            source: err,
        })?;

    let mut seen = HashSet::new();
    let mut partitions = Vec::new();
    for object in objects {
        let Some(key) = PartitionKey::from_object_path(&object.location, depth, extension) else {
            continue;
        };
        if seen.insert(key.clone()) {
            partitions.push(key);
        }
    }

    tracing::debug!(
        prefix = %prefix,
        partitions = partitions.len(),
        "discovered partitions in storage"
    );

    Ok(partitions)
}

fn last_segment(prefix: &Path) -> Option<String> {
    prefix.filename().map(str::to_string)
}

/// Error when listing common prefixes from the object store.
#[derive(Debug, thiserror::Error)]
#[error("failed to list common prefixes under {prefix}")]
pub struct ListPrefixesError {
    prefix: String,
    #[source]
    source: object_store::Error,
}

/// Error when listing objects under a partition-root prefix.
#[derive(Debug, thiserror::Error)]
#[error("failed to list objects under {prefix}")]
pub struct ListObjectsError {
    prefix: String,
    #[source]
    source: object_store::Error,
}
