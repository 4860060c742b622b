//! Statement synthesis for the Hive-style query dialect.

use common::partition::PartitionKey;

/// A table as the query service knows it: `database.table`.
///
/// Storage spells database names with dashes where the query dialect wants
/// underscores, and query-side table names carry the partition-folder suffix
/// (`clicks` stored under `raw_compressed/` is queried as
/// `clicks_raw_compressed`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedTable {
    database: String,
    table: String,
}

impl QualifiedTable {
    /// Builds the query-side name for a table found in storage.
    pub fn from_storage(
        database_segment: &str,
        table_segment: &str,
        partition_folder: &str,
    ) -> Self {
        Self {
            database: database_segment.replace('-', "_"),
            table: format!("{table_segment}_{partition_folder}"),
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

impl std::fmt::Display for QualifiedTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.database, self.table)
    }
}

/// `SHOW PARTITIONS <db>.<table>` — lists the partitions the service has
/// registered, one per result line.
pub fn show_partitions(table: &QualifiedTable) -> String {
    format!("SHOW PARTITIONS {table}")
}

/// `ALTER TABLE <db>.<table> ADD IF NOT EXISTS PARTITION (<k>=<v>, ...)` —
/// registers one partition; `IF NOT EXISTS` keeps re-runs idempotent.
pub fn add_partition(table: &QualifiedTable, key: &PartitionKey) -> String {
    format!(
        "ALTER TABLE {table} ADD IF NOT EXISTS PARTITION ({})",
        key.partition_spec()
    )
}
