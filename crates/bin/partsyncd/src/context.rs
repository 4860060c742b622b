//! Immutable per-run context shared by every pipeline stage.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use common::{partition::PartitionKey, store::ObjectStoreCreationError};
use config::{CatalogConfig, Config};
use metastore::PollPolicy;
use object_store::ObjectStore;

/// Everything one reconciliation run needs, resolved once from configuration
/// and passed by reference through the pipeline. Nothing in here mutates.
pub struct RunContext {
    /// Catalog walk settings.
    pub catalog: CatalogConfig,
    /// Partition folder convention for the active stage.
    pub partition_folder: String,
    /// Current-month partition suffix for the catalog walk.
    pub year_month: PartitionKey,
    /// Query status poll schedule.
    pub poll: PollPolicy,
    /// Store for the partitioned data bucket.
    pub data_store: Arc<dyn ObjectStore>,
    /// Store for the bucket the query service writes result objects to.
    pub results_store: Arc<dyn ObjectStore>,
}

impl RunContext {
    /// Builds the run context from resolved configuration, creating the
    /// object stores for the active stage's buckets.
    pub fn from_config(config: &Config) -> Result<Self, ContextError> {
        let data_store = common::store::new(&config.bucket_url).map_err(ContextError::DataStore)?;
        let results_store =
            common::store::new(&config.query_results_url).map_err(ContextError::ResultsStore)?;

        Ok(Self {
            catalog: config.catalog.clone(),
            partition_folder: config.partition_folder.clone(),
            year_month: PartitionKey::year_month(Utc::now().date_naive()),
            poll: PollPolicy {
                min_delay: Duration::from_secs(config.poll.min_delay_secs),
                max_delay: Duration::from_secs(config.poll.max_delay_secs),
                max_attempts: config.poll.max_attempts,
            },
            data_store,
            results_store,
        })
    }
}

/// Failed to build the run context.
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("failed to create data bucket store")]
    DataStore(#[source] ObjectStoreCreationError),

    #[error("failed to create query results store")]
    ResultsStore(#[source] ObjectStoreCreationError),
}
