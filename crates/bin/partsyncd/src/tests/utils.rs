//! Shared fixtures for the reconciliation integration tests.

use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
    time::Duration,
};

use common::partition::PartitionKey;
use config::CatalogConfig;
use metastore::{
    ExecutionId, ExecutionState, ExecutionStatus, PollPolicy, QueryService, QueryServiceError,
};
use object_store::{ObjectStore, PutPayload, memory::InMemory, path::Path};

use crate::context::RunContext;

/// In-memory [`QueryService`] for driving the pipeline without HTTP.
///
/// Every submission is recorded. Status polls resolve immediately: an
/// execution whose statement contains a configured failure marker reports
/// `FAILED`, everything else reports `SUCCEEDED` with the configured result
/// location.
pub struct FakeQueryService {
    result_location: String,
    fail_marker: Option<String>,
    submissions: Mutex<Vec<Submission>>,
}

#[derive(Debug, Clone)]
pub struct Submission {
    pub database: String,
    pub statement: String,
}

impl FakeQueryService {
    pub fn new(result_location: impl Into<String>) -> Self {
        Self {
            result_location: result_location.into(),
            fail_marker: None,
            submissions: Mutex::new(Vec::new()),
        }
    }

    /// Any statement containing `marker` will report a FAILED execution.
    pub fn failing_on(mut self, marker: impl Into<String>) -> Self {
        self.fail_marker = Some(marker.into());
        self
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions.lock().unwrap().clone()
    }

    fn statement_of(&self, id: &ExecutionId) -> String {
        let index: usize = id
            .as_str()
            .strip_prefix("exec-")
            .expect("unexpected execution id")
            .parse()
            .expect("unexpected execution id");
        self.submissions.lock().unwrap()[index].statement.clone()
    }
}

impl QueryService for FakeQueryService {
    async fn submit(
        &self,
        database: &str,
        statement: &str,
    ) -> Result<ExecutionId, QueryServiceError> {
        let mut submissions = self.submissions.lock().unwrap();
        let id = ExecutionId::new(format!("exec-{}", submissions.len()));
        submissions.push(Submission {
            database: database.to_string(),
            statement: statement.to_string(),
        });
        Ok(id)
    }

    async fn status(&self, id: &ExecutionId) -> Result<ExecutionStatus, QueryServiceError> {
        let statement = self.statement_of(id);
        let failed = self
            .fail_marker
            .as_ref()
            .is_some_and(|marker| statement.contains(marker));

        if failed {
            Ok(ExecutionStatus {
                state: ExecutionState::Failed,
                state_change_reason: Some("GENERIC_INTERNAL_ERROR".to_string()),
                output_location: None,
            })
        } else {
            Ok(ExecutionStatus {
                state: ExecutionState::Succeeded,
                state_change_reason: None,
                output_location: Some(self.result_location.clone()),
            })
        }
    }
}

/// A run context over in-memory stores, pinned to April 2021.
pub fn test_context(
    data_store: Arc<InMemory>,
    results_store: Arc<InMemory>,
    excluded_tables: impl IntoIterator<Item = &'static str>,
) -> RunContext {
    RunContext {
        catalog: CatalogConfig {
            root_prefix: "data/landing".to_string(),
            excluded_tables: excluded_tables
                .into_iter()
                .map(str::to_string)
                .collect::<HashSet<_>>(),
            data_file_extension: "json.gz".to_string(),
            partition_depth: 2,
        },
        partition_folder: "raw".to_string(),
        year_month: PartitionKey::new("year=2021/month=04"),
        poll: PollPolicy {
            min_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            max_attempts: 3,
        },
        data_store,
        results_store,
    }
}

pub async fn put_empty(store: &InMemory, key: &str) {
    store
        .put(&Path::from(key), PutPayload::from_static(b"{}"))
        .await
        .expect("Failed to seed data object");
}

pub async fn put_result_object(store: &InMemory, key: &str, lines: &str) {
    store
        .put(&Path::from(key), PutPayload::from(lines.as_bytes().to_vec()))
        .await
        .expect("Failed to seed result object");
}
