//! Query service protocol client.
//!
//! The service exposes an asynchronous-query HTTP API: submitting a statement
//! returns an execution handle immediately, and the execution is observed via
//! a separate status endpoint. Result objects land in the configured output
//! location with server-side encryption.

use std::{future::Future, time::Duration};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::execution::{ExecutionId, ExecutionStatus};

/// Server-side encryption mode requested for every result object.
const SERVER_SIDE_ENCRYPTION: &str = "SSE";

/// Default timeout for individual protocol calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Seam over the query service protocol.
///
/// The reconciler and the poll loop only ever talk to this trait, so they can
/// be exercised against a scripted service in tests.
pub trait QueryService {
    /// Submits `statement` for execution against `database` and returns the
    /// execution handle. Does not block on completion; one submission per
    /// call, no retry.
    fn submit(
        &self,
        database: &str,
        statement: &str,
    ) -> impl Future<Output = Result<ExecutionId, QueryServiceError>> + Send;

    /// Fetches the current status of an execution.
    fn status(
        &self,
        id: &ExecutionId,
    ) -> impl Future<Output = Result<ExecutionStatus, QueryServiceError>> + Send;
}

/// HTTP implementation of [`QueryService`].
#[derive(Debug, Clone)]
pub struct HttpQueryService {
    http_client: reqwest::Client,
    endpoint: String,
    output_location: String,
}

impl HttpQueryService {
    /// Creates a client for the service at `endpoint`, directing every
    /// query's results to `output_location`.
    pub fn new(
        endpoint: &Url,
        output_location: impl Into<String>,
    ) -> Result<Self, QueryServiceError> {
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(QueryServiceError::CreateClient)?;

        Ok(Self {
            http_client,
            endpoint: endpoint.as_str().trim_end_matches('/').to_string(),
            output_location: output_location.into(),
        })
    }
}

impl QueryService for HttpQueryService {
    async fn submit(
        &self,
        database: &str,
        statement: &str,
    ) -> Result<ExecutionId, QueryServiceError> {
        let url = format!("{}/queries", self.endpoint);
        let request = SubmitQueryRequest {
            statement,
            database,
            output_location: &self.output_location,
            encryption: SERVER_SIDE_ENCRYPTION,
        };

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(QueryServiceError::Request)?;
        let response = error_for_status(response).await?;

        let SubmitQueryResponse { execution_id } =
            response.json().await.map_err(QueryServiceError::Parse)?;

        tracing::debug!(%database, %execution_id, "submitted query");

        Ok(ExecutionId::new(execution_id))
    }

    async fn status(&self, id: &ExecutionId) -> Result<ExecutionStatus, QueryServiceError> {
        let url = format!("{}/queries/{}", self.endpoint, id);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(QueryServiceError::Request)?;
        let response = error_for_status(response).await?;

        response.json().await.map_err(QueryServiceError::Parse)
    }
}

/// Turns a non-2xx response into an [`QueryServiceError::Api`], capturing the
/// response body for the logs.
async fn error_for_status(response: reqwest::Response) -> Result<reqwest::Response, QueryServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(QueryServiceError::Api {
        status: status.as_u16(),
        body,
    })
}

#[derive(Debug, Serialize)]
struct SubmitQueryRequest<'a> {
    statement: &'a str,
    database: &'a str,
    output_location: &'a str,
    encryption: &'a str,
}

#[derive(Debug, Deserialize)]
struct SubmitQueryResponse {
    execution_id: String,
}

/// Errors from the query service protocol.
#[derive(Debug, thiserror::Error)]
pub enum QueryServiceError {
    /// Failed to construct the underlying HTTP client.
    #[error("failed to create HTTP client")]
    CreateClient(#[source] reqwest::Error),

    /// Transport-level failure sending the request.
    #[error("query service request failed")]
    Request(#[source] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("query service returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    /// The response body did not match the expected shape.
    #[error("failed to parse query service response")]
    Parse(#[source] reqwest::Error),
}
