//! Fetching and decoding `SHOW PARTITIONS` result objects.

use std::collections::HashSet;

use common::{
    partition::PartitionKey,
    store::ext::{ObjectStoreExt, ObjectStoreExtError},
};
use object_store::{ObjectStore, path::Path};
use url::Url;

/// Maps the result URL reported by the query service onto an object key
/// within the results bucket.
pub fn result_object_path(location: &str) -> Result<Path, ResultLocationError> {
    let url = Url::parse(location).map_err(|err| ResultLocationError::InvalidUrl {
        location: location.to_string(),
        source: err,
    })?;

    Path::from_url_path(url.path()).map_err(|err| ResultLocationError::InvalidPath {
        location: location.to_string(),
        source: err,
    })
}

/// Reads the result object at `path` and returns the registered partition
/// set: one canonical partition key per non-empty line.
///
/// The query service is trusted to emit the right shape; nothing beyond line
/// splitting happens here.
pub async fn fetch_registered_partitions(
    store: &dyn ObjectStore,
    path: &Path,
) -> Result<HashSet<PartitionKey>, FetchResultsError> {
    let contents = store
        .get_string(path.clone())
        .await
        .map_err(|err| FetchResultsError {
            path: path.to_string(),
            source: err,
        })?;

    Ok(contents
        .lines()
        .filter(|line| !line.is_empty())
        .map(PartitionKey::new)
        .collect())
}

/// The query service reported a result location we cannot address.
#[derive(Debug, thiserror::Error)]
pub enum ResultLocationError {
    #[error("result location is not a valid URL: {location}")]
    InvalidUrl {
        location: String,
        #[source]
        source: url::ParseError,
    },

    #[error("result location has no usable object path: {location}")]
    InvalidPath {
        location: String,
        #[source]
        source: object_store::path::Error,
    },
}

/// Error reading a query result object from the results store.
#[derive(Debug, thiserror::Error)]
#[error("failed to read query result object at {path}")]
pub struct FetchResultsError {
    path: String,
    #[source]
    source: ObjectStoreExtError,
}

#[cfg(test)]
mod tests {
    use object_store::{PutPayload, memory::InMemory};

    use super::*;

    #[tokio::test]
    async fn fetch_registered_partitions_splits_lines() {
        //* Given
        let store = InMemory::new();
        let path = Path::from("results/query-1.txt");
        store
            .put(
                &path,
                PutPayload::from_static(b"year=2021/month=03\nyear=2021/month=04\n\n"),
            )
            .await
            .expect("Failed to seed result object");

        //* When
        let registered = fetch_registered_partitions(&store, &path)
            .await
            .expect("Failed to fetch registered partitions");

        //* Then
        assert_eq!(
            registered,
            HashSet::from([
                PartitionKey::new("year=2021/month=03"),
                PartitionKey::new("year=2021/month=04"),
            ])
        );
    }

    #[tokio::test]
    async fn fetch_registered_partitions_of_empty_object_is_empty() {
        //* Given
        let store = InMemory::new();
        let path = Path::from("results/query-2.txt");
        store
            .put(&path, PutPayload::from_static(b""))
            .await
            .expect("Failed to seed result object");

        //* When
        let registered = fetch_registered_partitions(&store, &path)
            .await
            .expect("Failed to fetch registered partitions");

        //* Then
        assert!(registered.is_empty());
    }

    #[test]
    fn result_object_path_takes_the_url_path() {
        //* Given
        let location = "s3://data-lake-query-results/results/query-1.txt";

        //* When
        let path = result_object_path(location).expect("Failed to map result location");

        //* Then
        assert_eq!(path, Path::from("results/query-1.txt"));
    }

    #[test]
    fn result_object_path_rejects_non_urls() {
        //* Given
        let location = "not a url";

        //* When
        let err = result_object_path(location).expect_err("Expected mapping to fail");

        //* Then
        assert!(matches!(err, ResultLocationError::InvalidUrl { .. }));
    }
}
