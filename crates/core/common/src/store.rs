//! Object store construction for the storage backends partsync reads from.
//!
//! Provider credentials are taken from the environment (`AWS_*`, `GOOGLE_*`,
//! `AZURE_*`), matching how the rest of the deployment is configured.

use std::sync::Arc;

use object_store::{
    ObjectStore, aws::AmazonS3Builder, azure::MicrosoftAzureBuilder,
    gcp::GoogleCloudStorageBuilder, local::LocalFileSystem,
};

pub mod ext;
pub mod url;

use self::url::{ObjectStoreProvider, ObjectStoreUrl};

/// Creates an object store at the bucket/container root level.
///
/// The URL's path component is ignored; the returned store operates at the
/// bucket root and callers address objects by full key.
pub fn new(
    url: impl AsRef<ObjectStoreUrl>,
) -> Result<Arc<dyn ObjectStore>, ObjectStoreCreationError> {
    let url = url.as_ref();
    let creation_error = |err| ObjectStoreCreationError {
        url: url.to_string(),
        source: err,
    };

    match url.provider() {
        ObjectStoreProvider::AmazonS3 => {
            let store = AmazonS3Builder::from_env()
                .with_url(url)
                .build()
                .map_err(creation_error)?;
            Ok(Arc::new(store))
        }
        ObjectStoreProvider::GoogleCloudStorage => {
            let store = GoogleCloudStorageBuilder::from_env()
                .with_url(url)
                .build()
                .map_err(creation_error)?;
            Ok(Arc::new(store))
        }
        ObjectStoreProvider::MicrosoftAzure => {
            let store = MicrosoftAzureBuilder::from_env()
                .with_url(url)
                .build()
                .map_err(creation_error)?;
            Ok(Arc::new(store))
        }
        ObjectStoreProvider::Local => Ok(Arc::new(LocalFileSystem::new())),
    }
}

/// Failed to create an object store instance.
///
/// The URL scheme was already validated, so this points at provider
/// initialization: missing or invalid credentials in the environment, or a
/// malformed bucket/container component.
#[derive(Debug, thiserror::Error)]
#[error("failed to create object store for {url}")]
pub struct ObjectStoreCreationError {
    url: String,
    #[source]
    source: object_store::Error,
}
