//! Extension trait for ObjectStore.

use std::future::Future;

use bytes::Bytes;
use object_store::{ObjectStore, path::Path};

/// Extension trait for `ObjectStore` that provides convenient methods for
/// reading whole objects.
pub trait ObjectStoreExt {
    /// Reads the entire contents of an object as `Bytes`.
    fn get_bytes(
        &self,
        location: impl Into<Path>,
    ) -> impl Future<Output = Result<Bytes, ObjectStoreExtError>>;

    /// Reads the entire contents of an object as a UTF-8 string.
    ///
    /// Returns `ObjectStoreExtError::NotUtf8` if the contents are not valid UTF-8.
    fn get_string(
        &self,
        location: impl Into<Path>,
    ) -> impl Future<Output = Result<String, ObjectStoreExtError>>;
}

impl<T> ObjectStoreExt for T
where
    T: ObjectStore + ?Sized,
{
    async fn get_bytes(&self, location: impl Into<Path>) -> Result<Bytes, ObjectStoreExtError> {
        self.get(&location.into())
            .await
            .map_err(ObjectStoreExtError::ObjectStoreGet)?
            .bytes()
            .await
            .map_err(ObjectStoreExtError::ObjectStoreBytes)
    }

    async fn get_string(&self, location: impl Into<Path>) -> Result<String, ObjectStoreExtError> {
        let path = location.into();
        let bytes = self.get_bytes(path.clone()).await?;
        String::from_utf8(bytes.to_vec()).map_err(|err| ObjectStoreExtError::NotUtf8 {
            path: path.to_string(),
            source: err,
        })
    }
}

/// Error type for object store read operations.
#[derive(Debug, thiserror::Error)]
pub enum ObjectStoreExtError {
    /// Object contents are not valid UTF-8 text.
    #[error("object is not an utf8 text file: {path}")]
    NotUtf8 {
        /// The path of the object that is not valid UTF-8.
        path: String,
        #[source]
        source: std::string::FromUtf8Error,
    },

    /// Error getting object metadata or initiating object retrieval.
    #[error("failed to get object: {0}")]
    ObjectStoreGet(#[source] object_store::Error),

    /// Error reading object bytes after successful retrieval.
    #[error("failed to read object bytes: {0}")]
    ObjectStoreBytes(#[source] object_store::Error),
}
