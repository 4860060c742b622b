//! Validated URL wrapper and provider types for object store URLs.

use std::path::PathBuf;

use fs_err as fs;
use url::Url;

/// A validated URL wrapper that ensures the URL is a valid object store URL.
#[derive(Clone, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ObjectStoreUrl(Url);

impl ObjectStoreUrl {
    /// Creates a new [`ObjectStoreUrl`] from a string that can be either a URL
    /// or a filesystem path.
    pub fn new(location: impl Into<String>) -> Result<Self, ObjectStoreUrlError> {
        let location = location.into();

        // If the location fails to parse as a URL, we assume it's a filesystem path.
        Self::try_from_url(&location).or_else(|_| Self::try_from_filesystem_path(&location))
    }

    /// Parses a string as a URL and validates it for object store use.
    ///
    /// The URL must have a supported object store scheme (`file://`, `s3://`,
    /// `gs://`, etc.).
    fn try_from_url(url: impl AsRef<str>) -> Result<Self, ObjectStoreUrlError> {
        let inner = Url::parse(url.as_ref()).map_err(ObjectStoreUrlError::UrlParseError)?;

        // Validate the scheme to ensure it's a supported object store scheme
        let _: ObjectStoreProvider = inner.scheme().parse()?;

        Ok(Self(inner))
    }

    /// Parses a string as a filesystem path and converts it to a `file://` URL.
    ///
    /// The path must exist so it can be canonicalized to an absolute path.
    fn try_from_filesystem_path(location: impl AsRef<str>) -> Result<Self, ObjectStoreUrlError> {
        let path = PathBuf::from(location.as_ref());
        let canonical_path = fs::canonicalize(&path)
            .map_err(|err| ObjectStoreUrlError::InvalidFilesystemPath { path, source: err })?;

        let url = Url::from_directory_path(&canonical_path).map_err(|_| {
            ObjectStoreUrlError::InvalidFilesystemPath {
                path: canonical_path.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "absolute path could not be resolved",
                ),
            }
        })?;

        Ok(Self(url))
    }

    /// Returns the [`ObjectStoreProvider`] of the URL.
    pub fn provider(&self) -> ObjectStoreProvider {
        match self.0.scheme() {
            s if ObjectStoreProvider::is_local_filesystem(s) => ObjectStoreProvider::Local,
            s if ObjectStoreProvider::is_amazon_s3(s) => ObjectStoreProvider::AmazonS3,
            s if ObjectStoreProvider::is_google_cloud_storage(s) => {
                ObjectStoreProvider::GoogleCloudStorage
            }
            s if ObjectStoreProvider::is_microsoft_azure(s) => ObjectStoreProvider::MicrosoftAzure,
            _ => unreachable!(), // We validate the scheme previously.
        }
    }

    /// Get a reference to the inner [`Url`].
    pub fn inner(&self) -> &Url {
        &self.0
    }
}

impl AsRef<ObjectStoreUrl> for ObjectStoreUrl {
    fn as_ref(&self) -> &ObjectStoreUrl {
        self
    }
}

impl std::ops::Deref for ObjectStoreUrl {
    type Target = Url;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl TryFrom<Url> for ObjectStoreUrl {
    type Error = ObjectStoreUrlError;

    fn try_from(value: Url) -> Result<Self, Self::Error> {
        Self::try_from_url(value)
    }
}

impl std::str::FromStr for ObjectStoreUrl {
    type Err = ObjectStoreUrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Url::parse(s)
            .map_err(ObjectStoreUrlError::UrlParseError)?
            .try_into()
    }
}

impl std::fmt::Display for ObjectStoreUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::fmt::Debug for ObjectStoreUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self, f)
    }
}

impl From<&ObjectStoreUrl> for String {
    fn from(value: &ObjectStoreUrl) -> Self {
        value.to_string()
    }
}

/// Supported object store providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectStoreProvider {
    /// Local filesystem (`file://`)
    Local,

    /// Amazon S3 (`s3://`, `s3a://`)
    AmazonS3,

    /// Google Cloud Storage (`gs://`)
    GoogleCloudStorage,

    /// Microsoft Azure (`az://`, `adl://`, `azure://`, `abfs://`, `abfss://`)
    MicrosoftAzure,
}

impl ObjectStoreProvider {
    #[inline]
    fn is_amazon_s3(s: impl AsRef<str>) -> bool {
        let scheme = s.as_ref();
        scheme.eq_ignore_ascii_case("s3") || scheme.eq_ignore_ascii_case("s3a")
    }

    #[inline]
    fn is_google_cloud_storage(s: impl AsRef<str>) -> bool {
        s.as_ref().eq_ignore_ascii_case("gs")
    }

    #[inline]
    fn is_microsoft_azure(s: impl AsRef<str>) -> bool {
        let scheme = s.as_ref();
        scheme.eq_ignore_ascii_case("az")
            || scheme.eq_ignore_ascii_case("adl")
            || scheme.eq_ignore_ascii_case("azure")
            || scheme.eq_ignore_ascii_case("abfs")
            || scheme.eq_ignore_ascii_case("abfss")
    }

    #[inline]
    fn is_local_filesystem(s: impl AsRef<str>) -> bool {
        s.as_ref().eq_ignore_ascii_case("file")
    }
}

impl std::str::FromStr for ObjectStoreProvider {
    type Err = ObjectStoreUrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            s if ObjectStoreProvider::is_local_filesystem(s) => Ok(ObjectStoreProvider::Local),
            s if ObjectStoreProvider::is_amazon_s3(s) => Ok(ObjectStoreProvider::AmazonS3),
            s if ObjectStoreProvider::is_google_cloud_storage(s) => {
                Ok(ObjectStoreProvider::GoogleCloudStorage)
            }
            s if ObjectStoreProvider::is_microsoft_azure(s) => {
                Ok(ObjectStoreProvider::MicrosoftAzure)
            }
            _ => Err(ObjectStoreUrlError::UnsupportedScheme {
                scheme: s.to_string(),
            }),
        }
    }
}

/// Error type for invalid object store URLs.
///
/// If you are attempting to configure an S3-compatible object store over
/// HTTP/HTTPS, use the `s3://` scheme and configure `AWS_ENDPOINT` instead.
#[derive(Debug, thiserror::Error)]
pub enum ObjectStoreUrlError {
    /// URL string has invalid syntax and cannot be parsed.
    #[error(transparent)]
    UrlParseError(url::ParseError),

    /// URL scheme is not supported by object stores.
    ///
    /// Supported schemes: `file://`, `s3://`/`s3a://`, `gs://`, and the
    /// Azure family (`az://`, `adl://`, `azure://`, `abfs://`, `abfss://`).
    #[error("unsupported object store scheme: {scheme}")]
    UnsupportedScheme { scheme: String },

    /// Filesystem path does not exist or cannot be canonicalized.
    #[error("invalid filesystem path: {path}")]
    InvalidFilesystemPath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
