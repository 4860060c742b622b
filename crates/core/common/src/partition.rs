//! Partition keys and their extraction from object storage paths.
//!
//! A partition key is the `key=value` tail of an object path, e.g. an object
//! at `landing/events/clicks/raw/year=2021/month=04/part-0000.json.gz` with
//! partition depth 2 belongs to the partition `year=2021/month=04`.

use chrono::{Datelike, NaiveDate};
use object_store::path::Path;

/// Separator between the `key=value` segments of a partition key.
const KEY_DELIMITER: char = '/';

/// A partition key: one or more `key=value` segments joined by `/`.
///
/// Keys are compared by exact string equality. This must match the format the
/// query service prints for `SHOW PARTITIONS`, line by line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartitionKey(String);

impl PartitionKey {
    /// Wraps an already-canonical partition key string.
    ///
    /// Used for keys read back from the query service, which are trusted to
    /// be in the canonical format.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Derives the partition key evidenced by a data object at `path`.
    ///
    /// The object counts as evidence only if its filename ends with the
    /// configured compound `extension` (e.g. `json.gz`); a directory marker or
    /// an in-progress upload with another suffix does not materialize a
    /// partition. The key is built from the `depth` path segments preceding
    /// the filename, keeping only `key=value` shaped segments.
    pub fn from_object_path(path: &Path, depth: usize, extension: &str) -> Option<Self> {
        let mut segments: Vec<&str> = path.as_ref().split(KEY_DELIMITER).collect();

        let filename = segments.pop()?;
        if !filename
            .strip_suffix(extension)
            .is_some_and(|stem| stem.ends_with('.'))
        {
            return None;
        }

        let tail_start = segments.len().saturating_sub(depth);
        let key_segments: Vec<&str> = segments[tail_start..]
            .iter()
            .copied()
            .filter(|segment| is_key_value(segment))
            .collect();
        if key_segments.is_empty() {
            return None;
        }

        Some(Self(key_segments.join("/")))
    }

    /// The key for the current month's time partition, `year=YYYY/month=MM`.
    ///
    /// The date is injected by the caller so runs are reproducible in tests.
    pub fn year_month(date: NaiveDate) -> Self {
        Self(format!(
            "year={:04}/month={:02}",
            date.year(),
            date.month()
        ))
    }

    /// Renders the parenthesized key-list form used in partition DDL
    /// statements: `year=2021/month=04` becomes `year=2021, month=04`.
    pub fn partition_spec(&self) -> String {
        self.0.replace(KEY_DELIMITER, ", ")
    }

    /// Get the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A segment counts as `key=value` when both sides of the first `=` are
/// non-empty.
fn is_key_value(segment: &str) -> bool {
    match segment.split_once('=') {
        Some((key, value)) => !key.is_empty() && !value.is_empty(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_partition_key_from_object_path() {
        //* Given
        let path = Path::from("landing/events/clicks/raw/year=2021/month=04/part-0000.json.gz");

        //* When
        let key = PartitionKey::from_object_path(&path, 2, "json.gz");

        //* Then
        assert_eq!(key, Some(PartitionKey::new("year=2021/month=04")));
    }

    #[test]
    fn object_with_non_matching_extension_contributes_no_key() {
        //* Given
        let path = Path::from("landing/events/clicks/raw/year=2021/month=04/part-0000.parquet");

        //* When
        let key = PartitionKey::from_object_path(&path, 2, "json.gz");

        //* Then
        assert_eq!(key, None);
    }

    #[test]
    fn extension_must_match_a_whole_suffix() {
        //* Given
        // "gz" alone must not match ".json.gz" mid-segment, nor a bare "json.gz"
        // filename with no stem separator.
        let path = Path::from("landing/events/year=2021/month=04/data.xjson.gz");

        //* When
        let matching = PartitionKey::from_object_path(&path, 2, "xjson.gz");
        let non_matching = PartitionKey::from_object_path(&path, 2, "son.gz");

        //* Then
        assert_eq!(matching, Some(PartitionKey::new("year=2021/month=04")));
        assert_eq!(non_matching, None);
    }

    #[test]
    fn non_key_value_segments_are_dropped() {
        //* Given
        // Depth reaches past the partition tail into the static folder name.
        let path = Path::from("landing/events/clicks/raw/year=2021/month=04/part-0000.json.gz");

        //* When
        let key = PartitionKey::from_object_path(&path, 3, "json.gz");

        //* Then
        assert_eq!(key, Some(PartitionKey::new("year=2021/month=04")));
    }

    #[test]
    fn path_with_no_key_value_segments_contributes_no_key() {
        //* Given
        let path = Path::from("landing/events/clicks/raw/part-0000.json.gz");

        //* When
        let key = PartitionKey::from_object_path(&path, 2, "json.gz");

        //* Then
        assert_eq!(key, None);
    }

    #[test]
    fn partition_spec_joins_segments_with_comma() {
        //* Given
        let key = PartitionKey::new("year=2021/month=04");

        //* When
        let spec = key.partition_spec();

        //* Then
        assert_eq!(spec, "year=2021, month=04");
    }

    #[test]
    fn year_month_key_is_zero_padded() {
        //* Given
        let date = NaiveDate::from_ymd_opt(2021, 4, 27).unwrap();

        //* When
        let key = PartitionKey::year_month(date);

        //* Then
        assert_eq!(key.as_str(), "year=2021/month=04");
    }
}
