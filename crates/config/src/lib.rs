//! Configuration for partsync.
//!
//! A TOML file describes every deployment stage; one invocation resolves the
//! active stage into a validated [`Config`] and fails fast on anything
//! missing. Values can be overridden with `PARTSYNC_CONFIG_`-prefixed
//! environment variables (nested fields use `__`, e.g.
//! `PARTSYNC_CONFIG_CATALOG__ROOT_PREFIX`).

use std::{
    collections::{BTreeMap, HashSet},
    path::PathBuf,
};

use common::store::url::{ObjectStoreUrl, ObjectStoreUrlError};
use figment::{
    Figment,
    providers::{Env, Format as _, Toml},
};
use fs_err as fs;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

/// Resolved, validated configuration for one reconciliation run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Name of the active stage the run was resolved for.
    pub stage: String,
    /// Bucket holding the partitioned data files.
    pub bucket_url: ObjectStoreUrl,
    /// Bucket/prefix where the query service writes result objects.
    pub query_results_url: ObjectStoreUrl,
    /// Base URL of the query service HTTP endpoint.
    pub query_endpoint: Url,
    /// Partition folder naming convention for this stage (`raw`,
    /// `raw_compressed`, ...). Also suffixes the query-side table names.
    pub partition_folder: String,
    /// Catalog walk settings.
    pub catalog: CatalogConfig,
    /// Query status poll schedule.
    pub poll: PollConfig,
    /// Canonical path of the config file the run was loaded from.
    pub config_path: PathBuf,
}

/// Catalog walk settings, shared by every stage.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// Prefix under which the catalog lives: `<root>/<database>/<table>/...`.
    pub root_prefix: String,
    /// Table names to skip during the full-catalog walk.
    #[serde(default)]
    pub excluded_tables: HashSet<String>,
    /// Compound extension a data file must carry to count as partition
    /// evidence (e.g. `json.gz`).
    pub data_file_extension: String,
    /// Number of trailing `key=value` path segments forming a partition key
    /// (default: 2, i.e. `year=YYYY/month=MM`).
    #[serde(default = "default_partition_depth")]
    pub partition_depth: usize,
}

fn default_partition_depth() -> usize {
    2
}

/// Schedule for polling a query execution until it reaches a terminal state.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PollConfig {
    /// First delay between status polls, in seconds (default: 1).
    #[serde(default = "default_min_delay_secs")]
    pub min_delay_secs: u64,
    /// Upper bound each doubled delay is clamped to, in seconds (default: 30).
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: u64,
    /// Number of polls before the wait is abandoned (default: 20).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
}

fn default_min_delay_secs() -> u64 {
    1
}

fn default_max_delay_secs() -> u64 {
    30
}

fn default_max_attempts() -> usize {
    20
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            min_delay_secs: default_min_delay_secs(),
            max_delay_secs: default_max_delay_secs(),
            max_attempts: default_max_attempts(),
        }
    }
}

/// On-disk shape of the configuration file, prior to stage resolution.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    /// Active stage name; selects one `[stages.<name>]` table.
    stage: String,
    /// Per-environment settings, keyed by stage name.
    #[serde(default)]
    stages: BTreeMap<String, StageConfigFile>,
    /// Catalog walk settings.
    catalog: CatalogConfig,
    /// Query status poll schedule.
    #[serde(default)]
    poll: PollConfig,
}

/// One `[stages.<name>]` table. Every field is optional at parse time so the
/// resolver can report exactly which one is missing.
#[derive(Debug, Clone, Default, Deserialize)]
struct StageConfigFile {
    bucket: Option<String>,
    query_results: Option<String>,
    query_endpoint: Option<String>,
    partition_folder: Option<String>,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error at {0}: {1}")]
    Io(PathBuf, std::io::Error),
    #[error("Config parse error at {0}: {1}")]
    Figment(PathBuf, figment::Error),
    #[error("Unknown stage '{1}' at {0}: no matching [stages.{1}] section")]
    UnknownStage(PathBuf, String),
    #[error("Missing required config at {0}: {1}")]
    MissingConfig(PathBuf, String),
    #[error("Invalid object store URL for {1} at {0}: {2}")]
    InvalidObjectStoreUrl(PathBuf, String, #[source] ObjectStoreUrlError),
    #[error("Invalid query endpoint URL at {0}: {1}")]
    InvalidQueryEndpoint(PathBuf, #[source] url::ParseError),
}

impl Config {
    /// Load configuration from file with optional environment variable overrides.
    ///
    /// `env_override` allows env vars prefixed with `PARTSYNC_CONFIG_` to override config
    /// values. Nested config values use double underscore separators. `config_override`
    /// merges last and wins over both; it exists for tests and programmatic embedding.
    pub fn load(
        file: impl Into<PathBuf>,
        env_override: bool,
        config_override: Option<Figment>,
    ) -> Result<Self, ConfigError> {
        let input_path = file.into();
        let config_path = fs::canonicalize(&input_path)
            .map_err(|err| ConfigError::Io(input_path.clone(), err))?;
        let contents = fs::read_to_string(&config_path)
            .map_err(|err| ConfigError::Io(config_path.clone(), err))?;

        let config_file: ConfigFile = {
            let mut config_builder = Figment::new().merge(Toml::string(&contents));
            if env_override {
                config_builder = config_builder.merge(Env::prefixed("PARTSYNC_CONFIG_").split("__"));
            }
            if let Some(config_override) = config_override {
                config_builder = config_builder.merge(config_override);
            }
            config_builder
                .extract()
                .map_err(|e| ConfigError::Figment(config_path.clone(), e))?
        };

        config_file.resolve(config_path)
    }
}

impl ConfigFile {
    /// Resolves the active stage into a validated [`Config`].
    fn resolve(self, config_path: PathBuf) -> Result<Config, ConfigError> {
        let ConfigFile {
            stage,
            mut stages,
            catalog,
            poll,
        } = self;

        let stage_config = stages
            .remove(&stage)
            .ok_or_else(|| ConfigError::UnknownStage(config_path.clone(), stage.clone()))?;

        let require = |field: Option<String>, name: &str| {
            field.ok_or_else(|| {
                ConfigError::MissingConfig(config_path.clone(), format!("stages.{stage}.{name}"))
            })
        };

        let bucket = require(stage_config.bucket, "bucket")?;
        let bucket_url = ObjectStoreUrl::new(&bucket).map_err(|err| {
            ConfigError::InvalidObjectStoreUrl(config_path.clone(), bucket, err)
        })?;

        let query_results = require(stage_config.query_results, "query_results")?;
        let query_results_url = ObjectStoreUrl::new(&query_results).map_err(|err| {
            ConfigError::InvalidObjectStoreUrl(config_path.clone(), query_results, err)
        })?;

        let query_endpoint = require(stage_config.query_endpoint, "query_endpoint")?
            .parse::<Url>()
            .map_err(|err| ConfigError::InvalidQueryEndpoint(config_path.clone(), err))?;

        let partition_folder = require(stage_config.partition_folder, "partition_folder")?;

        Ok(Config {
            stage,
            bucket_url,
            query_results_url,
            query_endpoint,
            partition_folder,
            catalog,
            poll,
            config_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use figment::providers::Serialized;

    use super::*;

    const CONFIG_TOML: &str = r#"
        stage = "prod_lake"

        [stages.prod_lake]
        bucket = "s3://data-lake/"
        query_results = "s3://data-lake-query-results/"
        query_endpoint = "https://query.internal.example.com/"
        partition_folder = "raw_compressed"

        [stages.dev]
        bucket = "s3://data-lake-dev/"

        [catalog]
        root_prefix = "data/landing"
        excluded_tables = ["schema_migrations"]
        data_file_extension = "json.gz"
    "#;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(contents.as_bytes())
            .expect("Failed to write config");
        file
    }

    #[test]
    fn load_resolves_the_active_stage() {
        //* Given
        let file = write_config(CONFIG_TOML);

        //* When
        let config = Config::load(file.path(), false, None).expect("Failed to load config");

        //* Then
        assert_eq!(config.stage, "prod_lake");
        assert_eq!(config.bucket_url.to_string(), "s3://data-lake/");
        assert_eq!(config.partition_folder, "raw_compressed");
        assert_eq!(config.catalog.root_prefix, "data/landing");
        assert!(config.catalog.excluded_tables.contains("schema_migrations"));
    }

    #[test]
    fn load_applies_defaults() {
        //* Given
        let file = write_config(CONFIG_TOML);

        //* When
        let config = Config::load(file.path(), false, None).expect("Failed to load config");

        //* Then
        assert_eq!(config.catalog.partition_depth, 2);
        assert_eq!(config.poll.min_delay_secs, 1);
        assert_eq!(config.poll.max_delay_secs, 30);
        assert_eq!(config.poll.max_attempts, 20);
    }

    #[test]
    fn load_fails_on_unknown_stage() {
        //* Given
        let file = write_config(&CONFIG_TOML.replace("stage = \"prod_lake\"", "stage = \"uat\""));

        //* When
        let err = Config::load(file.path(), false, None).expect_err("Expected load to fail");

        //* Then
        assert!(matches!(err, ConfigError::UnknownStage(_, stage) if stage == "uat"));
    }

    #[test]
    fn load_fails_on_missing_stage_field() {
        //* Given
        // The dev stage defines only the bucket.
        let file = write_config(&CONFIG_TOML.replace("stage = \"prod_lake\"", "stage = \"dev\""));

        //* When
        let err = Config::load(file.path(), false, None).expect_err("Expected load to fail");

        //* Then
        assert!(
            matches!(err, ConfigError::MissingConfig(_, field) if field == "stages.dev.query_results")
        );
    }

    #[test]
    fn config_override_wins_over_file() {
        //* Given
        let file = write_config(CONFIG_TOML);
        let overlay = Figment::new().merge(Serialized::default("catalog.root_prefix", "overridden"));

        //* When
        let config =
            Config::load(file.path(), false, Some(overlay)).expect("Failed to load config");

        //* Then
        assert_eq!(config.catalog.root_prefix, "overridden");
    }
}
