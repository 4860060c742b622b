use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "partsyncd")]
#[command(version)]
#[command(about = "Reconciles query-service partition metadata against object storage", long_about = None)]
pub struct Cli {
    /// Path to the partsync configuration file
    ///
    /// Can also be set via the PARTSYNC_CONFIG environment variable
    #[arg(short = 'c', long, env = "PARTSYNC_CONFIG", default_value = "partsync.toml")]
    pub config: PathBuf,

    /// Reconcile only the table under this storage prefix
    ///
    /// When absent, the whole configured catalog root is walked and every
    /// discovered table is reconciled. Can also be set via the
    /// PARTSYNC_PREFIX environment variable.
    #[arg(short = 'p', long, env = "PARTSYNC_PREFIX")]
    pub prefix: Option<String>,
}
