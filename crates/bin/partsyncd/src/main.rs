use anyhow::Result;
use clap::Parser;
use partsyncd::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    monitoring::logging::init();

    let cli = Cli::parse();

    partsyncd::run(cli).await
}
