//! Berez CLI - find, rate and report drinking fountains near you.

use clap::Parser;
use tokio::task::LocalSet;

#[derive(Parser)]
#[command(
    name = "berez",
    version,
    about = "Find drinking fountains near you"
)]
struct Cli {
    #[command(flatten)]
    config: berez_cmd::Config,

    #[command(subcommand)]
    command: berez_cmd::Command,
}

// The engine is single-threaded and spawns its refresh timer locally.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    log::debug!("Using backend {}", cli.config.api_url);
    LocalSet::new()
        .run_until(berez_cmd::run(cli.config, cli.command))
        .await
}
