//! sdd-cli - storm damage predictions for every cell of a city grid.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "sdd-cli",
    version,
    about = "Storm damage dashboard toolkit"
)]
struct Cli {
    #[command(flatten)]
    config: sdd_cmd::Config,

    #[command(subcommand)]
    command: sdd_cmd::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    log::debug!("Configuration: {:?}", cli.config);
    let mut session = sdd_cmd::Session::new();
    sdd_cmd::run(&cli.config, &mut session, cli.command).await
}
