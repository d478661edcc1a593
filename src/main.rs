use anyhow::Result;
use clap::Parser;
use meetsched::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    meetsched::init_logger();
    log::info!("Starting MeetSched");

    meetsched::run(cli).await
}
