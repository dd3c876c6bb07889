use clap::Parser;
use guestcrypt::cli::CliArgs;

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    let cli = CliArgs::parse();

    // sets log level filter from environment (or defaults)
    let mut log_builder = env_logger::Builder::from_default_env();
    if let Some(level) = cli.get_log_level() {
        log_builder.filter_level(level);
    }
    log_builder.init();

    cli.run().await
}
