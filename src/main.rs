use clap::Parser;
use stockfeed::cli::{Cli, Commands};
use stockfeed::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::from_env()?;

    stockfeed::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Serve(args) => {
            tracing::info!("Starting profile lookup API");
            args.execute(&config).await?;
        }
        Commands::Ingest(args) => {
            tracing::info!("Starting price ingestion pipeline");
            args.execute(&config).await?;
        }
        Commands::Config => {
            println!("Current configuration:");
            println!("  Feed URL: {}", config.feed.ws_url);
            println!("  Store URL: {}", config.store.url);
            println!("  Store workers: {}", config.store.workers);
            println!(
                "  Batching: size={} timeout={:?}",
                config.ingest.batch_size, config.ingest.batch_timeout
            );
            println!("  API bind: {}", config.api.bind_addr);
            println!("  Metrics port: {}", config.telemetry.metrics_port);
        }
    }

    Ok(())
}
