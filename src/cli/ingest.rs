//! Ingest command implementation

use crate::config::Config;
use crate::ingest::IngestionSupervisor;
use clap::Args;
use tokio_util::sync::CancellationToken;

#[derive(Args, Debug)]
pub struct IngestArgs {}

impl IngestArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let supervisor = IngestionSupervisor::new(config);

        let shutdown = CancellationToken::new();
        let signal_token = shutdown.clone();
        tokio::spawn(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Received shutdown signal");
            signal_token.cancel();
        });

        supervisor.run(shutdown).await
    }
}
