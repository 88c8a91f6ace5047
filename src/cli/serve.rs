//! Serve command implementation

use crate::api;
use crate::config::Config;
use crate::provider::{ProviderConfig, TwelveDataClient};
use clap::Args;
use std::net::SocketAddr;
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Override the configured bind address
    #[arg(short, long)]
    pub bind: Option<SocketAddr>,
}

impl ServeArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let addr = self.bind.unwrap_or(config.api.bind_addr);
        let provider = Arc::new(TwelveDataClient::new(ProviderConfig::from(config)));

        api::serve(addr, provider).await
    }
}
