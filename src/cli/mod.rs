//! CLI interface for stockfeed
//!
//! Provides subcommands for:
//! - `serve`: Start the profile lookup API
//! - `ingest`: Run the price ingestion pipeline
//! - `config`: Show resolved configuration

mod ingest;
mod serve;

pub use ingest::IngestArgs;
pub use serve::ServeArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "stockfeed")]
#[command(about = "Real-time stock price ingestion with a profile lookup API")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the profile lookup API
    Serve(ServeArgs),
    /// Run the price ingestion pipeline
    Ingest(IngestArgs),
    /// Show resolved configuration
    Config,
}
