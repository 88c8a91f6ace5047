//! stockfeed: real-time stock price ingestion with a profile lookup API
//!
//! This library provides the core components for:
//! - A persistent WebSocket subscription to the TwelveData price feed
//! - A bounded tick buffer with size/time dual flush triggers
//! - Bulk persistence of flushed batches into a Supabase `price` table
//! - Supervised connection lifecycle with backoff reconnection
//! - A small axum API for stock profile and symbol search lookups
//! - Full observability stack

pub mod api;
pub mod cli;
pub mod config;
pub mod feed;
pub mod ingest;
pub mod provider;
pub mod store;
pub mod telemetry;
pub mod ws;
