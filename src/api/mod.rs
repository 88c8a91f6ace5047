//! HTTP API module
//!
//! Thin axum surface over the stock data provider: profile and symbol
//! search pass-through with open CORS.

mod routes;
mod server;

pub use server::{router, serve};
