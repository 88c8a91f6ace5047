//! Persistent store module
//!
//! Supabase (PostgREST) access: symbol source-of-truth reads and bulk
//! price inserts, plus the worker-pooled sink that feeds them.

mod sink;
mod supabase;

pub use sink::{PriceRecord, PriceSink, SinkStats};
pub use supabase::{StockRow, StoreError, SupabaseClient, SupabaseConfig};
