pub mod auth;
pub mod config;
pub mod cursor;
pub mod errors;
pub mod models;
pub mod utils;

pub use models::{
    Connection, ConversionJob, ConversionMessage, JobHistoryRecord, JobKey, JobStatus,
    NotificationMessage,
};

use tracing_subscriber::EnvFilter;

/// Sets up the subscriber every lambda binary uses. `RUST_LOG` overrides the
/// default `info` level.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .without_time() // CloudWatch will add the ingestion time
        .with_target(false)
        .init();
}
