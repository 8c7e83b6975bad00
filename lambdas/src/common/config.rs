//! Per-binary configuration, read once from the environment at cold start.

use std::time::Duration;

use aws_config::{meta::region::RegionProviderChain, BehaviorVersion, Region, SdkConfig};

use crate::common::errors::ConfigError;

pub const API_KEY_VALUE: &str = "API_KEY_VALUE";
pub const MODEL_S3_BUCKET: &str = "MODEL_S3_BUCKET";
pub const BLENDER_JOBS_QUEUE_URL: &str = "BLENDER_JOBS_QUEUE_URL";
pub const JOB_HISTORY_TABLE: &str = "JOB_HISTORY_TABLE";
pub const CONNECTIONS_TABLE: &str = "CONNECTIONS_TABLE";
pub const WEBSOCKET_API_ENDPOINT: &str = "WEBSOCKET_API_ENDPOINT";
pub const UPLOAD_URL_EXPIRY_SECONDS: &str = "UPLOAD_URL_EXPIRY_SECONDS";
pub const DOWNLOAD_URL_EXPIRY_SECONDS: &str = "DOWNLOAD_URL_EXPIRY_SECONDS";

const UPLOAD_URL_EXPIRY_DEFAULT: Duration = Duration::from_secs(60);
const DOWNLOAD_URL_EXPIRY_DEFAULT: Duration = Duration::from_secs(24 * 60 * 60);

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .filter(|value| !value.trim().is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn seconds_or<F>(lookup: &F, name: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name).filter(|value| !value.trim().is_empty()) {
        None => Ok(default),
        Some(value) => match value.trim().parse::<u64>() {
            Ok(seconds) if seconds > 0 => Ok(Duration::from_secs(seconds)),
            _ => Err(ConfigError::Invalid { name, value }),
        },
    }
}

/// Configuration of the HTTP API lambda.
#[derive(Clone)]
pub struct ApiConfig {
    pub api_key: String,
    pub bucket_name: String,
    pub queue_url: String,
    pub job_history_table: String,
    pub upload_url_expiry: Duration,
    pub download_url_expiry: Duration,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("api_key", &"<redacted>")
            .field("bucket_name", &self.bucket_name)
            .field("queue_url", &self.queue_url)
            .field("job_history_table", &self.job_history_table)
            .field("upload_url_expiry", &self.upload_url_expiry)
            .field("download_url_expiry", &self.download_url_expiry)
            .finish()
    }
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: required(&lookup, API_KEY_VALUE)?,
            bucket_name: required(&lookup, MODEL_S3_BUCKET)?,
            queue_url: required(&lookup, BLENDER_JOBS_QUEUE_URL)?,
            job_history_table: required(&lookup, JOB_HISTORY_TABLE)?,
            upload_url_expiry: seconds_or(
                &lookup,
                UPLOAD_URL_EXPIRY_SECONDS,
                UPLOAD_URL_EXPIRY_DEFAULT,
            )?,
            download_url_expiry: seconds_or(
                &lookup,
                DOWNLOAD_URL_EXPIRY_SECONDS,
                DOWNLOAD_URL_EXPIRY_DEFAULT,
            )?,
        })
    }
}

/// Configuration of the SQS notification lambda.
#[derive(Debug, Clone)]
pub struct NotificationConfig {
    pub connections_table: String,
    pub job_history_table: String,
    pub websocket_endpoint: String,
}

impl NotificationConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self, ConfigError> {
        Ok(Self {
            connections_table: required(&lookup, CONNECTIONS_TABLE)?,
            job_history_table: required(&lookup, JOB_HISTORY_TABLE)?,
            websocket_endpoint: required(&lookup, WEBSOCKET_API_ENDPOINT)?,
        })
    }
}

/// Configuration shared by the websocket `$connect` and `$disconnect` lambdas.
/// Only `$connect` checks the API key.
#[derive(Clone)]
pub struct ConnectionConfig {
    pub api_key: Option<String>,
    pub connections_table: String,
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("connections_table", &self.connections_table)
            .finish()
    }
}

impl ConnectionConfig {
    pub fn connect_from_env() -> Result<Self, ConfigError> {
        Self::connect_from_lookup(env_lookup)
    }

    pub fn disconnect_from_env() -> Result<Self, ConfigError> {
        Self::disconnect_from_lookup(env_lookup)
    }

    pub fn connect_from_lookup<F: Fn(&str) -> Option<String>>(
        lookup: F,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: Some(required(&lookup, API_KEY_VALUE)?),
            connections_table: required(&lookup, CONNECTIONS_TABLE)?,
        })
    }

    pub fn disconnect_from_lookup<F: Fn(&str) -> Option<String>>(
        lookup: F,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: None,
            connections_table: required(&lookup, CONNECTIONS_TABLE)?,
        })
    }
}

pub async fn load_aws_config() -> SdkConfig {
    let region_provider = RegionProviderChain::default_provider().or_else(Region::new("us-east-1"));
    aws_config::defaults(BehaviorVersion::latest())
        .region(region_provider)
        .load()
        .await
}
