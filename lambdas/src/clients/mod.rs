//! Ports for the managed services the lambdas talk to, and their AWS SDK
//! implementations. Handlers only see the traits, tests substitute mocks.

pub mod apigateway;
pub mod dynamodb;
pub mod s3;
pub mod sqs;

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::common::{JobHistoryRecord, JobKey};

pub use apigateway::ApiGatewayNotifier;
pub use dynamodb::{DynamoConnectionStore, DynamoJobHistoryStore};
pub use s3::S3ObjectStore;
pub use sqs::SqsJobQueue;

/// String attributes of a store position, used to resume a listing.
pub type StartKey = BTreeMap<String, String>;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Returns a URL allowing one PUT of `key`.
    async fn presign_upload(&self, key: &str, expires_in: Duration) -> anyhow::Result<String>;

    /// Returns a URL allowing GETs of `key`.
    async fn presign_download(&self, key: &str, expires_in: Duration) -> anyhow::Result<String>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn send_message(&self, body: &str) -> anyhow::Result<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConnectionStore: Send + Sync {
    async fn add_connection(&self, connection_id: &str) -> anyhow::Result<()>;

    async fn remove_connection(&self, connection_id: &str) -> anyhow::Result<()>;

    async fn connection_exists(&self, connection_id: &str) -> anyhow::Result<bool>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryQuery {
    /// Restricts the listing to one target format.
    pub to_file_type: Option<String>,
    /// Maximum number of items the store should evaluate.
    pub limit: i32,
    pub exclusive_start_key: Option<StartKey>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryPage {
    pub records: Vec<JobHistoryRecord>,
    pub last_evaluated_key: Option<StartKey>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobHistoryStore: Send + Sync {
    /// Finds the jobId already recorded for `key`, if any.
    async fn find_job_id(&self, key: &JobKey) -> anyhow::Result<Option<String>>;

    /// Inserts or overwrites the record stored under its jobId.
    async fn put_record(&self, record: &JobHistoryRecord) -> anyhow::Result<()>;

    async fn query_page(&self, query: &HistoryQuery) -> anyhow::Result<HistoryPage>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConnectionNotifier: Send + Sync {
    async fn post_to_connection(&self, connection_id: &str, data: &[u8]) -> anyhow::Result<()>;
}
