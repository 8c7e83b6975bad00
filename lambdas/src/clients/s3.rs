use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use aws_sdk_s3::presigning::PresigningConfig;
use tracing::info;

use crate::clients::ObjectStore;

/// Presigns requests against the model bucket.
#[derive(Clone, Debug)]
pub struct S3ObjectStore {
    inner: aws_sdk_s3::Client,
    bucket_name: String,
}

impl S3ObjectStore {
    pub fn new(inner: aws_sdk_s3::Client, bucket_name: impl Into<String>) -> Self {
        Self {
            inner,
            bucket_name: bucket_name.into(),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    #[tracing::instrument(skip(self))]
    async fn presign_upload(&self, key: &str, expires_in: Duration) -> anyhow::Result<String> {
        let presigned = self
            .inner
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .presigned(PresigningConfig::expires_in(expires_in)?)
            .await
            .context("failed to presign put_object")?;

        info!("presigned upload url for {}", key);
        Ok(presigned.uri().to_string())
    }

    #[tracing::instrument(skip(self))]
    async fn presign_download(&self, key: &str, expires_in: Duration) -> anyhow::Result<String> {
        let presigned = self
            .inner
            .get_object()
            .bucket(&self.bucket_name)
            .key(key)
            .presigned(PresigningConfig::expires_in(expires_in)?)
            .await
            .context("failed to presign get_object")?;

        info!("presigned download url for {}", key);
        Ok(presigned.uri().to_string())
    }
}
