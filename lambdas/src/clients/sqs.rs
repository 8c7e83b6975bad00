use anyhow::Context;
use async_trait::async_trait;
use tracing::info;

use crate::clients::JobQueue;

#[derive(Clone, Debug)]
pub struct SqsJobQueue {
    inner: aws_sdk_sqs::Client,
    queue_url: String,
}

impl SqsJobQueue {
    pub fn new(inner: aws_sdk_sqs::Client, queue_url: impl Into<String>) -> Self {
        Self {
            inner,
            queue_url: queue_url.into(),
        }
    }
}

#[async_trait]
impl JobQueue for SqsJobQueue {
    #[tracing::instrument(skip(self, body))]
    async fn send_message(&self, body: &str) -> anyhow::Result<()> {
        let message_output = self
            .inner
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(body)
            .send()
            .await
            .context("failed to send message to sqs")?;

        info!(
            "message sent to sqs: {}",
            message_output.message_id.unwrap_or("empty_id".into())
        );

        Ok(())
    }
}
