use anyhow::Context;
use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use tracing::info;

use crate::clients::ConnectionStore;
use crate::common::Connection;

/// Table of live websocket connections keyed by `connectionId`.
#[derive(Clone, Debug)]
pub struct DynamoConnectionStore {
    inner: Client,
    table_name: String,
}

impl DynamoConnectionStore {
    pub fn new(inner: Client, table_name: impl Into<String>) -> Self {
        Self {
            inner,
            table_name: table_name.into(),
        }
    }

    fn key(connection_id: &str) -> anyhow::Result<serde_dynamo::Item> {
        serde_dynamo::to_item(Connection {
            connection_id: connection_id.to_string(),
        })
        .context("should be able to serialize connection key")
    }
}

#[async_trait]
impl ConnectionStore for DynamoConnectionStore {
    #[tracing::instrument(skip(self))]
    async fn add_connection(&self, connection_id: &str) -> anyhow::Result<()> {
        let item = Self::key(connection_id)?;

        self.inner
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item.into()))
            .send()
            .await
            .context("failed to put connection")?;

        info!("added connection {}", connection_id);
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn remove_connection(&self, connection_id: &str) -> anyhow::Result<()> {
        let key = Self::key(connection_id)?;

        self.inner
            .delete_item()
            .table_name(&self.table_name)
            .set_key(Some(key.into()))
            .send()
            .await
            .context("failed to delete connection")?;

        info!("removed connection {}", connection_id);
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn connection_exists(&self, connection_id: &str) -> anyhow::Result<bool> {
        let key = Self::key(connection_id)?;

        let result = self
            .inner
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(key.into()))
            .send()
            .await
            .context("failed to get connection")?;

        Ok(result.item.is_some())
    }
}
