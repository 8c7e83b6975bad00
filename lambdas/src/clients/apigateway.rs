use anyhow::Context;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_apigatewaymanagement::{config, primitives::Blob, Client};

use crate::clients::ConnectionNotifier;

/// Pushes data to websocket clients through the API Gateway management API.
#[derive(Clone, Debug)]
pub struct ApiGatewayNotifier {
    inner: Client,
}

impl ApiGatewayNotifier {
    pub fn new(inner: Client) -> Self {
        Self { inner }
    }

    /// The management API has to be addressed through the websocket API's
    /// callback URL rather than the regional endpoint.
    pub fn for_endpoint(sdk_config: &SdkConfig, endpoint_url: &str) -> Self {
        let api_management_config = config::Builder::from(sdk_config)
            .endpoint_url(endpoint_url)
            .build();

        Self::new(Client::from_conf(api_management_config))
    }
}

#[async_trait]
impl ConnectionNotifier for ApiGatewayNotifier {
    #[tracing::instrument(skip(self, data), fields(bytes = data.len()))]
    async fn post_to_connection(&self, connection_id: &str, data: &[u8]) -> anyhow::Result<()> {
        self.inner
            .post_to_connection()
            .connection_id(connection_id)
            .data(Blob::new(data))
            .send()
            .await
            .with_context(|| format!("failed to post to connection {connection_id}"))?;

        Ok(())
    }
}

/// Adds `https://` to endpoints configured as bare host names.
pub fn endpoint_url(endpoint: &str) -> String {
    let endpoint = endpoint.trim_end_matches('/');
    if endpoint.starts_with("https://") || endpoint.starts_with("http://") {
        endpoint.to_string()
    } else {
        format!("https://{endpoint}")
    }
}

/// Callback URL of the websocket API that delivered a request.
pub fn callback_endpoint(domain_name: &str, stage: &str) -> String {
    format!("{}/{stage}", endpoint_url(domain_name))
}
