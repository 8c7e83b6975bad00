//! Handlers for the websocket API routes.

use lambda_http::aws_lambda_events::apigw::ApiGatewayWebsocketProxyRequestContext;
use lambda_http::http::StatusCode;
use lambda_http::request::RequestContext;
use lambda_http::{Request, RequestExt, Response};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::clients::apigateway::callback_endpoint;
use crate::clients::{ConnectionNotifier, ConnectionStore};
use crate::common::auth::validate_websocket_api_key;
use crate::common::config::ConnectionConfig;
use crate::common::errors::Error;
use crate::common::utils::text_response;

const CONNECTED: &str = "Connected";
const DISCONNECTED: &str = "Disconnected";
const MESSAGE_RECEIVED: &str = "Message received";
const MISSING_CONTEXT_ERROR: &str = "Missing websocket request context";
const MISSING_CONNECTION_ID_ERROR: &str = "Missing connection id";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConnectionIdMessage<'a> {
    connection_id: &'a str,
}

fn websocket_context(request: &Request) -> Result<&ApiGatewayWebsocketProxyRequestContext, Error> {
    match request.request_context_ref() {
        Some(RequestContext::WebSocket(context)) => Ok(context),
        _ => Err(Error::bad_request(MISSING_CONTEXT_ERROR)),
    }
}

pub fn connection_id(request: &Request) -> Result<&str, Error> {
    websocket_context(request)?
        .connection_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| Error::bad_request(MISSING_CONNECTION_ID_ERROR))
}

#[tracing::instrument(skip_all)]
pub async fn handle_connect(
    request: &Request,
    config: &ConnectionConfig,
    connections: &dyn ConnectionStore,
) -> Result<Response<String>, Error> {
    if let Some(api_key) = &config.api_key {
        validate_websocket_api_key(request, api_key)?;
    }

    let connection_id = connection_id(request)?;
    connections.add_connection(connection_id).await.map_err(|err| {
        error!(connection_id, "failed to register connection: {err:#}");
        Error::internal(format!("{err:#}"))
    })?;

    info!(connection_id, "connection registered");
    text_response(StatusCode::OK, CONNECTED)
}

#[tracing::instrument(skip_all)]
pub async fn handle_disconnect(
    request: &Request,
    connections: &dyn ConnectionStore,
) -> Result<Response<String>, Error> {
    let connection_id = connection_id(request)?;
    connections
        .remove_connection(connection_id)
        .await
        .map_err(|err| {
            error!(connection_id, "failed to remove connection: {err:#}");
            Error::internal(format!("{err:#}"))
        })?;

    info!(connection_id, "connection removed");
    text_response(StatusCode::OK, DISCONNECTED)
}

/// Tells the caller its own connection id. The push is best effort, the
/// route always acknowledges.
#[tracing::instrument(skip_all)]
pub async fn handle_default<N, F>(request: &Request, make_notifier: F) -> Result<Response<String>, Error>
where
    N: ConnectionNotifier,
    F: FnOnce(&str) -> N,
{
    let context = websocket_context(request)?;
    let connection_id = connection_id(request)?;

    let domain_name = context.domain_name.as_deref().unwrap_or_default();
    let stage = context.stage.as_deref().unwrap_or_default();
    if domain_name.is_empty() {
        warn!(connection_id, "request context has no domain name, not replying");
        return text_response(StatusCode::OK, MESSAGE_RECEIVED);
    }

    let notifier = make_notifier(&callback_endpoint(domain_name, stage));
    let payload = serde_json::to_vec(&ConnectionIdMessage { connection_id })?;
    match notifier.post_to_connection(connection_id, &payload).await {
        Ok(()) => info!(connection_id, "connection id sent"),
        Err(err) => error!(connection_id, "failed to send connection id: {err:#}"),
    }

    text_response(StatusCode::OK, MESSAGE_RECEIVED)
}
