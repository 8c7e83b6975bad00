use lambda_http::{run, service_fn, Error as LambdaError, Request as LambdaRequest};

use model_loader::clients::DynamoConnectionStore;
use model_loader::common::config::{load_aws_config, ConnectionConfig};
use model_loader::common::errors::into_lambda_result;
use model_loader::common::init_tracing;
use model_loader::handlers::websocket::handle_connect;

#[tokio::main]
async fn main() -> Result<(), LambdaError> {
    init_tracing();

    let config = ConnectionConfig::connect_from_env()?;
    let aws_config = load_aws_config().await;
    let connections = DynamoConnectionStore::new(
        aws_sdk_dynamodb::Client::new(&aws_config),
        &config.connections_table,
    );

    let config = &config;
    let connections = &connections;

    run(service_fn(|request: LambdaRequest| async move {
        into_lambda_result(handle_connect(&request, config, connections).await)
    }))
    .await
}
