use lambda_http::{run, service_fn, Error as LambdaError, Request as LambdaRequest};

use model_loader::clients::DynamoConnectionStore;
use model_loader::common::config::{load_aws_config, ConnectionConfig};
use model_loader::common::errors::into_lambda_result;
use model_loader::common::init_tracing;
use model_loader::handlers::websocket::handle_disconnect;

#[tokio::main]
async fn main() -> Result<(), LambdaError> {
    init_tracing();

    let config = ConnectionConfig::disconnect_from_env()?;
    let aws_config = load_aws_config().await;
    let connections = DynamoConnectionStore::new(
        aws_sdk_dynamodb::Client::new(&aws_config),
        &config.connections_table,
    );

    let connections = &connections;

    run(service_fn(|request: LambdaRequest| async move {
        into_lambda_result(handle_disconnect(&request, connections).await)
    }))
    .await
}
