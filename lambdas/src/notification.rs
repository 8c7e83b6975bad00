use aws_lambda_events::sqs::SqsEvent;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};

use model_loader::clients::apigateway::endpoint_url;
use model_loader::clients::{ApiGatewayNotifier, DynamoConnectionStore, DynamoJobHistoryStore};
use model_loader::common::config::{load_aws_config, NotificationConfig};
use model_loader::common::init_tracing;
use model_loader::handlers::notification::process_event;

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let config = NotificationConfig::from_env()?;
    tracing::info!(config = ?config, "starting notification relay");

    let aws_config = load_aws_config().await;
    let dynamodb_client = aws_sdk_dynamodb::Client::new(&aws_config);
    let connections = DynamoConnectionStore::new(dynamodb_client.clone(), &config.connections_table);
    let job_history = DynamoJobHistoryStore::new(dynamodb_client, &config.job_history_table);
    let notifier =
        ApiGatewayNotifier::for_endpoint(&aws_config, &endpoint_url(&config.websocket_endpoint));

    let (connections, job_history, notifier) = (&connections, &job_history, &notifier);

    run(service_fn(|event: LambdaEvent<SqsEvent>| async move {
        process_event(event.payload, connections, job_history, notifier).await;

        Ok::<(), Error>(())
    }))
    .await
}
