use lambda_http::{run, service_fn, Error as LambdaError, Request as LambdaRequest};

use model_loader::clients::{DynamoJobHistoryStore, S3ObjectStore, SqsJobQueue};
use model_loader::common::config::{load_aws_config, ApiConfig};
use model_loader::common::errors::into_lambda_result;
use model_loader::common::init_tracing;
use model_loader::handlers::router::process_request;

#[tokio::main]
async fn main() -> Result<(), LambdaError> {
    init_tracing();

    let config = ApiConfig::from_env()?;
    tracing::info!(config = ?config, "starting model loader api");

    let aws_config = load_aws_config().await;
    let object_store = S3ObjectStore::new(aws_sdk_s3::Client::new(&aws_config), &config.bucket_name);
    let job_queue = SqsJobQueue::new(aws_sdk_sqs::Client::new(&aws_config), &config.queue_url);
    let job_history = DynamoJobHistoryStore::new(
        aws_sdk_dynamodb::Client::new(&aws_config),
        &config.job_history_table,
    );

    let (config, object_store, job_queue, job_history) =
        (&config, &object_store, &job_queue, &job_history);

    run(service_fn(|request: LambdaRequest| async move {
        let result =
            process_request(request, config, object_store, job_queue, job_history).await;

        into_lambda_result(result)
    }))
    .await
}
