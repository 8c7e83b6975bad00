use lambda_http::{run, service_fn, Error as LambdaError, Request as LambdaRequest};

use model_loader::clients::ApiGatewayNotifier;
use model_loader::common::config::load_aws_config;
use model_loader::common::errors::into_lambda_result;
use model_loader::common::init_tracing;
use model_loader::handlers::websocket::handle_default;

#[tokio::main]
async fn main() -> Result<(), LambdaError> {
    init_tracing();

    let aws_config = load_aws_config().await;
    let aws_config = &aws_config;

    run(service_fn(|request: LambdaRequest| async move {
        let result = handle_default(&request, |endpoint| {
            ApiGatewayNotifier::for_endpoint(aws_config, endpoint)
        })
        .await;

        into_lambda_result(result)
    }))
    .await
}
