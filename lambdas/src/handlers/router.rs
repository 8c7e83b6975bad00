//! Routing for the HTTP API lambda.

use lambda_http::http::{Method, StatusCode};
use lambda_http::{Request as LambdaRequest, Response as LambdaResponse};
use tracing::info;

use crate::clients::{JobHistoryStore, JobQueue, ObjectStore};
use crate::common::config::ApiConfig;
use crate::common::errors::Error;
use crate::handlers::{get_model::get_model, list_models::list_models, submit_job::submit_job};

const NOT_FOUND_ERROR: &str = "Not found";
const METHOD_NOT_ALLOWED_ERROR: &str = "Method not allowed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    SubmitJob,
    GetModel { model_id: String },
    ListModels,
    MethodNotAllowed,
    NotFound,
}

impl Route {
    /// Matches on the trailing path segments so stage prefixes such as
    /// `/prod/v1/3d-models` resolve the same as `/v1/3d-models`.
    pub fn resolve(method: &Method, path: &str) -> Self {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let resource = match segments.as_slice() {
            [.., "v1", "3d-model"] => Resource::Model,
            [.., "v1", "3d-model", model_id] => Resource::ModelById(decode_segment(model_id)),
            [.., "v1", "3d-models"] => Resource::Models,
            _ => return Route::NotFound,
        };

        match (method, resource) {
            (&Method::POST, Resource::Model) => Route::SubmitJob,
            (&Method::GET, Resource::ModelById(model_id)) => Route::GetModel { model_id },
            (&Method::GET, Resource::Models) => Route::ListModels,
            _ => Route::MethodNotAllowed,
        }
    }
}

/// Percent-decodes a path segment, keeping it raw when it does not decode to UTF-8.
fn decode_segment(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}

enum Resource {
    Model,
    ModelById(String),
    Models,
}

#[tracing::instrument(skip_all, fields(method = %request.method(), path = %request.uri().path()))]
pub async fn process_request(
    request: LambdaRequest,
    config: &ApiConfig,
    object_store: &dyn ObjectStore,
    job_queue: &dyn JobQueue,
    job_history: &dyn JobHistoryStore,
) -> Result<LambdaResponse<String>, Error> {
    let route = Route::resolve(request.method(), request.uri().path());
    info!(route = ?route, "routing request");

    match route {
        Route::SubmitJob => submit_job(&request, config, job_queue).await,
        Route::GetModel { model_id } => {
            get_model(&request, Some(model_id), config, object_store).await
        }
        Route::ListModels => list_models(&request, config, job_history).await,
        Route::MethodNotAllowed => Err(Error::http(
            StatusCode::METHOD_NOT_ALLOWED,
            METHOD_NOT_ALLOWED_ERROR,
        )),
        Route::NotFound => Err(Error::http(StatusCode::NOT_FOUND, NOT_FOUND_ERROR)),
    }
}
