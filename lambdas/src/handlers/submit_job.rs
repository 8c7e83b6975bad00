//! `POST /v1/3d-model`: validates a conversion request and queues it for the
//! blender worker.

use lambda_http::http::{header, StatusCode};
use lambda_http::{Request as LambdaRequest, Response as LambdaResponse};
use serde::Serialize;
use tracing::{error, info};

use crate::clients::JobQueue;
use crate::common::auth::validate_http_api_key;
use crate::common::config::ApiConfig;
use crate::common::errors::Error;
use crate::common::models::{SOURCE_FILE_TYPE, SUPPORTED_OUTPUT_FORMATS};
use crate::common::utils::{extract_request, header_value, json_response};
use crate::common::{ConversionJob, ConversionMessage};

pub const JOB_QUEUED_STATUS: &str = "Job successfully queued";

const FILE_UPLOAD_ERROR: &str = "No file uploads allowed";
const UNSUPPORTED_SOURCE_ERROR: &str = "Only blend files are supported";
const QUEUE_ERROR: &str = "Error sending message to queue";

#[derive(Debug, Serialize)]
struct Response {
    pub status: &'static str,
}

fn validate_job(job: &ConversionJob) -> Result<(), Error> {
    let missing = job.missing_fields();
    if !missing.is_empty() {
        return Err(Error::bad_request(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }

    if job.from_file_type != SOURCE_FILE_TYPE {
        return Err(Error::bad_request(UNSUPPORTED_SOURCE_ERROR));
    }

    if !SUPPORTED_OUTPUT_FORMATS.contains(&job.to_file_type.as_str()) {
        return Err(Error::bad_request(format!(
            "Only {} files are supported",
            SUPPORTED_OUTPUT_FORMATS.join(", ")
        )));
    }

    Ok(())
}

#[tracing::instrument(skip_all)]
pub async fn submit_job(
    request: &LambdaRequest,
    config: &ApiConfig,
    job_queue: &dyn JobQueue,
) -> Result<LambdaResponse<String>, Error> {
    validate_http_api_key(request, &config.api_key)?;

    if header_value(request, header::CONTENT_TYPE.as_str())
        .is_some_and(|content_type| content_type.starts_with("multipart/form-data"))
    {
        return Err(Error::bad_request(FILE_UPLOAD_ERROR));
    }

    let job = extract_request::<ConversionJob>(request)?;
    validate_job(&job)?;

    let message = ConversionMessage::pending(job);
    let body = serde_json::to_string(&message)?;

    info!(
        job_id = %message.job_id,
        model_id = %message.job.model_id,
        to_file_type = %message.job.to_file_type,
        "queueing conversion job"
    );
    job_queue.send_message(&body).await.map_err(|err| {
        error!(job_id = %message.job_id, error = ?err, "failed to queue conversion job");
        Error::internal(QUEUE_ERROR)
    })?;

    json_response(
        StatusCode::ACCEPTED,
        &Response {
            status: JOB_QUEUED_STATUS,
        },
    )
}
