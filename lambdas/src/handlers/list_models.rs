//! `GET /v1/3d-models`: pages through the job history, hiding failed jobs.

use lambda_http::http::StatusCode;
use lambda_http::{Request as LambdaRequest, Response as LambdaResponse};
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::clients::{HistoryQuery, JobHistoryStore, StartKey};
use crate::common::auth::validate_http_api_key;
use crate::common::config::ApiConfig;
use crate::common::cursor::{decode_cursor, encode_cursor, CursorError};
use crate::common::errors::Error;
use crate::common::utils::{json_response, query_param};
use crate::common::JobHistoryRecord;

pub const DEFAULT_LIMIT: i32 = 10;
pub const MAX_LIMIT: i32 = 100;

const INVALID_LIMIT_ERROR: &str =
    "Invalid limit parameter. Must be a positive number between 1 and 100";
const INVALID_CURSOR_ENCODING_ERROR: &str = "Invalid URL-encoded cursor";
const INVALID_CURSOR_FORMAT_ERROR: &str = "Invalid cursor format";
const QUERY_ERROR: &str = "Failed to query models";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Response {
    pub models: Vec<JobHistoryRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

fn parse_limit(limit: Option<&str>) -> Result<i32, Error> {
    let Some(limit) = limit else {
        return Ok(DEFAULT_LIMIT);
    };

    match limit.trim().parse::<i32>() {
        Ok(limit) if (1..=MAX_LIMIT).contains(&limit) => Ok(limit),
        _ => Err(Error::bad_request(INVALID_LIMIT_ERROR)),
    }
}

fn parse_cursor(cursor: Option<&str>) -> Result<Option<StartKey>, Error> {
    let Some(cursor) = cursor else {
        return Ok(None);
    };

    decode_cursor(cursor).map(Some).map_err(|err| {
        warn!(error = %err, "rejecting cursor");
        match err {
            CursorError::Encoding(_) => Error::bad_request(INVALID_CURSOR_ENCODING_ERROR),
            CursorError::Format(_) => Error::bad_request(INVALID_CURSOR_FORMAT_ERROR),
        }
    })
}

/// Collects up to `limit` records that are not failed, starting at
/// `start_key`. Every store request asks for the number of records still
/// missing, so pages are consumed whole and the returned key is an exact
/// resume point.
pub async fn collect_models(
    job_history: &dyn JobHistoryStore,
    to_file_type: Option<String>,
    limit: i32,
    start_key: Option<StartKey>,
) -> anyhow::Result<(Vec<JobHistoryRecord>, Option<StartKey>)> {
    let mut models = Vec::with_capacity(limit as usize);
    let mut start_key = start_key;

    loop {
        let remaining = limit - models.len() as i32;
        let page = job_history
            .query_page(&HistoryQuery {
                to_file_type: to_file_type.clone(),
                limit: remaining,
                exclusive_start_key: start_key.take(),
            })
            .await?;

        debug!(
            fetched = page.records.len(),
            more = page.last_evaluated_key.is_some(),
            "fetched job history page"
        );
        models.extend(page.records.into_iter().filter(|record| !record.is_failed()));
        start_key = page.last_evaluated_key;

        if models.len() as i32 >= limit || start_key.is_none() {
            break;
        }
    }

    // a store may hand back more than it was asked for
    models.truncate(limit as usize);
    Ok((models, start_key))
}

#[tracing::instrument(skip_all)]
pub async fn list_models(
    request: &LambdaRequest,
    config: &ApiConfig,
    job_history: &dyn JobHistoryStore,
) -> Result<LambdaResponse<String>, Error> {
    validate_http_api_key(request, &config.api_key)?;

    let to_file_type = query_param(request, "fileType");
    let limit = parse_limit(query_param(request, "limit").as_deref())?;
    let start_key = parse_cursor(query_param(request, "cursor").as_deref())?;

    let (models, last_key) = collect_models(job_history, to_file_type, limit, start_key)
        .await
        .map_err(|err| {
            error!(error = ?err, "failed to query job history");
            Error::internal(QUERY_ERROR)
        })?;

    let next_cursor = last_key.as_ref().map(encode_cursor).transpose()?;

    json_response(
        StatusCode::OK,
        &Response {
            models,
            next_cursor,
        },
    )
}
