use lambda_http::http::{header, StatusCode};
use lambda_http::{Request, RequestExt, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::common::errors::Error;

pub const JSON_CONTENT_TYPE: &str = "application/json";

const INVALID_PAYLOAD_ERROR: &str = "Invalid request body";

/// Parses the JSON object body regardless of the declared content type.
/// Empty bodies and JSON values other than objects are rejected.
pub fn extract_request<T: DeserializeOwned>(request: &Request) -> Result<T, Error> {
    let value = serde_json::from_slice::<Value>(request.body().as_ref()).map_err(|err| {
        tracing::warn!(error = %err, "failed to parse request body");
        Error::bad_request(INVALID_PAYLOAD_ERROR)
    })?;

    if !value.is_object() {
        tracing::warn!("request body is not a json object");
        return Err(Error::bad_request(INVALID_PAYLOAD_ERROR));
    }

    serde_json::from_value::<T>(value).map_err(|err| {
        tracing::warn!(error = %err, "request body does not match the expected shape");
        Error::bad_request(INVALID_PAYLOAD_ERROR)
    })
}

pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Result<Response<String>, Error> {
    let response = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, JSON_CONTENT_TYPE)
        .body(serde_json::to_string(body)?)?;

    Ok(response)
}

pub fn text_response(status: StatusCode, body: &str) -> Result<Response<String>, Error> {
    let response = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "text/plain")
        .body(body.to_string())?;

    Ok(response)
}

/// First value of a query string parameter, treating empty values as absent.
pub fn query_param(request: &Request, name: &str) -> Option<String> {
    request
        .query_string_parameters_ref()
        .and_then(|params| params.first(name))
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

pub fn path_param(request: &Request, name: &str) -> Option<String> {
    request
        .path_parameters_ref()
        .and_then(|params| params.first(name))
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

pub fn header_value<'a>(request: &'a Request, name: &str) -> Option<&'a str> {
    request
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
}
