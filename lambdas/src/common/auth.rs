use lambda_http::http::StatusCode;
use lambda_http::Request;

use crate::common::errors::Error;
use crate::common::utils::{header_value, query_param};

pub const API_KEY_HEADER: &str = "x-api-key";
pub const API_KEY_QUERY_PARAM: &str = "apiKey";

const API_KEY_REQUIRED_ERROR: &str = "API key is required";
const API_KEY_INVALID_ERROR: &str = "Invalid API key";

/// Checks a caller supplied key against the shared secret.
/// Missing keys are 401, wrong keys are 403.
pub fn validate_api_key(provided: Option<&str>, expected: &str) -> Result<(), Error> {
    match provided {
        None | Some("") => {
            tracing::warn!("request without api key");
            Err(Error::http(StatusCode::UNAUTHORIZED, API_KEY_REQUIRED_ERROR))
        }
        Some(key) if key != expected => {
            tracing::warn!("request with invalid api key");
            Err(Error::http(StatusCode::FORBIDDEN, API_KEY_INVALID_ERROR))
        }
        Some(_) => Ok(()),
    }
}

pub fn validate_http_api_key(request: &Request, expected: &str) -> Result<(), Error> {
    validate_api_key(header_value(request, API_KEY_HEADER), expected)
}

pub fn validate_websocket_api_key(request: &Request, expected: &str) -> Result<(), Error> {
    validate_api_key(query_param(request, API_KEY_QUERY_PARAM).as_deref(), expected)
}
