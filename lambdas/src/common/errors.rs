use lambda_http::http::StatusCode;
use lambda_http::{Error as LambdaError, Response};
use serde::Serialize;

use crate::common::utils::json_response;

#[derive(Debug, Serialize)]
pub struct ErrorResponse<'a> {
    pub error: &'a str,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A finished response for the caller. The invocation itself succeeds.
    #[error("http error: {}", .0.status())]
    HttpError(Response<String>),
    #[error("lambda error: {0}")]
    LambdaError(LambdaError),
}

impl Error {
    /// Builds an `HttpError` carrying `{"error": message}`.
    pub fn http(status: StatusCode, message: impl AsRef<str>) -> Self {
        let body = ErrorResponse {
            error: message.as_ref(),
        };

        match json_response(status, &body) {
            Ok(response) => Error::HttpError(response),
            Err(err) => err,
        }
    }

    pub fn bad_request(message: impl AsRef<str>) -> Self {
        Self::http(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl AsRef<str>) -> Self {
        Self::http(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<LambdaError> for Error {
    fn from(value: LambdaError) -> Self {
        Error::LambdaError(value)
    }
}

impl From<lambda_http::http::Error> for Error {
    fn from(value: lambda_http::http::Error) -> Self {
        Error::LambdaError(Box::new(value))
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::LambdaError(Box::new(value))
    }
}

/// Collapses a handler result into what the runtime expects: client-facing
/// errors become regular responses, everything else fails the invocation.
pub fn into_lambda_result(
    result: Result<Response<String>, Error>,
) -> Result<Response<String>, LambdaError> {
    match result {
        Ok(val) => Ok(val),
        Err(Error::HttpError(val)) => Ok(val),
        Err(Error::LambdaError(err)) => Err(err),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    Missing(&'static str),
    #[error("environment variable {name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}
