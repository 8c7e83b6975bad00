//! `GET /v1/3d-model/{id}`: hands out presigned URLs for uploading a source
//! model or downloading a converted one.

use lambda_http::http::StatusCode;
use lambda_http::{Request as LambdaRequest, Response as LambdaResponse};
use serde::Serialize;
use tracing::{error, info};

use crate::clients::ObjectStore;
use crate::common::auth::validate_http_api_key;
use crate::common::config::ApiConfig;
use crate::common::errors::Error;
use crate::common::models::{DOWNLOADABLE_FILE_TYPE, SOURCE_FILE_TYPE};
use crate::common::utils::{json_response, path_param, query_param};

const MODEL_ID_REQUIRED_ERROR: &str = "Model id is required";
const FILE_TYPE_REQUIRED_ERROR: &str = "Malformed request - fileType query parameter is required";
const INVALID_UPLOAD_FLAG_ERROR: &str =
    "Malformed request - getPresignedUploadURL must be true or false";
const UPLOAD_TYPE_ERROR: &str = "Malformed request - fileType query parameter is not supported";
const DOWNLOAD_TYPE_ERROR: &str = "Malformed request - fetching this file type is not supported";
const PRESIGN_UPLOAD_ERROR: &str = "Failed to generate presigned PUT URL";
const PRESIGN_DOWNLOAD_ERROR: &str = "Failed to generate presigned URL";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Upload,
    Download,
}

impl Direction {
    fn from_flag(flag: Option<&str>) -> Result<Self, Error> {
        match flag {
            Some("true") => Ok(Direction::Upload),
            Some("false") | None => Ok(Direction::Download),
            Some(_) => Err(Error::bad_request(INVALID_UPLOAD_FLAG_ERROR)),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Response {
    pub presigned_url: String,
}

pub fn object_key(model_id: &str, file_type: &str) -> String {
    format!("{file_type}/{model_id}.{file_type}")
}

#[tracing::instrument(skip_all, fields(model_id = ?model_id))]
pub async fn get_model(
    request: &LambdaRequest,
    model_id: Option<String>,
    config: &ApiConfig,
    object_store: &dyn ObjectStore,
) -> Result<LambdaResponse<String>, Error> {
    validate_http_api_key(request, &config.api_key)?;

    let model_id = model_id
        .or_else(|| path_param(request, "id"))
        .ok_or_else(|| Error::bad_request(MODEL_ID_REQUIRED_ERROR))?;
    let file_type = query_param(request, "fileType")
        .ok_or_else(|| Error::bad_request(FILE_TYPE_REQUIRED_ERROR))?;
    let direction = Direction::from_flag(query_param(request, "getPresignedUploadURL").as_deref())?;

    let key = object_key(&model_id, &file_type);

    let presigned_url = match direction {
        Direction::Upload => {
            if file_type != SOURCE_FILE_TYPE {
                return Err(Error::bad_request(UPLOAD_TYPE_ERROR));
            }

            object_store
                .presign_upload(&key, config.upload_url_expiry)
                .await
                .map_err(|err| {
                    error!(key = %key, error = ?err, "failed to presign upload");
                    Error::internal(PRESIGN_UPLOAD_ERROR)
                })?
        }
        Direction::Download => {
            if file_type != DOWNLOADABLE_FILE_TYPE {
                return Err(Error::bad_request(DOWNLOAD_TYPE_ERROR));
            }

            object_store
                .presign_download(&key, config.download_url_expiry)
                .await
                .map_err(|err| {
                    error!(key = %key, error = ?err, "failed to presign download");
                    Error::internal(PRESIGN_DOWNLOAD_ERROR)
                })?
        }
    };

    info!(key = %key, direction = ?direction, "issued presigned url");
    json_response(StatusCode::OK, &Response { presigned_url })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::MockObjectStore;
    use crate::handlers::test_utils::{api_config, body_json, request, with_query};
    use mockall::predicate::eq;
    use std::time::Duration;

    async fn call(
        params: &[(&str, &str)],
        object_store: &MockObjectStore,
    ) -> LambdaResponse<String> {
        let request = with_query(request("GET", "/v1/3d-model/model-1", ""), params);
        match get_model(&request, Some("model-1".to_string()), &api_config(), object_store).await
        {
            Ok(response) | Err(Error::HttpError(response)) => response,
            Err(err) => panic!("unexpected error: {err}"),
        }
    }

    fn untouched_store() -> MockObjectStore {
        let mut store = MockObjectStore::new();
        store.expect_presign_upload().never();
        store.expect_presign_download().never();
        store
    }

    #[test]
    fn object_key_nests_by_type() {
        assert_eq!(object_key("model-1", "blend"), "blend/model-1.blend");
    }

    #[tokio::test]
    async fn upload_url_expires_quickly() {
        let mut store = MockObjectStore::new();
        store
            .expect_presign_upload()
            .with(eq("blend/model-1.blend"), eq(Duration::from_secs(60)))
            .times(1)
            .returning(|_, _| Ok("https://upload.example/blend".to_string()));

        let response = call(
            &[("fileType", "blend"), ("getPresignedUploadURL", "true")],
            &store,
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(&response)["presignedUrl"],
            "https://upload.example/blend"
        );
    }

    #[tokio::test]
    async fn download_url_lasts_a_day() {
        let mut store = MockObjectStore::new();
        store
            .expect_presign_download()
            .with(eq("glb/model-1.glb"), eq(Duration::from_secs(86400)))
            .times(1)
            .returning(|_, _| Ok("https://download.example/glb".to_string()));

        let response = call(&[("fileType", "glb")], &store).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(&response)["presignedUrl"],
            "https://download.example/glb"
        );
    }

    #[tokio::test]
    async fn upload_accepts_only_blend() {
        for file_type in ["glb", "fbx", "obj"] {
            let response = call(
                &[("fileType", file_type), ("getPresignedUploadURL", "true")],
                &untouched_store(),
            )
            .await;

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(body_json(&response)["error"], UPLOAD_TYPE_ERROR);
        }
    }

    #[tokio::test]
    async fn download_accepts_only_glb() {
        for file_type in ["blend", "gltf", "usdz"] {
            let response = call(
                &[("fileType", file_type), ("getPresignedUploadURL", "false")],
                &untouched_store(),
            )
            .await;

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(body_json(&response)["error"], DOWNLOAD_TYPE_ERROR);
        }
    }

    #[tokio::test]
    async fn file_type_is_required() {
        let response = call(&[], &untouched_store()).await;
        assert_eq!(body_json(&response)["error"], FILE_TYPE_REQUIRED_ERROR);
    }

    #[tokio::test]
    async fn unknown_upload_flag_is_rejected() {
        let response = call(
            &[("fileType", "glb"), ("getPresignedUploadURL", "yes")],
            &untouched_store(),
        )
        .await;
        assert_eq!(body_json(&response)["error"], INVALID_UPLOAD_FLAG_ERROR);
    }

    #[tokio::test]
    async fn model_id_falls_back_to_path_parameter() {
        use lambda_http::RequestExt;
        use std::collections::HashMap;

        let mut store = MockObjectStore::new();
        store
            .expect_presign_download()
            .with(eq("glb/from-path.glb"), eq(Duration::from_secs(86400)))
            .times(1)
            .returning(|_, _| Ok("https://download.example/path".to_string()));

        let request = with_query(request("GET", "/v1/3d-model/x", ""), &[("fileType", "glb")])
            .with_path_parameters(HashMap::from([("id".to_string(), "from-path".to_string())]));

        let response = get_model(&request, None, &api_config(), &store).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_model_id_is_rejected() {
        let request = with_query(request("GET", "/v1/3d-model/", ""), &[("fileType", "glb")]);

        let Err(Error::HttpError(response)) =
            get_model(&request, None, &api_config(), &untouched_store()).await
        else {
            panic!("expected http error");
        };
        assert_eq!(body_json(&response)["error"], MODEL_ID_REQUIRED_ERROR);
    }

    #[tokio::test]
    async fn signing_failure_is_internal_error() {
        let mut store = MockObjectStore::new();
        store
            .expect_presign_download()
            .returning(|_, _| Err(anyhow::anyhow!("no credentials")));

        let response = call(&[("fileType", "glb")], &store).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(&response)["error"], PRESIGN_DOWNLOAD_ERROR);
    }
}
