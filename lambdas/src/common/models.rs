use serde::{Deserialize, Deserializer, Serialize};

pub const SOURCE_FILE_TYPE: &str = "blend";
pub const DOWNLOADABLE_FILE_TYPE: &str = "glb";
pub const SUPPORTED_OUTPUT_FORMATS: [&str; 6] = ["glb", "gltf", "obj", "fbx", "usd", "usdz"];

pub const CONVERSION_JOB_TYPE: &str = "conversion";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    /// Any status the conversion worker reports that we don't model.
    #[serde(untagged)]
    Other(String),
}

impl Default for JobStatus {
    fn default() -> Self {
        JobStatus::Other(String::new())
    }
}

/// Reads an absent or `null` field as the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Body of `POST /v1/3d-model`. Missing fields deserialize as empty strings
/// so they can be reported together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConversionJob {
    pub connection_id: String,
    pub from_file_type: String,
    pub to_file_type: String,
    pub model_id: String,
    pub s3_key: String,
}

impl ConversionJob {
    /// Names of required fields that are empty, in declaration order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("connectionId", &self.connection_id),
            ("fromFileType", &self.from_file_type),
            ("toFileType", &self.to_file_type),
            ("modelId", &self.model_id),
            ("s3Key", &self.s3_key),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

/// What the job submitter puts on the blender jobs queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionMessage {
    pub job_type: String,
    pub job_id: String,
    pub job_status: JobStatus,
    #[serde(flatten)]
    pub job: ConversionJob,
}

impl ConversionMessage {
    pub fn pending(job: ConversionJob) -> Self {
        Self {
            job_type: CONVERSION_JOB_TYPE.to_string(),
            job_id: uuid::Uuid::new_v4().to_string(),
            job_status: JobStatus::Pending,
            job,
        }
    }
}

/// Status update published by the conversion worker.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationMessage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub connection_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub job_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub job_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub job_status: JobStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub from_file_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub to_file_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub model_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub s3_key: String,
    #[serde(default)]
    pub new_s3_key: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl NotificationMessage {
    pub fn job_key(&self) -> JobKey {
        JobKey {
            model_id: self.model_id.clone(),
            job_type: self.job_type.clone(),
            from_file_type: self.from_file_type.clone(),
            to_file_type: self.to_file_type.clone(),
        }
    }

    /// Builds the history row for this update under `job_id`.
    pub fn into_record(self, job_id: String, timestamp: String) -> JobHistoryRecord {
        JobHistoryRecord {
            job_id,
            connection_id: self.connection_id,
            job_type: self.job_type,
            job_status: self.job_status,
            from_file_type: self.from_file_type,
            to_file_type: self.to_file_type,
            model_id: self.model_id,
            s3_key: self.s3_key,
            new_s3_key: self.new_s3_key.filter(|value| !value.is_empty()),
            error: self.error.filter(|value| !value.is_empty()),
            timestamp,
        }
    }
}

/// Identifies one logical job: later updates for the same key share a jobId.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobKey {
    pub model_id: String,
    pub job_type: String,
    pub from_file_type: String,
    pub to_file_type: String,
}

/// Row of the job history table, also the element type of the list endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobHistoryRecord {
    pub job_id: String,
    pub connection_id: String,
    pub job_type: String,
    pub job_status: JobStatus,
    pub from_file_type: String,
    pub to_file_type: String,
    pub model_id: String,
    pub s3_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_s3_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: String,
}

impl JobHistoryRecord {
    pub fn is_failed(&self) -> bool {
        self.job_status == JobStatus::Failed
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub connection_id: String,
}
