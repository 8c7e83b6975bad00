use anyhow::Context;
use async_trait::async_trait;
use aws_sdk_dynamodb::{types::AttributeValue, Client};
use std::collections::HashMap;
use tracing::{debug, info, warn};

use super::{item_from_start_key, start_key_from_item};
use crate::clients::{HistoryPage, HistoryQuery, JobHistoryStore};
use crate::common::{JobHistoryRecord, JobKey};

/// GSI with hash key `modelId` and range key `jobType`.
pub const MODEL_JOB_TYPE_INDEX: &str = "ModelJobTypeIndex";
/// GSI with hash key `toFileType`.
pub const TO_FILE_TYPE_INDEX: &str = "ToFileTypeIndex";

/// Job history table keyed by `jobId`.
#[derive(Clone, Debug)]
pub struct DynamoJobHistoryStore {
    inner: Client,
    table_name: String,
}

impl DynamoJobHistoryStore {
    pub fn new(inner: Client, table_name: impl Into<String>) -> Self {
        Self {
            inner,
            table_name: table_name.into(),
        }
    }
}

fn decode_records(items: Vec<HashMap<String, AttributeValue>>) -> Vec<JobHistoryRecord> {
    items
        .into_iter()
        .filter_map(|item| {
            let job_id = item.get("jobId").and_then(|v| v.as_s().ok()).cloned();
            let record: Result<JobHistoryRecord, _> = serde_dynamo::from_item(item);
            match record {
                Ok(record) => Some(record),
                Err(err) => {
                    warn!(job_id = ?job_id, error = %err, "skipping malformed job history item");
                    None
                }
            }
        })
        .collect()
}

#[async_trait]
impl JobHistoryStore for DynamoJobHistoryStore {
    #[tracing::instrument(skip(self))]
    async fn find_job_id(&self, key: &JobKey) -> anyhow::Result<Option<String>> {
        let mut exclusive_start_key = None;

        loop {
            let result = self
                .inner
                .query()
                .table_name(&self.table_name)
                .index_name(MODEL_JOB_TYPE_INDEX)
                .key_condition_expression("#modelId = :modelId AND #jobType = :jobType")
                .filter_expression("#fromFileType = :fromFileType AND #toFileType = :toFileType")
                .expression_attribute_names("#modelId", "modelId")
                .expression_attribute_names("#jobType", "jobType")
                .expression_attribute_names("#fromFileType", "fromFileType")
                .expression_attribute_names("#toFileType", "toFileType")
                .expression_attribute_values(":modelId", AttributeValue::S(key.model_id.clone()))
                .expression_attribute_values(":jobType", AttributeValue::S(key.job_type.clone()))
                .expression_attribute_values(
                    ":fromFileType",
                    AttributeValue::S(key.from_file_type.clone()),
                )
                .expression_attribute_values(
                    ":toFileType",
                    AttributeValue::S(key.to_file_type.clone()),
                )
                .set_exclusive_start_key(exclusive_start_key)
                .send()
                .await
                .context("failed to query job history by model and job type")?;

            let job_id = result
                .items()
                .iter()
                .find_map(|item| item.get("jobId").and_then(|v| v.as_s().ok()).cloned());

            if job_id.is_some() {
                debug!(job_id = ?job_id, "found existing job");
                return Ok(job_id);
            }

            match result.last_evaluated_key {
                Some(last_key) => exclusive_start_key = Some(last_key),
                None => return Ok(None),
            }
        }
    }

    #[tracing::instrument(skip(self, record), fields(job_id = %record.job_id))]
    async fn put_record(&self, record: &JobHistoryRecord) -> anyhow::Result<()> {
        let item: HashMap<String, AttributeValue> =
            serde_dynamo::to_item(record).context("should be able to serialize job record")?;

        self.inner
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .send()
            .await
            .context("failed to put job history record")?;

        info!("saved job history record {}", record.job_id);
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn query_page(&self, query: &HistoryQuery) -> anyhow::Result<HistoryPage> {
        let exclusive_start_key = query.exclusive_start_key.as_ref().map(item_from_start_key);

        let (items, last_evaluated_key) = match &query.to_file_type {
            Some(to_file_type) => {
                let result = self
                    .inner
                    .query()
                    .table_name(&self.table_name)
                    .index_name(TO_FILE_TYPE_INDEX)
                    .key_condition_expression("#toFileType = :fileType")
                    .expression_attribute_names("#toFileType", "toFileType")
                    .expression_attribute_values(":fileType", AttributeValue::S(to_file_type.clone()))
                    .limit(query.limit)
                    .set_exclusive_start_key(exclusive_start_key)
                    .send()
                    .await
                    .context("failed to query job history by file type")?;

                (result.items, result.last_evaluated_key)
            }
            None => {
                let result = self
                    .inner
                    .scan()
                    .table_name(&self.table_name)
                    .limit(query.limit)
                    .set_exclusive_start_key(exclusive_start_key)
                    .send()
                    .await
                    .context("failed to scan job history")?;

                (result.items, result.last_evaluated_key)
            }
        };

        Ok(HistoryPage {
            records: decode_records(items.unwrap_or_default()),
            last_evaluated_key: last_evaluated_key.as_ref().map(start_key_from_item),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::JobStatus;

    fn s(value: &str) -> AttributeValue {
        AttributeValue::S(value.to_string())
    }

    #[test]
    fn decodes_items_and_skips_malformed_ones() {
        let complete = HashMap::from([
            ("jobId".to_string(), s("job-1")),
            ("connectionId".to_string(), s("conn-1")),
            ("jobType".to_string(), s("conversion")),
            ("jobStatus".to_string(), s("completed")),
            ("fromFileType".to_string(), s("blend")),
            ("toFileType".to_string(), s("glb")),
            ("modelId".to_string(), s("model-1")),
            ("s3Key".to_string(), s("blend/model-1.blend")),
            ("newS3Key".to_string(), s("glb/model-1.glb")),
            ("timestamp".to_string(), s("2024-05-01T12:00:00Z")),
        ]);
        let missing_status = HashMap::from([("jobId".to_string(), s("job-2"))]);

        let records = decode_records(vec![complete, missing_status]);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].job_id, "job-1");
        assert_eq!(records[0].job_status, JobStatus::Completed);
        assert_eq!(records[0].new_s3_key.as_deref(), Some("glb/model-1.glb"));
        assert_eq!(records[0].error, None);
    }
}
