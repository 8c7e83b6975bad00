//! Relays job status updates from the notification queue to websocket clients
//! and keeps the job history current.

use aws_lambda_events::sqs::SqsEvent;
use chrono::{SecondsFormat, Utc};
use tracing::{info, warn};

use crate::clients::{ConnectionNotifier, ConnectionStore, JobHistoryStore};
use crate::common::NotificationMessage;

/// Why a queue record was not relayed.
#[derive(Debug, thiserror::Error)]
pub enum SkipReason {
    #[error("message has no body")]
    MissingBody,
    #[error("message body is not a notification: {0}")]
    InvalidBody(#[from] serde_json::Error),
    #[error("notification has no connectionId")]
    MissingConnectionId,
    #[error("connection is no longer registered")]
    UnknownConnection,
    #[error("failed to look up connection: {0:#}")]
    ConnectionLookup(anyhow::Error),
    #[error("failed to look up existing job: {0:#}")]
    JobLookup(anyhow::Error),
    #[error("failed to save job history: {0:#}")]
    Persist(anyhow::Error),
    #[error("failed to push to connection: {0:#}")]
    Push(anyhow::Error),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub relayed: usize,
    pub skipped: usize,
}

pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Handles one queue record and returns the jobId it was recorded under.
pub async fn process_record(
    body: Option<&str>,
    connections: &dyn ConnectionStore,
    job_history: &dyn JobHistoryStore,
    notifier: &dyn ConnectionNotifier,
) -> Result<String, SkipReason> {
    let body = body.ok_or(SkipReason::MissingBody)?;
    let notification: NotificationMessage = serde_json::from_str(body)?;

    if notification.connection_id.is_empty() {
        return Err(SkipReason::MissingConnectionId);
    }
    let connection_id = notification.connection_id.clone();

    let registered = connections
        .connection_exists(&connection_id)
        .await
        .map_err(SkipReason::ConnectionLookup)?;
    if !registered {
        return Err(SkipReason::UnknownConnection);
    }

    // TODO: guard the lookup and the put with a condition expression, two
    // concurrent updates for the same model can still create two job ids
    let existing_job_id = job_history
        .find_job_id(&notification.job_key())
        .await
        .map_err(SkipReason::JobLookup)?;
    let job_id = existing_job_id.unwrap_or_else(|| notification.job_id.clone());

    let record = notification.into_record(job_id.clone(), timestamp_now());
    job_history
        .put_record(&record)
        .await
        .map_err(SkipReason::Persist)?;

    notifier
        .post_to_connection(&connection_id, body.as_bytes())
        .await
        .map_err(SkipReason::Push)?;

    Ok(job_id)
}

/// Processes every record of the batch in order. A failing record is logged
/// and skipped, it never fails the invocation.
#[tracing::instrument(skip_all, fields(records = event.records.len()))]
pub async fn process_event(
    event: SqsEvent,
    connections: &dyn ConnectionStore,
    job_history: &dyn JobHistoryStore,
    notifier: &dyn ConnectionNotifier,
) -> BatchSummary {
    let mut summary = BatchSummary::default();

    for record in &event.records {
        let message_id = record.message_id.as_deref().unwrap_or("unknown");
        match process_record(record.body.as_deref(), connections, job_history, notifier).await {
            Ok(job_id) => {
                info!(message_id, job_id = %job_id, "notification relayed");
                summary.relayed += 1;
            }
            Err(reason) => {
                warn!(message_id, reason = %reason, "skipping notification");
                summary.skipped += 1;
            }
        }
    }

    info!(relayed = summary.relayed, skipped = summary.skipped, "batch processed");
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{MockConnectionNotifier, MockConnectionStore, MockJobHistoryStore};
    use crate::common::{JobKey, JobStatus};
    use aws_lambda_events::sqs::SqsMessage;
    use mockall::predicate::eq;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn body(connection_id: &str, job_id: &str, status: &str) -> String {
        json!({
            "connectionId": connection_id,
            "jobType": "conversion",
            "jobId": job_id,
            "jobStatus": status,
            "fromFileType": "blend",
            "toFileType": "glb",
            "modelId": "model-1",
            "s3Key": "blend/model-1.blend",
            "newS3Key": "glb/model-1.glb",
            "error": ""
        })
        .to_string()
    }

    fn event(bodies: &[Option<String>]) -> SqsEvent {
        SqsEvent {
            records: bodies
                .iter()
                .enumerate()
                .map(|(i, body)| SqsMessage {
                    message_id: Some(format!("message-{i}")),
                    body: body.clone(),
                    ..Default::default()
                })
                .collect(),
        }
    }

    fn known_connections() -> MockConnectionStore {
        let mut connections = MockConnectionStore::new();
        connections
            .expect_connection_exists()
            .returning(|connection_id| Ok(connection_id != "gone"));
        connections
    }

    fn accepting_notifier() -> MockConnectionNotifier {
        let mut notifier = MockConnectionNotifier::new();
        notifier.expect_post_to_connection().returning(|_, _| Ok(()));
        notifier
    }

    #[tokio::test]
    async fn new_job_is_recorded_and_relayed_verbatim() {
        let body = body("conn-1", "job-new", "completed");
        let mut job_history = MockJobHistoryStore::new();
        job_history
            .expect_find_job_id()
            .with(eq(JobKey {
                model_id: "model-1".to_string(),
                job_type: "conversion".to_string(),
                from_file_type: "blend".to_string(),
                to_file_type: "glb".to_string(),
            }))
            .times(1)
            .returning(|_| Ok(None));
        job_history
            .expect_put_record()
            .withf(|record| {
                record.job_id == "job-new"
                    && record.job_status == JobStatus::Completed
                    && record.new_s3_key.as_deref() == Some("glb/model-1.glb")
                    && record.error.is_none()
                    && chrono::DateTime::parse_from_rfc3339(&record.timestamp).is_ok()
            })
            .times(1)
            .returning(|_| Ok(()));

        let expected = body.clone();
        let mut notifier = MockConnectionNotifier::new();
        notifier
            .expect_post_to_connection()
            .withf(move |connection_id, data| {
                connection_id == "conn-1" && data == expected.as_bytes()
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let job_id = process_record(Some(&body), &known_connections(), &job_history, &notifier)
            .await
            .unwrap();

        assert_eq!(job_id, "job-new");
    }

    #[tokio::test]
    async fn later_update_reuses_existing_job_id() {
        let mut job_history = MockJobHistoryStore::new();
        job_history
            .expect_find_job_id()
            .returning(|_| Ok(Some("job-first".to_string())));
        job_history
            .expect_put_record()
            .withf(|record| record.job_id == "job-first")
            .times(1)
            .returning(|_| Ok(()));

        let job_id = process_record(
            Some(&body("conn-1", "job-second", "completed")),
            &known_connections(),
            &job_history,
            &accepting_notifier(),
        )
        .await
        .unwrap();

        assert_eq!(job_id, "job-first");
    }

    #[tokio::test]
    async fn partial_update_is_still_recorded_and_relayed() {
        let body = json!({
            "connectionId": "conn-1",
            "jobId": null,
            "modelId": "model-1",
            "s3Key": "blend/model-1.blend"
        })
        .to_string();

        let mut job_history = MockJobHistoryStore::new();
        job_history
            .expect_find_job_id()
            .times(1)
            .returning(|_| Ok(Some("job-first".to_string())));
        job_history
            .expect_put_record()
            .withf(|record| {
                record.job_id == "job-first"
                    && record.job_status == JobStatus::Other(String::new())
                    && record.model_id == "model-1"
            })
            .times(1)
            .returning(|_| Ok(()));

        let expected = body.clone();
        let mut notifier = MockConnectionNotifier::new();
        notifier
            .expect_post_to_connection()
            .withf(move |connection_id, data| {
                connection_id == "conn-1" && data == expected.as_bytes()
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let job_id = process_record(Some(&body), &known_connections(), &job_history, &notifier)
            .await
            .unwrap();

        assert_eq!(job_id, "job-first");
    }

    #[tokio::test]
    async fn unparseable_and_anonymous_messages_touch_nothing() {
        let mut connections = MockConnectionStore::new();
        connections.expect_connection_exists().never();
        let mut job_history = MockJobHistoryStore::new();
        job_history.expect_put_record().never();
        let mut notifier = MockConnectionNotifier::new();
        notifier.expect_post_to_connection().never();

        let messages = [None, Some("not json".to_string()), Some(body("", "job-1", "pending"))];
        for message in messages {
            let result =
                process_record(message.as_deref(), &connections, &job_history, &notifier).await;
            assert!(result.is_err());
        }
    }

    #[tokio::test]
    async fn disconnected_client_is_skipped() {
        let mut job_history = MockJobHistoryStore::new();
        job_history.expect_find_job_id().never();
        job_history.expect_put_record().never();

        let result = process_record(
            Some(&body("gone", "job-1", "completed")),
            &known_connections(),
            &job_history,
            &MockConnectionNotifier::new(),
        )
        .await;

        assert!(matches!(result, Err(SkipReason::UnknownConnection)));
    }

    #[tokio::test]
    async fn persist_failure_skips_push() {
        let mut job_history = MockJobHistoryStore::new();
        job_history.expect_find_job_id().returning(|_| Ok(None));
        job_history
            .expect_put_record()
            .returning(|_| Err(anyhow::anyhow!("provisioned throughput exceeded")));
        let mut notifier = MockConnectionNotifier::new();
        notifier.expect_post_to_connection().never();

        let result = process_record(
            Some(&body("conn-1", "job-1", "failed")),
            &known_connections(),
            &job_history,
            &notifier,
        )
        .await;

        assert!(matches!(result, Err(SkipReason::Persist(_))));
    }

    #[tokio::test]
    async fn batch_continues_after_failures() {
        let mut job_history = MockJobHistoryStore::new();
        job_history.expect_find_job_id().returning(|_| Ok(None));
        job_history.expect_put_record().times(2).returning(|_| Ok(()));

        let mut notifier = MockConnectionNotifier::new();
        notifier
            .expect_post_to_connection()
            .times(2)
            .returning(|connection_id, _| {
                if connection_id == "conn-broken" {
                    Err(anyhow::anyhow!("GoneException"))
                } else {
                    Ok(())
                }
            });

        let summary = process_event(
            event(&[
                Some("{".to_string()),
                Some(body("conn-broken", "job-1", "processing")),
                Some(body("gone", "job-2", "completed")),
                Some(body("conn-1", "job-3", "completed")),
            ]),
            &known_connections(),
            &job_history,
            &notifier,
        )
        .await;

        assert_eq!(
            summary,
            BatchSummary {
                relayed: 1,
                skipped: 3
            }
        );
    }

    #[test]
    fn timestamp_is_utc_seconds() {
        let timestamp = timestamp_now();
        assert!(timestamp.ends_with('Z'));
        assert_eq!(timestamp.len(), "2024-05-01T12:00:00Z".len());
    }
}
